use chat_relay::modules::{self, cli::Cli, logger};
use chat_relay::{AppResult, AxumServer};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_dir = if cli.no_log_file {
        None
    } else {
        match logger::get_log_dir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                eprintln!("Failed to initialize log directory: {}", e);
                None
            }
        }
    };
    let _guard = logger::init_logger(log_dir.as_deref());

    if let Err(e) = run(cli).await {
        error!("chat-relay failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let mut config = modules::load_relay_config(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    info!(
        endpoint = %config.upstream.endpoint,
        default_model = %config.upstream.default_model,
        timeout_secs = config.upstream.request_timeout,
        "config loaded"
    );

    let (server, handle) = AxumServer::start(&config).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    server.stop();
    if let Err(e) = handle.await {
        error!("Server task failed: {}", e);
    }

    Ok(())
}

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::proxy::RelayConfig;

const DATA_DIR: &str = ".chat_relay";
const CONFIG_FILE: &str = "relay_config.json";

/// Get the data directory, creating it if missing
pub fn get_data_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Failed to get user home directory".to_string()))?;
    let data_dir = home.join(DATA_DIR);

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)?;
    }

    Ok(data_dir)
}

/// Load relay config.
///
/// An explicit path must exist. Without one, `<data dir>/relay_config.json`
/// is read when present and defaults are used otherwise.
pub fn load_relay_config(path: Option<&Path>) -> AppResult<RelayConfig> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let default_path = get_data_dir()?.join(CONFIG_FILE);
            if !default_path.exists() {
                return Ok(RelayConfig::default());
            }
            default_path
        }
    };

    read_config_file(&config_path)
}

fn read_config_file(path: &Path) -> AppResult<RelayConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        AppError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"port": 8080, "upstream": {{"api_key": "secret", "default_model": "glm-4.6"}}}}"#
        )
        .unwrap();

        let config = load_relay_config(Some(file.path())).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upstream.api_key, "secret");
        assert_eq!(config.upstream.default_model, "glm-4.6");
        assert_eq!(config.upstream.request_timeout, 25);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            load_relay_config(Some(&missing)),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            load_relay_config(Some(file.path())),
            Err(AppError::Config(_))
        ));
    }
}

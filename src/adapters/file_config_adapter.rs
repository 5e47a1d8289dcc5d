//! INI file configuration adapter.

use crate::domain::error::SibylError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SibylError> {
        let mut config = Ini::new();
        config.load(&path).map_err(|e| SibylError::ConfigParse {
            file: path.as_ref().display().to_string(),
            reason: e,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SibylError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|e| SibylError::ConfigParse {
                file: "<inline>".to_string(),
                reason: e,
            })?;
        Ok(Self { config })
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[backtest]
initial_capital = 250000
days = 90

[policy]
buy_threshold = 2.0
sell_threshold = -2.0
strict_scaler = yes
"#;

    #[test]
    fn reads_typed_values_with_defaults() {
        let config = FileConfigAdapter::from_string(SAMPLE).unwrap();
        assert_eq!(config.get_double("backtest", "initial_capital", 0.0), 250000.0);
        assert_eq!(config.get_int("backtest", "days", 180), 90);
        assert_eq!(config.get_double("policy", "sell_threshold", -1.5), -2.0);
        assert!(config.get_bool("policy", "strict_scaler", false));

        // Missing keys fall back.
        assert_eq!(config.get_int("backtest", "absent", 7), 7);
        assert_eq!(config.get_string("policy", "absent"), None);
    }

    #[test]
    fn from_file_loads_and_reports_parse_errors() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        let config = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(config.get_int("backtest", "days", 180), 90);

        let err = FileConfigAdapter::from_file("/nonexistent/sibyl.ini").unwrap_err();
        assert!(matches!(err, SibylError::ConfigParse { .. }));
    }
}

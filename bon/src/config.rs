//! Настройки CLI: необязательный TOML-файл, флаги командной строки важнее.

use bonlib::error::{BonError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_FILE: &str = "bon-data.json";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub data_file: Option<PathBuf>,
    /// Компания по умолчанию (id или имя), если `--company` не указан.
    pub default_company: Option<String>,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| BonError::Parse(format!("{}: {e}", path.display())))
    }

    pub fn data_file(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.data_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE))
    }

    pub fn company(&self, flag: Option<String>) -> Result<String> {
        flag.or_else(|| self.default_company.clone())
            .ok_or_else(|| BonError::Validation("no --company given and no default_company configured".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file() {
        let s: Settings = toml::from_str("data_file = \"/srv/bon.json\"\ndefault_company = \"Atlas\"").unwrap();
        assert_eq!(s.data_file(None), PathBuf::from("/srv/bon.json"));
        assert_eq!(s.data_file(Some("x.json".into())), PathBuf::from("x.json"));
        assert_eq!(s.company(None).unwrap(), "Atlas");
        assert_eq!(s.company(Some("Beta".into())).unwrap(), "Beta");
    }

    #[test]
    fn defaults_without_file() {
        let s = Settings::load(None).unwrap();
        assert_eq!(s.data_file(None), PathBuf::from(DEFAULT_DATA_FILE));
        assert!(s.company(None).is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<Settings>("colour = \"red\"").is_err());
    }
}

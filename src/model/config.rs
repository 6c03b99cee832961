//! 运行配置：可选的 JSON 配置文件，缺省字段取默认值

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::data_core::AppError;
use crate::model::import::{ImportLimits, DEFAULT_MAX_FILE_BYTES};
use crate::model::library::{DEFAULT_QUOTA_BYTES, USER_WORDS_KEY};
use crate::model::parser::{PairParser, ParsePolicy, DEFAULT_SEPARATORS};
use crate::model::tree::SUPPORTED_EXTENSIONS;
use crate::utils::fs::read_json_file;

pub const DEFAULT_MY_WORDS_LABEL: &str = "My Words";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 含 files.json 与 data/ 的目录
    pub content_root: PathBuf,
    /// 用户词库存放目录
    pub storage_dir: PathBuf,
    pub storage_key: String,
    pub max_file_bytes: u64,
    pub quota_bytes: u64,
    /// 按优先级排列
    pub separators: Vec<String>,
    pub policy: ParsePolicy,
    pub extensions: Vec<String>,
    pub my_words_label: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            content_root: PathBuf::from("."),
            storage_dir: PathBuf::from(".word_shelf"),
            storage_key: USER_WORDS_KEY.to_string(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            quota_bytes: DEFAULT_QUOTA_BYTES,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            policy: ParsePolicy::default(),
            extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            my_words_label: DEFAULT_MY_WORDS_LABEL.to_string(),
        }
    }
}

impl AppConfig {
    /// 没有给出路径时使用默认配置
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(p) => {
                let config: AppConfig = read_json_file(p)?;
                tracing::info!("已读取配置 {}", p.display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn parser(&self) -> PairParser {
        PairParser::new(self.separators.clone(), self.policy)
    }

    pub fn limits(&self) -> ImportLimits {
        ImportLimits {
            max_file_bytes: self.max_file_bytes,
            extensions: self
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.quota_bytes, 5 * 1024 * 1024);
        assert_eq!(config.max_file_bytes, 5 * 1024 * 1024);
        assert_eq!(config.storage_key, "user_words");
        assert_eq!(config.policy, ParsePolicy::Lenient);
        assert_eq!(config.parser().separators()[0], "=>");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"policy": "strict", "separators": ["::"], "extensions": [".TXT"], "my_words_label": "Мои слова"}"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.policy, ParsePolicy::Strict);
        assert_eq!(config.parser().separators(), &["::".to_string()]);
        assert_eq!(config.limits().extensions, vec!["txt".to_string()]);
        assert_eq!(config.my_words_label, "Мои слова");
        assert_eq!(config.quota_bytes, DEFAULT_QUOTA_BYTES);
    }

    #[test]
    fn test_bad_config_is_error() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"policy": "sometimes"}"#).unwrap();
        assert!(matches!(AppConfig::load(Some(&path)), Err(AppError::Parse(_))));
    }
}

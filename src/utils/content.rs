//! 静态内容来源：清单 files.json 与 data/ 下的词表文件

use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use crate::model::data_core::AppError;

/// 清单文件名
pub const MANIFEST_FILE: &str = "files.json";
/// 词表所在子目录
pub const DATA_DIR: &str = "data";

/// 只读内容来源；任何读取失败都报告为 `FetchFailed`
pub trait ContentSource {
    fn fetch_manifest(&self) -> Result<Vec<u8>, AppError>;
    fn fetch(&self, path: &str) -> Result<Vec<u8>, AppError>;
}

/// 本地目录：`<root>/files.json` + `<root>/data/<path>`
#[derive(Debug, Clone)]
pub struct DirContentSource {
    root: PathBuf,
}

impl DirContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    fn read(path: &Path) -> Result<Vec<u8>, AppError> {
        fs::read(path).map_err(|e| AppError::FetchFailed(format!("{}: {}", path.display(), e)))
    }
}

impl ContentSource for DirContentSource {
    fn fetch_manifest(&self) -> Result<Vec<u8>, AppError> {
        Self::read(&self.root.join(MANIFEST_FILE))
    }

    fn fetch(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(AppError::FetchFailed(format!("非法的内容路径: {}", path)));
        }
        Self::read(&self.data_dir().join(rel))
    }
}

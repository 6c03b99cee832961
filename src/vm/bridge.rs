//! VM桥接层：把核心状态整理成展示层可直接使用的数据
//!
//! 错误到用户提示的映射、导入预览的行数据都在这里，不依赖具体 UI 框架。

use crate::model::data_core::AppError;
use crate::model::import::Preview;
use crate::model::tree::TreeNode;

// === 常量定义（消除魔法值） ===
pub const STATUS_READY: &str = "Ready";
pub const STATUS_EMPTY_FOLDER: &str = "No items in this folder";
pub const STATUS_IMPORTED: &str = "Words added to My Words";
pub const STATUS_DELETED: &str = "File deleted";
pub const EMPTY_TERM: &str = "(no word)";
pub const EMPTY_TRANSLATION: &str = "(no translation)";

/// 错误对应的用户提示
pub fn user_message(err: &AppError) -> &'static str {
    match err {
        AppError::UnsupportedFormat(_) => "Unsupported file format (use .txt, .csv or .xlsx)",
        AppError::FileTooLarge { .. } => "File is too large",
        AppError::EmptyFile | AppError::Sheet(_) => "File is empty",
        AppError::FetchFailed(_) | AppError::Io(_) => "Failed to load file",
        AppError::QuotaExceeded { .. } => "Not enough space in My Words",
        AppError::SuspectPairs(_) => "Fix all empty rows to upload",
        AppError::Parse(_) => "File list is damaged",
        AppError::NotFound(_) => "Nothing here",
        AppError::State(_) => "Action is not available right now",
    }
}

/// 列表中一项的展示数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub name: String,
    pub is_folder: bool,
    /// 只有用户文件可删除
    pub deletable: bool,
}

impl From<&TreeNode> for NodeRow {
    fn from(node: &TreeNode) -> Self {
        Self {
            name: node.name().to_string(),
            is_folder: matches!(node, TreeNode::Folder(_)),
            deletable: matches!(node, TreeNode::File(_)) && node.is_user(),
        }
    }
}

/// 预览中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRow {
    pub term: String,
    pub translation: String,
    pub missing_term: bool,
    pub missing_translation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewView {
    pub file_name: String,
    pub total: usize,
    pub valid: usize,
    pub suspect: usize,
    pub confirm_enabled: bool,
    pub rows: Vec<PreviewRow>,
}

impl From<&Preview> for PreviewView {
    fn from(preview: &Preview) -> Self {
        let rows = preview
            .pairs()
            .iter()
            .map(|p| PreviewRow {
                term: p.term.clone(),
                translation: p.translation.clone(),
                missing_term: p.term.is_empty(),
                missing_translation: p.translation.is_empty(),
            })
            .collect();
        Self {
            file_name: preview.file_name.clone(),
            total: preview.total(),
            valid: preview.valid_count(),
            suspect: preview.suspect_count(),
            confirm_enabled: preview.can_confirm(),
            rows,
        }
    }
}

impl PreviewView {
    /// "共 N 条 / 有效 / 可疑" 计数行
    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows, {} ok, {} with empty fields",
            self.file_name, self.total, self.valid, self.suspect
        )
    }
}

impl PreviewRow {
    pub fn display(&self) -> (&str, &str) {
        let term: &str = if self.missing_term { EMPTY_TERM } else { &self.term };
        let translation: &str = if self.missing_translation {
            EMPTY_TRANSLATION
        } else {
            &self.translation
        };
        (term, translation)
    }
}

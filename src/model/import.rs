//! ImportPipeline：单个文件的导入状态机
//!
//! Idle → Validating → PreviewPending → Committing → Idle。
//! 任一步失败都回到稳定状态，不会把部分结果写进词库。

use std::rc::Rc;

use crate::model::data_core::AppError;
use crate::model::library::{LibraryStore, UserEntry};
use crate::model::pair::{Pair, ParseResult};
use crate::model::parser::PairParser;
use crate::model::tree::{extension_of, SUPPORTED_EXTENSIONS};
use crate::utils::formats::parse_file_bytes;
use crate::utils::storage::KeyValueStore;

/// 单个导入文件的大小上限
pub const DEFAULT_MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// 用户选中（或拖入）的文件，内容尚未读取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub size: u64,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_file_bytes: u64,
    /// 小写、不带点
    pub extensions: Vec<String>,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            extensions: SUPPORTED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ImportLimits {
    /// 格式与大小检查，在任何解析之前进行
    pub fn check(&self, file: &IncomingFile) -> Result<(), AppError> {
        let ext = extension_of(&file.name).unwrap_or_default();
        if !self.extensions.iter().any(|e| *e == ext) {
            return Err(AppError::UnsupportedFormat(ext));
        }
        self.check_size(file.size)
    }

    fn check_size(&self, size: u64) -> Result<(), AppError> {
        if size > self.max_file_bytes {
            return Err(AppError::FileTooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

/// 预览：完整词对列表 + 有效/可疑计数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub file_name: String,
    pub result: ParseResult,
}

impl Preview {
    pub fn pairs(&self) -> &[Pair] {
        self.result.pairs()
    }

    pub fn total(&self) -> usize {
        self.result.pairs().len()
    }

    pub fn valid_count(&self) -> usize {
        self.result.valid_count()
    }

    pub fn suspect_count(&self) -> usize {
        self.result.suspect_count()
    }

    /// 没有可疑词对时才允许确认
    pub fn can_confirm(&self) -> bool {
        self.suspect_count() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    Validating(IncomingFile),
    PreviewPending(Preview),
    Committing,
}

#[derive(Debug)]
pub struct ImportPipeline {
    /// 所属的选择批次，用于丢弃过期结果
    selection: u64,
    state: ImportState,
}

impl ImportPipeline {
    pub fn new(selection: u64) -> Self {
        Self {
            selection,
            state: ImportState::Idle,
        }
    }

    pub fn selection(&self) -> u64 {
        self.selection
    }

    pub fn state(&self) -> &ImportState {
        &self.state
    }

    pub fn file_name(&self) -> Option<&str> {
        match &self.state {
            ImportState::Validating(file) => Some(&file.name),
            ImportState::PreviewPending(preview) => Some(&preview.file_name),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<&Preview> {
        match &self.state {
            ImportState::PreviewPending(preview) => Some(preview),
            _ => None,
        }
    }

    /// Idle → Validating；格式或大小不合格时保持 Idle
    pub fn select(&mut self, file: IncomingFile, limits: &ImportLimits) -> Result<(), AppError> {
        if self.state != ImportState::Idle {
            return Err(AppError::State("导入正在进行中".into()));
        }
        if let Err(e) = limits.check(&file) {
            tracing::info!("拒绝导入 {}: {}", file.name, e);
            return Err(e);
        }
        tracing::debug!("开始校验 {} ({} 字节)", file.name, file.size);
        self.state = ImportState::Validating(file);
        Ok(())
    }

    /// Validating → PreviewPending；解析不出词对时回到 Idle 并报告 EmptyFile
    pub fn load(
        &mut self,
        bytes: &[u8],
        parser: &PairParser,
        limits: &ImportLimits,
    ) -> Result<&Preview, AppError> {
        let ImportState::Validating(file) = std::mem::replace(&mut self.state, ImportState::Idle)
        else {
            return Err(AppError::State("没有等待解析的文件".into()));
        };

        limits.check_size(bytes.len() as u64)?;
        let result = parse_file_bytes(parser, &file.name, bytes).inspect_err(|e| {
            tracing::info!("解析 {} 失败: {}", file.name, e);
        })?;

        let preview = Preview {
            file_name: file.name,
            result,
        };
        tracing::info!(
            "预览 {}: 共 {} 条，有效 {}，可疑 {}",
            preview.file_name,
            preview.total(),
            preview.valid_count(),
            preview.suspect_count()
        );
        self.state = ImportState::PreviewPending(preview);
        self.preview()
            .ok_or_else(|| AppError::State("预览状态丢失".into()))
    }

    /// PreviewPending → Committing → Idle
    ///
    /// 仍有可疑词对时拒绝确认并保持 PreviewPending；
    /// 配额不足时放弃提交，回到 PreviewPending，词库不变。
    pub fn confirm<S: KeyValueStore>(
        &mut self,
        library: &mut LibraryStore<S>,
    ) -> Result<Rc<UserEntry>, AppError> {
        match &self.state {
            ImportState::PreviewPending(preview) if !preview.can_confirm() => {
                return Err(AppError::SuspectPairs(preview.suspect_count()));
            }
            ImportState::PreviewPending(_) => {}
            _ => return Err(AppError::State("没有等待确认的预览".into())),
        }
        let ImportState::PreviewPending(preview) =
            std::mem::replace(&mut self.state, ImportState::Committing)
        else {
            return Err(AppError::State("没有等待确认的预览".into()));
        };

        let meta = preview.result.meta();
        match library.add(&preview.file_name, preview.pairs().to_vec(), meta) {
            Ok(entry) => {
                self.state = ImportState::Idle;
                Ok(entry)
            }
            Err(e) => {
                self.state = ImportState::PreviewPending(preview);
                Err(e)
            }
        }
    }

    /// 任意状态直接回到 Idle
    pub fn cancel(&mut self) {
        if self.state != ImportState::Idle {
            tracing::debug!("取消导入");
        }
        self.state = ImportState::Idle;
    }
}

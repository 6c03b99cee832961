//! 词表书架库
//!
//! 浏览静态词表目录（files.json），导入用户自己的 txt / csv / xlsx 词表，
//! 并把它们合并成同一棵可导航的目录树（"My Words" 文件夹）。

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::config::AppConfig;
pub use model::data_core::{AppError, AppState, ImportOutcome, WordSet};
pub use model::import::{ImportPipeline, ImportState, IncomingFile, Preview};
pub use model::library::{LibraryStore, UserEntry};
pub use model::navigator::TreeNavigator;
pub use model::pair::{Pair, ParseMeta, ParseResult, SourceKind};
pub use model::parser::{Cell, PairParser, ParseError, ParsePolicy};
pub use model::tree::{FileNode, FileOrigin, Folder, Level, TreeNode};

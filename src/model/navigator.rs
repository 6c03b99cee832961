//! TreeNavigator：在静态树与用户文件夹之间导航，维护返回栈

use std::rc::Rc;

use crate::model::data_core::AppError;
use crate::model::library::UserEntry;
use crate::model::pair::Pair;
use crate::model::parser::PairParser;
use crate::model::tree::{build_user_folder, FileNode, FileOrigin, Folder, Level, NodeOrigin, TreeNode};
use crate::utils::content::ContentSource;
use crate::utils::formats::parse_file_bytes;

/// 当前显示的位置。根层级与用户文件夹不缓存节点，每次访问重新生成
#[derive(Debug, Clone, PartialEq)]
enum Position {
    Root,
    UserFolder,
    Static(Level),
}

#[derive(Debug)]
pub struct TreeNavigator {
    root: Level,
    user_label: String,
    stack: Vec<Position>,
    current: Position,
}

impl TreeNavigator {
    pub fn new(root: Level, user_label: &str) -> Self {
        Self {
            root,
            user_label: user_label.to_string(),
            stack: Vec::new(),
            current: Position::Root,
        }
    }

    /// 返回栈深度（0 表示已在根层级且无法再返回）
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_at_root(&self) -> bool {
        self.current == Position::Root
    }

    pub fn is_in_user_folder(&self) -> bool {
        self.current == Position::UserFolder
    }

    /// 当前层级；`entries` 为 LibraryStore 的有序快照
    pub fn current_level(&self, entries: &[Rc<UserEntry>]) -> Level {
        self.level_of(&self.current, entries)
    }

    fn level_of(&self, position: &Position, entries: &[Rc<UserEntry>]) -> Level {
        match position {
            Position::Root => self.root_level(entries),
            Position::UserFolder => build_user_folder(&self.user_label, entries).children,
            Position::Static(level) => level.clone(),
        }
    }

    /// 根层级：用户词库非空时在最前面加上 "My Words"
    fn root_level(&self, entries: &[Rc<UserEntry>]) -> Level {
        if entries.is_empty() {
            return self.root.clone();
        }
        let user_folder = TreeNode::Folder(build_user_folder(&self.user_label, entries));
        std::iter::once(user_folder)
            .chain(self.root.iter().cloned())
            .collect()
    }

    /// 进入文件夹；空文件夹返回空层级，不是错误
    pub fn descend(&mut self, folder: &Folder, entries: &[Rc<UserEntry>]) -> Level {
        let next = match folder.origin {
            NodeOrigin::User => Position::UserFolder,
            NodeOrigin::Static => Position::Static(folder.children.clone()),
        };
        let previous = std::mem::replace(&mut self.current, next);
        self.stack.push(previous);
        tracing::debug!("进入文件夹 {} (深度 {})", folder.name, self.stack.len());
        self.current_level(entries)
    }

    /// 返回上一层；栈空时停在根层级
    pub fn go_back(&mut self, entries: &[Rc<UserEntry>]) -> Level {
        self.current = self.stack.pop().unwrap_or(Position::Root);
        self.current_level(entries)
    }

    pub fn go_home(&mut self, entries: &[Rc<UserEntry>]) -> Level {
        self.stack.clear();
        self.current = Position::Root;
        self.current_level(entries)
    }

    /// 导入成功后直接显示用户文件夹，返回目标为根层级
    pub fn show_user_folder(&mut self, entries: &[Rc<UserEntry>]) -> Level {
        self.stack = vec![Position::Root];
        self.current = Position::UserFolder;
        self.current_level(entries)
    }

    /// 取得文件的词对：静态文件经内容来源读取后解析，用户文件直接使用已解析的词对
    pub fn resolve_file(
        &self,
        node: &FileNode,
        source: &dyn ContentSource,
        parser: &PairParser,
    ) -> Result<Vec<Pair>, AppError> {
        match &node.origin {
            FileOrigin::Static { path } => {
                let bytes = source.fetch(path)?;
                let (pairs, meta) = parse_file_bytes(parser, path, &bytes)?.into_parts();
                tracing::info!("已加载 {}: {} 个词对", path, meta.count);
                Ok(pairs)
            }
            FileOrigin::User(entry) => {
                if entry.pairs.is_empty() {
                    return Err(AppError::EmptyFile);
                }
                Ok(entry.pairs.clone())
            }
        }
    }
}

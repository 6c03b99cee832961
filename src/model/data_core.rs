//! AppState：会话上下文（静态树、用户词库、导航、当前导入批次）与错误类型

use std::rc::Rc;

use thiserror::Error;

use crate::model::config::AppConfig;
use crate::model::import::{ImportLimits, ImportPipeline, IncomingFile, Preview};
use crate::model::library::{LibraryStore, UserEntry};
use crate::model::navigator::TreeNavigator;
use crate::model::pair::Pair;
use crate::model::parser::{PairParser, ParseError};
use crate::model::tree::{parse_manifest, Level, TreeNode};
use crate::utils::content::{ContentSource, DirContentSource};
use crate::utils::storage::{FileStore, KeyValueStore};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("不支持的文件格式: {0:?}")]
    UnsupportedFormat(String),
    #[error("文件过大: {size} 字节（上限 {limit} 字节）")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("文件中没有可用的词对")]
    EmptyFile,
    #[error("内容加载失败: {0}")]
    FetchFailed(String),
    #[error("用户词库空间不足: {size} 字节（上限 {limit} 字节）")]
    QuotaExceeded { size: u64, limit: u64 },
    #[error("表格读取失败: {0}")]
    Sheet(String),
    #[error("仍有 {0} 个可疑词对，无法确认导入")]
    SuspectPairs(usize),
    #[error("未找到: {0}")]
    NotFound(String),
    #[error("状态错误: {0}")]
    State(String),
}

impl From<ParseError> for AppError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::EmptyResult => AppError::EmptyFile,
        }
    }
}

/// 交给游戏/练习层的唯一输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSet {
    pub file_name: String,
    pub pairs: Vec<Pair>,
}

/// 一个文件在批量导入中的结果；`Ok(None)` 表示用户在预览时放弃
#[derive(Debug)]
pub struct ImportOutcome {
    pub file_name: String,
    pub result: Result<Option<Rc<UserEntry>>, AppError>,
}

#[derive(Debug)]
pub struct AppState<S: KeyValueStore = FileStore, C: ContentSource = DirContentSource> {
    config: AppConfig,
    parser: PairParser,
    limits: ImportLimits,
    library: LibraryStore<S>,
    navigator: TreeNavigator,
    source: C,
    /// 当前文件选择批次；旧批次的结果到达时直接丢弃
    selection: u64,
}

impl AppState<FileStore, DirContentSource> {
    /// 按配置打开本地内容目录与词库目录
    pub fn from_config(config: AppConfig) -> Result<Self, AppError> {
        let source = DirContentSource::new(&config.content_root);
        let store = FileStore::open(&config.storage_dir)?;
        Self::new(config, store, source)
    }
}

impl<S: KeyValueStore, C: ContentSource> AppState<S, C> {
    /// 启动：读取一次清单与用户词库
    pub fn new(config: AppConfig, store: S, source: C) -> Result<Self, AppError> {
        let root = parse_manifest(&source.fetch_manifest()?)?;
        let library = LibraryStore::open(store, &config.storage_key, config.quota_bytes)?;
        let navigator = TreeNavigator::new(root, &config.my_words_label);
        tracing::info!(
            "会话已建立: 静态根节点 {} 个, 用户词表 {} 个",
            navigator.current_level(&[]).len(),
            library.len()
        );
        Ok(Self {
            parser: config.parser(),
            limits: config.limits(),
            config,
            library,
            navigator,
            source,
            selection: 0,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn library(&self) -> &LibraryStore<S> {
        &self.library
    }

    pub fn navigator(&self) -> &TreeNavigator {
        &self.navigator
    }

    fn entries(&self) -> Vec<Rc<UserEntry>> {
        self.library.list()
    }

    /// 当前显示的层级
    pub fn level(&self) -> Level {
        self.navigator.current_level(&self.entries())
    }

    /// 当前层级中按名称查找节点位置
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.level().iter().position(|n| n.name() == name)
    }

    fn node_at(&self, index: usize) -> Result<TreeNode, AppError> {
        self.level()
            .get(index)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("第 {} 项", index)))
    }

    /// 进入当前层级第 `index` 项（必须是文件夹）
    pub fn enter(&mut self, index: usize) -> Result<Level, AppError> {
        match self.node_at(index)? {
            TreeNode::Folder(folder) => {
                let entries = self.entries();
                Ok(self.navigator.descend(&folder, &entries))
            }
            TreeNode::File(file) => Err(AppError::State(format!("{} 不是文件夹", file.name))),
        }
    }

    pub fn back(&mut self) -> Level {
        let entries = self.entries();
        self.navigator.go_back(&entries)
    }

    pub fn home(&mut self) -> Level {
        let entries = self.entries();
        self.navigator.go_home(&entries)
    }

    /// 打开当前层级第 `index` 项（必须是文件），得到交给练习层的词对
    pub fn open_file(&self, index: usize) -> Result<WordSet, AppError> {
        match self.node_at(index)? {
            TreeNode::File(file) => {
                let pairs = self
                    .navigator
                    .resolve_file(&file, &self.source, &self.parser)?;
                Ok(WordSet {
                    file_name: file.name,
                    pairs,
                })
            }
            TreeNode::Folder(folder) => Err(AppError::State(format!("{} 是文件夹", folder.name))),
        }
    }

    /// 删除用户词表；词库删空后回到根层级
    pub fn delete_entry(&mut self, name: &str) -> Result<Level, AppError> {
        if !self.library.remove(name)? {
            return Err(AppError::NotFound(name.to_string()));
        }
        if self.library.is_empty() {
            return Ok(self.home());
        }
        Ok(self.level())
    }

    /// 开始新的文件选择批次，之前批次尚未完成的导入随之作废
    pub fn new_selection(&mut self) -> u64 {
        self.selection += 1;
        self.selection
    }

    pub fn current_selection(&self) -> u64 {
        self.selection
    }

    /// 为当前批次中的一个文件创建导入流程（格式与大小在此校验）
    pub fn start_import(&self, file: IncomingFile) -> Result<ImportPipeline, AppError> {
        let mut pipeline = ImportPipeline::new(self.selection);
        pipeline.select(file, &self.limits)?;
        Ok(pipeline)
    }

    /// 文件内容读取完成；过期批次的结果被丢弃并返回 `None`
    pub fn load_import<'p>(
        &self,
        pipeline: &'p mut ImportPipeline,
        bytes: &[u8],
    ) -> Result<Option<&'p Preview>, AppError> {
        if pipeline.selection() != self.selection {
            tracing::info!(
                "丢弃过期的导入结果 {:?} (批次 {} / 当前 {})",
                pipeline.file_name(),
                pipeline.selection(),
                self.selection
            );
            pipeline.cancel();
            return Ok(None);
        }
        pipeline.load(bytes, &self.parser, &self.limits).map(Some)
    }

    /// 确认导入：写入词库后导航到用户文件夹（返回目标为根层级）
    pub fn commit(&mut self, pipeline: &mut ImportPipeline) -> Result<Rc<UserEntry>, AppError> {
        if pipeline.selection() != self.selection {
            pipeline.cancel();
            return Err(AppError::State("导入批次已过期".into()));
        }
        let entry = pipeline.confirm(&mut self.library)?;
        let entries = self.entries();
        self.navigator.show_user_folder(&entries);
        Ok(entry)
    }

    /// 批量导入：每个文件独立走一遍流程，一个失败不影响其他文件
    pub fn import_batch<F>(&mut self, files: Vec<(IncomingFile, Vec<u8>)>, mut decide: F) -> Vec<ImportOutcome>
    where
        F: FnMut(&Preview) -> bool,
    {
        self.new_selection();
        files
            .into_iter()
            .map(|(file, bytes)| {
                let file_name = file.name.clone();
                let result = self.import_one(file, &bytes, &mut decide);
                if let Err(e) = &result {
                    tracing::warn!("导入 {} 失败: {}", file_name, e);
                }
                ImportOutcome { file_name, result }
            })
            .collect()
    }

    fn import_one<F>(
        &mut self,
        file: IncomingFile,
        bytes: &[u8],
        decide: &mut F,
    ) -> Result<Option<Rc<UserEntry>>, AppError>
    where
        F: FnMut(&Preview) -> bool,
    {
        let mut pipeline = self.start_import(file)?;
        let Some(preview) = self.load_import(&mut pipeline, bytes)? else {
            return Ok(None);
        };
        if !decide(preview) {
            pipeline.cancel();
            return Ok(None);
        }
        self.commit(&mut pipeline).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::import::ImportState;
    use crate::model::library::USER_WORDS_KEY;
    use crate::utils::storage::MemoryStore;
    use std::collections::HashMap;

    const MANIFEST: &str = r#"[
        {"name": "Basics", "type": "folder", "children": [
            {"name": "animals.txt", "type": "file", "path": "animals.txt"}
        ]},
        {"name": "Empty", "type": "folder", "children": []}
    ]"#;

    #[derive(Debug, Default)]
    struct FakeSource {
        manifest: Option<String>,
        files: HashMap<String, Vec<u8>>,
    }

    impl ContentSource for FakeSource {
        fn fetch_manifest(&self) -> Result<Vec<u8>, AppError> {
            self.manifest
                .clone()
                .map(String::into_bytes)
                .ok_or_else(|| AppError::FetchFailed("files.json".into()))
        }

        fn fetch(&self, path: &str) -> Result<Vec<u8>, AppError> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| AppError::FetchFailed(path.into()))
        }
    }

    fn source() -> FakeSource {
        FakeSource {
            manifest: Some(MANIFEST.to_string()),
            files: HashMap::from([(
                "animals.txt".to_string(),
                b"dog - perro\ncat - gato".to_vec(),
            )]),
        }
    }

    fn session() -> AppState<MemoryStore, FakeSource> {
        AppState::new(AppConfig::default(), MemoryStore::default(), source()).unwrap()
    }

    fn names(level: &Level) -> Vec<String> {
        level.iter().map(|n| n.name().to_string()).collect()
    }

    fn text_file(name: &str, content: &str) -> (IncomingFile, Vec<u8>) {
        (
            IncomingFile::new(name, content.len() as u64),
            content.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_end_to_end_static_file() {
        let mut app = session();
        assert_eq!(names(&app.level()), ["Basics", "Empty"]);

        let basics = app.enter(0).unwrap();
        assert_eq!(names(&basics), ["animals.txt"]);

        let words = app.open_file(0).unwrap();
        assert_eq!(words.file_name, "animals.txt");
        assert_eq!(
            words.pairs,
            vec![Pair::new("dog", "perro"), Pair::new("cat", "gato")]
        );
    }

    #[test]
    fn test_manifest_unreachable() {
        let err = AppState::new(AppConfig::default(), MemoryStore::default(), FakeSource::default())
            .unwrap_err();
        assert!(matches!(err, AppError::FetchFailed(_)));
    }

    #[test]
    fn test_enter_errors_leave_navigation_unchanged() {
        let mut app = session();
        app.enter(0).unwrap();

        assert!(matches!(app.enter(0), Err(AppError::State(_))), "文件不能进入");
        assert!(matches!(app.enter(9), Err(AppError::NotFound(_))));
        assert!(matches!(app.open_file(5), Err(AppError::NotFound(_))));
        assert_eq!(app.navigator().depth(), 1);
        assert_eq!(names(&app.level()), ["animals.txt"]);
    }

    #[test]
    fn test_empty_folder_is_not_an_error() {
        let mut app = session();
        let level = app.enter(1).unwrap();
        assert!(level.is_empty());
        assert_eq!(app.navigator().depth(), 1);
    }

    #[test]
    fn test_fetch_failure_keeps_view() {
        let mut app = session();
        app.source.files.clear();
        app.enter(0).unwrap();
        assert!(matches!(app.open_file(0), Err(AppError::FetchFailed(_))));
        assert_eq!(names(&app.level()), ["animals.txt"]);
    }

    #[test]
    fn test_import_shows_user_folder() {
        let mut app = session();
        app.enter(0).unwrap();

        let outcomes = app.import_batch(vec![text_file("mine.txt", "sun=>sol\nmoon=>luna")], |_| true);
        let entry = outcomes[0].result.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(entry.name, "mine.txt");

        assert!(app.navigator().is_in_user_folder());
        assert_eq!(names(&app.level()), ["mine.txt"]);
        assert_eq!(names(&app.back()), ["My Words", "Basics", "Empty"]);

        let words = app.open_file(0);
        assert!(matches!(words, Err(AppError::State(_))), "My Words 是文件夹");
        app.enter(0).unwrap();
        let words = app.open_file(0).unwrap();
        assert_eq!(words.pairs, vec![Pair::new("sun", "sol"), Pair::new("moon", "luna")]);
    }

    #[test]
    fn test_batch_failures_are_independent() {
        let mut sizing = session();
        sizing.import_batch(vec![text_file("a.txt", "sun=>sol")], |_| true);
        let one_entry = sizing.library().serialized_size().unwrap();

        // 配额只够一个条目：第二个失败，第一个和第三个不受影响
        let config = AppConfig {
            quota_bytes: one_entry + 40,
            ..AppConfig::default()
        };
        let mut app = AppState::new(config, MemoryStore::default(), source()).unwrap();
        let outcomes = app.import_batch(
            vec![
                text_file("a.txt", "sun=>sol"),
                text_file("big.txt", &"word=>palabra\n".repeat(50)),
                text_file("bad.pdf", "x"),
                text_file("blank.txt", "\n\n"),
                text_file("mixed.txt", "cat=>\ndog=>perro"),
            ],
            |_| true,
        );

        assert!(outcomes[0].result.as_ref().unwrap().is_some());
        assert!(matches!(outcomes[1].result, Err(AppError::QuotaExceeded { .. })));
        assert!(matches!(outcomes[2].result, Err(AppError::UnsupportedFormat(_))));
        assert!(matches!(outcomes[3].result, Err(AppError::EmptyFile)));
        assert!(matches!(outcomes[4].result, Err(AppError::SuspectPairs(1))));

        let names: Vec<String> = app.library().list().iter().map(|e| e.name.clone()).collect();
        assert_eq!(names, ["a.txt"]);
    }

    #[test]
    fn test_oversized_file_rejected_before_content() {
        let mut app = session();
        let limit = app.config().max_file_bytes;
        let outcomes = app.import_batch(
            vec![
                (IncomingFile::new("huge.txt", limit + 1), Vec::new()),
                text_file("b.txt", "moon=>luna"),
            ],
            |_| true,
        );

        assert!(matches!(outcomes[0].result, Err(AppError::FileTooLarge { .. })));
        assert_eq!(outcomes[1].file_name, "b.txt");
        assert!(outcomes[1].result.as_ref().unwrap().is_some(), "后面的文件应照常导入");
    }

    #[test]
    fn test_declined_preview_commits_nothing() {
        let mut app = session();
        let outcomes = app.import_batch(vec![text_file("a.txt", "sun=>sol")], |preview| {
            assert_eq!(preview.total(), 1);
            false
        });
        assert!(matches!(outcomes[0].result, Ok(None)));
        assert!(app.library().is_empty());
        assert!(app.navigator().is_at_root());
    }

    #[test]
    fn test_stale_selection_is_discarded() {
        let mut app = session();
        app.new_selection();
        let mut old = app.start_import(IncomingFile::new("old.txt", 8)).unwrap();

        // 用户又选了一个文件
        app.new_selection();
        let mut fresh = app.start_import(IncomingFile::new("new.txt", 8)).unwrap();

        assert!(app.load_import(&mut old, b"sun=>sol").unwrap().is_none());
        assert_eq!(old.state(), &ImportState::Idle);

        assert!(app.load_import(&mut fresh, b"sun=>sol").unwrap().is_some());
        app.commit(&mut fresh).unwrap();
        assert!(app.library().get("new.txt").is_some());
        assert!(app.library().get("old.txt").is_none());
    }

    #[test]
    fn test_commit_after_new_selection_is_refused() {
        let mut app = session();
        app.new_selection();
        let mut pipeline = app.start_import(IncomingFile::new("a.txt", 8)).unwrap();
        app.load_import(&mut pipeline, b"sun=>sol").unwrap();

        app.new_selection();
        assert!(matches!(app.commit(&mut pipeline), Err(AppError::State(_))));
        assert!(app.library().is_empty());
    }

    #[test]
    fn test_delete_last_entry_goes_home() {
        let mut app = session();
        app.import_batch(
            vec![text_file("a.txt", "sun=>sol"), text_file("b.txt", "moon=>luna")],
            |_| true,
        );
        assert_eq!(names(&app.level()), ["a.txt", "b.txt"]);

        assert_eq!(names(&app.delete_entry("a.txt").unwrap()), ["b.txt"]);
        assert!(app.navigator().is_in_user_folder());

        assert_eq!(names(&app.delete_entry("b.txt").unwrap()), ["Basics", "Empty"]);
        assert!(app.navigator().is_at_root());
        assert_eq!(app.navigator().depth(), 0);

        assert!(matches!(app.delete_entry("b.txt"), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_library_survives_restart() {
        let mut app = session();
        app.import_batch(vec![text_file("a.txt", "sun=>sol")], |_| true);

        let mut store = MemoryStore::default();
        let saved = serde_json::to_string(&app.library().list()).unwrap();
        store.set(USER_WORDS_KEY, &saved).unwrap();
        let restarted = AppState::new(AppConfig::default(), store, source()).unwrap();
        assert_eq!(names(&restarted.level()), ["My Words", "Basics", "Empty"]);
    }
}

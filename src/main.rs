//! 程序入口：初始化日志、读取配置，按子命令操作词表目录与用户词库

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::SubscriberBuilder;

use word_shelf::model::tree::scan_folder;
use word_shelf::utils::content::{DATA_DIR, MANIFEST_FILE};
use word_shelf::utils::fs::write_json_file;
use word_shelf::vm::bridge::{
    user_message, NodeRow, PreviewView, STATUS_DELETED, STATUS_EMPTY_FOLDER, STATUS_IMPORTED,
    STATUS_READY,
};
use word_shelf::{AppConfig, AppError, AppState, IncomingFile, Level, WordSet};

#[derive(Parser, Debug)]
#[command(name = "word_shelf", version, about = "Browse vocabulary lists and import your own words")]
struct Cli {
    /// JSON 配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    /// 含 files.json 与 data/ 的目录
    #[arg(long)]
    content: Option<PathBuf>,
    /// 用户词库目录
    #[arg(long)]
    store: Option<PathBuf>,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出某个文件夹（按名称逐级给出路径）
    Ls { path: Vec<String> },
    /// 显示文件中的词对
    Show {
        #[arg(required = true)]
        path: Vec<String>,
    },
    /// 导入 txt / csv / xlsx 文件到 My Words
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// 不询问，直接确认没有可疑行的预览
        #[arg(long)]
        yes: bool,
    },
    /// 删除 My Words 中的文件
    Rm { name: String },
    /// 扫描 data 目录生成 files.json
    Manifest {
        data_dir: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// 交互式浏览
    Shell,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志输出
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = SubscriberBuilder::default()
        .with_max_level(level)
        .with_writer(io::stderr)
        .try_init();

    if let Command::Manifest { data_dir, out } = &cli.command {
        return generate_manifest(data_dir, out.as_deref());
    }

    let mut config = AppConfig::load(cli.config.as_deref()).context("读取配置失败")?;
    if let Some(content) = cli.content {
        config.content_root = content;
    }
    if let Some(store) = cli.store {
        config.storage_dir = store;
    }

    let mut app = AppState::from_config(config).map_err(report)?;
    match cli.command {
        Command::Ls { path } => {
            let level = walk(&mut app, &path)?;
            print_level(&level);
        }
        Command::Show { path } => {
            let (file, folders) = path.split_last().context("缺少文件名")?;
            walk(&mut app, folders)?;
            let words = open_named(&app, file)?;
            print_words(&words);
        }
        Command::Import { files, yes } => import_files(&mut app, &files, yes)?,
        Command::Rm { name } => {
            app.delete_entry(&name).map_err(report)?;
            println!("{}: {}", STATUS_DELETED, name);
        }
        Command::Shell => shell(&mut app)?,
        Command::Manifest { .. } => {}
    }
    Ok(())
}

/// 打印用户提示，并保留详细错误供日志使用
fn report(err: AppError) -> anyhow::Error {
    eprintln!("{}", user_message(&err));
    anyhow::Error::new(err)
}

fn generate_manifest(data_dir: &Path, out: Option<&Path>) -> anyhow::Result<()> {
    let manifest = scan_folder(data_dir)
        .with_context(|| format!("扫描 {} 失败", data_dir.display()))?;
    let out = match out {
        Some(p) => p.to_path_buf(),
        None => data_dir
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(MANIFEST_FILE),
    };
    if data_dir.file_name().map_or(true, |n| n != DATA_DIR) {
        tracing::warn!("词表目录通常命名为 {}/", DATA_DIR);
    }
    write_json_file(&out, &manifest)?;
    println!("{} generated successfully", out.display());
    Ok(())
}

/// 从根层级按名称逐级进入
fn walk(app: &mut AppState, path: &[String]) -> anyhow::Result<Level> {
    let mut level = app.home();
    for name in path {
        let idx = app
            .position_of(name)
            .ok_or_else(|| AppError::NotFound(name.clone()))
            .map_err(report)?;
        level = app.enter(idx).map_err(report)?;
    }
    Ok(level)
}

fn open_named(app: &AppState, name: &str) -> anyhow::Result<WordSet> {
    let idx = app
        .position_of(name)
        .ok_or_else(|| AppError::NotFound(name.to_string()))
        .map_err(report)?;
    app.open_file(idx).map_err(report)
}

fn print_level(level: &Level) {
    if level.is_empty() {
        println!("{}", STATUS_EMPTY_FOLDER);
        return;
    }
    for (i, node) in level.iter().enumerate() {
        let row = NodeRow::from(node);
        let marker = match (row.is_folder, row.deletable) {
            (true, _) => "/",
            (false, true) => " *",
            (false, false) => "",
        };
        println!("{:>3}  {}{}", i, row.name, marker);
    }
}

fn print_words(words: &WordSet) {
    println!("# {} ({} words)", words.file_name, words.pairs.len());
    for pair in &words.pairs {
        println!("{}\t{}", pair.term, pair.translation);
    }
}

fn print_preview(view: &PreviewView) {
    println!("{}", view.summary());
    for row in &view.rows {
        let (term, translation) = row.display();
        let flag = if row.missing_term || row.missing_translation { "!" } else { " " };
        println!("{} {}\t{}", flag, term, translation);
    }
}

fn ask(question: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

/// 读取待导入文件；超过大小上限的文件不读内容，交给导入流程拒绝
fn read_incoming(path: &Path, max_bytes: u64) -> io::Result<(IncomingFile, Vec<u8>)> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let size = std::fs::metadata(path)?.len();
    let bytes = if size > max_bytes {
        Vec::new()
    } else {
        std::fs::read(path)?
    };
    Ok((IncomingFile::new(&name, size), bytes))
}

/// 每个文件独立导入；某个文件失败只报告，不影响其他文件
fn import_files(app: &mut AppState, files: &[PathBuf], yes: bool) -> anyhow::Result<()> {
    let max_bytes = app.config().max_file_bytes;
    let mut failed = 0usize;
    let mut batch = Vec::with_capacity(files.len());
    for path in files {
        match read_incoming(path, max_bytes) {
            Ok(item) => batch.push(item),
            Err(e) => {
                tracing::debug!("无法读取 {}: {}", path.display(), e);
                eprintln!("{}: {}", path.display(), user_message(&AppError::Io(e)));
                failed += 1;
            }
        }
    }

    let outcomes = app.import_batch(batch, |preview| {
        let view = PreviewView::from(preview);
        print_preview(&view);
        // 有可疑行时照常提交，由确认步骤拒绝并给出提示
        if !view.confirm_enabled || yes {
            return true;
        }
        ask("Upload these words?").unwrap_or_else(|e| {
            tracing::warn!("读取确认输入失败: {}", e);
            false
        })
    });

    for outcome in outcomes {
        match outcome.result {
            Ok(Some(entry)) => println!("{}: {}", STATUS_IMPORTED, entry.name),
            Ok(None) => {}
            Err(e) => {
                eprintln!("{}: {}", outcome.file_name, user_message(&e));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{} 个文件导入失败", failed);
    }
    Ok(())
}

fn shell(app: &mut AppState) -> anyhow::Result<()> {
    println!("{}  (ls, cd N, open N, back, home, rm NAME, quit)", STATUS_READY);
    print_level(&app.level());

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let (cmd, arg) = line
            .trim()
            .split_once(' ')
            .map(|(c, a)| (c, a.trim()))
            .unwrap_or((line.trim(), ""));

        let result: Result<(), AppError> = match cmd {
            "" => Ok(()),
            "ls" => {
                print_level(&app.level());
                Ok(())
            }
            "cd" => parse_index(arg).and_then(|i| app.enter(i)).map(|l| print_level(&l)),
            "open" => parse_index(arg)
                .and_then(|i| app.open_file(i))
                .map(|w| print_words(&w)),
            "back" => {
                print_level(&app.back());
                Ok(())
            }
            "home" => {
                print_level(&app.home());
                Ok(())
            }
            "rm" => app.delete_entry(arg).map(|l| print_level(&l)),
            "quit" | "exit" => break,
            other => Err(AppError::State(format!("未知命令: {}", other))),
        };

        if let Err(e) = result {
            tracing::debug!("{}", e);
            println!("{}", user_message(&e));
        }
    }
    Ok(())
}

fn parse_index(arg: &str) -> Result<usize, AppError> {
    arg.parse()
        .map_err(|_| AppError::NotFound(format!("不是有效的序号: {:?}", arg)))
}

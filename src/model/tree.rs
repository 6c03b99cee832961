//! 目录树：静态清单（files.json）+ 用户词库合成的 "My Words" 文件夹
//!
//! 静态子树在运行期只读；用户文件夹每次访问都从 LibraryStore 重新生成，不做增量修补。

use std::{fs, path::Path, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::model::data_core::AppError;
use crate::model::library::UserEntry;

/// 支持的词表扩展名
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "csv", "xlsx"];

/// 一层目录的节点列表，克隆代价低
pub type Level = Rc<[TreeNode]>;

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Folder(Folder),
    File(FileNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
    Static,
    User,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Folder {
    pub name: String,
    pub children: Level,
    pub origin: NodeOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub name: String,
    pub origin: FileOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOrigin {
    /// 相对 data 目录的路径
    Static { path: String },
    User(Rc<UserEntry>),
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Folder(f) => &f.name,
            TreeNode::File(f) => &f.name,
        }
    }

    pub fn is_user(&self) -> bool {
        match self {
            TreeNode::Folder(f) => f.origin == NodeOrigin::User,
            TreeNode::File(f) => matches!(f.origin, FileOrigin::User(_)),
        }
    }
}

/// 清单节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestKind {
    Folder,
    File,
}

/// files.json 中的一个节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ManifestKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ManifestNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// 解析清单字节并构建静态根层级
pub fn parse_manifest(bytes: &[u8]) -> Result<Level, AppError> {
    let nodes: Vec<ManifestNode> = serde_json::from_slice(bytes)?;
    Ok(build_static_tree(&nodes))
}

/// 从清单构建静态树
pub fn build_static_tree(nodes: &[ManifestNode]) -> Level {
    nodes.iter().map(static_node).collect()
}

fn static_node(node: &ManifestNode) -> TreeNode {
    match node.kind {
        ManifestKind::Folder => TreeNode::Folder(Folder {
            name: node.name.clone(),
            children: node
                .children
                .as_deref()
                .map(build_static_tree)
                .unwrap_or_else(|| Rc::from(Vec::new())),
            origin: NodeOrigin::Static,
        }),
        ManifestKind::File => {
            let path = node.path.clone().unwrap_or_else(|| {
                tracing::warn!("清单文件节点缺少 path，使用名称代替: {}", node.name);
                node.name.clone()
            });
            TreeNode::File(FileNode {
                name: node.name.clone(),
                origin: FileOrigin::Static { path },
            })
        }
    }
}

/// 由用户词库条目（已排序）生成 "My Words" 文件夹
pub fn build_user_folder(label: &str, entries: &[Rc<UserEntry>]) -> Folder {
    Folder {
        name: label.to_string(),
        children: entries
            .iter()
            .map(|entry| {
                TreeNode::File(FileNode {
                    name: entry.name.clone(),
                    origin: FileOrigin::User(entry.clone()),
                })
            })
            .collect(),
        origin: NodeOrigin::User,
    }
}

/// 取小写扩展名
pub fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// 扫描 data 目录生成清单：文件夹递归，文件只保留支持的扩展名
pub fn scan_folder(dir: &Path) -> Result<Vec<ManifestNode>, AppError> {
    fn walk(dir: &Path, prefix: &str, out: &mut Vec<ManifestNode>) -> Result<(), AppError> {
        let mut entries = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.file_name());

        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let rel = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };

            if entry.file_type()?.is_dir() {
                let mut children = Vec::new();
                walk(&entry.path(), &rel, &mut children)?;
                out.push(ManifestNode {
                    name,
                    kind: ManifestKind::Folder,
                    children: Some(children),
                    path: None,
                });
            } else if extension_of(&name)
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            {
                out.push(ManifestNode {
                    name,
                    kind: ManifestKind::File,
                    children: None,
                    path: Some(rel),
                });
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    walk(dir, "", &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::pair::{Pair, ParseMeta, SourceKind};

    #[test]
    fn test_parse_manifest() {
        let json = br#"[
            {"name": "Basics", "type": "folder", "children": [
                {"name": "animals.txt", "type": "file", "path": "Basics/animals.txt"},
                {"name": "Empty", "type": "folder", "children": []}
            ]},
            {"name": "top.xlsx", "type": "file", "path": "top.xlsx"}
        ]"#;

        let root = parse_manifest(json).unwrap();
        assert_eq!(root.len(), 2);

        let TreeNode::Folder(basics) = &root[0] else {
            panic!("第一个节点应该是文件夹");
        };
        assert_eq!(basics.name, "Basics");
        assert_eq!(basics.origin, NodeOrigin::Static);
        assert_eq!(basics.children.len(), 2);
        match &basics.children[0] {
            TreeNode::File(f) => assert_eq!(
                f.origin,
                FileOrigin::Static { path: "Basics/animals.txt".into() }
            ),
            other => panic!("应该是文件节点: {:?}", other),
        }
        match &basics.children[1] {
            TreeNode::Folder(f) => assert!(f.children.is_empty()),
            other => panic!("应该是文件夹节点: {:?}", other),
        }
    }

    #[test]
    fn test_folder_without_children_and_file_without_path() {
        let json = br#"[
            {"name": "Lonely", "type": "folder"},
            {"name": "bare.txt", "type": "file"}
        ]"#;
        let root = parse_manifest(json).unwrap();
        assert!(matches!(&root[0], TreeNode::Folder(f) if f.children.is_empty()));
        assert!(matches!(
            &root[1],
            TreeNode::File(FileNode { origin: FileOrigin::Static { path }, .. }) if path == "bare.txt"
        ));
    }

    #[test]
    fn test_invalid_manifest() {
        assert!(matches!(parse_manifest(b"{oops"), Err(AppError::Parse(_))));
        assert!(parse_manifest(br#"[{"name": "x", "type": "link"}]"#).is_err());
    }

    #[test]
    fn test_user_folder_from_entries() {
        let entry = Rc::new(UserEntry {
            name: "mine.txt".into(),
            pairs: vec![Pair::new("a", "b")],
            meta: ParseMeta { source: SourceKind::Text, count: 1 },
        });
        let folder = build_user_folder("My Words", &[entry.clone()]);
        assert_eq!(folder.name, "My Words");
        assert_eq!(folder.origin, NodeOrigin::User);
        assert_eq!(folder.children.len(), 1);
        assert!(folder.children[0].is_user());
        assert_eq!(folder.children[0].name(), "mine.txt");
    }

    #[test]
    fn test_scan_folder() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let root = dir.path();
        fs::create_dir_all(root.join("Basics/Deep")).unwrap();
        fs::write(root.join("Basics/animals.txt"), "dog - perro").unwrap();
        fs::write(root.join("Basics/notes.md"), "ignored").unwrap();
        fs::write(root.join("Basics/Deep/verbs.CSV"), "run,correr").unwrap();
        fs::write(root.join("colors.xlsx"), b"").unwrap();

        let manifest = scan_folder(root).unwrap();
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"name": "Basics", "type": "folder", "children": [
                    {"name": "Deep", "type": "folder", "children": [
                        {"name": "verbs.CSV", "type": "file", "path": "Basics/Deep/verbs.CSV"}
                    ]},
                    {"name": "animals.txt", "type": "file", "path": "Basics/animals.txt"}
                ]},
                {"name": "colors.xlsx", "type": "file", "path": "colors.xlsx"}
            ])
        );
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.TXT").as_deref(), Some("txt"));
        assert_eq!(extension_of("archive.tar.xlsx").as_deref(), Some("xlsx"));
        assert_eq!(extension_of("noext"), None);
    }
}

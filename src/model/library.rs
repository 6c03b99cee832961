//! LibraryStore：用户导入的词表（"My Words"）
//!
//! 每次修改都把完整条目列表序列化后整块写回存储；
//! 写入前检查总大小是否超过配额，超出则回滚，内存状态保持不变。

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::model::data_core::AppError;
use crate::model::pair::{Pair, ParseMeta};
use crate::utils::storage::KeyValueStore;

/// 持久化使用的固定键
pub const USER_WORDS_KEY: &str = "user_words";
/// 整个词库序列化后的字节上限
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// 在词库内唯一
    pub name: String,
    pub pairs: Vec<Pair>,
    pub meta: ParseMeta,
}

#[derive(Debug)]
pub struct LibraryStore<S: KeyValueStore> {
    backend: S,
    key: String,
    quota: u64,
    /// 插入顺序；展示顺序由 `list` 另行排序
    entries: Vec<Rc<UserEntry>>,
}

impl<S: KeyValueStore> LibraryStore<S> {
    /// 启动时读取一次存储；内容损坏或无法读取时按空词库处理
    pub fn open(backend: S, key: &str, quota: u64) -> Result<Self, AppError> {
        let entries = match backend.get(key) {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<Rc<UserEntry>>>(&blob) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("用户词库数据损坏，按空词库处理: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("用户词库无法读取，按空词库处理: {}", e);
                Vec::new()
            }
        };
        tracing::info!("用户词库已加载: {} 个条目", entries.len());
        Ok(Self {
            backend,
            key: key.to_string(),
            quota,
            entries,
        })
    }

    /// 当前快照，按名称字母序排列
    pub fn list(&self) -> Vec<Rc<UserEntry>> {
        let mut out = self.entries.clone();
        out.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    pub fn get(&self, name: &str) -> Option<Rc<UserEntry>> {
        self.entries.iter().find(|e| e.name == name).cloned()
    }

    /// 当前词库序列化后的字节数
    pub fn serialized_size(&self) -> Result<u64, AppError> {
        Ok(serde_json::to_vec(&self.entries)?.len() as u64)
    }

    /// 以唯一名称加入新条目并持久化
    pub fn add(
        &mut self,
        name: &str,
        pairs: Vec<Pair>,
        meta: ParseMeta,
    ) -> Result<Rc<UserEntry>, AppError> {
        let name = unique_name(name, self.entries.iter().map(|e| e.name.as_str()));
        let entry = Rc::new(UserEntry { name, pairs, meta });

        self.entries.push(entry.clone());
        let blob = match serde_json::to_string(&self.entries) {
            Ok(blob) => blob,
            Err(e) => {
                self.entries.pop();
                return Err(e.into());
            }
        };

        let size = blob.len() as u64;
        if size > self.quota {
            self.entries.pop();
            tracing::warn!(
                "词库配额不足，拒绝导入 {}: {} > {} 字节",
                entry.name,
                size,
                self.quota
            );
            return Err(AppError::QuotaExceeded {
                size,
                limit: self.quota,
            });
        }

        if let Err(e) = self.backend.set(&self.key, &blob) {
            self.entries.pop();
            return Err(e);
        }

        tracing::info!(
            "已加入用户词表 {} ({} 个词对, 词库 {} 字节)",
            entry.name,
            entry.pairs.len(),
            size
        );
        Ok(entry)
    }

    /// 按名称删除；条目不存在时什么都不做，返回 false
    pub fn remove(&mut self, name: &str) -> Result<bool, AppError> {
        let Some(idx) = self.entries.iter().position(|e| e.name == name) else {
            return Ok(false);
        };

        let removed = self.entries.remove(idx);
        let persisted = serde_json::to_string(&self.entries)
            .map_err(AppError::from)
            .and_then(|blob| self.backend.set(&self.key, &blob));
        if let Err(e) = persisted {
            self.entries.insert(idx, removed);
            return Err(e);
        }

        tracing::info!("已删除用户词表 {}", name);
        Ok(true)
    }
}

/// 名称冲突时在扩展名前追加 " (2)"、" (3)"……（区分大小写的精确匹配）
pub fn unique_name<'a>(original: &str, existing: impl Iterator<Item = &'a str> + Clone) -> String {
    let taken = |candidate: &str| existing.clone().any(|n| n == candidate);
    if !taken(original) {
        return original.to_string();
    }

    let (base, ext) = match original.rfind('.') {
        Some(i) if i > 0 => original.split_at(i),
        _ => (original, ""),
    };
    (2u32..)
        .map(|n| format!("{} ({}){}", base, n, ext))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| original.to_string())
}

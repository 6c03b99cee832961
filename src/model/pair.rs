//! 词对数据模型：Pair / ParseMeta / ParseResult

use serde::{Deserialize, Serialize};

/// 单条词汇：原词 + 译文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub term: String,
    pub translation: String,
}

impl Pair {
    pub fn new(term: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            translation: translation.into(),
        }
    }

    /// 原词或译文缺失其一即为"可疑"
    pub fn is_suspect(&self) -> bool {
        self.term.is_empty() || self.translation.is_empty()
    }

    /// 两侧都为空的行在解析阶段就会被丢弃
    pub fn is_blank(&self) -> bool {
        self.term.is_empty() && self.translation.is_empty()
    }
}

/// 解析来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// 行文本（txt / csv），持久化格式里写作 "txt"
    #[serde(rename = "txt", alias = "text", alias = "csv")]
    Text,
    #[serde(rename = "xlsx")]
    Xlsx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseMeta {
    pub source: SourceKind,
    pub count: usize,
}

/// 一次解析的产物，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pairs: Vec<Pair>,
    meta: ParseMeta,
}

impl ParseResult {
    pub(crate) fn new(pairs: Vec<Pair>, source: SourceKind) -> Self {
        let meta = ParseMeta {
            source,
            count: pairs.len(),
        };
        Self { pairs, meta }
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn meta(&self) -> ParseMeta {
        self.meta
    }

    /// 可疑词对数量（缺原词或缺译文）
    pub fn suspect_count(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_suspect()).count()
    }

    pub fn valid_count(&self) -> usize {
        self.pairs.len() - self.suspect_count()
    }

    pub fn into_parts(self) -> (Vec<Pair>, ParseMeta) {
        (self.pairs, self.meta)
    }
}

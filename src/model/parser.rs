//! PairParser：把松散的文本行或表格行规整成 (term, translation) 词对
//!
//! 文本解析按固定优先级尝试分隔符，行内第一个命中的分隔符胜出；
//! 都不命中时退回到首个空白处切分。纯函数，无副作用。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::pair::{Pair, ParseResult, SourceKind};

/// 默认分隔符（按优先级排列）
pub const DEFAULT_SEPARATORS: &[&str] = &["=>", "->", "\t", ";", "|", "—", " - ", ":", ","];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("没有解析出任何词对")]
    EmptyResult,
}

/// 单侧为空的行如何处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsePolicy {
    /// 策略A：保留单侧词对；无分隔符且无空白时整行作为原词
    #[default]
    Lenient,
    /// 策略B：两侧都非空才保留；无法切分的行直接丢弃
    Strict,
}

/// 表格单元格（xlsx 读取后的中间表示）
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// 转成去掉首尾空白的字符串；整数值的浮点数不带小数部分
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PairParser {
    separators: Vec<String>,
    policy: ParsePolicy,
}

impl Default for PairParser {
    fn default() -> Self {
        Self::new(
            DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
            ParsePolicy::default(),
        )
    }
}

impl PairParser {
    /// 空分隔符会被忽略
    pub fn new(separators: Vec<String>, policy: ParsePolicy) -> Self {
        let separators = separators.into_iter().filter(|s| !s.is_empty()).collect();
        Self { separators, policy }
    }

    pub fn policy(&self) -> ParsePolicy {
        self.policy
    }

    pub fn separators(&self) -> &[String] {
        &self.separators
    }

    /// 解析行文本（txt / csv）
    pub fn parse_text(&self, raw: &str) -> Result<ParseResult, ParseError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let pairs: Vec<Pair> = raw
            .split(['\n', '\r'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter_map(|line| self.split_line(line))
            .filter(|pair| self.keeps(pair))
            .collect();

        if pairs.is_empty() {
            return Err(ParseError::EmptyResult);
        }
        Ok(ParseResult::new(pairs, SourceKind::Text))
    }

    /// 解析表格：每行第1列为原词，第2列为译文
    pub fn parse_tabular<R: AsRef<[Cell]>>(&self, rows: &[R]) -> Result<ParseResult, ParseError> {
        let mut pairs = Vec::new();
        for row in rows {
            let row = row.as_ref();
            if self.policy == ParsePolicy::Strict && row.len() < 2 {
                continue;
            }
            let term = row.first().map(Cell::to_text).unwrap_or_default();
            let translation = row.get(1).map(Cell::to_text).unwrap_or_default();
            let pair = Pair { term, translation };
            if self.keeps(&pair) {
                pairs.push(pair);
            }
        }

        if pairs.is_empty() {
            return Err(ParseError::EmptyResult);
        }
        Ok(ParseResult::new(pairs, SourceKind::Xlsx))
    }

    /// 切分单行（已 trim 且非空）
    fn split_line(&self, line: &str) -> Option<Pair> {
        let separator = self
            .separators
            .iter()
            .find(|sep| line.contains(sep.as_str()));

        let split = match separator {
            Some(sep) => line.split_once(sep.as_str()),
            None => line.split_once(char::is_whitespace),
        };

        match split {
            Some((left, right)) => Some(Pair::new(left.trim(), right.trim())),
            None => match self.policy {
                ParsePolicy::Lenient => Some(Pair::new(line, "")),
                ParsePolicy::Strict => None,
            },
        }
    }

    fn keeps(&self, pair: &Pair) -> bool {
        match self.policy {
            ParsePolicy::Lenient => !pair.is_blank(),
            ParsePolicy::Strict => !pair.is_suspect(),
        }
    }
}

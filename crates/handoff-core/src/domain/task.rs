//! Task - キューを流れるタスク文字列とそのパース
//!
//! タスクは `nature/process/product` の 3 フィールドを区切り文字で連結した
//! 不透明な文字列としてストアに置かれます。
//!
//! # 設計原則
//! - ストアに書き戻すのは常に `raw`（パース前の文字列そのもの）
//! - フィールド数が 3 でないもの、空フィールドを含むものは不正
//! - 区切り文字は設定で差し替え可能（デフォルト `/`）

use serde::{Deserialize, Serialize};
use std::fmt;

/// デフォルトの区切り文字
pub const DEFAULT_DELIMITER: char = '/';

/// パース済みのタスク
///
/// `raw` を保持しているので、完了時に output / claimed へ同じ文字列を渡せます。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    raw: String,
    nature: String,
    process: String,
    product: String,
}

/// TaskParseError はタスク文字列が 3 フィールドに分解できないときのエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskParseError {
    #[error("task {raw:?} has {found} field(s), expected 3 separated by {delimiter:?}")]
    FieldCount {
        raw: String,
        delimiter: char,
        found: usize,
    },

    #[error("task {raw:?} has an empty {field} field")]
    EmptyField { raw: String, field: &'static str },

    /// `raw` は不正なバイトを U+FFFD に置き換えた表示用の文字列
    #[error("task {raw:?} is not valid UTF-8")]
    InvalidUtf8 { raw: String },
}

impl TaskParseError {
    /// 不正だったタスク文字列
    pub fn raw(&self) -> &str {
        match self {
            Self::FieldCount { raw, .. }
            | Self::EmptyField { raw, .. }
            | Self::InvalidUtf8 { raw } => raw,
        }
    }
}

impl Task {
    /// `raw` を `delimiter` で分割して Task を作る
    ///
    /// # Example
    /// ```
    /// use handoff_core::domain::Task;
    ///
    /// let task = Task::parse("build/lineA/partX", '/').unwrap();
    /// assert_eq!(task.nature(), "build");
    /// assert_eq!(task.process(), "lineA");
    /// assert_eq!(task.product(), "partX");
    /// ```
    pub fn parse(raw: &str, delimiter: char) -> Result<Self, TaskParseError> {
        let fields: Vec<&str> = raw.split(delimiter).collect();
        let [nature, process, product] = fields.as_slice() else {
            return Err(TaskParseError::FieldCount {
                raw: raw.to_string(),
                delimiter,
                found: fields.len(),
            });
        };
        for (field, value) in [("nature", nature), ("process", process), ("product", product)] {
            if value.is_empty() {
                return Err(TaskParseError::EmptyField {
                    raw: raw.to_string(),
                    field,
                });
            }
        }
        Ok(Self {
            raw: raw.to_string(),
            nature: nature.to_string(),
            process: process.to_string(),
            product: product.to_string(),
        })
    }

    /// ストアから取り出したバイト列を Task にする（UTF-8 でなければ不正なタスク）
    pub fn from_utf8(raw: &[u8], delimiter: char) -> Result<Self, TaskParseError> {
        let raw = std::str::from_utf8(raw).map_err(|_| TaskParseError::InvalidUtf8 {
            raw: String::from_utf8_lossy(raw).into_owned(),
        })?;
        Self::parse(raw, delimiter)
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn nature(&self) -> &str {
        &self.nature
    }

    pub fn process(&self) -> &str {
        &self.process
    }

    pub fn product(&self) -> &str {
        &self.product
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

//! Errors - エラー型と分類
//!
//! - StoreError: ストアとの通信エラー（1 回分）
//! - ConfigError: 起動前の設定検証エラー
//! - HandoffError: Worker を止めるエラー（呼び出し元に返る）
//!
//! 不正なタスク（TaskParseError）は Worker を止めないので HandoffError には入りません。

use thiserror::Error;

/// ErrorKind は Worker から見たエラーの運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 一時的なエラー（リトライ推奨）
    Transient,
    /// 恒久的なエラー（リトライ無意味）
    Permanent,
}

/// StoreError はキューストアとの 1 回の通信エラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not connect to store: {0}")]
    Connection(String),

    #[error("store command {command} failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl StoreError {
    pub fn command(command: &'static str, message: impl Into<String>) -> Self {
        Self::Command {
            command,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Transient,
            Self::Command { .. } => ErrorKind::Transient,
            Self::Redis(e) => {
                if e.is_io_error() || e.is_timeout() || e.is_connection_dropped() {
                    ErrorKind::Transient
                } else {
                    ErrorKind::Permanent
                }
            }
        }
    }
}

/// ConfigError は WorkerConfig の検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} queue name must not be empty")]
    EmptyQueueName(&'static str),

    #[error("{first} and {second} queues must differ, both are {name:?}")]
    DuplicateQueue {
        first: &'static str,
        second: &'static str,
        name: String,
    },

    #[error("claim timeout must be at least one second")]
    ZeroClaimTimeout,

    #[error("delimiter {0:?} must not be whitespace")]
    InvalidDelimiter(char),

    #[error("store retry policy needs at least one attempt")]
    NoAttempts,
}

/// HandoffError は Worker の実行を止めるエラー
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// リトライ上限までストア操作が失敗した（ストアの状態が不明なので停止する）
    #[error("{operation} on {queue:?} failed after {attempts} attempt(s): {source}")]
    StoreExhausted {
        operation: &'static str,
        queue: String,
        attempts: u32,
        #[source]
        source: StoreError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_message_names_operation_and_queue() {
        let err = HandoffError::StoreExhausted {
            operation: "push",
            queue: "global/done".to_string(),
            attempts: 3,
            source: StoreError::command("LPUSH", "connection reset"),
        };
        let msg = err.to_string();
        assert!(msg.contains("push"));
        assert!(msg.contains("global/done"));
        assert!(msg.contains("3 attempt"));
    }

    #[test]
    fn command_errors_are_transient() {
        assert_eq!(
            StoreError::command("LREM", "boom").kind(),
            ErrorKind::Transient
        );
    }
}

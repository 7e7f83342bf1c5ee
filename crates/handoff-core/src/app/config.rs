//! WorkerConfig - Worker の設定
//!
//! キュー名やタイムアウトはすべてここに集め、Worker 構築時に渡します。
//! プロセス全体の定数にはしません。
//!
//! # 使用例
//! ```
//! use std::time::Duration;
//! use handoff_core::app::WorkerConfig;
//!
//! let config = WorkerConfig::new("trt/plantA/todo", "global/done")
//!     .with_claimed_queue("trt/plantA/taken")
//!     .with_dead_letter_queue("trt/plantA/dead")
//!     .with_claim_timeout(Duration::from_secs(30));
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use super::StoreRetryPolicy;
use crate::domain::{ConfigError, DEFAULT_DELIMITER};

/// BRPOPLPUSH で待つ時間のデフォルト
pub const DEFAULT_CLAIM_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// pending のタスクが積まれるキュー
    pub input_queue: String,

    /// 処理中のタスクを置くキュー（デフォルト `<input>/taken`）
    pub claimed_queue: String,

    /// 完了したタスクを書くキュー
    pub output_queue: String,

    /// 不正なタスクの退避先。None なら claimed に残す（ログで可視化する）
    pub dead_letter_queue: Option<String>,

    /// handler が失敗を返したタスクの書き先。None なら output に書く
    pub failed_queue: Option<String>,

    pub delimiter: char,

    pub claim_timeout: Duration,

    /// 起動時に claimed の残りを input に戻すか（claimed を他の Worker と共有しない場合のみ）
    pub recover_on_start: bool,

    pub store_retry: StoreRetryPolicy,
}

impl WorkerConfig {
    pub fn new(input_queue: impl Into<String>, output_queue: impl Into<String>) -> Self {
        let input_queue = input_queue.into();
        Self {
            claimed_queue: default_claimed_queue(&input_queue),
            input_queue,
            output_queue: output_queue.into(),
            dead_letter_queue: None,
            failed_queue: None,
            delimiter: DEFAULT_DELIMITER,
            claim_timeout: DEFAULT_CLAIM_TIMEOUT,
            recover_on_start: false,
            store_retry: StoreRetryPolicy::default(),
        }
    }

    pub fn with_claimed_queue(mut self, queue: impl Into<String>) -> Self {
        self.claimed_queue = queue.into();
        self
    }

    pub fn with_dead_letter_queue(mut self, queue: impl Into<String>) -> Self {
        self.dead_letter_queue = Some(queue.into());
        self
    }

    pub fn with_failed_queue(mut self, queue: impl Into<String>) -> Self {
        self.failed_queue = Some(queue.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_claim_timeout(mut self, timeout: Duration) -> Self {
        self.claim_timeout = timeout;
        self
    }

    pub fn with_recover_on_start(mut self, recover: bool) -> Self {
        self.recover_on_start = recover;
        self
    }

    pub fn with_store_retry(mut self, policy: StoreRetryPolicy) -> Self {
        self.store_retry = policy;
        self
    }

    /// handler 失敗時の書き先
    pub fn failure_queue(&self) -> &str {
        self.failed_queue.as_deref().unwrap_or(&self.output_queue)
    }

    /// 設定の整合性チェック（接続前に呼ぶ）
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut queues = vec![
            ("input", self.input_queue.as_str()),
            ("claimed", self.claimed_queue.as_str()),
            ("output", self.output_queue.as_str()),
        ];
        if let Some(queue) = &self.dead_letter_queue {
            queues.push(("dead-letter", queue.as_str()));
        }
        if let Some(queue) = &self.failed_queue {
            queues.push(("failed", queue.as_str()));
        }

        for &(role, name) in &queues {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyQueueName(role));
            }
        }
        for (i, &(first, a)) in queues.iter().enumerate() {
            if let Some(&(second, _)) = queues[i + 1..].iter().find(|(_, b)| a == *b) {
                return Err(ConfigError::DuplicateQueue {
                    first,
                    second,
                    name: a.to_string(),
                });
            }
        }

        if self.claim_timeout < Duration::from_secs(1) {
            return Err(ConfigError::ZeroClaimTimeout);
        }
        if self.delimiter.is_whitespace() {
            return Err(ConfigError::InvalidDelimiter(self.delimiter));
        }
        self.store_retry.validate()
    }
}

/// The claimed queue name derived from the input queue when none is configured.
pub fn default_claimed_queue(input_queue: &str) -> String {
    format!("{input_queue}/taken")
}

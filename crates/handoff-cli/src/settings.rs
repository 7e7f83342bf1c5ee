//! Settings - 環境変数（`HANDOFF_*`）からの設定読み込み
//!
//! `.env` があれば先に読み込み、その後 envy で `HANDOFF_` プレフィックスの
//! 環境変数を Settings にデシリアライズします。CLI フラグはこの後に上書きします。

use std::time::Duration;

use anyhow::{Context, Result, bail};
use handoff_core::app::{StoreRetryPolicy, WorkerConfig, default_claimed_queue};
use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_input_queue")]
    pub input_queue: String,
    /// 未設定なら `<input>/taken`
    pub claimed_queue: Option<String>,
    #[serde(default = "default_output_queue")]
    pub output_queue: String,
    /// 未設定なら `<input>/dead`、空文字なら dead-letter なし
    pub dead_letter_queue: Option<String>,
    /// 未設定なら失敗も output に書く
    pub failed_queue: Option<String>,
    /// 設定すると Worker のイベントをこの channel に publish する
    pub listener_channel: Option<String>,
    /// 受け付ける nature（カンマ区切り）。未設定ならすべて受け付ける
    pub natures: Option<String>,

    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_claim_timeout_secs")]
    pub claim_timeout_secs: u64,
    #[serde(default)]
    pub recover_on_start: bool,
    #[serde(default = "default_store_attempts")]
    pub store_attempts: u32,

    /// デモ handler が 1 タスクにかける秒数
    #[serde(default = "default_work_secs")]
    pub work_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1/".to_string()
}
fn default_input_queue() -> String {
    "trt/plantA/todo".to_string()
}
fn default_output_queue() -> String {
    "global/done".to_string()
}
fn default_delimiter() -> String {
    "/".to_string()
}
fn default_claim_timeout_secs() -> u64 {
    60
}
fn default_store_attempts() -> u32 {
    5
}
fn default_work_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("HANDOFF_")
            .from_env::<Settings>()
            .context("failed to load HANDOFF_* settings")
    }

    fn delimiter_char(&self) -> Result<char> {
        let mut chars = self.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => bail!(
                "HANDOFF_DELIMITER must be a single character, got {:?}",
                self.delimiter
            ),
        }
    }

    pub fn claimed_queue(&self) -> String {
        self.claimed_queue
            .clone()
            .unwrap_or_else(|| default_claimed_queue(&self.input_queue))
    }

    pub fn dead_letter_queue(&self) -> Option<String> {
        match &self.dead_letter_queue {
            None => Some(format!("{}/dead", self.input_queue)),
            Some(queue) if queue.is_empty() => None,
            Some(queue) => Some(queue.clone()),
        }
    }

    pub fn natures(&self) -> Vec<String> {
        self.natures
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Settings から WorkerConfig を組み立てて検証する
    pub fn worker_config(&self) -> Result<WorkerConfig> {
        let mut config = WorkerConfig::new(&self.input_queue, &self.output_queue)
            .with_claimed_queue(self.claimed_queue())
            .with_delimiter(self.delimiter_char()?)
            .with_claim_timeout(Duration::from_secs(self.claim_timeout_secs))
            .with_recover_on_start(self.recover_on_start)
            .with_store_retry(StoreRetryPolicy {
                max_attempts: self.store_attempts,
                ..StoreRetryPolicy::default()
            });
        if let Some(queue) = self.dead_letter_queue() {
            config = config.with_dead_letter_queue(queue);
        }
        if let Some(queue) = &self.failed_queue {
            config = config.with_failed_queue(queue);
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        envy::from_iter::<_, Settings>(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn defaults_match_the_demo_queues() {
        let s = settings(&[]);
        let config = s.worker_config().unwrap();
        assert_eq!(config.input_queue, "trt/plantA/todo");
        assert_eq!(config.claimed_queue, "trt/plantA/todo/taken");
        assert_eq!(config.output_queue, "global/done");
        assert_eq!(config.dead_letter_queue.as_deref(), Some("trt/plantA/todo/dead"));
        assert_eq!(config.claim_timeout, Duration::from_secs(60));
        assert_eq!(s.redis_url, "redis://127.0.0.1/");
    }

    #[test]
    fn empty_dead_letter_disables_it() {
        let s = settings(&[("DEAD_LETTER_QUEUE", "")]);
        assert_eq!(s.worker_config().unwrap().dead_letter_queue, None);
    }

    #[test]
    fn explicit_values_are_used() {
        let s = settings(&[
            ("INPUT_QUEUE", "in"),
            ("CLAIMED_QUEUE", "in/mine"),
            ("OUTPUT_QUEUE", "out"),
            ("FAILED_QUEUE", "out/failed"),
            ("DELIMITER", ":"),
            ("CLAIM_TIMEOUT_SECS", "5"),
            ("RECOVER_ON_START", "true"),
        ]);
        let config = s.worker_config().unwrap();
        assert_eq!(config.claimed_queue, "in/mine");
        assert_eq!(config.failed_queue.as_deref(), Some("out/failed"));
        assert_eq!(config.delimiter, ':');
        assert_eq!(config.claim_timeout, Duration::from_secs(5));
        assert!(config.recover_on_start);
    }

    #[test]
    fn natures_are_comma_separated() {
        assert!(settings(&[]).natures().is_empty());
        let s = settings(&[("NATURES", "build, paint,,weld ")]);
        assert_eq!(s.natures(), vec!["build", "paint", "weld"]);
    }

    #[test]
    fn multi_char_delimiter_is_rejected() {
        let s = settings(&[("DELIMITER", "::")]);
        assert!(s.worker_config().is_err());
    }

    #[test]
    fn invalid_worker_config_is_rejected() {
        let s = settings(&[("INPUT_QUEUE", "same"), ("OUTPUT_QUEUE", "same")]);
        assert!(s.worker_config().is_err());
    }
}

//! Status - キューの長さのスナップショット
//!
//! `handoff status` と Worker::counts の戻り値。
//! claimed が増え続けていたら、どこかで Worker が止まって取り残されたタスクがある。

use serde::{Deserialize, Serialize};

use super::WorkerConfig;
use crate::domain::HandoffError;
use crate::ports::QueueStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub input: usize,
    pub claimed: usize,
    pub output: usize,
    /// dead-letter 未設定なら None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_letter: Option<usize>,
    /// failed 未設定なら None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
}

impl QueueCounts {
    /// 設定されたキューの LLEN をまとめて読む
    pub async fn read(
        store: &dyn QueueStore,
        config: &WorkerConfig,
    ) -> Result<Self, HandoffError> {
        let dead_letter = match &config.dead_letter_queue {
            Some(queue) => Some(store.len(queue).await?),
            None => None,
        };
        let failed = match &config.failed_queue {
            Some(queue) => Some(store.len(queue).await?),
            None => None,
        };
        Ok(Self {
            input: store.len(&config.input_queue).await?,
            claimed: store.len(&config.claimed_queue).await?,
            output: store.len(&config.output_queue).await?,
            dead_letter,
            failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryQueueStore;

    #[tokio::test]
    async fn reads_configured_queues_only() {
        let store = InMemoryQueueStore::new();
        store.push("todo", "a/b/c").await.unwrap();
        store.push("todo", "d/e/f").await.unwrap();
        store.push("done", "x/y/z").await.unwrap();

        let config = WorkerConfig::new("todo", "done").with_failed_queue("failed");
        let counts = QueueCounts::read(&store, &config).await.unwrap();
        assert_eq!(
            counts,
            QueueCounts {
                input: 2,
                claimed: 0,
                output: 1,
                dead_letter: None,
                failed: Some(0),
            }
        );

        let json = serde_json::to_value(&counts).unwrap();
        assert!(json.get("dead_letter").is_none());
        assert_eq!(json["failed"], 0);
    }
}

//! Events - Worker が発行するイベント
//!
//! Worker は状態遷移ごとに WorkerEvent を EventSink に渡します。
//! Redis 実装では listener channel に `"<claimed> <KIND> <task>"` を publish します。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::WorkerId;

/// EventKind はイベントの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// input から claimed へ移った
    Taken,
    /// output に書き込まれ、claimed から消えた
    Done,
    /// handler が失敗を返し、failed（または output）に書き込まれた
    Failed,
    /// 不正なタスクとして dead-letter に送られた
    Dead,
    /// 不正なタスクだが dead-letter が無いので claimed に残った
    Stuck,
    /// recover で claimed から input に戻された
    Recovered,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Taken => "TAKEN",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Dead => "DEAD",
            Self::Stuck => "STUCK",
            Self::Recovered => "RECOVERED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WorkerEvent は 1 タスクの 1 遷移
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerEvent {
    pub worker: WorkerId,
    pub kind: EventKind,
    /// claimed キュー名（listener 側はこれで Worker を見分ける）
    pub queue: String,
    pub task: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub at: DateTime<Utc>,
}

impl WorkerEvent {
    pub fn new(
        worker: WorkerId,
        kind: EventKind,
        queue: impl Into<String>,
        task: impl Into<String>,
    ) -> Self {
        Self {
            worker,
            kind,
            queue: queue.into(),
            task: task.into(),
            detail: None,
            at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// listener channel に流す 1 行
    pub fn channel_message(&self) -> String {
        format!("{} {} {}", self.queue, self.kind, self.task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_message_format() {
        let event = WorkerEvent::new(
            WorkerId::generate(),
            EventKind::Done,
            "trt/plantA/taken",
            "build/lineA/partX",
        );
        assert_eq!(
            event.channel_message(),
            "trt/plantA/taken DONE build/lineA/partX"
        );
    }

    #[test]
    fn detail_is_skipped_when_absent() {
        let event = WorkerEvent::new(WorkerId::generate(), EventKind::Taken, "q", "t");
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["kind"], "TAKEN");
        assert!(v.get("detail").is_none());

        let v = serde_json::to_value(event.with_detail("why")).unwrap();
        assert_eq!(v["detail"], "why");
    }
}

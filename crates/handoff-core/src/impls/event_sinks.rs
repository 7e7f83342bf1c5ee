//! EventSink の軽量実装

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{EventKind, StoreError, WorkerEvent};
use crate::ports::EventSink;

/// 何もしない EventSink（listener channel 未設定時のデフォルト）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn emit(&self, _event: &WorkerEvent) -> Result<(), StoreError> {
        Ok(())
    }
}

/// 受け取ったイベントを溜めておく EventSink（テスト・デバッグ用）
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSink {
    events: Arc<Mutex<Vec<WorkerEvent>>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WorkerEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|e| e.kind).collect()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn emit(&self, event: &WorkerEvent) -> Result<(), StoreError> {
        let mut events = self
            .events
            .lock()
            .map_err(|e| StoreError::command("emit", e.to_string()))?;
        events.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WorkerId;

    #[tokio::test]
    async fn memory_sink_records_in_order() {
        let sink = MemoryEventSink::new();
        let worker = WorkerId::generate();
        sink.emit(&WorkerEvent::new(worker, EventKind::Taken, "q", "t"))
            .await
            .unwrap();
        sink.emit(&WorkerEvent::new(worker, EventKind::Done, "q", "t"))
            .await
            .unwrap();
        assert_eq!(sink.kinds(), vec![EventKind::Taken, EventKind::Done]);
    }
}

//! EventSink port - イベント通知の抽象化
//!
//! # 実装
//! - NoopEventSink: 何もしない（デフォルト）
//! - MemoryEventSink: テスト用に記録する
//! - RedisEventSink: listener channel に publish する

use async_trait::async_trait;

use crate::domain::{StoreError, WorkerEvent};

/// EventSink は WorkerEvent を外部に通知
///
/// 通知の失敗で Worker は止まりません（呼び出し側は warn を出して続行）。
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &WorkerEvent) -> Result<(), StoreError>;
}

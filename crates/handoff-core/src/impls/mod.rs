//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryQueueStore**: 開発・テスト用のキューストア
//! - **RedisQueueStore**: 本番用のキューストア
//! - **RedisEventSink**: listener channel への通知
//! - **NoopEventSink / MemoryEventSink**: 通知なし・記録のみ

pub mod event_sinks;
pub mod inmem_store;
pub mod redis_store;

pub use self::event_sinks::{MemoryEventSink, NoopEventSink};
pub use self::inmem_store::InMemoryQueueStore;
pub use self::redis_store::{RedisEventSink, RedisQueueStore};

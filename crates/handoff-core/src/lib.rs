//! handoff-core
//!
//! Core building blocks for a reliable queue worker.
//!
//! Worker は input キューからタスクを原子的に claimed キューへ移し、
//! handler で実行してから output キューへ書き、claimed から消します。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（Task, TaskState, Outcome, WorkerEvent, errors）
//! - **ports**: 抽象化レイヤー（QueueStore, TaskHandler, EventSink）
//! - **impls**: 実装（InMemoryQueueStore, RedisQueueStore, RedisEventSink など）
//! - **app**: アプリケーションロジック（WorkerConfig, Worker, StoreRetryPolicy, HandlerRegistry）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{Iteration, Worker, WorkerConfig};
pub use domain::{HandoffError, Outcome, Task};

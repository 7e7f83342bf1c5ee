//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! Worker はこれらの trait だけに依存し、Redis などの詳細は impls に閉じ込めます。
//!
//! # 設計原則
//! - キューストアが source of truth（Worker は状態を持たない）
//! - 仕事の中身は TaskHandler の外に出さない
//! - イベント通知はベストエフォート

pub mod event_sink;
pub mod handler;
pub mod queue_store;

pub use self::event_sink::EventSink;
pub use self::handler::{FnHandler, TaskHandler, handler_fn};
pub use self::queue_store::QueueStore;

//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて Worker のロジックを実装します。
//!
//! # 主要コンポーネント
//! - **WorkerConfig**: キュー名・タイムアウト・リトライの設定
//! - **Worker**: claim→parse→execute→complete のループ
//! - **StoreRetryPolicy**: ストア操作のリトライ（上限を超えたら致命的）
//! - **HandlerRegistry**: nature ごとの handler 振り分け
//! - **QueueCounts**: キュー長のスナップショット

pub mod config;
pub mod registry;
pub mod retry;
pub mod status;
pub mod worker_loop;

// 主要な型を再エクスポート
pub use self::config::{DEFAULT_CLAIM_TIMEOUT, WorkerConfig, default_claimed_queue};
pub use self::registry::{HandlerRegistry, RegistryError};
pub use self::retry::StoreRetryPolicy;
pub use self::status::QueueCounts;
pub use self::worker_loop::{Iteration, Worker};

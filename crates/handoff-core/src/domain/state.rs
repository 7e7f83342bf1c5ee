//! State - タスクの状態
//!
//! Worker 自身は状態を持たないので、これはログ・イベント・テストで
//! 「いまタスクがどのキューにいるか」を表すための語彙です。

use serde::{Deserialize, Serialize};

/// TaskState はタスクのライフサイクル
///
/// # 状態遷移
/// - Pending -> Claimed -> Done
/// - Pending -> Claimed -> Failed（handler が失敗を返した）
/// - Pending -> Claimed -> Discarded（不正なタスク）
/// - Claimed -> Pending（起動時の recover）
///
/// Worker の 1 イテレーションの結果は `Iteration::state()` でこの語彙に対応づけます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// input キューで待機中
    Pending,
    /// claimed キューにあり、ある Worker が処理中
    Claimed,
    /// output キューに書き込まれた
    Done,
    /// failed キュー（未設定なら output）に書き込まれた
    Failed,
    /// 不正なタスクとして dead-letter に送られた、または claimed に残された
    Discarded,
}

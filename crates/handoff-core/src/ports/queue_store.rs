//! QueueStore port - キューストア（Redis または InMemory）
//!
//! QueueStore はタスク文字列のリストを名前付きで保持する外部ストアです。
//! Worker の正しさはすべて `claim` の原子性に依存します。
//!
//! # リストの向き（Redis と同じ）
//! - `push` は先頭（LPUSH）
//! - `claim` / `move_one` は src の末尾（最も古い要素）を取り、dst の先頭へ
//! - `remove_one` は先頭から最初に一致した 1 件を削除（LREM count=1）
//! - `list` は先頭から末尾の順（LRANGE 0 -1）
//!
//! タスクはストア上ではバイト列。`push` / `remove_one` は文字列用の薄いラッパー

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::StoreError;

/// QueueStore は名前付きリストを持つ外部ストア
///
/// # 設計原則
/// - Worker はストア以外に状態を持たない
/// - `claim` は原子的：タスクが input と claimed のどちらにも無い瞬間は観測されない
/// - 複数 Worker が同じストアを共有しても、同じタスクを 2 つの Worker が claim することはない
///
/// # Thread Safety
/// - `Send + Sync` を要求（`Arc<dyn QueueStore>` で共有できる）
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// `input` の最も古いタスクを原子的に `claimed` へ移して返す
    ///
    /// `timeout` の間タスクが無ければ `Ok(None)`（エラーではない）。
    /// 中身はバイト列のまま返す（UTF-8 でないタスクも claimed から片付けられるように）
    async fn claim(
        &self,
        input: &str,
        claimed: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, StoreError>;

    /// `queue` の先頭にタスクを追加
    async fn push_raw(&self, queue: &str, task: &[u8]) -> Result<(), StoreError>;

    /// `queue` から一致するタスクを 1 件だけ削除し、削除件数（0 か 1）を返す
    async fn remove_one_raw(&self, queue: &str, task: &[u8]) -> Result<usize, StoreError>;

    /// `src` の最も古いタスクを待たずに `dst` へ移す（recover 用）
    async fn move_one(&self, src: &str, dst: &str) -> Result<Option<Vec<u8>>, StoreError>;

    async fn len(&self, queue: &str) -> Result<usize, StoreError>;

    /// 先頭から末尾の順で全要素を返す（確認・テスト用、UTF-8 でない部分は置換）
    async fn list(&self, queue: &str) -> Result<Vec<String>, StoreError>;

    async fn push(&self, queue: &str, task: &str) -> Result<(), StoreError> {
        self.push_raw(queue, task.as_bytes()).await
    }

    async fn remove_one(&self, queue: &str, task: &str) -> Result<usize, StoreError> {
        self.remove_one_raw(queue, task.as_bytes()).await
    }
}

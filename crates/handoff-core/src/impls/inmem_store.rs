//! InMemoryQueueStore - 開発・テスト用のキューストア
//!
//! # 実装メモ
//! - tokio::sync::Mutex で全キューをまとめて保護（claim の原子性はこのロック 1 つで保証）
//! - push 時に Notify で待機中の claim を起こす
//! - VecDeque の front がリストの先頭（LPUSH 側）

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::domain::StoreError;
use crate::ports::QueueStore;

/// InMemoryQueueStore は Redis のリスト操作を真似たストア
///
/// # 使用例
/// ```ignore
/// let store = InMemoryQueueStore::new();
/// store.push("todo", "build/lineA/partX").await?;
/// let task = store.claim("todo", "taken", Duration::from_secs(1)).await?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryQueueStore {
    queues: Arc<Mutex<HashMap<String, VecDeque<Vec<u8>>>>>,
    notify: Arc<Notify>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 末尾から取り出して dst の先頭へ（ロック取得済みの前提）
    fn relocate(
        queues: &mut HashMap<String, VecDeque<Vec<u8>>>,
        src: &str,
        dst: &str,
    ) -> Option<Vec<u8>> {
        let task = queues.get_mut(src)?.pop_back()?;
        queues
            .entry(dst.to_string())
            .or_default()
            .push_front(task.clone());
        Some(task)
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn claim(
        &self,
        input: &str,
        claimed: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            // ロックより先に待機登録しておかないと、その間の push を取りこぼす
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut queues = self.queues.lock().await;
                if let Some(task) = Self::relocate(&mut queues, input, claimed) {
                    return Ok(Some(task));
                }
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn push_raw(&self, queue: &str, task: &[u8]) -> Result<(), StoreError> {
        {
            let mut queues = self.queues.lock().await;
            queues
                .entry(queue.to_string())
                .or_default()
                .push_front(task.to_vec());
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn remove_one_raw(&self, queue: &str, task: &[u8]) -> Result<usize, StoreError> {
        let mut queues = self.queues.lock().await;
        let Some(list) = queues.get_mut(queue) else {
            return Ok(0);
        };
        match list.iter().position(|t| t == task) {
            Some(index) => {
                list.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn move_one(&self, src: &str, dst: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let moved = {
            let mut queues = self.queues.lock().await;
            Self::relocate(&mut queues, src, dst)
        };
        if moved.is_some() {
            self.notify.notify_waiters();
        }
        Ok(moved)
    }

    async fn len(&self, queue: &str) -> Result<usize, StoreError> {
        let queues = self.queues.lock().await;
        Ok(queues.get(queue).map_or(0, VecDeque::len))
    }

    async fn list(&self, queue: &str) -> Result<Vec<String>, StoreError> {
        let queues = self.queues.lock().await;
        Ok(queues
            .get(queue)
            .map(|list| {
                list.iter()
                    .map(|task| String::from_utf8_lossy(task).into_owned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

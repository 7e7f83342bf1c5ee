//! RedisQueueStore / RedisEventSink - 本番用の実装
//!
//! - claim: BRPOPLPUSH（原子的な移動 + ブロッキング待ち）
//! - push: LPUSH
//! - remove_one: LREM count=1
//! - move_one: RPOPLPUSH
//! - イベント: listener channel への PUBLISH
//!
//! 接続は redis の ConnectionManager で持ちます。ソケットが切れたコマンドは
//! エラーを返しますが、裏で再接続が始まるので、StoreRetryPolicy の次の試行は
//! 新しい接続で実行されます。
//!
//! ConnectionManager は clone しても同じソケットを共有します。
//! BRPOPLPUSH で待っている間は同じ接続の他のコマンドも待たされるので、
//! EventSink や status 確認には別の接続を張ってください。

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::debug;

use crate::domain::{StoreError, WorkerEvent};
use crate::ports::{EventSink, QueueStore};

/// 接続を開いて PING で疎通を確認する
async fn open(url: &str) -> Result<ConnectionManager, StoreError> {
    let client = redis::Client::open(url).map_err(|e| StoreError::Connection(e.to_string()))?;
    let mut con = ConnectionManager::new(client)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    let pong: String = redis::cmd("PING")
        .query_async(&mut con)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    debug!(url, reply = %pong, "got redis connection");
    Ok(con)
}

/// Redis リストを使う QueueStore
#[derive(Clone)]
pub struct RedisQueueStore {
    con: ConnectionManager,
}

impl RedisQueueStore {
    /// 接続に失敗したら StoreError::Connection（起動時は致命的として扱う）
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            con: open(url).await?,
        })
    }
}

/// BRPOPLPUSH の timeout は秒単位で切り上げる。0 は「無期限」になるので最低 1 秒
fn timeout_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    async fn claim(
        &self,
        input: &str,
        claimed: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let mut con = self.con.clone();
        let task: Option<Vec<u8>> = redis::cmd("BRPOPLPUSH")
            .arg(input)
            .arg(claimed)
            .arg(timeout_secs(timeout))
            .query_async(&mut con)
            .await?;
        Ok(task)
    }

    async fn push_raw(&self, queue: &str, task: &[u8]) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let _: usize = con.lpush(queue, task).await?;
        Ok(())
    }

    async fn remove_one_raw(&self, queue: &str, task: &[u8]) -> Result<usize, StoreError> {
        let mut con = self.con.clone();
        let removed: usize = con.lrem(queue, 1, task).await?;
        Ok(removed)
    }

    async fn move_one(&self, src: &str, dst: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut con = self.con.clone();
        let task: Option<Vec<u8>> = con.rpoplpush(src, dst).await?;
        Ok(task)
    }

    async fn len(&self, queue: &str) -> Result<usize, StoreError> {
        let mut con = self.con.clone();
        let len: usize = con.llen(queue).await?;
        Ok(len)
    }

    async fn list(&self, queue: &str) -> Result<Vec<String>, StoreError> {
        let mut con = self.con.clone();
        let tasks: Vec<Vec<u8>> = con.lrange(queue, 0, -1).await?;
        Ok(tasks
            .iter()
            .map(|task| String::from_utf8_lossy(task).into_owned())
            .collect())
    }
}

/// listener channel に `"<claimed> <KIND> <task>"` を publish する EventSink
#[derive(Clone)]
pub struct RedisEventSink {
    con: ConnectionManager,
    channel: String,
}

impl RedisEventSink {
    pub async fn connect(url: &str, channel: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            con: open(url).await?,
            channel: channel.into(),
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait]
impl EventSink for RedisEventSink {
    async fn emit(&self, event: &WorkerEvent) -> Result<(), StoreError> {
        let mut con = self.con.clone();
        let receivers: usize = con
            .publish(&self.channel, event.channel_message())
            .await?;
        debug!(channel = %self.channel, receivers, kind = %event.kind, "event published");
        Ok(())
    }
}

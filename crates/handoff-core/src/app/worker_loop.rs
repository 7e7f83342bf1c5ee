//! Worker - claim → parse → execute → complete のループ
//!
//! # フロー
//! 1. QueueStore::claim() で input から claimed へ原子的に移す（timeout 付きで待つ）
//! 2. Task::parse() で 3 フィールドに分解
//! 3. TaskHandler::handle() で実行 → Outcome
//! 4. 成功なら output へ push、失敗なら failed（未設定なら output）へ push
//! 5. claimed から 1 件 remove
//!
//! 不正なタスクは handler に渡さず、dead-letter があればそこへ移し、
//! 無ければ claimed に残してログに出します。
//!
//! # 並行性
//! - 1 Worker は 1 タスクずつ処理する（内部で spawn しない）
//! - スケールは Worker を複数起動して行う（排他は claim の原子性だけに依存）
//! - shutdown はイテレーションの間でだけ確認する（処理中のタスクは最後まで完了させる）

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::{QueueCounts, WorkerConfig};
use crate::domain::{
    EventKind, HandoffError, Outcome, Task, TaskParseError, TaskState, WorkerEvent, WorkerId,
};
use crate::impls::NoopEventSink;
use crate::ports::{EventSink, QueueStore, TaskHandler};

/// 1 イテレーションの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iteration {
    /// timeout までタスクが来なかった
    Idle,
    /// output に書き込んだ
    Completed(Task),
    /// handler が失敗を返し、failure queue に書き込んだ
    Failed { task: Task, reason: String },
    /// 不正なタスクを dead-letter に移した
    DeadLettered(TaskParseError),
    /// 不正なタスクだが dead-letter が無いので claimed に残した
    LeftInClaimed(TaskParseError),
}

impl Iteration {
    /// タスクの最終状態（Idle なら None）
    pub fn state(&self) -> Option<TaskState> {
        match self {
            Self::Idle => None,
            Self::Completed(_) => Some(TaskState::Done),
            Self::Failed { .. } => Some(TaskState::Failed),
            Self::DeadLettered(_) | Self::LeftInClaimed(_) => Some(TaskState::Discarded),
        }
    }
}

pub struct Worker {
    id: WorkerId,
    config: WorkerConfig,
    store: Arc<dyn QueueStore>,
    handler: Arc<dyn TaskHandler>,
    events: Arc<dyn EventSink>,
}

impl Worker {
    /// 設定を検証して Worker を作る（ストアへの接続は呼び出し側で済ませておく）
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn QueueStore>,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<Self, HandoffError> {
        config.validate()?;
        Ok(Self {
            id: WorkerId::generate(),
            config,
            store,
            handler,
            events: Arc::new(NoopEventSink),
        })
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// shutdown が true になるか、致命的なエラーが起きるまでループする
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<(), HandoffError> {
        if self.config.recover_on_start {
            self.recover_claimed().await?;
        }
        info!(
            worker = %self.id,
            queue = %self.config.input_queue,
            "worker listening"
        );
        while !*shutdown.borrow() {
            let iteration = self.run_once().await?;
            debug!(worker = %self.id, state = ?iteration.state(), "iteration finished");
        }
        info!(worker = %self.id, "worker stopped");
        Ok(())
    }

    /// 1 タスク分（または 1 回の idle）だけ処理する
    pub async fn run_once(&self) -> Result<Iteration, HandoffError> {
        let Some(raw) = self.claim().await? else {
            info!(
                worker = %self.id,
                queue = %self.config.input_queue,
                timeout_secs = self.config.claim_timeout.as_secs(),
                "no task available, still waiting"
            );
            return Ok(Iteration::Idle);
        };

        let shown = String::from_utf8_lossy(&raw);
        info!(worker = %self.id, task = %shown, "<- claimed task");
        self.emit(EventKind::Taken, &shown, None).await;

        let task = match Task::from_utf8(&raw, self.config.delimiter) {
            Ok(task) => task,
            Err(e) => return self.discard(&raw, e).await,
        };

        debug!(
            worker = %self.id,
            nature = task.nature(),
            process = task.process(),
            product = task.product(),
            "executing task"
        );
        match self.handler.handle(&task).await {
            Outcome::Success => {
                self.complete(&self.config.output_queue, task.raw().as_bytes())
                    .await?;
                info!(worker = %self.id, task = %task, queue = %self.config.output_queue, "-> done");
                self.emit(EventKind::Done, task.raw(), None).await;
                Ok(Iteration::Completed(task))
            }
            Outcome::Failure { reason } => {
                let queue = self.config.failure_queue();
                self.complete(queue, task.raw().as_bytes()).await?;
                warn!(worker = %self.id, task = %task, queue, reason = %reason, "-> failed");
                self.emit(EventKind::Failed, task.raw(), Some(&reason)).await;
                Ok(Iteration::Failed { task, reason })
            }
        }
    }

    /// claimed に残っているタスクをすべて input に戻す（古い順）
    ///
    /// claimed を共有している生きた Worker がいると、その処理中タスクまで戻してしまう。
    pub async fn recover_claimed(&self) -> Result<usize, HandoffError> {
        let claimed = &self.config.claimed_queue;
        let input = &self.config.input_queue;
        debug!(worker = %self.id, queue = %claimed, "cleaning claimed queue");

        let mut moved = 0;
        while let Some(task) = self
            .config
            .store_retry
            .run("recover", claimed, || self.store.move_one(claimed, input))
            .await?
        {
            let task = String::from_utf8_lossy(&task);
            debug!(task = %task, from = %claimed, to = %input, "moving task back");
            self.emit(EventKind::Recovered, &task, None).await;
            moved += 1;
        }
        if moved > 0 {
            warn!(worker = %self.id, moved, from = %claimed, to = %input, "recovered unfinished tasks");
        }
        Ok(moved)
    }

    pub async fn counts(&self) -> Result<QueueCounts, HandoffError> {
        QueueCounts::read(self.store.as_ref(), &self.config).await
    }

    async fn claim(&self) -> Result<Option<Vec<u8>>, HandoffError> {
        let config = &self.config;
        config
            .store_retry
            .run("claim", &config.input_queue, || {
                self.store
                    .claim(&config.input_queue, &config.claimed_queue, config.claim_timeout)
            })
            .await
    }

    /// output（または failure queue）へ push してから claimed から remove する
    async fn complete(&self, queue: &str, raw: &[u8]) -> Result<(), HandoffError> {
        let retry = &self.config.store_retry;
        let claimed = &self.config.claimed_queue;

        retry.run("push", queue, || self.store.push_raw(queue, raw)).await?;
        let removed = retry
            .run("remove", claimed, || self.store.remove_one_raw(claimed, raw))
            .await?;
        if removed == 0 {
            warn!(
                worker = %self.id,
                task = %String::from_utf8_lossy(raw),
                queue = %claimed,
                "task was no longer in claimed queue"
            );
        }
        Ok(())
    }

    /// 不正なタスクを dead-letter へ移す。`raw` はストア上のバイト列そのもの
    async fn discard(
        &self,
        raw: &[u8],
        parse_error: TaskParseError,
    ) -> Result<Iteration, HandoffError> {
        let shown = parse_error.raw().to_string();
        warn!(worker = %self.id, task = %shown, error = %parse_error, "illegal task format");

        let Some(dead_letter) = &self.config.dead_letter_queue else {
            error!(
                worker = %self.id,
                task = %shown,
                queue = %self.config.claimed_queue,
                "no dead-letter queue configured, task left in claimed queue"
            );
            self.emit(EventKind::Stuck, &shown, Some(&parse_error.to_string()))
                .await;
            return Ok(Iteration::LeftInClaimed(parse_error));
        };

        self.complete(dead_letter, raw).await?;
        info!(worker = %self.id, task = %shown, queue = %dead_letter, "-> dead-lettered");
        self.emit(EventKind::Dead, &shown, Some(&parse_error.to_string()))
            .await;
        Ok(Iteration::DeadLettered(parse_error))
    }

    async fn emit(&self, kind: EventKind, task: &str, detail: Option<&str>) {
        let mut event = WorkerEvent::new(self.id, kind, &self.config.claimed_queue, task);
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        if let Err(e) = self.events.emit(&event).await {
            warn!(worker = %self.id, kind = %kind, error = %e, "could not emit event");
        }
    }
}

//! デモ用の handler
//!
//! 実際の仕事の代わりに、1 秒ごとに進捗を出しながら指定秒数だけ待ちます。

use std::time::Duration;

use async_trait::async_trait;
use handoff_core::domain::{Outcome, Task};
use handoff_core::ports::TaskHandler;
use tracing::{debug, info};

pub struct SimulatedWork {
    duration: Duration,
    tick: Duration,
}

impl SimulatedWork {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            tick: Duration::from_secs(1),
        }
    }
}

#[async_trait]
impl TaskHandler for SimulatedWork {
    async fn handle(&self, task: &Task) -> Outcome {
        info!(
            nature = task.nature(),
            product = task.product(),
            process = task.process(),
            "executing"
        );
        let mut elapsed = Duration::ZERO;
        while elapsed < self.duration {
            let step = self.tick.min(self.duration - elapsed);
            tokio::time::sleep(step).await;
            elapsed += step;
            debug!(task = %task, elapsed_secs = elapsed.as_secs(), ".");
        }
        Outcome::success()
    }
}

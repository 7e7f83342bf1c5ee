//! TaskHandler port - 実際の「仕事」
//!
//! Worker は claim したタスクをパースして TaskHandler に渡し、
//! 返ってきた Outcome で完了先のキューを決めます。仕事の中身は Worker の外側です。

use std::future::Future;

use async_trait::async_trait;

use crate::domain::{Outcome, Task};

/// A handler for claimed tasks.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: &Task) -> Outcome;
}

/// Closure-backed handler, see [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// async クロージャを TaskHandler にする
///
/// # Example
/// ```
/// use handoff_core::domain::Outcome;
/// use handoff_core::ports::handler_fn;
///
/// let handler = handler_fn(|task| async move {
///     println!("executing {}", task.nature());
///     Outcome::success()
/// });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Task) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> TaskHandler for FnHandler<F>
where
    F: Fn(Task) -> Fut + Send + Sync,
    Fut: Future<Output = Outcome> + Send,
{
    async fn handle(&self, task: &Task) -> Outcome {
        (self.f)(task.clone()).await
    }
}

#[async_trait]
impl<H: TaskHandler + ?Sized> TaskHandler for std::sync::Arc<H> {
    async fn handle(&self, task: &Task) -> Outcome {
        (**self).handle(task).await
    }
}

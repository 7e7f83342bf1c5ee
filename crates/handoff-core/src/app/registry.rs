//! HandlerRegistry - nature ごとの handler 登録
//!
//! タスクの先頭フィールド（nature）で handler を選びます。
//! Registry 自体が TaskHandler なので、そのまま Worker に渡せます。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{Outcome, Task};
use crate::ports::TaskHandler;

/// RegistryError は HandlerRegistry の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("handler for nature '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Registry of handlers (nature -> handler).
///
/// Design:
/// - Built during initialization (mutable).
/// - Used during runtime (immutable, shared behind `Arc`).
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
    fallback: Option<Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        nature: impl Into<String>,
        handler: Arc<dyn TaskHandler>,
    ) -> Result<(), RegistryError> {
        let nature = nature.into();
        if self.handlers.contains_key(&nature) {
            return Err(RegistryError::AlreadyRegistered(nature));
        }
        self.handlers.insert(nature, handler);
        Ok(())
    }

    /// 未登録の nature を受け取る handler
    pub fn with_fallback(mut self, handler: Arc<dyn TaskHandler>) -> Self {
        self.fallback = Some(handler);
        self
    }

    pub fn get(&self, nature: &str) -> Option<&Arc<dyn TaskHandler>> {
        self.handlers.get(nature).or(self.fallback.as_ref())
    }

    pub fn natures(&self) -> Vec<String> {
        let mut natures: Vec<String> = self.handlers.keys().cloned().collect();
        natures.sort();
        natures
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl TaskHandler for HandlerRegistry {
    async fn handle(&self, task: &Task) -> Outcome {
        match self.get(task.nature()) {
            Some(handler) => handler.handle(task).await,
            None => {
                warn!(task = %task, nature = task.nature(), "no handler registered");
                Outcome::failure(format!("no handler for nature {:?}", task.nature()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::handler_fn;

    fn ok_handler() -> Arc<dyn TaskHandler> {
        Arc::new(handler_fn(|_| async { Outcome::success() }))
    }

    fn tagged_failure(tag: &'static str) -> Arc<dyn TaskHandler> {
        Arc::new(handler_fn(move |_| async move { Outcome::failure(tag) }))
    }

    #[tokio::test]
    async fn dispatches_by_nature() {
        let mut registry = HandlerRegistry::new();
        registry.register("build", ok_handler()).unwrap();
        registry.register("paint", tagged_failure("paint")).unwrap();

        let build = Task::parse("build/lineA/partX", '/').unwrap();
        let paint = Task::parse("paint/lineA/partX", '/').unwrap();
        assert!(registry.handle(&build).await.is_success());
        assert_eq!(registry.handle(&paint).await, Outcome::failure("paint"));
        assert_eq!(registry.natures(), vec!["build", "paint"]);
    }

    #[test]
    fn double_registration_is_an_error() {
        let mut registry = HandlerRegistry::new();
        registry.register("build", ok_handler()).unwrap();
        let result = registry.register("build", ok_handler());
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(n)) if n == "build"));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn unknown_nature_fails_without_fallback() {
        let registry = HandlerRegistry::new();
        let task = Task::parse("weld/lineB/partY", '/').unwrap();
        let outcome = registry.handle(&task).await;
        assert!(matches!(outcome, Outcome::Failure { reason } if reason.contains("weld")));
    }

    #[tokio::test]
    async fn unknown_nature_goes_to_fallback() {
        let registry = HandlerRegistry::new().with_fallback(tagged_failure("fallback"));
        let task = Task::parse("weld/lineB/partY", '/').unwrap();
        assert_eq!(registry.handle(&task).await, Outcome::failure("fallback"));
    }
}

//! Named query handlers that nearest-neighbor results can be chained into.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

/// A secondary query, invoked with the template args merged with
/// `closest_results`.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    async fn handle(&self, args: Value) -> anyhow::Result<Value>;
}

/// Adapts a synchronous closure into a [`QueryHandler`].
pub struct FnQueryHandler<F>(pub F);

#[async_trait]
impl<F> QueryHandler for FnQueryHandler<F>
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync,
{
    async fn handle(&self, args: Value) -> anyhow::Result<Value> {
        (self.0)(args)
    }
}

/// Handlers by name. Shared by reference so handlers added or removed at
/// runtime are seen by every engine holding it.
#[derive(Default)]
pub struct QueryRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn QueryHandler>>>,
}

impl std::fmt::Debug for QueryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRegistry").finish_non_exhaustive()
    }
}

impl QueryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler` under `name`, returning the one it replaced.
    pub async fn register(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn QueryHandler>,
    ) -> Option<Arc<dyn QueryHandler>> {
        let name = name.into();
        tracing::debug!(query = %name, "query handler registered");
        self.handlers.write().await.insert(name, handler)
    }

    pub async fn register_fn<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnQueryHandler(handler))).await;
    }

    pub async fn unregister(&self, name: &str) -> Option<Arc<dyn QueryHandler>> {
        self.handlers.write().await.remove(name)
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn QueryHandler>> {
        self.handlers.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

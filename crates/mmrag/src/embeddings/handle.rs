//! Process-wide, lazily initialized model handle

use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::Result;

/// Initialize-once shared reference to a model.
///
/// The first caller runs the initializer; concurrent callers wait for that
/// same initialization and every later caller gets the cached `Arc`. A failed
/// initialization is not cached, so the next caller tries again.
pub struct ModelHandle<T: ?Sized> {
    name: String,
    cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized> ModelHandle<T> {
    /// Empty handle
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cell: OnceCell::new(),
        }
    }

    /// Handle that is already initialized
    pub fn ready(name: impl Into<String>, value: Arc<T>) -> Self {
        Self {
            name: name.into(),
            cell: OnceCell::new_with(Some(value)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model, if it has been loaded
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Return the model, running `init` if nobody has loaded it yet
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<T>>>,
    {
        let value = self
            .cell
            .get_or_try_init(|| async {
                tracing::info!(model = %self.name, "Loading embedding backend");
                let loaded = init().await;
                if let Err(e) = &loaded {
                    tracing::warn!(model = %self.name, "Embedding backend failed to load: {}", e);
                }
                loaded
            })
            .await?;
        Ok(Arc::clone(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_initialize_once() {
        let handle = Arc::new(ModelHandle::<String>::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let handle = Arc::clone(&handle);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    handle
                        .get_or_init(|| async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(Arc::new("model".to_string()))
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let model = task.await.unwrap().unwrap();
            assert_eq!(model.as_str(), "model");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(handle.is_initialized());
    }

    #[tokio::test]
    async fn test_failed_init_is_retried() {
        let handle = ModelHandle::<u32>::new("flaky");

        let first = handle
            .get_or_init(|| async { Err(Error::model_unavailable("not yet")) })
            .await;
        assert!(matches!(first, Err(Error::ModelUnavailable(_))));
        assert!(handle.get().is_none());

        let second = handle.get_or_init(|| async { Ok(Arc::new(7)) }).await.unwrap();
        assert_eq!(*second, 7);
        assert_eq!(handle.get().map(|v| *v), Some(7));
    }

    #[test]
    fn test_ready_handle_skips_init() {
        let handle = ModelHandle::ready("preloaded", Arc::new(1u8));
        let value = tokio_test::block_on(
            handle.get_or_init(|| async { Err(Error::internal("initializer must not run")) }),
        )
        .unwrap();
        assert_eq!(*value, 1);
        assert!(handle.is_initialized());
    }
}

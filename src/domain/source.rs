use std::{future::Future, pin::Pin, sync::Arc};

use super::SourceError;

/// Supplier of one uniformly distributed integer in `[min, max]`.
#[async_trait::async_trait]
pub trait RandomIntegerSource: Send + Sync + 'static {
    async fn fetch_integer(&self, min: i64, max: i64) -> Result<i64, SourceError>;
}

type SourceFuture = Pin<Box<dyn Future<Output = Result<i64, SourceError>> + Send>>;

/// Thin wrapper around a boxed async fn, so callers can plug in any
/// integer supplier without writing a new type.
#[derive(Clone)]
pub struct FnSource {
    inner: Arc<dyn Fn(i64, i64) -> SourceFuture + Send + Sync>,
}

impl FnSource {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(i64, i64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<i64, SourceError>> + Send + 'static,
    {
        Self { inner: Arc::new(move |min, max| Box::pin(f(min, max))) }
    }

    /// Always answers `value`, whatever range is asked for.
    pub fn fixed(value: i64) -> Self {
        Self::new(move |_, _| async move { Ok(value) })
    }
}

#[async_trait::async_trait]
impl RandomIntegerSource for FnSource {
    async fn fetch_integer(&self, min: i64, max: i64) -> Result<i64, SourceError> {
        (self.inner)(min, max).await
    }
}

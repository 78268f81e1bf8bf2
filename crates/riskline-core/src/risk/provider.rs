//! The seam to whatever supplies risk data.
//!
//! Transport (HTTP, pagination, retries) lives behind this trait and is not
//! part of the engine; hosts plug in their own implementation.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::TtlCache;
use crate::error::Result;

use super::Risk;

/// Asynchronous source of risk findings for a single file, addressed by its
/// repository-relative path.
#[async_trait]
pub trait RiskProvider: Send + Sync {
    async fn risks_for_file(&self, relative_path: &str) -> Result<Vec<Risk>>;
}

/// TTL-cached decorator around another provider, so rapid highlight cycles
/// on the same file reuse one upstream call per window.
pub struct CachedRiskProvider<P> {
    inner: P,
    cache: TtlCache<String, Vec<Risk>>,
}

impl<P: RiskProvider> CachedRiskProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

#[async_trait]
impl<P: RiskProvider> RiskProvider for CachedRiskProvider<P> {
    async fn risks_for_file(&self, relative_path: &str) -> Result<Vec<Risk>> {
        let key = format!("risks_{relative_path}");
        if let Some(risks) = self.cache.get(&key) {
            return Ok(risks);
        }

        let risks = self.inner.risks_for_file(relative_path).await?;
        self.cache.set(key, risks.clone());
        Ok(risks)
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::gateway::{ContractGateway, GatewayError};
use crate::model::{Contract, UnitId};

struct CacheEntry {
    contracts: Arc<[Contract]>,
    fetched_at: Instant,
}

/// Per-unit TTL cache in front of another gateway.
///
/// Only successful fetches are cached, so unknown units and store faults are
/// re-checked on every call.
pub struct CachingGateway<G> {
    inner: G,
    ttl: Duration,
    entries: DashMap<UnitId, CacheEntry>,
}

impl<G: ContractGateway> CachingGateway<G> {
    pub fn new(inner: G, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Drop the cached contracts of one unit (e.g. after a booking changed).
    pub fn invalidate(&self, unit_id: &str) {
        self.entries.remove(unit_id);
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn cached_units(&self) -> usize {
        self.entries.len()
    }

    fn lookup(&self, unit_id: &str) -> Option<Arc<[Contract]>> {
        let entry = self.entries.get(unit_id)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.contracts.clone())
        } else {
            None
        }
    }
}

#[async_trait]
impl<G: ContractGateway> ContractGateway for CachingGateway<G> {
    async fn fetch_contracts(&self, unit_id: &str) -> Result<Arc<[Contract]>, GatewayError> {
        if let Some(contracts) = self.lookup(unit_id) {
            metrics::counter!(crate::observability::CACHE_HITS_TOTAL).increment(1);
            return Ok(contracts);
        }
        metrics::counter!(crate::observability::CACHE_MISSES_TOTAL).increment(1);

        let contracts = self.inner.fetch_contracts(unit_id).await?;
        self.entries.insert(
            unit_id.to_string(),
            CacheEntry {
                contracts: contracts.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(contracts)
    }
}

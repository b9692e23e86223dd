//! Read interface to the external contract store.
//!
//! The engine only ever reads contract snapshots through [`ContractGateway`].
//! [`InMemoryGateway`] backs tests, benchmarks and the CLI; caching lives in
//! [`crate::cache`] as a wrapper around any gateway.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::model::{Contract, UnitId};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The store has no rental unit with this id.
    #[error("unknown rental unit: {0}")]
    UnknownUnit(UnitId),
    #[error("contract store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid contract snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies every contract (live or not) for one rental unit.
///
/// Implementations must fail with [`GatewayError::UnknownUnit`] for ids they
/// cannot resolve so the engine can tell "no such unit" from store faults.
/// Timeouts and retries are the implementation's concern.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    async fn fetch_contracts(&self, unit_id: &str) -> Result<Arc<[Contract]>, GatewayError>;
}

#[async_trait]
impl<G: ContractGateway + ?Sized> ContractGateway for Arc<G> {
    async fn fetch_contracts(&self, unit_id: &str) -> Result<Arc<[Contract]>, GatewayError> {
        (**self).fetch_contracts(unit_id).await
    }
}

/// On-disk snapshot format: `{"units": {"<unit id>": [Contract, ...]}}`.
#[derive(Debug, Deserialize)]
struct Snapshot {
    units: HashMap<UnitId, Vec<Contract>>,
}

pub struct InMemoryGateway {
    units: DashMap<UnitId, Arc<[Contract]>>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self {
            units: DashMap::new(),
        }
    }

    pub fn from_snapshot_reader(reader: impl Read) -> Result<Self, GatewayError> {
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        let gateway = Self::new();
        for (unit_id, contracts) in snapshot.units {
            gateway.insert_unit(unit_id, contracts);
        }
        Ok(gateway)
    }

    pub fn load_snapshot(path: &Path) -> Result<Self, GatewayError> {
        let file = File::open(path)?;
        Self::from_snapshot_reader(BufReader::new(file))
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn contains_unit(&self, unit_id: &str) -> bool {
        self.units.contains_key(unit_id)
    }

    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.units.iter().map(|e| e.key().clone()).collect()
    }

    /// Register a unit, replacing any contracts it had before.
    pub fn insert_unit(&self, unit_id: impl Into<UnitId>, contracts: Vec<Contract>) {
        self.units.insert(unit_id.into(), contracts.into());
    }

    /// Insert or replace (by contract id) a single contract on an existing unit.
    pub fn upsert_contract(&self, unit_id: &str, contract: Contract) -> Result<(), GatewayError> {
        let mut entry = self
            .units
            .get_mut(unit_id)
            .ok_or_else(|| GatewayError::UnknownUnit(unit_id.to_string()))?;
        let mut contracts = entry.to_vec();
        match contracts.iter_mut().find(|c| c.id == contract.id) {
            Some(existing) => *existing = contract,
            None => contracts.push(contract),
        }
        *entry = contracts.into();
        Ok(())
    }

    pub fn remove_unit(&self, unit_id: &str) -> Option<Arc<[Contract]>> {
        self.units.remove(unit_id).map(|(_, contracts)| contracts)
    }
}

#[async_trait]
impl ContractGateway for InMemoryGateway {
    async fn fetch_contracts(&self, unit_id: &str) -> Result<Arc<[Contract]>, GatewayError> {
        self.units
            .get(unit_id)
            .map(|e| e.value().clone())
            .ok_or_else(|| GatewayError::UnknownUnit(unit_id.to_string()))
    }
}

use chrono::TimeDelta;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

pub(crate) fn validate_range(range: &DateRange, max_window: TimeDelta) -> Result<(), EngineError> {
    if !range.is_valid() {
        return Err(EngineError::Validation(format!(
            "requested range start {} must be before end {}",
            range.start.to_rfc3339(),
            range.end.to_rfc3339()
        )));
    }
    if range.duration() > max_window {
        return Err(EngineError::LimitExceeded("requested range too wide"));
    }
    Ok(())
}

pub(crate) fn validate_unit_id(unit_id: &str) -> Result<(), EngineError> {
    if unit_id.is_empty() {
        return Err(EngineError::Validation("unit id must not be empty".into()));
    }
    if unit_id.len() > MAX_UNIT_ID_LEN {
        return Err(EngineError::LimitExceeded("unit id too long"));
    }
    Ok(())
}

/// Contracts that currently occupy their unit (active, scheduled or pending).
pub fn live_contracts(contracts: &[Contract]) -> impl Iterator<Item = &Contract> {
    contracts.iter().filter(|c| c.is_live())
}

/// Live contracts overlapping `requested`, ascending by start with ties
/// broken by contract id.
pub fn find_conflicts(contracts: &[Contract], requested: &DateRange) -> Vec<Contract> {
    let mut conflicts: Vec<Contract> = live_contracts(contracts)
        .filter(|c| c.occupied_range.overlaps(requested))
        .cloned()
        .collect();
    #[cfg(test)]
    super::availability::work::add(
        &super::availability::work::CONFLICTS_CLONED,
        conflicts.len(),
    );
    conflicts.sort_by(|a, b| {
        a.occupied_range
            .start
            .cmp(&b.occupied_range.start)
            .then_with(|| a.id.cmp(&b.id))
    });
    conflicts
}

/// Short-circuiting variant of [`find_conflicts`] for verdict-only queries.
pub fn has_conflict(contracts: &[Contract], requested: &DateRange) -> bool {
    live_contracts(contracts).any(|c| c.occupied_range.overlaps(requested))
}

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Opaque rental unit ("Mietfach") identifier.
pub type UnitId = String;

/// Opaque contract identifier.
pub type ContractId = String;

/// Half-open date range `[start, end)`.
///
/// Serialised with RFC 3339 timestamps. Deserialisation does not enforce
/// `start < end`; callers validate requested ranges before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end, "DateRange start must be before end");
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Adjacent ranges (`self.end == other.start`) do not overlap.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_range(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Lifecycle state of a contract, owned by the external booking workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Scheduled,
    Pending,
    Cancelled,
    Expired,
}

impl ContractStatus {
    /// Live contracts occupy their unit; cancelled and expired ones never do.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            ContractStatus::Active | ContractStatus::Scheduled | ContractStatus::Pending
        )
    }
}

/// A booking that occupies a rental unit for `occupied_range`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    pub status: ContractStatus,
    pub occupied_range: DateRange,
    /// Display name for conflict reporting only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renter: Option<String>,
}

impl Contract {
    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailabilityOptions {
    /// When false, `conflicts` is left empty even if conflicts exist.
    pub include_conflicts: bool,
    /// When true and the unit is unavailable, search for the next free window.
    pub calculate_next_available: bool,
}

impl Default for AvailabilityOptions {
    fn default() -> Self {
        Self {
            include_conflicts: true,
            calculate_next_available: false,
        }
    }
}

impl AvailabilityOptions {
    /// Both optional computations enabled.
    pub fn full() -> Self {
        Self {
            include_conflicts: true,
            calculate_next_available: true,
        }
    }

    /// Verdict only: the cheapest evaluation.
    pub fn minimal() -> Self {
        Self {
            include_conflicts: false,
            calculate_next_available: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub available: bool,
    /// Live overlapping contracts, ascending by start then id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Contract>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_available: Option<DateRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub unit_id: UnitId,
    pub requested_range: DateRange,
    #[serde(default)]
    pub options: AvailabilityOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchAvailabilityRequest {
    pub unit_ids: Vec<UnitId>,
    pub requested_range: DateRange,
    #[serde(default)]
    pub options: AvailabilityOptions,
}

/// JSON request envelope: `{"op": "availability", ...}` or `{"op": "batch", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Availability(AvailabilityRequest),
    Batch(BatchAvailabilityRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Availability(AvailabilityResult),
    Batch(BatchAvailabilityResponse),
}

// ── Error markers ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Service,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Service => "service",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Per-unit failure recorded in a batch slot instead of aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMarker {
    pub kind: ErrorKind,
    pub unit_id: UnitId,
    pub message: String,
}

/// One batch slot: either a computed result or the error that prevented it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitAvailability {
    Resolved(AvailabilityResult),
    Failed { error: ErrorMarker },
}

impl UnitAvailability {
    pub fn result(&self) -> Option<&AvailabilityResult> {
        match self {
            UnitAvailability::Resolved(result) => Some(result),
            UnitAvailability::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorMarker> {
        match self {
            UnitAvailability::Resolved(_) => None,
            UnitAvailability::Failed { error } => Some(error),
        }
    }

    /// `Some(true)` only for resolved, available units.
    pub fn is_available(&self) -> Option<bool> {
        self.result().map(|r| r.available)
    }
}

/// Unit id → slot, one entry per distinct requested id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchAvailabilityResponse {
    pub units: HashMap<UnitId, UnitAvailability>,
}

impl BatchAvailabilityResponse {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, unit_id: &str) -> Option<&UnitAvailability> {
        self.units.get(unit_id)
    }

    pub fn available_count(&self) -> usize {
        self.units
            .values()
            .filter(|slot| slot.is_available() == Some(true))
            .count()
    }

    /// Ids whose slot holds an error marker, sorted for stable reporting.
    pub fn failed_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .units
            .iter()
            .filter(|(_, slot)| slot.error().is_some())
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}

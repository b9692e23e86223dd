/// Upper bound on distinct unit ids accepted in one batch call.
pub const MAX_BATCH_UNITS: usize = 1000;

/// Widest requested range accepted, in days (~10 years).
pub const MAX_QUERY_WINDOW_DAYS: i64 = 3650;

/// Concurrent per-unit gateway fetches within one batch call.
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

pub const MAX_UNIT_ID_LEN: usize = 256;

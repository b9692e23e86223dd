use std::collections::{HashMap, HashSet};
use std::time::Instant;

use futures::{StreamExt, stream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::model::*;
use crate::observability::{self, BATCH_UNITS, GATEWAY_FAILURES_TOTAL};

use super::availability::evaluate;
use super::conflict::{validate_range, validate_unit_id};
use super::{Engine, EngineError};

impl Engine {
    /// Fetch one unit's contracts and evaluate them. Gateway errors are mapped
    /// but never retried.
    async fn evaluate_unit(
        &self,
        unit_id: &str,
        requested: &DateRange,
        options: &AvailabilityOptions,
    ) -> Result<AvailabilityResult, EngineError> {
        let contracts = self
            .gateway
            .fetch_contracts(unit_id)
            .await
            .map_err(|e| {
                let err = EngineError::from_gateway(unit_id, e);
                metrics::counter!(GATEWAY_FAILURES_TOTAL, "kind" => err.kind().as_str())
                    .increment(1);
                err
            })?;

        let result = evaluate(&contracts, requested, options);
        debug!(
            unit_id,
            available = result.available,
            conflicts = result.conflicts.len(),
            "evaluated rental unit"
        );
        Ok(result)
    }

    pub async fn calculate_availability(
        &self,
        unit_id: &str,
        requested: DateRange,
        options: AvailabilityOptions,
    ) -> Result<AvailabilityResult, EngineError> {
        let started = Instant::now();
        let result = match validate_unit_id(unit_id)
            .and_then(|()| validate_range(&requested, self.config.max_query_window))
        {
            Ok(()) => self.evaluate_unit(unit_id, &requested, &options).await,
            Err(e) => Err(e),
        };
        observability::record_query(
            "availability",
            observability::outcome_label(&result),
            started,
        );
        result
    }

    /// Evaluate many units; see [`Engine::calculate_batch_availability_with_cancel`].
    pub async fn calculate_batch_availability(
        &self,
        request: &BatchAvailabilityRequest,
    ) -> Result<BatchAvailabilityResponse, EngineError> {
        self.calculate_batch_availability_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Evaluate every distinct unit in `request`, at most
    /// `config.max_concurrency` gateway fetches at a time.
    ///
    /// Request-level validation failures abort the whole call. Per-unit
    /// failures, malformed unit ids included, are recorded in that unit's
    /// slot. Once `cancel` fires no new fetches start, in-flight ones are
    /// abandoned, and every unresolved unit gets a `cancelled` marker; units
    /// already resolved keep their results.
    pub async fn calculate_batch_availability_with_cancel(
        &self,
        request: &BatchAvailabilityRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchAvailabilityResponse, EngineError> {
        let started = Instant::now();
        let result = self.run_batch(request, cancel).await;
        observability::record_query("batch", observability::outcome_label(&result), started);
        result
    }

    async fn run_batch(
        &self,
        request: &BatchAvailabilityRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchAvailabilityResponse, EngineError> {
        if request.unit_ids.is_empty() {
            return Err(EngineError::Validation("unitIds must not be empty".into()));
        }
        validate_range(&request.requested_range, self.config.max_query_window)?;

        let mut seen = HashSet::with_capacity(request.unit_ids.len());
        let unit_ids: Vec<&str> = request
            .unit_ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();
        if unit_ids.len() > self.config.max_batch_units {
            return Err(EngineError::LimitExceeded("too many unit ids"));
        }
        metrics::histogram!(BATCH_UNITS).record(unit_ids.len() as f64);

        let requested = &request.requested_range;
        let options = &request.options;
        let concurrency = self.config.max_concurrency.max(1);

        let slots: Vec<(UnitId, UnitAvailability)> = stream::iter(unit_ids)
            .map(|unit_id| async move {
                // A malformed id fails only its own slot
                let outcome = if let Err(e) = validate_unit_id(unit_id) {
                    Err(e)
                } else if cancel.is_cancelled() {
                    Err(EngineError::Cancelled(unit_id.to_string()))
                } else {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(EngineError::Cancelled(unit_id.to_string())),
                        result = self.evaluate_unit(unit_id, requested, options) => result,
                    }
                };
                (unit_id.to_string(), into_slot(unit_id, outcome))
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let units: HashMap<UnitId, UnitAvailability> = slots.into_iter().collect();
        let response = BatchAvailabilityResponse { units };
        let failed = response.failed_ids().len();
        if cancel.is_cancelled() {
            info!(
                units = response.len(),
                failed, "batch availability cancelled, returning partial results"
            );
        } else {
            info!(
                units = response.len(),
                available = response.available_count(),
                failed,
                "batch availability computed"
            );
        }
        Ok(response)
    }

    /// Dispatch a JSON-level request envelope.
    pub async fn execute(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Response, EngineError> {
        match request {
            Request::Availability(req) => self
                .calculate_availability(&req.unit_id, req.requested_range, req.options)
                .await
                .map(Response::Availability),
            Request::Batch(req) => self
                .calculate_batch_availability_with_cancel(req, cancel)
                .await
                .map(Response::Batch),
        }
    }
}

fn into_slot(unit_id: &str, outcome: Result<AvailabilityResult, EngineError>) -> UnitAvailability {
    match outcome {
        Ok(result) => UnitAvailability::Resolved(result),
        Err(e) => {
            if !matches!(e, EngineError::Cancelled(_)) {
                warn!("unit {unit_id} recorded as failed: {e}");
            }
            UnitAvailability::Failed {
                error: e.to_marker(unit_id),
            }
        }
    }
}

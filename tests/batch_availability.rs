use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use mietfach::model::*;
use mietfach::{CachingGateway, ContractGateway, Engine, EngineConfig, InMemoryGateway};

// ── Test infrastructure ──────────────────────────────────────

const SNAPSHOT: &str = r#"{
    "units": {
        "regal-01": [
            {
                "id": "v-100",
                "status": "active",
                "occupiedRange": {"start": "2025-01-10T00:00:00Z", "end": "2025-01-20T00:00:00Z"},
                "renter": "Strickwaren Otto"
            },
            {
                "id": "v-101",
                "status": "scheduled",
                "occupiedRange": {"start": "2025-01-25T00:00:00Z", "end": "2025-01-31T00:00:00Z"},
                "renter": "Holzkunst Berger"
            }
        ],
        "regal-02": [
            {
                "id": "v-200",
                "status": "cancelled",
                "occupiedRange": {"start": "2024-12-01T00:00:00Z", "end": "2025-03-01T00:00:00Z"}
            }
        ],
        "regal-03": [
            {
                "id": "v-300",
                "status": "expired",
                "occupiedRange": {"start": "2024-11-01T00:00:00Z", "end": "2025-01-05T00:00:00Z"}
            },
            {
                "id": "v-301",
                "status": "pending",
                "occupiedRange": {"start": "2025-01-05T00:00:00Z", "end": "2025-01-12T00:00:00Z"},
                "renter": "Seifenmanufaktur"
            }
        ],
        "regal-04": []
    }
}"#;

fn snapshot_engine(config: EngineConfig) -> Engine {
    let store = InMemoryGateway::from_snapshot_reader(SNAPSHOT.as_bytes()).unwrap();
    Engine::with_config(Arc::new(store), config)
}

fn january() -> DateRange {
    serde_json::from_value(json!({
        "start": "2025-01-01T00:00:00Z",
        "end": "2025-02-01T00:00:00Z"
    }))
    .unwrap()
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn batch_over_snapshot_reports_every_unit() {
    let engine = snapshot_engine(EngineConfig::default());
    let request = BatchAvailabilityRequest {
        unit_ids: vec![
            "regal-01".into(),
            "regal-02".into(),
            "regal-03".into(),
            "regal-04".into(),
            "regal-99".into(),
        ],
        requested_range: january(),
        options: AvailabilityOptions::full(),
    };

    let response = engine.calculate_batch_availability(&request).await.unwrap();
    assert_eq!(response.len(), 5);
    assert_eq!(response.available_count(), 2); // regal-02 (cancelled) and regal-04 (empty)
    assert_eq!(response.failed_ids(), vec!["regal-99"]);

    let busy = response.get("regal-01").unwrap().result().unwrap();
    let ids: Vec<&str> = busy.conflicts.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["v-100", "v-101"]);
    assert!(busy.next_available.is_some());

    let pending = response.get("regal-03").unwrap().result().unwrap();
    assert_eq!(pending.conflicts.len(), 1);
    assert_eq!(pending.conflicts[0].renter.as_deref(), Some("Seifenmanufaktur"));
}

#[tokio::test]
async fn batch_response_serializes_as_keyed_map() {
    let engine = snapshot_engine(EngineConfig::default());
    let request: Request = serde_json::from_value(json!({
        "op": "batch",
        "unitIds": ["regal-01", "regal-04", "regal-99"],
        "requestedRange": {"start": "2025-01-12T00:00:00Z", "end": "2025-01-14T00:00:00Z"},
        "options": {"includeConflicts": true, "calculateNextAvailable": true}
    }))
    .unwrap();

    let response = engine.execute(&request, &CancellationToken::new()).await.unwrap();
    let value = serde_json::to_value(&response).unwrap();

    assert_eq!(value["regal-04"], json!({"available": true}));
    assert_eq!(value["regal-01"]["available"], false);
    assert_eq!(value["regal-01"]["conflicts"][0]["occupiedRange"]["start"], "2025-01-10T00:00:00Z");
    assert_eq!(
        value["regal-01"]["nextAvailable"],
        json!({"start": "2025-01-20T00:00:00Z", "end": "2025-01-22T00:00:00Z"})
    );
    assert_eq!(value["regal-99"]["error"]["kind"], "not_found");
    assert_eq!(value["regal-99"]["error"]["unitId"], "regal-99");
}

#[tokio::test]
async fn minimal_options_keep_verdicts() {
    let engine = snapshot_engine(EngineConfig::default());
    let ids: Vec<UnitId> = ["regal-01", "regal-02", "regal-03", "regal-04"]
        .into_iter()
        .map(String::from)
        .collect();

    let full = engine
        .calculate_batch_availability(&BatchAvailabilityRequest {
            unit_ids: ids.clone(),
            requested_range: january(),
            options: AvailabilityOptions::full(),
        })
        .await
        .unwrap();
    let minimal = engine
        .calculate_batch_availability(&BatchAvailabilityRequest {
            unit_ids: ids.clone(),
            requested_range: january(),
            options: AvailabilityOptions::minimal(),
        })
        .await
        .unwrap();

    for id in &ids {
        let f = full.get(id).unwrap().result().unwrap();
        let m = minimal.get(id).unwrap().result().unwrap();
        assert_eq!(f.available, m.available, "unit {id}");
        assert!(m.conflicts.is_empty());
        assert!(m.next_available.is_none());
    }
}

#[tokio::test]
async fn cached_gateway_serves_repeated_batches() {
    let store = InMemoryGateway::from_snapshot_reader(SNAPSHOT.as_bytes()).unwrap();
    let cache = Arc::new(CachingGateway::new(store, Duration::from_secs(300)));
    let engine = Engine::new(cache.clone());
    let request = BatchAvailabilityRequest {
        unit_ids: vec!["regal-01".into(), "regal-04".into()],
        requested_range: january(),
        options: AvailabilityOptions::default(),
    };

    let first = engine.calculate_batch_availability(&request).await.unwrap();
    assert_eq!(cache.cached_units(), 2);

    // Upstream change is invisible until the unit is invalidated
    cache.inner().insert_unit("regal-01", vec![]);
    let second = engine.calculate_batch_availability(&request).await.unwrap();
    assert_eq!(first, second);

    cache.invalidate("regal-01");
    let third = engine.calculate_batch_availability(&request).await.unwrap();
    assert_eq!(third.available_count(), 2);
    assert_eq!(cache.fetch_contracts("regal-01").await.unwrap().len(), 0);
}

#[tokio::test]
async fn many_concurrent_callers_share_one_engine() {
    let engine = Arc::new(snapshot_engine(EngineConfig {
        max_concurrency: 2,
        ..EngineConfig::default()
    }));

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let unit = if i % 2 == 0 { "regal-01" } else { "regal-04" };
            engine
                .calculate_availability(unit, january(), AvailabilityOptions::default())
                .await
                .map(|r| (unit, r.available))
        }));
    }

    for handle in handles {
        let (unit, available) = handle.await.unwrap().unwrap();
        assert_eq!(available, unit == "regal-04");
    }
}

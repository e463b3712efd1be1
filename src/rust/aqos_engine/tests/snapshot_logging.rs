use aqos_config::PolicyConfig;
use aqos_engine::classifier::{ClassifierBackend, ClassifierError, FEATURE_COUNT};
use aqos_engine::{Classifier, CongestionState, CounterReading, MetricsEngine, SnapshotLogger};
use aqos_store::{SnapshotRecord, SnapshotStore, SqliteStore, StoreError, StoredSnapshot};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const BACKOFF: Duration = Duration::from_millis(1);

#[derive(Default, Clone)]
struct Recording {
    inserted: Arc<Mutex<Vec<SnapshotRecord>>>,
}

impl SnapshotStore for Recording {
    fn insert(&self, record: &SnapshotRecord, _: DateTime<Utc>) -> Result<(), StoreError> {
        self.inserted.lock().push(record.clone());
        Ok(())
    }

    fn query(&self, _: usize) -> Result<Vec<StoredSnapshot>, StoreError> {
        Ok(Vec::new())
    }
}

fn reading() -> CounterReading {
    CounterReading {
        bytes_sent: 0,
        bytes_recv: 0,
        timestamp: 1.0,
        taken_at: Instant::now(),
    }
}

fn engine_with(classifier: Classifier, load: f64) -> MetricsEngine {
    let engine =
        MetricsEngine::new(classifier, 100.0, PolicyConfig::default()).expect("valid engine");
    engine.record_sample(load, reading());
    engine
}

fn engine_at(load: f64) -> MetricsEngine {
    engine_with(Classifier::Threshold, load)
}

/// Fails its first prediction, panics on its second, then works.
struct Flaky {
    calls: Arc<AtomicUsize>,
}

impl ClassifierBackend for Flaky {
    fn predict(&self, _: &[f64; FEATURE_COUNT]) -> Result<CongestionState, ClassifierError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Err(ClassifierError::Prediction("model not warmed up".to_string())),
            1 => panic!("model runtime fault"),
            _ => Ok(CongestionState::Med),
        }
    }
}

fn short_cycle() -> Result<Duration, aqos_utils::unix_time::TimeError> {
    Ok(Duration::from_millis(1))
}

#[test]
fn logged_record_matches_snapshot() {
    let logger = SnapshotLogger::new(engine_at(95.0), Recording::default(), BACKOFF);
    let snapshot = logger.log_once().expect("log cycle");
    let logged = logger.store().inserted.lock().clone();
    assert_eq!(logged, vec![SnapshotRecord::from(&snapshot)]);
}

#[test]
fn snapshots_land_in_sqlite() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("metrics.sqlite");

    let logger = SnapshotLogger::new(engine_at(10.0), SqliteStore::new(&path), BACKOFF);
    logger.log_once().expect("first cycle");

    let logger = SnapshotLogger::new(engine_at(95.0), SqliteStore::new(&path), BACKOFF);
    logger.log_once().expect("second cycle");

    let history = SqliteStore::new(&path).query(10).expect("query");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].record.state, "high");
    assert_eq!(history[1].record.state, "low");
    assert!(history[0].id > history[1].id);
}

#[test]
fn run_recovers_from_engine_errors_and_panics() {
    let calls = Arc::new(AtomicUsize::new(0));
    let classifier = Classifier::Model {
        backend: Box::new(Flaky {
            calls: calls.clone(),
        }),
        default_confidence: 90.0,
    };
    let store = Recording::default();
    let logger = SnapshotLogger::new(engine_with(classifier, 60.0), store.clone(), BACKOFF)
        .with_cycle_delay(short_cycle);
    std::thread::spawn(move || logger.run());

    let deadline = Instant::now() + Duration::from_secs(10);
    while store.inserted.lock().is_empty() {
        assert!(Instant::now() < deadline, "logger never recovered");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(calls.load(Ordering::SeqCst) >= 3);
    let first = store.inserted.lock()[0].clone();
    assert_eq!(first.state, "med");
    assert_eq!(first.confidence, 90.0);
}

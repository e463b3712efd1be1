use chrono::{DateTime, Utc};
use serde::Serialize;

/// Flattened snapshot fields, as persisted once per minute.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotRecord {
    pub load_mbps: f64,
    pub voip_kbps: i64,
    pub http_mbps: f64,
    pub ftp_mbps: f64,
    pub arrival_rate: i64,
    pub base_delay_ms: f64,
    pub queue_length: i64,
    pub state: String,
    pub confidence: f64,
    pub infer_time_ms: f64,
    pub bandwidth_voip: i64,
    pub bandwidth_http: i64,
    pub bandwidth_ftp: i64,
    pub queue_voip: i64,
    pub queue_http: i64,
    pub queue_ftp: i64,
    pub link_utilization: i64,
    pub queue_occupancy: i64,
    pub final_delay_ms: f64,
    pub throughput_mbps: f64,
    pub packet_loss: f64,
    pub alert_count: i64,
}

/// A previously persisted snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredSnapshot {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub record: SnapshotRecord,
}

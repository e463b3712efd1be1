//! The per-call metrics snapshot, and its persisted form.

use crate::{
    AlertEvent, Allocation, Classification, CongestionState, DerivedFeatures, PerformanceEstimate,
};
use aqos_store::SnapshotRecord;
use aqos_utils::rounding::round_dp;
use serde::Serialize;

/// Queue length (packets) treated as a full queue.
const QUEUE_CAPACITY_PACKETS: f64 = 500.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrafficView {
    /// Real-time traffic, kbps.
    pub voip: i64,
    /// Interactive traffic, Mbps.
    pub http: f64,
    /// Bulk traffic, Mbps.
    pub ftp: f64,
    pub aggregate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonitoringView {
    pub arrival_rate: u64,
    /// Base queueing delay, ms.
    pub delay: f64,
    pub queue_length: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationView {
    pub state: CongestionState,
    pub confidence: f64,
    /// Inference latency, ms.
    pub infer_time: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouterView {
    pub link_utilization: u8,
    pub queue_occupancy: u8,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceView {
    pub delay: f64,
    pub throughput: f64,
    pub packet_loss: f64,
}

/// Everything a consumer sees for one point in time. Built in a single
/// critical section and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub traffic: TrafficView,
    pub monitoring: MonitoringView,
    pub ml: ClassificationView,
    pub qos: Allocation,
    pub router: RouterView,
    pub performance: PerformanceView,
    pub alerts: Vec<AlertEvent>,
    /// Unix time of the sample the snapshot was built from. `None`
    /// until the sampler has completed a cycle.
    pub timestamp: Option<f64>,
    /// Unrounded load the snapshot was derived from, for persistence.
    #[serde(skip)]
    pub load_mbps: f64,
}

fn percent(value: f64) -> u8 {
    f64::min(100.0, (value * 100.0).floor()).max(0.0) as u8
}

impl MetricsSnapshot {
    pub(crate) fn build(
        timestamp: Option<f64>,
        features: &DerivedFeatures,
        classification: &Classification,
        allocation: Allocation,
        performance: &PerformanceEstimate,
        alerts: Vec<AlertEvent>,
    ) -> Self {
        let queue_length = features.queue_length.max(0.0).floor();
        Self {
            traffic: TrafficView {
                voip: features.traffic.real_time_kbps.round() as i64,
                http: round_dp(features.traffic.interactive_mbps, 1),
                ftp: round_dp(features.traffic.bulk_mbps, 1),
                aggregate: round_dp(features.traffic.aggregate_mbps, 1),
            },
            monitoring: MonitoringView {
                arrival_rate: features.arrival_rate,
                delay: round_dp(features.base_delay_ms, 1),
                queue_length: queue_length as i64,
            },
            ml: ClassificationView {
                state: classification.state,
                confidence: classification.confidence,
                infer_time: classification.inference_ms,
            },
            qos: allocation,
            router: RouterView {
                link_utilization: percent(features.utilization_ratio),
                queue_occupancy: percent(queue_length / QUEUE_CAPACITY_PACKETS),
            },
            performance: PerformanceView {
                delay: round_dp(performance.delay_ms, 1),
                throughput: round_dp(performance.throughput_mbps, 2),
                packet_loss: round_dp(performance.packet_loss, 2),
            },
            alerts,
            timestamp,
            load_mbps: features.load_mbps,
        }
    }
}

impl From<&MetricsSnapshot> for SnapshotRecord {
    fn from(snapshot: &MetricsSnapshot) -> Self {
        let bandwidth = &snapshot.qos.bandwidth;
        let queues = &snapshot.qos.queues;
        SnapshotRecord {
            load_mbps: snapshot.load_mbps,
            voip_kbps: snapshot.traffic.voip,
            http_mbps: snapshot.traffic.http,
            ftp_mbps: snapshot.traffic.ftp,
            arrival_rate: snapshot.monitoring.arrival_rate as i64,
            base_delay_ms: snapshot.monitoring.delay,
            queue_length: snapshot.monitoring.queue_length,
            state: snapshot.ml.state.to_string(),
            confidence: snapshot.ml.confidence,
            infer_time_ms: snapshot.ml.infer_time,
            bandwidth_voip: bandwidth.real_time as i64,
            bandwidth_http: bandwidth.interactive as i64,
            bandwidth_ftp: bandwidth.bulk as i64,
            queue_voip: queues.real_time as i64,
            queue_http: queues.interactive as i64,
            queue_ftp: queues.bulk as i64,
            link_utilization: snapshot.router.link_utilization as i64,
            queue_occupancy: snapshot.router.queue_occupancy as i64,
            final_delay_ms: snapshot.performance.delay,
            throughput_mbps: snapshot.performance.throughput,
            packet_loss: snapshot.performance.packet_loss,
            alert_count: snapshot.alerts.len() as i64,
        }
    }
}

//! Alert generation. Transition alerts fire once per state edge;
//! utilization and loss alerts fire on every snapshot where they hold.

use crate::{Allocation, CongestionState};
use serde::Serialize;

/// Utilization ratio above which a critical alert is raised.
pub const CRITICAL_UTILIZATION: f64 = 0.85;

/// Packet loss (percent) above which a warning is raised.
pub const ELEVATED_LOSS_PERCENT: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Ok,
    Warn,
    Crit,
}

/// One alert as shown to operators.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlertEvent {
    /// Local wall-clock time, `HH:MM:SS`.
    pub time: String,
    pub msg: String,
    pub cls: AlertSeverity,
}

impl AlertEvent {
    fn new(time: &str, msg: impl Into<String>, cls: AlertSeverity) -> Self {
        Self {
            time: time.to_string(),
            msg: msg.into(),
            cls,
        }
    }
}

pub(crate) fn local_clock() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn transition_alert(time: &str, state: CongestionState, allocation: &Allocation) -> AlertEvent {
    match state {
        CongestionState::Low => AlertEvent::new(
            time,
            "Nominal traffic conditions - Policy reset",
            AlertSeverity::Ok,
        ),
        CongestionState::Med => AlertEvent::new(
            time,
            "Moderate congestion - protecting real-time and interactive classes",
            AlertSeverity::Ok,
        ),
        CongestionState::High => AlertEvent::new(
            time,
            format!(
                "QoS active: VoIP bandwidth increased to {}%",
                allocation.bandwidth.real_time
            ),
            AlertSeverity::Warn,
        ),
    }
}

/// Alerts for one snapshot, in order: transition, utilization, loss.
///
/// `last_state` is updated to `state` when they differ. The caller must
/// hold the engine lock so the update and the transition alert are
/// observed together.
pub(crate) fn evaluate(
    time: &str,
    state: CongestionState,
    last_state: &mut CongestionState,
    allocation: &Allocation,
    utilization_ratio: f64,
    packet_loss: f64,
) -> Vec<AlertEvent> {
    let mut alerts = Vec::new();
    if state != *last_state {
        alerts.push(transition_alert(time, state, allocation));
        *last_state = state;
    }
    if utilization_ratio > CRITICAL_UTILIZATION {
        alerts.push(AlertEvent::new(
            time,
            "Critical link utilization detected > 85%",
            AlertSeverity::Crit,
        ));
    }
    if packet_loss > ELEVATED_LOSS_PERCENT {
        alerts.push(AlertEvent::new(
            time,
            format!("Packet loss elevated ({packet_loss:.1}%) on background queues"),
            AlertSeverity::Warn,
        ));
    }
    alerts
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::allocate;
    use aqos_config::PolicyConfig;

    const NOW: &str = "12:00:00";

    fn allocation(state: CongestionState) -> Allocation {
        allocate(state, &PolicyConfig::default())
    }

    #[test]
    fn transition_fires_once_per_edge() {
        let mut last = CongestionState::Low;
        let high = allocation(CongestionState::High);

        let first = evaluate(NOW, CongestionState::High, &mut last, &high, 0.5, 0.5);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].cls, AlertSeverity::Warn);
        assert_eq!(first[0].msg, "QoS active: VoIP bandwidth increased to 50%");
        assert_eq!(last, CongestionState::High);

        let second = evaluate(NOW, CongestionState::High, &mut last, &high, 0.5, 0.5);
        assert!(second.is_empty());
    }

    #[test]
    fn return_to_low_resets_policy() {
        let mut last = CongestionState::Med;
        let alerts = evaluate(
            NOW,
            CongestionState::Low,
            &mut last,
            &allocation(CongestionState::Low),
            0.1,
            0.02,
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].msg, "Nominal traffic conditions - Policy reset");
        assert_eq!(alerts[0].cls, AlertSeverity::Ok);
    }

    #[test]
    fn threshold_alerts_are_level_triggered() {
        let mut last = CongestionState::High;
        let high = allocation(CongestionState::High);
        for _ in 0..3 {
            let alerts = evaluate(NOW, CongestionState::High, &mut last, &high, 0.95, 1.5);
            assert_eq!(alerts.len(), 2);
            assert_eq!(alerts[0].cls, AlertSeverity::Crit);
            assert_eq!(alerts[0].msg, "Critical link utilization detected > 85%");
            assert_eq!(alerts[1].cls, AlertSeverity::Warn);
            assert_eq!(alerts[1].msg, "Packet loss elevated (1.5%) on background queues");
        }
    }

    #[test]
    fn alerts_are_ordered() {
        let mut last = CongestionState::Low;
        let alerts = evaluate(
            NOW,
            CongestionState::High,
            &mut last,
            &allocation(CongestionState::High),
            0.95,
            1.5,
        );
        let classes: Vec<AlertSeverity> = alerts.iter().map(|a| a.cls).collect();
        assert_eq!(
            classes,
            vec![AlertSeverity::Warn, AlertSeverity::Crit, AlertSeverity::Warn]
        );
    }

    #[test]
    fn boundaries_are_exclusive() {
        let mut last = CongestionState::High;
        let alerts = evaluate(
            NOW,
            CongestionState::High,
            &mut last,
            &allocation(CongestionState::High),
            CRITICAL_UTILIZATION,
            ELEVATED_LOSS_PERCENT,
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&AlertSeverity::Crit).expect("serializable");
        assert_eq!(json, "\"crit\"");
    }
}

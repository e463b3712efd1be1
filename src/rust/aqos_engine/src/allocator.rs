//! Maps the congestion state and policy to bandwidth and queue shares
//! for the real-time, interactive and bulk classes. Every branch
//! produces triples that sum to exactly 100.

use crate::CongestionState;
use aqos_config::{BulkPriority, PolicyConfig};
use serde::Serialize;

/// Points moved between classes by a bulk-priority adjustment.
const BULK_SHIFT: u8 = 10;

/// Interactive share of the budget left after the real-time reservation.
const INTERACTIVE_SHARE_OF_REMAINDER: f64 = 0.7;

/// Percent shares for the three traffic classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ShareTriple {
    #[serde(rename = "voip")]
    pub real_time: u8,
    #[serde(rename = "http")]
    pub interactive: u8,
    #[serde(rename = "ftp")]
    pub bulk: u8,
}

impl ShareTriple {
    const fn new(real_time: u8, interactive: u8, bulk: u8) -> Self {
        Self {
            real_time,
            interactive,
            bulk,
        }
    }

    pub fn total(&self) -> u32 {
        self.real_time as u32 + self.interactive as u32 + self.bulk as u32
    }

    fn interactive_to_bulk(self, points: u8) -> Self {
        Self::new(self.real_time, self.interactive - points, self.bulk + points)
    }

    fn bulk_to_interactive(self, points: u8) -> Self {
        Self::new(self.real_time, self.interactive + points, self.bulk - points)
    }
}

/// Bandwidth and queue shares for one snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Allocation {
    pub bandwidth: ShareTriple,
    pub queues: ShareTriple,
}

const LOW_BANDWIDTH: ShareTriple = ShareTriple::new(20, 50, 30);
const LOW_QUEUES: ShareTriple = ShareTriple::new(10, 30, 60);
const MED_BANDWIDTH: ShareTriple = ShareTriple::new(30, 45, 25);
const MED_QUEUES: ShareTriple = ShareTriple::new(20, 40, 40);
const HIGH_QUEUES: ShareTriple = ShareTriple::new(50, 30, 20);

/// Allocate shares for `state` under `policy`.
pub fn allocate(state: CongestionState, policy: &PolicyConfig) -> Allocation {
    match state {
        CongestionState::Low => Allocation {
            bandwidth: LOW_BANDWIDTH,
            queues: LOW_QUEUES,
        },
        CongestionState::Med => match policy.bulk_priority {
            BulkPriority::High => Allocation {
                bandwidth: MED_BANDWIDTH.interactive_to_bulk(BULK_SHIFT),
                queues: MED_QUEUES.interactive_to_bulk(BULK_SHIFT),
            },
            BulkPriority::Low => Allocation {
                bandwidth: MED_BANDWIDTH.bulk_to_interactive(BULK_SHIFT),
                queues: MED_QUEUES.bulk_to_interactive(BULK_SHIFT),
            },
            BulkPriority::Std => Allocation {
                bandwidth: MED_BANDWIDTH,
                queues: MED_QUEUES,
            },
        },
        CongestionState::High => {
            let real_time = policy.voip_alloc.min(100);
            let remaining = 100 - real_time;
            let interactive = (remaining as f64 * INTERACTIVE_SHARE_OF_REMAINDER).round() as u8;
            let bandwidth = ShareTriple::new(real_time, interactive, remaining - interactive);
            let queues = match policy.bulk_priority {
                BulkPriority::High => HIGH_QUEUES.bulk_to_interactive(BULK_SHIFT),
                BulkPriority::Low | BulkPriority::Std => HIGH_QUEUES,
            };
            Allocation { bandwidth, queues }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn policy(voip_alloc: u8, bulk_priority: BulkPriority) -> PolicyConfig {
        PolicyConfig {
            voip_alloc,
            congestion_threshold: 0.4,
            bulk_priority,
        }
    }

    #[test]
    fn every_branch_sums_to_one_hundred() {
        let states = [CongestionState::Low, CongestionState::Med, CongestionState::High];
        let priorities = [BulkPriority::Low, BulkPriority::Std, BulkPriority::High];
        for state in states {
            for priority in priorities {
                for voip in 0..=100u8 {
                    let a = allocate(state, &policy(voip, priority));
                    assert_eq!(a.bandwidth.total(), 100, "{state:?} {priority:?} {voip}");
                    assert_eq!(a.queues.total(), 100, "{state:?} {priority:?} {voip}");
                }
            }
        }
    }

    #[test]
    fn low_ignores_policy() {
        let a = allocate(CongestionState::Low, &policy(80, BulkPriority::High));
        assert_eq!(a.bandwidth, ShareTriple::new(20, 50, 30));
        assert_eq!(a.queues, ShareTriple::new(10, 30, 60));
    }

    #[test]
    fn medium_bulk_priority_shifts() {
        let high = allocate(CongestionState::Med, &policy(50, BulkPriority::High));
        assert_eq!(high.bandwidth, ShareTriple::new(30, 35, 35));
        assert_eq!(high.queues, ShareTriple::new(20, 30, 50));

        let low = allocate(CongestionState::Med, &policy(50, BulkPriority::Low));
        assert_eq!(low.bandwidth, ShareTriple::new(30, 55, 15));
        assert_eq!(low.queues, ShareTriple::new(20, 50, 30));

        let std = allocate(CongestionState::Med, &policy(50, BulkPriority::Std));
        assert_eq!(std.bandwidth, ShareTriple::new(30, 45, 25));
    }

    #[test]
    fn high_reserves_real_time_budget() {
        let a = allocate(CongestionState::High, &policy(50, BulkPriority::Std));
        assert_eq!(a.bandwidth, ShareTriple::new(50, 35, 15));
        assert_eq!(a.queues, ShareTriple::new(50, 30, 20));

        let a = allocate(CongestionState::High, &policy(33, BulkPriority::High));
        assert_eq!(a.bandwidth.real_time, 33);
        assert_eq!(a.bandwidth.interactive, 47);
        assert_eq!(a.bandwidth.bulk, 20);
        assert_eq!(a.queues, ShareTriple::new(50, 40, 10));
    }

    #[test]
    fn serializes_with_class_names() {
        let json = serde_json::to_string(&ShareTriple::new(20, 50, 30)).expect("serializable");
        assert_eq!(json, r#"{"voip":20,"http":50,"ftp":30}"#);
    }
}

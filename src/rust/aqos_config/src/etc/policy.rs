//! The QoS allocation policy. These values may be changed while the
//! daemon runs, so every write goes through the clamping rules here.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Highest congestion threshold accepted. The threshold must stay
/// strictly below 1.0.
pub const MAX_CONGESTION_THRESHOLD: f64 = 0.99;

/// How strongly the bulk-transfer class is favoured when the link is
/// congested.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BulkPriority {
    /// Bulk yields to interactive traffic.
    Low,
    /// No adjustment.
    #[default]
    Std,
    /// Bulk takes budget from interactive traffic.
    High,
}

impl Display for BulkPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BulkPriority::Low => write!(f, "low"),
            BulkPriority::Std => write!(f, "std"),
            BulkPriority::High => write!(f, "high"),
        }
    }
}

impl FromStr for BulkPriority {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(BulkPriority::Low),
            "std" => Ok(BulkPriority::Std),
            "high" => Ok(BulkPriority::High),
            _ => Err(PolicyError::UnknownBulkPriority(s.to_string())),
        }
    }
}

/// User-adjustable allocation policy.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Bandwidth share (percent) reserved for real-time traffic under
    /// high congestion.
    #[serde(deserialize_with = "deserialize_voip_alloc")]
    pub voip_alloc: u8,

    /// Utilization ratio below which the link is considered lightly
    /// loaded, in `[0, 1)`.
    #[serde(deserialize_with = "deserialize_congestion_threshold")]
    pub congestion_threshold: f64,

    /// Bulk class adjustment under medium and high congestion.
    pub bulk_priority: BulkPriority,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            voip_alloc: 50,
            congestion_threshold: 0.4,
            bulk_priority: BulkPriority::Std,
        }
    }
}

/// Clamp a requested real-time allocation into 0-100.
pub fn clamp_voip_alloc(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// Validate and clamp a requested congestion threshold into
/// `[0, MAX_CONGESTION_THRESHOLD]`. Non-finite values are rejected.
pub fn sanitize_congestion_threshold(value: f64) -> Result<f64, PolicyError> {
    if !value.is_finite() {
        return Err(PolicyError::InvalidThreshold(value));
    }
    Ok(value.clamp(0.0, MAX_CONGESTION_THRESHOLD))
}

fn deserialize_voip_alloc<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_voip_alloc(raw))
}

fn deserialize_congestion_threshold<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    sanitize_congestion_threshold(raw).map_err(serde::de::Error::custom)
}

/// Rejected policy writes.
#[derive(Error, Debug, PartialEq)]
pub enum PolicyError {
    /// Bulk priority must be one of low, std or high.
    #[error("Unknown bulk priority '{0}'. Expected low, std or high.")]
    UnknownBulkPriority(String),
    /// The congestion threshold must be a finite number.
    #[error("Congestion threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),
}

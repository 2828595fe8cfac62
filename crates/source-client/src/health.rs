// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Health reporting for collaborators

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status of a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum HealthStatus {
    /// Reachable and answering queries
    Up,
    /// Answering, but not the way it should
    Degraded { reason: String },
    /// Unreachable or refusing queries
    Down { reason: String },
}

impl HealthStatus {
    /// Whether the collaborator can still serve requests
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Up | Self::Degraded { .. })
    }

    /// Whether the collaborator is completely down
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Down { .. })
    }

    /// Human-readable description of the status
    pub fn description(&self) -> &str {
        match self {
            Self::Up => "Service is healthy",
            Self::Degraded { reason } | Self::Down { reason } => reason,
        }
    }
}

/// Outcome of probing one named component
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    /// Component that was probed
    pub component: String,
    /// Reported status
    pub status: HealthStatus,
    /// How long the probe took
    pub response_time: Duration,
    /// When the probe ran
    pub timestamp: DateTime<Utc>,
}

impl HealthCheckResult {
    /// Record a status observed for a component
    pub fn new(component: impl Into<String>, status: HealthStatus, response_time: Duration) -> Self {
        Self {
            component: component.into(),
            status,
            response_time,
            timestamp: Utc::now(),
        }
    }

    /// Record a probe that could not be completed
    pub fn failed(component: impl Into<String>, response_time: Duration, reason: String) -> Self {
        Self::new(component, HealthStatus::Down { reason }, response_time)
    }
}

/// Health of every probed component, worst status wins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthReport {
    /// Individual probe results
    pub checks: Vec<HealthCheckResult>,
}

impl HealthReport {
    /// Add a probe result
    pub fn push(&mut self, result: HealthCheckResult) {
        self.checks.push(result);
    }

    /// Aggregated status of all components
    pub fn overall(&self) -> HealthStatus {
        let mut overall = HealthStatus::Up;
        for check in &self.checks {
            match &check.status {
                HealthStatus::Down { reason } => {
                    return HealthStatus::Down {
                        reason: format!("{}: {reason}", check.component),
                    };
                }
                HealthStatus::Degraded { reason } if overall == HealthStatus::Up => {
                    overall = HealthStatus::Degraded {
                        reason: format!("{}: {reason}", check.component),
                    };
                }
                _ => {}
            }
        }
        overall
    }
}

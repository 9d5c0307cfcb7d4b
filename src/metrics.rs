//! Integration envelope written to stdout for the monitoring agent.

use anyhow::Result;
use serde::Serialize;

use crate::prober::StatusCode;

pub const INTEGRATION_NAME: &str = "info.tdoc.newrelic.check_tcp";
pub const PROTOCOL_VERSION: &str = "1";
pub const INTEGRATION_VERSION: &str = "0.0.1";
pub const EVENT_TYPE: &str = "TdocCheckTCP";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricData {
    pub event_type: &'static str,
    pub status_code: u16,
    pub status: &'static str,
}

impl From<StatusCode> for MetricData {
    fn from(status: StatusCode) -> Self {
        Self {
            event_type: EVENT_TYPE,
            status_code: status.code(),
            status: status.label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IntegrationData {
    pub name: &'static str,
    pub protocol_version: &'static str,
    pub integration_version: &'static str,
    pub metrics: Vec<MetricData>,
}

impl Default for IntegrationData {
    fn default() -> Self {
        Self {
            name: INTEGRATION_NAME,
            protocol_version: PROTOCOL_VERSION,
            integration_version: INTEGRATION_VERSION,
            metrics: Vec::new(),
        }
    }
}

impl IntegrationData {
    pub fn push(&mut self, status: StatusCode) {
        self.metrics.push(MetricData::from(status));
    }

    /// Single-line JSON record.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

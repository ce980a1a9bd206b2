//! Monitoring endpoints and time-series query helpers.
//!
//! Instant and range queries are relayed by the backend to its metrics
//! store. The per-resource history helpers only build the series selector;
//! aggregation happens server-side.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use serde::Serialize;

use super::ApiClient;
use super::types::{DashboardSummary, QueryResponse};
use crate::{Error, Result};

/// Default resolution of range queries, in seconds
pub const DEFAULT_STEP: u64 = 60;

/// Per-resource gauges exported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceMetric {
    /// CPU usage percent
    Cpu,
    /// Memory usage percent
    Memory,
    /// Disk usage percent
    Disk,
    /// Inbound traffic, MB/s
    NetworkIn,
    /// Outbound traffic, MB/s
    NetworkOut,
}

impl ResourceMetric {
    /// All metrics, in display order
    pub const ALL: [Self; 5] = [
        Self::Cpu,
        Self::Memory,
        Self::Disk,
        Self::NetworkIn,
        Self::NetworkOut,
    ];

    /// Exported series name
    #[must_use]
    pub fn series_name(self) -> &'static str {
        match self {
            Self::Cpu => "opspro_cpu_usage_percent",
            Self::Memory => "opspro_memory_usage_percent",
            Self::Disk => "opspro_disk_usage_percent",
            Self::NetworkIn => "opspro_network_in_mb",
            Self::NetworkOut => "opspro_network_out_mb",
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::NetworkIn => "network-in",
            Self::NetworkOut => "network-out",
        }
    }
}

impl fmt::Display for ResourceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ResourceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|m| m.key() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|m| m.key()).collect();
                format!("unknown metric '{s}' (expected one of: {})", known.join(", "))
            })
    }
}

/// Escape a label value for use inside a double-quoted selector
#[must_use]
pub fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

/// Selector for one resource's series, e.g. `opspro_cpu_usage_percent{resource_id="7"}`
#[must_use]
pub fn history_query(metric: ResourceMetric, resource_id: &str) -> String {
    format!(
        "{}{{resource_id=\"{}\"}}",
        metric.series_name(),
        escape_label_value(resource_id)
    )
}

#[derive(Serialize)]
struct InstantParams<'q> {
    query: &'q str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<f64>,
}

#[derive(Serialize)]
struct RangeParams<'q> {
    query: &'q str,
    start: i64,
    end: i64,
    step: u64,
}

/// `/monitoring/*` endpoints
#[derive(Debug, Clone, Copy)]
pub struct MonitoringApi<'a> {
    client: &'a ApiClient,
}

impl<'a> MonitoringApi<'a> {
    pub(super) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Fleet dashboard figures
    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        let builder = self.client.request(Method::GET, "/monitoring/dashboard");
        self.client.send_json(builder).await
    }

    /// Instant query, evaluated now or at `time` (unix seconds)
    pub async fn query(&self, query: &str, time: Option<f64>) -> Result<QueryResponse> {
        let builder = self
            .client
            .request(Method::GET, "/monitoring/query")
            .query(&InstantParams { query, time });
        self.client.send_json(builder).await
    }

    /// Range query over `[start, end]` (unix seconds) at `step` seconds
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `end < start` or `step` is zero.
    pub async fn query_range(
        &self,
        query: &str,
        start: i64,
        end: i64,
        step: u64,
    ) -> Result<QueryResponse> {
        if end < start {
            return Err(Error::InvalidInput(format!(
                "range end ({end}) is before start ({start})"
            )));
        }
        if step == 0 {
            return Err(Error::InvalidInput("step must be positive".into()));
        }

        let builder = self
            .client
            .request(Method::GET, "/monitoring/query_range")
            .query(&RangeParams {
                query,
                start,
                end,
                step,
            });
        self.client.send_json(builder).await
    }

    /// History of one metric for one resource at the default step
    pub async fn resource_history(
        &self,
        metric: ResourceMetric,
        resource_id: impl fmt::Display,
        start: i64,
        end: i64,
    ) -> Result<QueryResponse> {
        let query = history_query(metric, &resource_id.to_string());
        self.query_range(&query, start, end, DEFAULT_STEP).await
    }

    /// CPU usage history
    pub async fn cpu_history(&self, resource_id: impl fmt::Display, start: i64, end: i64) -> Result<QueryResponse> {
        self.resource_history(ResourceMetric::Cpu, resource_id, start, end).await
    }

    /// Memory usage history
    pub async fn memory_history(&self, resource_id: impl fmt::Display, start: i64, end: i64) -> Result<QueryResponse> {
        self.resource_history(ResourceMetric::Memory, resource_id, start, end).await
    }

    /// Disk usage history
    pub async fn disk_history(&self, resource_id: impl fmt::Display, start: i64, end: i64) -> Result<QueryResponse> {
        self.resource_history(ResourceMetric::Disk, resource_id, start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_query() {
        assert_eq!(
            history_query(ResourceMetric::Cpu, "7"),
            r#"opspro_cpu_usage_percent{resource_id="7"}"#
        );
        assert_eq!(
            history_query(ResourceMetric::NetworkOut, "42"),
            r#"opspro_network_out_mb{resource_id="42"}"#
        );
    }

    #[test]
    fn test_label_escaping() {
        assert_eq!(escape_label_value(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_label_value(r"c:\tmp"), r"c:\\tmp");
        assert_eq!(escape_label_value("x\ny"), r"x\ny");
        assert_eq!(
            history_query(ResourceMetric::Disk, r#"7"} or vector(1) #"#),
            r#"opspro_disk_usage_percent{resource_id="7\"} or vector(1) #"}"#
        );
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("cpu".parse::<ResourceMetric>(), Ok(ResourceMetric::Cpu));
        assert_eq!("Network_In".parse::<ResourceMetric>(), Ok(ResourceMetric::NetworkIn));
        assert!("load".parse::<ResourceMetric>().unwrap_err().contains("network-out"));
        for metric in ResourceMetric::ALL {
            assert_eq!(metric.to_string().parse::<ResourceMetric>(), Ok(metric));
        }
    }
}

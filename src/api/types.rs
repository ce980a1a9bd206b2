//! Request and response models for the backend API

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ============================================================================
// Auth
// ============================================================================

/// Username/password pair submitted at login
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    /// Account name
    pub username: String,
    /// Plain-text password
    pub password: String,
}

impl LoginCredentials {
    /// Create credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account registration payload
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterData {
    /// Account name
    pub username: String,
    /// Contact address
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl fmt::Debug for RegisterData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterData")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Token issued at login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Opaque bearer token
    pub access_token: String,
    /// Token scheme, normally `bearer`
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Account profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Account id
    pub id: i64,
    /// Account name
    pub username: String,
    /// Contact address
    #[serde(default)]
    pub email: Option<String>,
    /// Display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Whether the account may log in
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Administrative privileges
    #[serde(default)]
    pub is_superuser: Option<bool>,
}

/// Generic `{"message": ...}` acknowledgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

// ============================================================================
// Resources
// ============================================================================

macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $(
                #[allow(missing_docs)]
                $variant,
            )+
            /// Value this client does not know about
            Other(String),
        }

        impl $name {
            /// Wire representation
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(s) => s,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.to_ascii_lowercase().as_str() {
                    $($wire => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self::from(s.to_string()))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

open_enum! {
    /// Kind of managed resource
    ResourceType {
        Server => "server",
        VirtualMachine => "virtual_machine",
        Container => "container",
        Database => "database",
        Network => "network",
        Storage => "storage",
    }
}

open_enum! {
    /// Lifecycle status of a resource
    ResourceStatus {
        Active => "active",
        Inactive => "inactive",
        Maintenance => "maintenance",
        Error => "error",
    }
}

/// A managed resource as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource id
    pub id: i64,
    /// Unique name
    pub name: String,
    /// Resource kind
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Lifecycle status
    pub status: ResourceStatus,
    /// IP address
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Host name
    #[serde(default)]
    pub hostname: Option<String>,
    /// CPU cores
    #[serde(default)]
    pub cpu_cores: Option<u32>,
    /// Memory size in GiB
    #[serde(default)]
    pub memory_gb: Option<f64>,
    /// Disk size in GiB
    #[serde(default)]
    pub disk_gb: Option<f64>,
    /// Operating system family
    #[serde(default)]
    pub os_type: Option<String>,
    /// Operating system version
    #[serde(default)]
    pub os_version: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Key/value labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Notes
    #[serde(default)]
    pub description: Option<String>,
    /// Last reported CPU usage (percent)
    #[serde(default)]
    pub cpu_usage: f64,
    /// Last reported memory usage (percent)
    #[serde(default)]
    pub memory_usage: f64,
    /// Last reported disk usage (percent)
    #[serde(default)]
    pub disk_usage: f64,
    /// Creation time
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification time
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Last metrics report
    #[serde(default, with = "timestamp::option")]
    pub last_seen: Option<DateTime<Utc>>,
}

/// Payload for creating a resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCreate {
    /// Unique name (1–100 characters)
    pub name: String,
    /// Resource kind
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// IP address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Host name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// CPU cores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<u32>,
    /// Memory size in GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_gb: Option<f64>,
    /// Disk size in GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_gb: Option<f64>,
    /// Operating system family
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    /// Operating system version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Key/value labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResourceCreate {
    /// Minimal payload with a name and a type
    pub fn new(name: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            name: name.into(),
            resource_type,
            ip_address: None,
            hostname: None,
            cpu_cores: None,
            memory_gb: None,
            disk_gb: None,
            os_type: None,
            os_version: None,
            tags: Vec::new(),
            labels: BTreeMap::new(),
            description: None,
        }
    }

    /// Reject payloads the backend would refuse
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for empty or over-long names, zero CPU
    /// cores, or negative sizes.
    pub fn validate(&self) -> Result<()> {
        let len = self.name.chars().count();
        if !(1..=100).contains(&len) {
            return Err(Error::InvalidInput(format!(
                "resource name must be 1-100 characters, got {len}"
            )));
        }
        if self.cpu_cores == Some(0) {
            return Err(Error::InvalidInput("cpu_cores must be at least 1".into()));
        }
        for (field, value) in [("memory_gb", self.memory_gb), ("disk_gb", self.disk_gb)] {
            if value.is_some_and(|v| v < 0.0) {
                return Err(Error::InvalidInput(format!("{field} must not be negative")));
            }
        }
        Ok(())
    }
}

/// Partial update; unset fields are left untouched by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub status: Option<ResourceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub cpu_cores: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub memory_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub disk_gb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub os_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub description: Option<String>,
}

/// Usage sample pushed for a resource (all percentages)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetrics {
    /// CPU usage, 0–100
    pub cpu_usage: f64,
    /// Memory usage, 0–100
    pub memory_usage: f64,
    /// Disk usage, 0–100
    pub disk_usage: f64,
}

impl ResourceMetrics {
    /// Check every value is a percentage
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first out-of-range field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("cpu_usage", self.cpu_usage),
            ("memory_usage", self.memory_usage),
            ("disk_usage", self.disk_usage),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(Error::InvalidInput(format!(
                    "{field} must be between 0 and 100, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Filters for listing resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceQuery {
    /// Rows to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    /// Maximum rows (backend caps at 100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Only this kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<ResourceType>,
    /// Only this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResourceStatus>,
}

/// Inventory summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStats {
    /// All resources
    pub total: u64,
    /// Active resources
    pub active: u64,
    /// Inactive resources
    pub inactive: u64,
    /// Count per resource type
    #[serde(default)]
    pub by_type: BTreeMap<String, u64>,
}

// ============================================================================
// Monitoring
// ============================================================================

/// Fleet-wide dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Number of resources
    pub total_resources: u64,
    /// Mean CPU usage (percent)
    pub average_cpu_usage: f64,
    /// Mean memory usage (percent)
    pub average_memory_usage: f64,
    /// Mean disk usage (percent)
    pub average_disk_usage: f64,
    /// Busiest resources by CPU
    #[serde(default)]
    pub top_cpu_resources: Vec<TopResource>,
}

/// Entry in the dashboard's top-CPU list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopResource {
    /// Resource id
    pub id: i64,
    /// Resource name
    pub name: String,
    /// CPU usage (percent)
    pub cpu_usage: f64,
    /// Memory usage (percent)
    pub memory_usage: f64,
}

/// Time-series query response as relayed from the metrics backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// `success` or `error`
    pub status: String,
    /// Result payload
    #[serde(default)]
    pub data: Option<QueryData>,
    /// Error category
    #[serde(default, rename = "errorType", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    /// Whether the query succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Series in the result (empty on error)
    #[must_use]
    pub fn series(&self) -> &[Series] {
        self.data.as_ref().map_or(&[], |d| d.result.as_slice())
    }
}

/// Result envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryData {
    /// `matrix`, `vector`, `scalar` or `string`
    #[serde(rename = "resultType")]
    pub result_type: String,
    /// Series
    #[serde(default)]
    pub result: Vec<Series>,
}

/// One labelled series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Label set
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    /// Instant sample (instant queries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Sample>,
    /// Samples (range queries)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Sample>,
}

/// `[unix_seconds, "value"]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample(pub f64, pub String);

impl Sample {
    /// Sample timestamp in unix seconds
    #[must_use]
    pub fn timestamp(&self) -> f64 {
        self.0
    }

    /// Numeric value, if it parses
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.1.parse().ok()
    }
}

/// Timestamps arrive either RFC 3339 or as naive UTC (`2024-05-01T12:00:00.123`).
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};

    fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }

    pub mod option {
        use chrono::{DateTime, SecondsFormat, Utc};
        use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}"))),
            }
        }
    }
}

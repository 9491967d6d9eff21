use serde::{Deserialize, Serialize};

use crate::utils::severity_label;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alert {
    pub id: Option<i64>,
    pub device_id: Option<i64>,
    pub device_name: Option<String>,
    pub severity: Option<String>,
    pub message: Option<String>,
    pub created_at: Option<String>,
    #[serde(default)]
    pub acknowledged: bool,
    pub acknowledged_at: Option<String>,
}

impl Alert {
    pub fn severity_display(&self) -> String {
        severity_label(self.severity.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: u64,
}

/// One page of the alert list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertPage {
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsSummary {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub unacknowledged: u64,
    #[serde(default)]
    pub critical: u64,
    #[serde(default)]
    pub high: u64,
    /// Most recent unacknowledged alerts, newest first
    #[serde(default)]
    pub recent: Vec<Alert>,
}

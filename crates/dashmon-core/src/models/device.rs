use serde::{Deserialize, Serialize};

use crate::utils::status_label;

/// A polled network device (switch, router, camera host, ...)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub vendor: Option<String>,
    pub device_type: Option<String>,
    pub snmp_community: Option<String>,
    pub last_seen: Option<String>,
    pub status: Option<String>,
    pub meta: Option<serde_json::Value>,
}

impl Device {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }

    pub fn status_display(&self) -> String {
        status_label(self.status.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Camera {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub rtsp_url: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub last_snapshot: Option<String>,
}

impl Camera {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed)")
    }

    pub fn status_display(&self) -> String {
        status_label(self.status.as_deref())
    }
}

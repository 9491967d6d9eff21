use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// One of `admin`, `operator`, `viewer`
    #[serde(default)]
    pub role: Option<String>,
}

impl UserProfile {
    pub fn role_display(&self) -> &str {
        self.role.as_deref().unwrap_or("viewer")
    }

    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

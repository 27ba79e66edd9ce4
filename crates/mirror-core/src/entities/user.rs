//! User record - shared by reference from members and message authorship

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::UserId;

/// Server-side user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular authenticated user
    #[default]
    User,
    /// Anonymous/guest session
    Guest,
    /// Channel-level moderator rights everywhere
    Moderator,
    /// Full administrative rights
    Admin,
}

impl UserRole {
    /// Parse from the wire's raw role string; unknown values fall back to `User`
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "guest" => Self::Guest,
            "moderator" => Self::Moderator,
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Guest => write!(f, "guest"),
            Self::Moderator => write!(f, "moderator"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// User record
///
/// Never owned by a single channel; membership is the many-to-many join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub role: UserRole,
    pub online: bool,
    pub invisible: bool,
    pub banned: bool,
    pub teams: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
    /// Opaque server attributes, round-tripped byte-for-byte
    pub extra: serde_json::Value,
}

impl UserRecord {
    /// Check whether the user should appear online to others
    #[inline]
    pub fn is_visibly_online(&self) -> bool {
        self.online && !self.invisible
    }
}

//! Admin user and session models

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// Back-office role
    pub enum AdminRole {
        SuperAdmin => "SUPER_ADMIN",
        Editor => "EDITOR",
    }
}

string_enum! {
    /// Only active admins may sign in
    pub enum AdminStatus {
        Active => "ACTIVE",
        Disabled => "DISABLED",
    }
}

/// Back-office account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: AdminRole,
    pub status: AdminStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn is_active(&self) -> bool {
        self.status == AdminStatus::Active
    }
}

/// Server-side admin session, keyed by the cookie token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub id: String,
    pub admin_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AdminSession {
    /// Create a session with a random token valid for `ttl`.
    /// Expiry saturates at the latest representable instant.
    pub fn new(admin_id: i64, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple()),
            admin_id,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_is_unique_and_fits_column() {
        let a = AdminSession::new(1, Duration::days(7));
        let b = AdminSession::new(1, Duration::days(7));
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 64);
        assert!(!a.is_expired());
    }

    #[test]
    fn test_huge_ttl_saturates_expiry() {
        let session = AdminSession::new(1, Duration::days(100_000_000));
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!session.is_expired());
    }

    #[test]
    fn test_expired_session() {
        let session = AdminSession::new(1, Duration::seconds(-1));
        assert!(session.is_expired());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let now = Utc::now();
        let admin = AdminUser {
            id: 1,
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: AdminRole::SuperAdmin,
            status: AdminStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&admin).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "SUPER_ADMIN");
    }
}

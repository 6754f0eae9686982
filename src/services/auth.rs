//! Admin authentication service
//!
//! Admins sign in with email and password. A successful login creates a
//! server-side session whose token travels in the `admin_session` cookie.

use chrono::{Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

use super::password::{hash_password, verify_password};
use super::rate_limiter::LoginRateLimiter;
use super::required_text;
use crate::db::repositories::{AdminRepository, SessionRepository};
use crate::models::{AdminRole, AdminSession, AdminStatus, AdminUser};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many login attempts, please try again later")]
    RateLimited,

    #[error("Admin user already exists")]
    AlreadyInitialized,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub admin: AdminUser,
    pub session: AdminSession,
}

/// Admin authentication service
pub struct AuthService {
    admins: Arc<dyn AdminRepository>,
    sessions: Arc<dyn SessionRepository>,
    rate_limiter: Arc<LoginRateLimiter>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        sessions: Arc<dyn SessionRepository>,
        rate_limiter: Arc<LoginRateLimiter>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            admins,
            sessions,
            rate_limiter,
            session_ttl,
        }
    }

    /// Verify credentials and open a session
    ///
    /// Unknown emails, disabled accounts and wrong passwords all fail with
    /// the same error. Requests without a client IP skip the per-IP limit.
    pub async fn login(
        &self,
        email: Option<&str>,
        password: Option<&str>,
        client_ip: Option<&str>,
    ) -> Result<LoginOutcome, AuthServiceError> {
        if let Some(ip) = client_ip {
            if self.rate_limiter.is_ip_limited(ip).await {
                tracing::warn!("Login rate limit hit for {}", ip);
                return Err(AuthServiceError::RateLimited);
            }
            self.rate_limiter.record_ip_request(ip).await;
        }

        let (Some(email), Some(password)) = (
            required_text(email).map(|e| e.to_lowercase()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthServiceError::Validation(
                "Email and password are required".to_string(),
            ));
        };

        if self.rate_limiter.is_email_limited(&email).await {
            tracing::warn!("Login rate limit hit for {}", email);
            return Err(AuthServiceError::RateLimited);
        }

        let admin = match self.admins.get_by_email(&email).await? {
            Some(admin) if admin.is_active() => admin,
            _ => return self.reject(&email).await,
        };
        // Hash parse failures count as a wrong password
        if !verify_password(password, &admin.password_hash).unwrap_or(false) {
            return self.reject(&email).await;
        }

        self.rate_limiter.clear_email(&email).await;
        let session = AdminSession::new(admin.id, self.session_ttl);
        self.sessions.create(&session).await?;
        tracing::info!("Admin {} signed in", admin.id);

        Ok(LoginOutcome { admin, session })
    }

    pub async fn logout(&self, token: &str) -> Result<(), AuthServiceError> {
        self.sessions.delete(token).await?;
        Ok(())
    }

    /// Admin owning a live session, if any
    pub async fn current_admin(&self, token: &str) -> Result<Option<AdminUser>, AuthServiceError> {
        let Some(session) = self.sessions.get_by_id(token).await? else {
            return Ok(None);
        };
        if session.is_expired() {
            self.sessions.delete(token).await?;
            return Ok(None);
        }

        Ok(self
            .admins
            .get_by_id(session.admin_id)
            .await?
            .filter(AdminUser::is_active))
    }

    /// Create the first super admin. Refused once any admin exists.
    pub async fn bootstrap(
        &self,
        name: Option<&str>,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<AdminUser, AuthServiceError> {
        if self.admins.count().await? > 0 {
            return Err(AuthServiceError::AlreadyInitialized);
        }

        let (Some(name), Some(email), Some(password)) = (
            required_text(name),
            required_text(email).map(|e| e.to_lowercase()),
            password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AuthServiceError::Validation(
                "Name, email and password are required".to_string(),
            ));
        };

        let now = Utc::now();
        let admin = AdminUser {
            id: 0,
            name,
            email,
            password_hash: hash_password(password)?,
            role: AdminRole::SuperAdmin,
            status: AdminStatus::Active,
            created_at: now,
            updated_at: now,
        };

        let created = self.admins.create(&admin).await?;
        tracing::info!("Bootstrapped super admin {}", created.id);
        Ok(created)
    }

    /// Drop expired sessions and stale rate limiter entries
    pub async fn cleanup_expired(&self) -> Result<u64, AuthServiceError> {
        self.rate_limiter.cleanup().await;
        Ok(self.sessions.delete_expired().await?)
    }

    async fn reject<T>(&self, email: &str) -> Result<T, AuthServiceError> {
        self.rate_limiter.record_failed_attempt(email).await;
        tracing::debug!("Rejected login for {}", email);
        Err(AuthServiceError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::admin::tests::admin;
    use crate::db::repositories::test_support::migrated_pool;
    use crate::db::repositories::{SqlxAdminRepository, SqlxSessionRepository};
    use crate::db::DynDatabasePool;

    fn service(pool: &DynDatabasePool, ttl: Duration) -> AuthService {
        AuthService::new(
            SqlxAdminRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            Arc::new(LoginRateLimiter::new()),
            ttl,
        )
    }

    async fn bootstrapped() -> (DynDatabasePool, AuthService) {
        let pool = migrated_pool().await;
        let auth = service(&pool, Duration::days(7));
        auth.bootstrap(Some("Root"), Some("Root@Example.com"), Some("s3cret-pass"))
            .await
            .unwrap();
        (pool, auth)
    }

    #[tokio::test]
    async fn test_bootstrap_only_once() {
        let (_pool, auth) = bootstrapped().await;
        let err = auth
            .bootstrap(Some("Again"), Some("again@example.com"), Some("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthServiceError::AlreadyInitialized));
        assert_eq!(err.to_string(), "Admin user already exists");
    }

    #[tokio::test]
    async fn test_bootstrap_requires_fields() {
        let pool = migrated_pool().await;
        let auth = service(&pool, Duration::days(7));
        assert!(matches!(
            auth.bootstrap(Some("Root"), None, Some("pw")).await,
            Err(AuthServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_and_session_lifecycle() {
        let (_pool, auth) = bootstrapped().await;

        let outcome = auth
            .login(Some(" root@example.COM "), Some("s3cret-pass"), Some("203.0.113.9"))
            .await
            .unwrap();
        assert_eq!(outcome.admin.role, AdminRole::SuperAdmin);

        let token = outcome.session.id;
        let current = auth.current_admin(&token).await.unwrap().unwrap();
        assert_eq!(current.email, "root@example.com");

        auth.logout(&token).await.unwrap();
        assert!(auth.current_admin(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_rejections_share_message() {
        let (pool, auth) = bootstrapped().await;
        SqlxAdminRepository::new(pool)
            .create(&admin("off@example.com", AdminStatus::Disabled))
            .await
            .unwrap();

        for (email, password) in [
            ("root@example.com", "wrong"),
            ("nobody@example.com", "s3cret-pass"),
            ("off@example.com", "hash"),
        ] {
            let err = auth.login(Some(email), Some(password), None).await.unwrap_err();
            assert!(matches!(err, AuthServiceError::InvalidCredentials));
            assert_eq!(err.to_string(), "Invalid email or password");
        }

        assert!(matches!(
            auth.login(Some("root@example.com"), None, None).await,
            Err(AuthServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_email_is_locked_after_failures() {
        let (_pool, auth) = bootstrapped().await;
        for _ in 0..5 {
            let _ = auth.login(Some("root@example.com"), Some("nope"), None).await;
        }
        assert!(matches!(
            auth.login(Some("root@example.com"), Some("s3cret-pass"), None).await,
            Err(AuthServiceError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_ip_is_limited_per_minute() {
        let (_pool, auth) = bootstrapped().await;
        for _ in 0..10 {
            let _ = auth.login(Some("x@example.com"), Some("nope"), Some("198.51.100.1")).await;
        }
        assert!(matches!(
            auth.login(Some("root@example.com"), Some("s3cret-pass"), Some("198.51.100.1")).await,
            Err(AuthServiceError::RateLimited)
        ));
        assert!(auth
            .login(Some("root@example.com"), Some("s3cret-pass"), Some("198.51.100.2"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_cleaned() {
        let pool = migrated_pool().await;
        let auth = service(&pool, Duration::seconds(-1));
        auth.bootstrap(Some("Root"), Some("root@example.com"), Some("pw-123456"))
            .await
            .unwrap();

        let expired = auth
            .login(Some("root@example.com"), Some("pw-123456"), None)
            .await
            .unwrap();
        let second = auth
            .login(Some("root@example.com"), Some("pw-123456"), None)
            .await
            .unwrap();

        assert!(auth.current_admin(&expired.session.id).await.unwrap().is_none());
        assert_eq!(auth.cleanup_expired().await.unwrap(), 1);
        assert!(SqlxSessionRepository::new(pool)
            .get_by_id(&second.session.id)
            .await
            .unwrap()
            .is_none());
    }
}

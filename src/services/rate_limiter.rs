//! Rate limiter for admin login attempts
//!
//! Two sliding windows guard the login endpoint:
//! - failed attempts per email (5 per 15 minutes)
//! - requests per client IP (10 per minute)

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const EMAIL_MAX_FAILURES: usize = 5;
const EMAIL_WINDOW_MINUTES: i64 = 15;
const IP_MAX_REQUESTS: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

type Attempts = Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>;

/// Login rate limiter
#[derive(Default)]
pub struct LoginRateLimiter {
    email_failures: Attempts,
    ip_requests: Attempts,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the email has used up its failed attempts
    pub async fn is_email_limited(&self, email: &str) -> bool {
        let cutoff = Utc::now() - Duration::minutes(EMAIL_WINDOW_MINUTES);
        let mut failures = self.email_failures.write().await;
        let entry = failures.entry(email.to_lowercase()).or_default();
        entry.retain(|time| *time > cutoff);
        entry.len() >= EMAIL_MAX_FAILURES
    }

    pub async fn record_failed_attempt(&self, email: &str) {
        let mut failures = self.email_failures.write().await;
        failures
            .entry(email.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget failures after a successful login
    pub async fn clear_email(&self, email: &str) {
        self.email_failures.write().await.remove(&email.to_lowercase());
    }

    /// Whether the client has sent too many login requests
    pub async fn is_ip_limited(&self, ip: &str) -> bool {
        let cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);
        let mut requests = self.ip_requests.write().await;
        let entry = requests.entry(ip.to_string()).or_default();
        entry.retain(|time| *time > cutoff);
        entry.len() >= IP_MAX_REQUESTS
    }

    pub async fn record_ip_request(&self, ip: &str) {
        let mut requests = self.ip_requests.write().await;
        requests.entry(ip.to_string()).or_default().push(Utc::now());
    }

    /// Drop expired entries. Called periodically by a background task.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        prune(&self.email_failures, now - Duration::minutes(EMAIL_WINDOW_MINUTES)).await;
        prune(&self.ip_requests, now - Duration::minutes(IP_WINDOW_MINUTES)).await;
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.email_failures.read().await.len() + self.ip_requests.read().await.len()
    }
}

async fn prune(attempts: &Attempts, cutoff: DateTime<Utc>) {
    let mut attempts = attempts.write().await;
    attempts.retain(|_, times| {
        times.retain(|time| *time > cutoff);
        !times.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_email_limit_after_five_failures() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            assert!(!limiter.is_email_limited("ops@example.com").await);
            limiter.record_failed_attempt("ops@example.com").await;
        }
        limiter.record_failed_attempt("ops@example.com").await;
        assert!(limiter.is_email_limited("ops@example.com").await);

        limiter.clear_email("ops@example.com").await;
        assert!(!limiter.is_email_limited("ops@example.com").await);
    }

    #[tokio::test]
    async fn test_email_key_ignores_case() {
        let limiter = LoginRateLimiter::new();
        for email in ["A@x.io", "a@X.io", "A@X.IO", "a@x.io", "a@x.IO"] {
            limiter.record_failed_attempt(email).await;
        }
        assert!(limiter.is_email_limited("a@x.io").await);
    }

    #[tokio::test]
    async fn test_ip_limit_after_ten_requests() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..9 {
            assert!(!limiter.is_ip_limited("203.0.113.7").await);
            limiter.record_ip_request("203.0.113.7").await;
        }
        limiter.record_ip_request("203.0.113.7").await;
        assert!(limiter.is_ip_limited("203.0.113.7").await);
        assert!(!limiter.is_ip_limited("203.0.113.8").await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failed_attempt("a@x.io").await;
        limiter.record_ip_request("203.0.113.7").await;

        limiter.cleanup().await;
        assert_eq!(limiter.tracked_keys().await, 2);
    }
}

/// Rate limiting module for preventing abuse
///
/// Implements sliding window rate limiting using in-memory storage (DashMap).
/// This is suitable for single-instance deployments. For multi-instance
/// deployments, consider using a shared backing store.
///
/// Limits are loaded from the application config at startup and can be
/// reloaded without a restart.
use arc_swap::ArcSwap;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config;

/// Global rate limiter instance
pub static RATE_LIMITER: Lazy<Arc<RateLimiter>> = Lazy::new(|| Arc::new(RateLimiter::new()));

/// Global rate limit configuration (hot-reloadable)
static RATE_LIMIT_CONFIG: Lazy<ArcSwap<RateLimitConfig>> =
    Lazy::new(|| ArcSwap::from_pointee(RateLimitConfig::default()));

/// Rate limit windows derived from the application config
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login_max: usize,
    pub login_window: Duration,
    pub registration_max: usize,
    pub registration_window: Duration,
    /// Water source and review submissions share one bucket.
    pub submission_max: usize,
    pub submission_window: Duration,
    pub upload_max: usize,
    pub upload_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from_config(&app_config::RateLimitConfig::default())
    }
}

impl RateLimitConfig {
    pub fn from_config(config: &app_config::RateLimitConfig) -> Self {
        Self {
            login_max: config.login_max_attempts as usize,
            login_window: Duration::from_secs(config.login_window_seconds as u64),
            registration_max: config.registration_per_hour as usize,
            registration_window: Duration::from_secs(3600),
            submission_max: config.submission_max as usize,
            submission_window: Duration::from_secs(config.submission_window_seconds as u64),
            upload_max: config.uploads_per_minute as usize,
            upload_window: Duration::from_secs(60),
        }
    }
}

/// Initialize rate limits from config (call at startup after loading config)
pub fn init_rate_limits(config: &app_config::AppConfig) {
    let rate_config = RateLimitConfig::from_config(&config.rate_limit);
    RATE_LIMIT_CONFIG.store(Arc::new(rate_config));
    log::info!("Rate limit configuration initialized");
}

/// Get the current rate limit configuration
pub fn get_rate_limit_config() -> Arc<RateLimitConfig> {
    RATE_LIMIT_CONFIG.load_full()
}

/// Rate limiter using in-memory storage
pub struct RateLimiter {
    /// Map of (action_type:identifier) -> Request timestamps
    requests: DashMap<String, Vec<Instant>>,
}

/// Error returned when rate limit is exceeded
#[derive(Debug, Clone)]
pub struct RateLimitError {
    /// Number of seconds until the rate limit resets
    pub retry_after_seconds: u64,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            requests: DashMap::new(),
        }
    }

    /// Check if a request should be rate limited
    ///
    /// # Arguments
    /// * `action` - The action being rate limited (e.g., "login", "submit")
    /// * `identifier` - Unique identifier for the requester (e.g., IP address)
    /// * `max_requests` - Maximum number of requests allowed in the window
    /// * `window` - Time window for the rate limit
    pub fn check_rate_limit(
        &self,
        action: &str,
        identifier: &str,
        max_requests: usize,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        let key = format!("{}:{}", action, identifier);
        let now = Instant::now();

        let mut entry = self.requests.entry(key).or_default();

        // Remove requests outside the time window (sliding window)
        entry.retain(|&timestamp| now.duration_since(timestamp) < window);

        if entry.len() >= max_requests {
            // Calculate how long until the oldest request expires
            let oldest = entry[0];
            let retry_after = window.saturating_sub(now.duration_since(oldest));

            return Err(RateLimitError {
                retry_after_seconds: retry_after.as_secs() + 1, // Round up
            });
        }

        entry.push(now);

        Ok(())
    }

    /// Clean up old entries to prevent memory leaks
    ///
    /// This should be called periodically (e.g., every 5 minutes) to remove
    /// entries for keys that haven't been used recently.
    pub fn cleanup_old_entries(&self) {
        self.requests.retain(|_, timestamps| !timestamps.is_empty());
    }

    /// Clear all requests for a specific action/identifier
    pub fn clear_requests(&self, action: &str, identifier: &str) {
        let key = format!("{}:{}", action, identifier);
        self.requests.remove(&key);
    }

    /// Get the number of tracked keys (for monitoring/debugging)
    pub fn tracked_keys_count(&self) -> usize {
        self.requests.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic cleanup entry point for the background task in main.
pub fn cleanup_old_entries_public() {
    RATE_LIMITER.cleanup_old_entries();
}

// ============================================================================
// Helper functions for common rate-limited actions
// ============================================================================

/// Check rate limit for login attempts
///
/// Uses configurable limit per IP+email combination
pub fn check_login_rate_limit(ip: &str, email: &str) -> Result<(), RateLimitError> {
    let config = get_rate_limit_config();
    RATE_LIMITER.check_rate_limit(
        "login",
        &format!("{}:{}", ip, email),
        config.login_max,
        config.login_window,
    )
}

/// Check rate limit for user registration
pub fn check_registration_rate_limit(ip: &str) -> Result<(), RateLimitError> {
    let config = get_rate_limit_config();
    RATE_LIMITER.check_rate_limit(
        "register",
        ip,
        config.registration_max,
        config.registration_window,
    )
}

/// Check rate limit for water source and review submissions
pub fn check_submission_rate_limit(ip: &str) -> Result<(), RateLimitError> {
    let config = get_rate_limit_config();
    RATE_LIMITER.check_rate_limit(
        "submit",
        ip,
        config.submission_max,
        config.submission_window,
    )
}

/// Check rate limit for photo uploads
pub fn check_upload_rate_limit(ip: &str) -> Result<(), RateLimitError> {
    let config = get_rate_limit_config();
    RATE_LIMITER.check_rate_limit("upload", ip, config.upload_max, config.upload_window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_blocks() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            assert!(limiter.check_rate_limit("test", "1.2.3.4", 3, window).is_ok());
        }
        let err = limiter
            .check_rate_limit("test", "1.2.3.4", 3, window)
            .unwrap_err();
        assert!(err.retry_after_seconds > 0);
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);

        assert!(limiter.check_rate_limit("test", "a", 1, window).is_ok());
        assert!(limiter.check_rate_limit("test", "b", 1, window).is_ok());
        assert!(limiter.check_rate_limit("test", "a", 1, window).is_err());
    }

    #[test]
    fn clearing_resets_the_window() {
        let limiter = RateLimiter::new();
        let window = Duration::from_secs(60);

        assert!(limiter.check_rate_limit("test", "a", 1, window).is_ok());
        assert!(limiter.check_rate_limit("test", "a", 1, window).is_err());
        limiter.clear_requests("test", "a");
        assert!(limiter.check_rate_limit("test", "a", 1, window).is_ok());
    }
}

//! Application-wide constants
//!
//! This module contains constants used throughout the application.

/// Duplicate-location tolerance in decimal degrees
/// Two water sources whose coordinates differ by less than this on both
/// axes are treated as the same physical location. The check is
/// degree-based, not distance-based, so longitude spacing is coarser
/// near the poles.
pub const COORDINATE_TOLERANCE_DEGREES: f64 = 1e-4;

/// Inclusive lower bound for review ratings
pub const RATING_MIN: i32 = 1;

/// Inclusive upper bound for review ratings
pub const RATING_MAX: i32 = 5;

/// Upload size cap applied when the config file does not set one
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Failed login attempts before an account is temporarily locked
pub const MAX_FAILED_LOGIN_ATTEMPTS: i32 = 5;

/// Minutes an account stays locked after too many failed logins
pub const LOCKOUT_DURATION_MINUTES: i64 = 15;

//! Domain constants shared across crates.

/// Reserved token marking a calendar slot bookable. Matching is
/// case-insensitive and substring-based; see [`crate::utils::availability`].
pub const AVAILABILITY_TOKEN: &str = "AVAILABLE";

/// Summary written to a slot when a booking succeeds.
pub const BOOKED_SUMMARY: &str = "BOOKED";

/// Default listing window, in days from now.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 30;

/// Default interval between relabel reconciliation passes, in seconds.
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 30;

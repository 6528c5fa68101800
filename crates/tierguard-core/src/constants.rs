//! Shared constants: window lengths, lifecycle defaults, file names.

/// Monthly query window, in days.
pub const MONTHLY_WINDOW_DAYS: i64 = 30;

/// Daily query window, in days.
pub const DAILY_WINDOW_DAYS: i64 = 1;

/// Length of the trial granted on first touch.
pub const DEFAULT_TRIAL_DAYS: i64 = 7;

/// Length of the paid_limited grace window after a payment failure.
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 7;

/// Documents kept when a lapsed grace period drops the client to free.
pub const DEFAULT_RETAINED_DOCUMENTS: usize = 3;

/// Extra queries allowed past a quota before requests are blocked.
pub const DEFAULT_QUERY_OVERAGE_ALLOWANCE: u32 = 5;

/// How often the overage allowance is refilled.
pub const DEFAULT_GRACE_REPLENISH_DAYS: i64 = 30;

/// Lookback for violation counts and upgrade signals.
pub const SIGNAL_LOOKBACK_DAYS: i64 = 30;

/// Usage percentage at which a warning is emitted.
pub const USAGE_WARNING_PCT: f64 = 90.0;

/// Usage percentage at which free/trial clients are prompted to upgrade.
pub const UPGRADE_PROMPT_PCT: f64 = 80.0;

/// Average daily queries above which a high-usage recommendation is made.
pub const HIGH_USAGE_QUERIES_PER_DAY: f64 = 10.0;

pub const USAGE_FILE_NAME: &str = "usage.json";
pub const SUBSCRIPTION_FILE_NAME: &str = "subscription.json";

/// Source label attached to every notification this system emits.
pub const NOTIFICATION_SOURCE: &str = "subscription";

mod feature_flag;
mod quota;
mod subscription;
mod tier;
mod tier_history;
mod violation;

pub use feature_flag::FeatureFlag;
pub use quota::{GraceOutcome, LimitBreach, QueryLimitCheck, QuotaDecision, QuotaWindow, RemainingQuota, UpgradeSignals};
pub use subscription::Subscription;
pub use tier::{ApiKeyMode, Tier};
pub use tier_history::TierHistoryEntry;
pub use violation::{ViolationAction, ViolationRecord, ViolationType};

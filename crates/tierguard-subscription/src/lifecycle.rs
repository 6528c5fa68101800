//! Tier lifecycle: expiry checks, transitions, payment signals and license
//! activation.
//!
//! ```text
//! trial ──(trial window over)──────────────▶ free
//! paid ──(payment failed)──▶ paid_limited ──(grace over)──▶ free
//!                            paid_limited ──(payment restored)──▶ paid
//! any ──(license activated for T)──▶ T
//! ```

use chrono::Duration;
use tierguard_core::catalog::TierCatalog;
use tierguard_core::models::{ApiKeyMode, Subscription, Tier};
use tierguard_core::{TierguardErrorCode, TierguardResult};
use tracing::{debug, info, warn};

use crate::manager::SubscriptionManager;
use crate::notify::{Notification, NotificationKind, NotificationSink};
use crate::registry::DocumentRegistry;

/// Outcome of the paid_limited → free document cleanup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub kept: usize,
    pub removed: usize,
    pub failed: usize,
}

impl<N: NotificationSink, D: DocumentRegistry> SubscriptionManager<N, D> {
    /// Apply time-based transitions due now. Returns `true` only if the tier
    /// changed. The first call on a fresh install opens the trial window.
    pub async fn check_tier_expiry(&self) -> TierguardResult<bool> {
        let now = self.clock.now();
        let subscription = self.get_current_subscription().await?;

        match subscription.tier {
            Tier::Trial if subscription.trial_expires_at.is_none() => {
                self.start_trial_window().await?;
                Ok(false)
            }
            Tier::Trial if subscription.trial_expired(now) => {
                self.transition_tier(Tier::Free, "trial expired").await
            }
            Tier::PaidLimited if subscription.grace_expired(now) => {
                self.transition_tier(Tier::Free, "grace period expired").await
            }
            _ => Ok(false),
        }
    }

    async fn start_trial_window(&self) -> TierguardResult<()> {
        let now = self.clock.now();
        let trial_days = self.lifecycle.trial_days;
        let started = self
            .subscriptions
            .update(|record| {
                let sub = &mut record.subscription;
                if sub.tier != Tier::Trial || sub.trial_expires_at.is_some() {
                    return (false, None);
                }
                sub.trial_started_at = Some(now);
                sub.trial_expires_at = Some(now + Duration::days(trial_days));
                (true, sub.trial_expires_at)
            })
            .await?;

        if let Some(expires) = started {
            info!(%expires, trial_days, "trial started");
            self.notify(Notification::new(
                NotificationKind::TrialStarted,
                "Welcome to your trial",
                format!(
                    "Your {trial_days}-day trial has started and runs until {}.",
                    expires.format("%Y-%m-%d")
                ),
            ))
            .await;
        }
        Ok(())
    }

    /// Move to `new`. Returns `false` without side effects when already there.
    ///
    /// Entering paid_limited opens a grace window; entering any other tier
    /// clears it. The API-key mode follows the new tier's `use_default_keys`.
    /// Leaving paid_limited for free removes documents past the retained count.
    ///
    /// The tier history and the cleanup run before the subscription record is
    /// committed. Both are safe to repeat, so if either fails the tier stays
    /// put and the next call redoes the whole transition.
    pub async fn transition_tier(&self, new: Tier, reason: &str) -> TierguardResult<bool> {
        let old = self.current_tier().await?;
        if old == new {
            debug!(tier = %new, reason, "transition skipped, tier unchanged");
            return Ok(false);
        }

        self.usage.record_tier_change(old, new, reason, None, None).await?;

        let cleanup = if old == Tier::PaidLimited && new == Tier::Free {
            Some(self.retain_earliest_documents().await?)
        } else {
            None
        };

        let now = self.clock.now();
        let grace_days = self.lifecycle.grace_period_days;
        let key_mode = ApiKeyMode::for_default_keys(TierCatalog::features(new).use_default_keys);
        let committed = self
            .subscriptions
            .update(|record| {
                if record.subscription.tier != old {
                    return (false, None);
                }
                let sub = &mut record.subscription;
                sub.tier = new;
                sub.last_tier_change = Some(now);
                if new == Tier::PaidLimited {
                    sub.grace_period_started_at = Some(now);
                    sub.grace_period_expires_at = Some(now + Duration::days(grace_days));
                } else {
                    sub.clear_grace_window();
                }
                record.settings.api_key_mode = key_mode;
                (true, Some(sub.clone()))
            })
            .await?;

        let Some(subscription) = committed else {
            warn!(from = %old, to = %new, reason, "tier changed underneath the transition");
            return Ok(false);
        };
        info!(from = %old, to = %new, reason, ?key_mode, "tier transition");
        self.notify(transition_notice(old, new, &subscription, cleanup))
            .await;
        Ok(true)
    }

    /// paid → paid_limited. No-op from any other tier.
    pub async fn handle_payment_failed(&self) -> TierguardResult<bool> {
        if self.current_tier().await? != Tier::Paid {
            debug!("payment failure ignored outside the paid tier");
            return Ok(false);
        }
        self.transition_tier(Tier::PaidLimited, "payment failed").await
    }

    /// paid_limited → paid. No-op from any other tier.
    pub async fn handle_payment_restored(&self) -> TierguardResult<bool> {
        if self.current_tier().await? != Tier::PaidLimited {
            debug!("payment restoration ignored outside the paid_limited tier");
            return Ok(false);
        }
        self.transition_tier(Tier::Paid, "payment restored").await
    }

    /// Validate `token` and assign its tier directly.
    ///
    /// A rejected token leaves the stored subscription untouched and surfaces
    /// as `TierguardError::InvalidLicense`.
    pub async fn activate_license(&self, token: &str) -> TierguardResult<Subscription> {
        let payload = match self.validator.validate(token) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "license activation rejected");
                return Err(e.into());
            }
        };
        let licensed = self.validator.extract_subscription(&payload);
        let new = payload.tier;
        let old = self.current_tier().await?;

        // Usage first: a failure here leaves the subscription as it was.
        self.usage
            .record_license_validation(&payload.license_id, new, payload.algorithm.as_str())
            .await?;
        if old != new {
            self.usage
                .record_tier_change(
                    old,
                    new,
                    "license activated",
                    Some(&payload.license_id),
                    payload.expires_at(),
                )
                .await?;
        }

        let key_mode = ApiKeyMode::for_default_keys(TierCatalog::features(new).use_default_keys);
        let token = token.trim().to_string();
        let subscription = self
            .subscriptions
            .update(|record| {
                let mut next = licensed;
                // Trial timestamps are history; a non-trial license keeps them.
                if new != Tier::Trial {
                    next.trial_started_at = record.subscription.trial_started_at;
                    next.trial_expires_at = record.subscription.trial_expires_at;
                }
                if record.subscription.tier == new {
                    next.last_tier_change = record.subscription.last_tier_change;
                } else {
                    record.settings.api_key_mode = key_mode;
                }
                next.license_token = Some(token);
                record.subscription = next;
                (true, record.subscription.clone())
            })
            .await?;

        if old != new {
            info!(from = %old, to = %new, license_id = %payload.license_id, "license activated");
            if new == Tier::Paid {
                self.notify(Notification::new(
                    NotificationKind::WelcomePaid,
                    "Welcome to paid",
                    "Your license is active. Documents and queries are now unlimited.",
                ))
                .await;
            }
        } else {
            info!(tier = %new, license_id = %payload.license_id, "license renewed");
        }
        Ok(subscription)
    }

    /// Keep the earliest `retained_documents` by creation time; delete the rest.
    /// Registry failures are logged and the next document is tried.
    async fn retain_earliest_documents(&self) -> TierguardResult<CleanupReport> {
        let keep = self.lifecycle.retained_documents;
        let mut documents = match self.registry.list().await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(error = %e, "could not list documents for downgrade cleanup");
                return Ok(CleanupReport::default());
            }
        };
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let mut report = CleanupReport {
            kept: documents.len().min(keep),
            ..CleanupReport::default()
        };
        for document in documents.iter().skip(keep) {
            match self.registry.delete(&document.id).await {
                Ok(()) => {
                    // usage history is keyed by upload name, not registry id
                    self.usage.record_document_deletion(&document.name).await?;
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(document_id = %document.id, error = %e, "document delete failed during downgrade");
                    report.failed += 1;
                }
            }
        }
        if report.failed > 0 {
            warn!(failed = report.failed, removed = report.removed, "downgrade cleanup incomplete");
        } else {
            info!(kept = report.kept, removed = report.removed, "downgrade cleanup finished");
        }
        Ok(report)
    }
}

fn transition_notice(
    old: Tier,
    new: Tier,
    subscription: &Subscription,
    cleanup: Option<CleanupReport>,
) -> Notification {
    let free = TierCatalog::features(Tier::Free);
    match (old, new) {
        (Tier::Trial, Tier::Free) => Notification::new(
            NotificationKind::TrialEnded,
            "Your trial has ended",
            format!(
                "You are now on the free tier: {} documents and {} queries per month. \
                 Add your own API keys to keep using AI features.",
                free.max_documents, free.max_queries_monthly
            ),
        ),
        (Tier::PaidLimited, Tier::Free) => {
            let kept = cleanup.map_or(0, |c| c.kept);
            Notification::new(
                NotificationKind::Downgraded,
                "Subscription downgraded",
                format!(
                    "Your grace period ended and your account moved to the free tier. \
                     Your {kept} earliest documents were kept."
                ),
            )
        }
        (_, Tier::PaidLimited) => {
            let until = subscription
                .grace_period_expires_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            Notification::new(
                NotificationKind::PaymentIssue,
                "Payment issue",
                format!(
                    "We could not process your payment. Reduced limits apply until {until}; \
                     after that the account moves to the free tier."
                ),
            )
        }
        (Tier::PaidLimited, Tier::Paid) => Notification::new(
            NotificationKind::PaymentRestored,
            "Payment restored",
            "Your payment went through and full paid access is back.",
        ),
        _ => Notification::new(
            NotificationKind::TierChanged,
            "Subscription changed",
            format!("Your tier changed from {old} to {new}."),
        ),
    }
}

//! Synchronous client for call sites without an async runtime.
//!
//! One named worker thread owns a current-thread tokio runtime and the
//! manager. Requests arrive over a bounded crossbeam channel, each carrying
//! its own reply channel, and run one at a time.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use tierguard_core::clock::{Clock, SystemClock};
use tierguard_core::config::TierguardConfig;
use tierguard_core::models::{ApiKeyMode, FeatureFlag, QuotaDecision, Subscription, Tier};
use tierguard_core::{TierguardError, TierguardResult};
use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::insights::{TierStatus, UpgradeRecommendation, UsageStats};
use crate::manager::SubscriptionManager;
use crate::notify::NotificationSink;
use crate::registry::DocumentRegistry;

const CHANNEL_BOUND: usize = 64;
const WORKER_NAME: &str = "tierguard-subscription";

type Reply<T> = Sender<TierguardResult<T>>;

enum Request {
    CurrentSubscription(Reply<Subscription>),
    ApiKeyMode(Reply<ApiKeyMode>),
    CheckTierExpiry(Reply<bool>),
    TransitionTier {
        tier: Tier,
        reason: String,
        reply: Reply<bool>,
    },
    PaymentFailed(Reply<bool>),
    PaymentRestored(Reply<bool>),
    ActivateLicense {
        token: String,
        reply: Reply<Subscription>,
    },
    CheckUploadAllowed(Reply<QuotaDecision>),
    CheckDocumentSize {
        size_mb: f64,
        reply: Reply<QuotaDecision>,
    },
    CheckQueryAllowed(Reply<QuotaDecision>),
    RecordQuery(Reply<()>),
    RecordDocumentUpload {
        name: String,
        size_mb: f64,
        reply: Reply<()>,
    },
    RecordDocumentDeletion {
        name: String,
        reply: Reply<bool>,
    },
    RecordFeatureUsage {
        flag: FeatureFlag,
        reply: Reply<()>,
    },
    UsageStats(Reply<UsageStats>),
    TierStatus(Reply<TierStatus>),
    UpgradeRecommendations(Reply<Vec<UpgradeRecommendation>>),
    Shutdown,
}

/// Blocking facade over [`SubscriptionManager`]. Dropping it stops the worker.
pub struct BlockingSubscriptionClient {
    tx: Sender<Request>,
    handle: Option<JoinHandle<()>>,
}

impl BlockingSubscriptionClient {
    /// Open the manager on a new worker thread using the system clock.
    pub fn open<N, D>(config: TierguardConfig, sink: N, registry: D) -> TierguardResult<Self>
    where
        N: NotificationSink + 'static,
        D: DocumentRegistry + 'static,
    {
        Self::open_with_clock(config, Arc::new(SystemClock), sink, registry)
    }

    /// Open the manager on a new worker thread. Open failures (bad config,
    /// corrupt store) are returned here and the worker exits.
    pub fn open_with_clock<N, D>(
        config: TierguardConfig,
        clock: Arc<dyn Clock>,
        sink: N,
        registry: D,
    ) -> TierguardResult<Self>
    where
        N: NotificationSink + 'static,
        D: DocumentRegistry + 'static,
    {
        let runtime = build_runtime()?;
        let (tx, rx) = bounded(CHANNEL_BOUND);
        let (ready_tx, ready_rx) = bounded::<TierguardResult<()>>(1);

        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                let opened = runtime.block_on(SubscriptionManager::open_with_clock(
                    &config, clock, sink, registry,
                ));
                match opened {
                    Ok(manager) => {
                        let _ = ready_tx.send(Ok(()));
                        worker_loop(&runtime, &manager, &rx);
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| TierguardError::WorkerUnavailable(format!("failed to spawn worker: {e}")))?;

        let ready = ready_rx.recv().map_err(|_| {
            TierguardError::WorkerUnavailable("worker exited during startup".to_string())
        });
        match ready {
            Ok(Ok(())) => Ok(Self {
                tx,
                handle: Some(handle),
            }),
            Ok(Err(e)) | Err(e) => {
                let _ = handle.join();
                Err(e)
            }
        }
    }

    /// Move an already-opened manager onto a worker thread.
    pub fn spawn<N, D>(manager: SubscriptionManager<N, D>) -> TierguardResult<Self>
    where
        N: NotificationSink + 'static,
        D: DocumentRegistry + 'static,
    {
        let runtime = build_runtime()?;
        let (tx, rx) = bounded(CHANNEL_BOUND);
        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker_loop(&runtime, &manager, &rx))
            .map_err(|e| TierguardError::WorkerUnavailable(format!("failed to spawn worker: {e}")))?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    pub fn get_current_subscription(&self) -> TierguardResult<Subscription> {
        self.call(Request::CurrentSubscription)
    }

    pub fn api_key_mode(&self) -> TierguardResult<ApiKeyMode> {
        self.call(Request::ApiKeyMode)
    }

    pub fn check_tier_expiry(&self) -> TierguardResult<bool> {
        self.call(Request::CheckTierExpiry)
    }

    pub fn transition_tier(&self, tier: Tier, reason: &str) -> TierguardResult<bool> {
        let reason = reason.to_string();
        self.call(|reply| Request::TransitionTier {
            tier,
            reason,
            reply,
        })
    }

    pub fn handle_payment_failed(&self) -> TierguardResult<bool> {
        self.call(Request::PaymentFailed)
    }

    pub fn handle_payment_restored(&self) -> TierguardResult<bool> {
        self.call(Request::PaymentRestored)
    }

    pub fn activate_license(&self, token: &str) -> TierguardResult<Subscription> {
        let token = token.to_string();
        self.call(|reply| Request::ActivateLicense { token, reply })
    }

    pub fn check_upload_allowed(&self) -> TierguardResult<QuotaDecision> {
        self.call(Request::CheckUploadAllowed)
    }

    pub fn check_document_size(&self, size_mb: f64) -> TierguardResult<QuotaDecision> {
        self.call(|reply| Request::CheckDocumentSize { size_mb, reply })
    }

    pub fn check_query_allowed(&self) -> TierguardResult<QuotaDecision> {
        self.call(Request::CheckQueryAllowed)
    }

    pub fn record_query(&self) -> TierguardResult<()> {
        self.call(Request::RecordQuery)
    }

    pub fn record_document_upload(&self, name: &str, size_mb: f64) -> TierguardResult<()> {
        let name = name.to_string();
        self.call(|reply| Request::RecordDocumentUpload {
            name,
            size_mb,
            reply,
        })
    }

    pub fn record_document_deletion(&self, name: &str) -> TierguardResult<bool> {
        let name = name.to_string();
        self.call(|reply| Request::RecordDocumentDeletion { name, reply })
    }

    pub fn record_feature_usage(&self, flag: FeatureFlag) -> TierguardResult<()> {
        self.call(|reply| Request::RecordFeatureUsage { flag, reply })
    }

    pub fn get_usage_stats(&self) -> TierguardResult<UsageStats> {
        self.call(Request::UsageStats)
    }

    pub fn get_tier_status(&self) -> TierguardResult<TierStatus> {
        self.call(Request::TierStatus)
    }

    pub fn get_upgrade_recommendations(&self) -> TierguardResult<Vec<UpgradeRecommendation>> {
        self.call(Request::UpgradeRecommendations)
    }

    /// Send a request and block for its reply.
    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> TierguardResult<T> {
        let (reply_tx, reply_rx) = bounded(1);
        self.tx
            .send(make(reply_tx))
            .map_err(|_| TierguardError::WorkerUnavailable("worker has stopped".to_string()))?;
        reply_rx.recv().map_err(|_| {
            TierguardError::WorkerUnavailable("worker dropped the request".to_string())
        })?
    }
}

impl Drop for BlockingSubscriptionClient {
    fn drop(&mut self) {
        let _ = self.tx.send(Request::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("subscription worker panicked");
            }
        }
    }
}

fn build_runtime() -> TierguardResult<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TierguardError::WorkerUnavailable(format!("failed to build runtime: {e}")))
}

fn worker_loop<N, D>(runtime: &Runtime, manager: &SubscriptionManager<N, D>, rx: &Receiver<Request>)
where
    N: NotificationSink,
    D: DocumentRegistry,
{
    debug!("subscription worker started");
    while let Ok(request) = rx.recv() {
        // A caller that gave up on its reply is not an error.
        match request {
            Request::CurrentSubscription(reply) => {
                let _ = reply.send(runtime.block_on(manager.get_current_subscription()));
            }
            Request::ApiKeyMode(reply) => {
                let _ = reply.send(runtime.block_on(manager.api_key_mode()));
            }
            Request::CheckTierExpiry(reply) => {
                let _ = reply.send(runtime.block_on(manager.check_tier_expiry()));
            }
            Request::TransitionTier {
                tier,
                reason,
                reply,
            } => {
                let _ = reply.send(runtime.block_on(manager.transition_tier(tier, &reason)));
            }
            Request::PaymentFailed(reply) => {
                let _ = reply.send(runtime.block_on(manager.handle_payment_failed()));
            }
            Request::PaymentRestored(reply) => {
                let _ = reply.send(runtime.block_on(manager.handle_payment_restored()));
            }
            Request::ActivateLicense { token, reply } => {
                let _ = reply.send(runtime.block_on(manager.activate_license(&token)));
            }
            Request::CheckUploadAllowed(reply) => {
                let _ = reply.send(runtime.block_on(manager.check_upload_allowed()));
            }
            Request::CheckDocumentSize { size_mb, reply } => {
                let _ = reply.send(runtime.block_on(manager.check_document_size(size_mb)));
            }
            Request::CheckQueryAllowed(reply) => {
                let _ = reply.send(runtime.block_on(manager.check_query_allowed()));
            }
            Request::RecordQuery(reply) => {
                let _ = reply.send(runtime.block_on(manager.record_query()));
            }
            Request::RecordDocumentUpload {
                name,
                size_mb,
                reply,
            } => {
                let _ = reply.send(runtime.block_on(manager.record_document_upload(&name, size_mb)));
            }
            Request::RecordDocumentDeletion { name, reply } => {
                let _ = reply.send(runtime.block_on(manager.record_document_deletion(&name)));
            }
            Request::RecordFeatureUsage { flag, reply } => {
                let _ = reply.send(runtime.block_on(manager.record_feature_usage(flag)));
            }
            Request::UsageStats(reply) => {
                let _ = reply.send(runtime.block_on(manager.get_usage_stats()));
            }
            Request::TierStatus(reply) => {
                let _ = reply.send(runtime.block_on(manager.get_tier_status()));
            }
            Request::UpgradeRecommendations(reply) => {
                let _ = reply.send(runtime.block_on(manager.get_upgrade_recommendations()));
            }
            Request::Shutdown => break,
        }
    }
    debug!("subscription worker stopped");
}

//! Generic poll-and-fan-out update primitive.
//!
//! One coordinator owns a single refresh operation against an upstream data
//! source. Entities register passive listener callbacks; after every
//! successful refresh the coordinator invokes each listener synchronously, in
//! registration order, so all listeners observe one self-consistent snapshot
//! per cycle. A failed refresh notifies nobody and leaves listeners on their
//! last computed state.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::warn;

type RefreshError = Box<dyn Error + Send + Sync>;
type RefreshFuture = Pin<Box<dyn Future<Output = Result<(), RefreshError>> + Send>>;
type RefreshFn = Box<dyn Fn() -> RefreshFuture + Send + Sync>;
type Listener = Box<dyn Fn() + Send + Sync>;

pub struct UpdateCoordinator {
    name: &'static str,
    refresh_fn: RefreshFn,
    listeners: Mutex<Vec<Listener>>,
    last_update_success: AtomicBool,
}

impl UpdateCoordinator {
    pub fn new<F, Fut>(name: &'static str, refresh_fn: F) -> Arc<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RefreshError>> + Send + 'static,
    {
        Arc::new(Self {
            name,
            refresh_fn: Box::new(move || Box::pin(refresh_fn())),
            listeners: Mutex::new(Vec::new()),
            last_update_success: AtomicBool::new(true),
        })
    }

    /// Register a listener callback, invoked after each successful refresh.
    ///
    /// Listeners must be synchronous and non-blocking. Notification order is
    /// registration order.
    pub fn add_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push(Box::new(listener));
        }
    }

    /// Run one refresh cycle: poll the upstream source, then fan out to
    /// listeners only if the poll succeeded.
    pub async fn refresh(&self) {
        match (self.refresh_fn)().await {
            Ok(()) => {
                self.last_update_success.store(true, Ordering::SeqCst);
                debug!("[{}] refresh succeeded, notifying listeners", self.name);
                self.notify_listeners();
            }
            Err(e) => {
                self.last_update_success.store(false, Ordering::SeqCst);
                warn!("[{}] refresh failed: {}", self.name, e);
            }
        }
    }

    /// Whether the most recent refresh succeeded. Entities bound to this
    /// coordinator are considered unavailable while this is false.
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::SeqCst)
    }

    fn notify_listeners(&self) {
        if let Ok(listeners) = self.listeners.lock() {
            for listener in listeners.iter() {
                listener();
            }
        }
    }

    /// Start the periodic refresh loop in a background task.
    ///
    /// The first interval tick is consumed without refreshing: integrations
    /// perform one fetch during setup, before any entity exists.
    pub fn spawn(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                coordinator.refresh().await;
            }
        })
    }
}

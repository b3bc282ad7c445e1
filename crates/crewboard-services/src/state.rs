//! Observable dashboard state
//!
//! Every store the presentation layer renders from is an [`Observable`]: a value plus
//! change notification, built on `tokio::sync::watch`. Loads are tracked by a
//! [`LoadTracker`] that hands out generation-stamped [`LoadingGuard`]s. A guard whose
//! generation has been superseded can no longer publish, which is what keeps an
//! overlapping, slower load from overwriting the results of a newer one.

use crate::progress::Progress;
use crewboard_core::models::{Application, Client, Invitation};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// A value with subscribe/notify semantics
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Set only when `predicate` holds for the current value. Check and set are atomic.
    fn set_if(&self, predicate: impl FnOnce(&T) -> bool, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if predicate(current) {
                *current = value;
                true
            } else {
                false
            }
        })
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Error,
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }
}

/// Generation captured when a load started
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Loading flag, error slot, and the load generation counter
#[derive(Debug, Default)]
pub struct LoadTracker {
    generation: AtomicU64,
    status: Observable<LoadStatus>,
    error: Observable<Option<String>>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &Observable<LoadStatus> {
        &self.status
    }

    pub fn error(&self) -> &Observable<Option<String>> {
        &self.error
    }

    pub fn is_loading(&self) -> bool {
        self.status.get().is_loading()
    }

    pub fn current(&self) -> LoadTicket {
        LoadTicket(self.generation.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.current() == ticket
    }

    fn next_ticket(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Start a load that supersedes any load in flight
    pub fn begin(&self) -> LoadingGuard<'_> {
        let ticket = self.next_ticket();
        self.status.set(LoadStatus::Loading);
        self.error.set(None);
        LoadingGuard {
            tracker: self,
            ticket,
            settled: false,
        }
    }

    /// Start a load unless one is already in flight
    pub fn try_begin(&self) -> Option<LoadingGuard<'_>> {
        if !self
            .status
            .set_if(|status| !status.is_loading(), LoadStatus::Loading)
        {
            return None;
        }
        let ticket = self.next_ticket();
        self.error.set(None);
        Some(LoadingGuard {
            tracker: self,
            ticket,
            settled: false,
        })
    }

    /// Wait until no load is in flight
    pub async fn settled(&self) {
        let mut status = self.status.subscribe();
        let _ = status.wait_for(|status| !status.is_loading()).await;
    }

    /// Supersede any load in flight and return to idle with no error
    pub fn invalidate(&self) {
        self.next_ticket();
        self.status.set(LoadStatus::Idle);
        self.error.set(None);
    }
}

/// Handle on one in-flight load.
///
/// Dropping the guard without settling it (early return, cancelled future) returns the
/// tracker to idle, but only while the guard's generation is still current.
#[derive(Debug)]
pub struct LoadingGuard<'a> {
    tracker: &'a LoadTracker,
    ticket: LoadTicket,
    settled: bool,
}

impl LoadingGuard<'_> {
    pub fn is_current(&self) -> bool {
        self.tracker.is_current(self.ticket)
    }

    /// Write `value` into `target` unless this load has been superseded
    pub fn publish<T: Clone>(&self, target: &Observable<T>, value: T) -> bool {
        if !self.is_current() {
            tracing::debug!(
                generation = self.ticket.generation(),
                "Discarding result of superseded load"
            );
            return false;
        }
        target.set(value);
        true
    }

    pub fn succeed(mut self) {
        self.settled = true;
        if self.is_current() {
            self.tracker.status.set(LoadStatus::Idle);
        }
    }

    /// Record a human readable failure message in the error slot
    pub fn fail(mut self, message: impl Into<String>) {
        self.settled = true;
        if self.is_current() {
            self.tracker.error.set(Some(message.into()));
            self.tracker.status.set(LoadStatus::Error);
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.settled && self.is_current() {
            self.tracker
                .status
                .set_if(LoadStatus::is_loading, LoadStatus::Idle);
        }
    }
}

/// Tenant-wide stores filled by the dashboard load
#[derive(Debug, Default)]
pub struct DashboardState {
    pub client: Observable<Option<Client>>,
    pub applications: Observable<Vec<Application>>,
    pub invitations: Observable<Vec<Invitation>>,
    pub progress: Observable<Progress>,
    pub load: LoadTracker,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to initial values; any load in flight is superseded
    pub fn reset(&self) {
        self.load.invalidate();
        self.client.set(None);
        self.applications.set(Vec::new());
        self.invitations.set(Vec::new());
        self.progress.set(Progress::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_guard_resets_loading() {
        let tracker = LoadTracker::new();
        {
            let _guard = tracker.begin();
            assert!(tracker.is_loading());
        }
        assert_eq!(tracker.status().get(), LoadStatus::Idle);
    }

    #[test]
    fn try_begin_refuses_while_loading() {
        let tracker = LoadTracker::new();
        let guard = tracker.try_begin().unwrap();
        assert!(tracker.try_begin().is_none());
        guard.succeed();
        assert!(tracker.try_begin().is_some());
    }

    #[test]
    fn superseded_guard_cannot_publish_or_reset() {
        let tracker = LoadTracker::new();
        let target = Observable::new(0);

        let stale = tracker.begin();
        let fresh = tracker.begin();
        assert!(!stale.publish(&target, 1));
        assert!(fresh.publish(&target, 2));

        stale.fail("late failure");
        assert_eq!(tracker.error().get(), None);
        assert!(tracker.is_loading());

        fresh.succeed();
        assert_eq!(target.get(), 2);
        assert_eq!(tracker.status().get(), LoadStatus::Idle);
    }

    #[test]
    fn fail_records_message() {
        let tracker = LoadTracker::new();
        tracker.begin().fail("Failed to reach the data service");
        assert_eq!(tracker.status().get(), LoadStatus::Error);
        assert_eq!(
            tracker.error().get().as_deref(),
            Some("Failed to reach the data service")
        );

        tracker.invalidate();
        assert_eq!(tracker.status().get(), LoadStatus::Idle);
        assert_eq!(tracker.error().get(), None);
    }

    #[tokio::test]
    async fn settled_waits_for_the_load_in_flight() {
        let tracker = std::sync::Arc::new(LoadTracker::new());
        let guard = tracker.try_begin().unwrap();

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.settled().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        guard.succeed();
        waiter.await.unwrap();
        tracker.settled().await;
    }

    #[tokio::test]
    async fn subscribers_see_updates() {
        let observable = Observable::new(Vec::<u32>::new());
        let mut rx = observable.subscribe();
        observable.update(|v| v.push(7));
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), vec![7]);
    }
}

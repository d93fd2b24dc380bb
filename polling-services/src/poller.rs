//! Poll execution: fetch the unread set, notify for new messages, remember the set.
//!
//! A single [`Poller`] owns the seen set and the timer. Executions are
//! serialized by the async mutex around the [`SeenSetTracker`]; timer ticks
//! that arrive while a poll is in flight are dropped, on-demand requests wait
//! for it and then run their own fetch.

use chrono::Utc;
use shared::api::{LastPoll, PollOutcomeKind};
use shared::MessageSummary;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::credentials::CredentialStore;
use crate::error::{FetchError, NotifyError, PollError};
use crate::notify::NotificationSink;
use crate::provider::MailProvider;
use crate::scheduler::PollTimer;
use crate::tracker::SeenSetTracker;

/// Longest accepted delay between polls (one year)
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A validated, strictly positive delay between polls, at most [`MAX_POLL_INTERVAL`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollInterval(Duration);

impl PollInterval {
    pub fn from_secs_f64(secs: f64) -> Result<Self, PollError> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err(PollError::InvalidArgument(format!(
                "interval must be a positive number of seconds, got {}",
                secs
            )));
        }
        if secs > MAX_POLL_INTERVAL.as_secs_f64() {
            return Err(PollError::InvalidArgument(format!(
                "interval of {} seconds exceeds the maximum of {} seconds",
                secs,
                MAX_POLL_INTERVAL.as_secs()
            )));
        }

        match Duration::try_from_secs_f64(secs) {
            Ok(duration) if !duration.is_zero() => Ok(Self(duration)),
            Ok(_) => Err(PollError::InvalidArgument(format!(
                "interval of {} seconds is too small",
                secs
            ))),
            Err(e) => Err(PollError::InvalidArgument(e.to_string())),
        }
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        Self(Duration::from_secs(60))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Polling,
    Scheduled,
}

/// What asked for a poll; decides how a busy poller coalesces the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTrigger {
    /// Dropped if another poll is in flight
    Timer,
    /// Waits for an in-flight poll, then runs its own
    OnDemand,
}

#[derive(Debug, Clone, Default)]
pub struct PollerOptions {
    pub interval: PollInterval,
    /// Notify for everything unread on the first poll instead of taking it as a baseline
    pub notify_existing_on_start: bool,
}

/// A notification launched for one new message
#[derive(Debug)]
pub struct Dispatch {
    pub message_id: String,
    pub handle: JoinHandle<Result<(), NotifyError>>,
}

#[derive(Debug)]
pub struct PollReport {
    pub fetched: usize,
    /// First poll adopted silently as the starting point
    pub baseline: bool,
    pub dispatches: Vec<Dispatch>,
}

impl PollReport {
    pub fn new_ids(&self) -> Vec<&str> {
        self.dispatches.iter().map(|d| d.message_id.as_str()).collect()
    }
}

#[derive(Debug)]
pub enum PollOutcome {
    Completed(PollReport),
    /// Timer tick coalesced into an in-flight poll
    Skipped,
}

#[derive(Debug, Clone)]
pub struct PollerStatus {
    pub state: PollerState,
    pub monitoring: bool,
    pub interval: PollInterval,
    pub seen_count: usize,
    pub last_poll: Option<LastPoll>,
}

struct PollerMeta {
    interval: PollInterval,
    timer: Option<PollTimer>,
    seen_count: usize,
    last_poll: Option<LastPoll>,
}

pub struct Poller {
    credentials: Arc<CredentialStore>,
    provider: Arc<dyn MailProvider>,
    notifier: Arc<dyn NotificationSink>,
    notify_existing_on_start: bool,
    tracker: tokio::sync::Mutex<SeenSetTracker>,
    in_flight: AtomicBool,
    meta: Mutex<PollerMeta>,
}

/// Clears the in-flight flag even if the poll future is dropped early
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Poller {
    pub fn new(
        credentials: Arc<CredentialStore>,
        provider: Arc<dyn MailProvider>,
        notifier: Arc<dyn NotificationSink>,
        options: PollerOptions,
    ) -> Self {
        Self {
            credentials,
            provider,
            notifier,
            notify_existing_on_start: options.notify_existing_on_start,
            tracker: tokio::sync::Mutex::new(SeenSetTracker::new()),
            in_flight: AtomicBool::new(false),
            meta: Mutex::new(PollerMeta {
                interval: options.interval,
                timer: None,
                seen_count: 0,
                last_poll: None,
            }),
        }
    }

    /// Replace any running timer, poll right away, then every `interval`
    pub fn start(self: &Arc<Self>, interval: PollInterval) {
        let mut meta = self.meta();
        if let Some(previous) = meta.timer.take() {
            previous.cancel();
        }
        meta.interval = interval;
        meta.timer = Some(PollTimer::spawn(
            Arc::downgrade(self),
            interval.as_duration(),
        ));

        tracing::info!("Monitoring inbox every {:?}", interval.as_duration());
    }

    /// Change the polling period.
    ///
    /// A poll already running is left alone; the next tick fires one new period
    /// from now. On an idle poller the value is kept for the next `start`.
    pub fn set_interval(&self, secs: f64) -> Result<PollInterval, PollError> {
        let interval = PollInterval::from_secs_f64(secs)?;

        let mut meta = self.meta();
        meta.interval = interval;
        if let Some(timer) = &meta.timer {
            timer.reschedule(interval.as_duration());
        }

        tracing::info!("Poll interval set to {:?}", interval.as_duration());
        Ok(interval)
    }

    /// Cancel the timer. Safe to call when already stopped.
    pub fn stop(&self) {
        if let Some(timer) = self.meta().timer.take() {
            timer.cancel();
            tracing::info!("Inbox monitoring stopped");
        }
    }

    pub fn state(&self) -> PollerState {
        if self.in_flight.load(Ordering::SeqCst) {
            PollerState::Polling
        } else if self.meta().timer.is_some() {
            PollerState::Scheduled
        } else {
            PollerState::Idle
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.meta().timer.is_some()
    }

    pub fn status(&self) -> PollerStatus {
        let state = self.state();
        let meta = self.meta();
        PollerStatus {
            state,
            monitoring: meta.timer.is_some(),
            interval: meta.interval,
            seen_count: meta.seen_count,
            last_poll: meta.last_poll.clone(),
        }
    }

    /// Snapshot of the seen set; waits for any in-flight poll
    pub async fn seen_ids(&self) -> HashSet<String> {
        self.tracker.lock().await.seen().clone()
    }

    /// Fetch the current unread list without touching the seen set
    pub async fn fetch_current(&self) -> Result<Vec<MessageSummary>, PollError> {
        let credential = self
            .credentials
            .credential()
            .ok_or(PollError::Unauthenticated)?;

        match self.provider.fetch_unread(&credential).await {
            Ok(messages) => Ok(messages),
            Err(FetchError::AuthExpired(reason)) => {
                tracing::error!("Provider rejected the credential: {}", reason);
                self.credentials.invalidate();
                Err(PollError::AuthExpired(reason))
            }
            Err(FetchError::Transient(reason)) => Err(PollError::Fetch(reason)),
        }
    }

    /// Run one poll execution, coalescing with any poll already in flight
    pub async fn poll_once(&self, trigger: PollTrigger) -> Result<PollOutcome, PollError> {
        let mut tracker = match trigger {
            PollTrigger::Timer => match self.tracker.try_lock() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::debug!("Poll already in flight, dropping timer tick");
                    return Ok(PollOutcome::Skipped);
                }
            },
            PollTrigger::OnDemand => self.tracker.lock().await,
        };

        let _in_flight = InFlight::enter(&self.in_flight);
        let result = self.execute(&mut tracker).await;
        self.record(&result, tracker.seen().len());

        result.map(PollOutcome::Completed)
    }

    async fn execute(&self, tracker: &mut SeenSetTracker) -> Result<PollReport, PollError> {
        let messages = match self.fetch_current().await {
            Ok(messages) => messages,
            Err(e @ PollError::Fetch(_)) => {
                tracing::warn!("Error checking emails, keeping previous seen set: {}", e);
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let current: HashSet<String> = messages.iter().map(|m| m.id.clone()).collect();
        let new_ids = tracker.diff(&current);
        let baseline = !tracker.is_primed() && !self.notify_existing_on_start;

        let mut dispatches = Vec::new();
        if baseline {
            tracing::info!(
                "Adopting {} unread message(s) as baseline without notifying",
                current.len()
            );
        } else if !new_ids.is_empty() {
            tracing::info!("Found {} new email(s)", new_ids.len());

            let mut launched = HashSet::new();
            for message in messages.iter().filter(|m| new_ids.contains(&m.id)) {
                if launched.insert(message.id.as_str()) {
                    dispatches.push(self.dispatch(message.clone()));
                }
            }
        }

        tracker.commit(current);

        Ok(PollReport {
            fetched: messages.len(),
            baseline,
            dispatches,
        })
    }

    fn dispatch(&self, message: MessageSummary) -> Dispatch {
        let notifier = Arc::clone(&self.notifier);
        let message_id = message.id.clone();

        let handle = tokio::spawn(async move {
            let result = notifier.notify(&message).await;
            match &result {
                Ok(()) => tracing::debug!(id = %message.id, "Notification sent"),
                Err(e) => tracing::warn!(id = %message.id, "Notification failed: {}", e),
            }
            result
        });

        Dispatch { message_id, handle }
    }

    fn record(&self, result: &Result<PollReport, PollError>, seen_count: usize) {
        let (outcome, fetched, new_messages) = match result {
            Ok(report) if report.baseline => (PollOutcomeKind::Baseline, report.fetched, 0),
            Ok(report) => (
                PollOutcomeKind::Completed,
                report.fetched,
                report.dispatches.len(),
            ),
            Err(PollError::Unauthenticated) => (PollOutcomeKind::Unauthenticated, 0, 0),
            Err(PollError::AuthExpired(_)) => (PollOutcomeKind::AuthExpired, 0, 0),
            Err(_) => (PollOutcomeKind::FetchFailed, 0, 0),
        };

        let mut meta = self.meta();
        meta.seen_count = seen_count;
        meta.last_poll = Some(LastPoll {
            at: Utc::now(),
            outcome,
            fetched,
            new_messages,
        });
    }

    fn meta(&self) -> MutexGuard<'_, PollerMeta> {
        self.meta.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

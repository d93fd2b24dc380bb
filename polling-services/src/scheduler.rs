use std::sync::Weak;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::PollError;
use crate::poller::{PollTrigger, Poller};

/// Handle to the background task that drives timer-triggered polls.
///
/// The task only looks at its control channel between polls, so re-arming or
/// cancelling never interrupts a fetch that is already running.
pub(crate) struct PollTimer {
    control: watch::Sender<Option<Duration>>,
    _task: JoinHandle<()>,
}

impl PollTimer {
    /// Spawn the timer. The first tick fires immediately.
    pub(crate) fn spawn(poller: Weak<Poller>, period: Duration) -> Self {
        let (control, rx) = watch::channel(Some(period));
        let task = tokio::spawn(run(poller, rx, period));
        Self {
            control,
            _task: task,
        }
    }

    /// Next tick fires one full `period` from now, then every `period`
    pub(crate) fn reschedule(&self, period: Duration) {
        self.control.send_replace(Some(period));
    }

    pub(crate) fn cancel(self) {
        self.control.send_replace(None);
    }
}

async fn run(poller: Weak<Poller>, mut control: watch::Receiver<Option<Duration>>, period: Duration) {
    let mut ticker = ticker_at(Instant::now(), period);

    tracing::info!("Poll timer started (interval: {:?})", period);

    loop {
        tokio::select! {
            biased;

            changed = control.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = *control.borrow_and_update();
                match next {
                    Some(period) => match Instant::now().checked_add(period) {
                        Some(start) => {
                            ticker = ticker_at(start, period);
                            tracing::info!("Poll timer re-armed (interval: {:?})", period);
                        }
                        None => {
                            tracing::warn!("Ignoring out of range poll interval {:?}", period);
                        }
                    },
                    None => break,
                }
            }
            _ = ticker.tick() => {
                let Some(poller) = poller.upgrade() else {
                    break;
                };

                tracing::debug!("Running poll cycle");
                match poller.poll_once(PollTrigger::Timer).await {
                    Ok(_) => {}
                    Err(PollError::Unauthenticated) => {
                        tracing::debug!("Skipping poll: not authenticated");
                    }
                    // Continue polling even on error
                    Err(e) => tracing::warn!("Poll cycle failed: {}", e),
                }
            }
        }
    }

    tracing::debug!("Poll timer stopped");
}

fn ticker_at(start: Instant, period: Duration) -> Interval {
    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

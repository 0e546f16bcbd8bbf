use crate::broadcast::{Subscription, UpdateBus};
use crate::completion::CompletionTracker;
use crate::config::TickerTiming;
use crate::models::DashboardData;
use crate::storage::{persist_completed, read_data};
use crate::ticker::{TickerEngine, TickerFrame};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, error, info};

pub struct TickerRuntime {
    pub timing: TickerTiming,
    pub data_path: PathBuf,
    pub completed_path: PathBuf,
}

pub struct TickerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Stops the loop and waits for it, dropping every timer it owns.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.task.await {
            error!("ticker task ended abnormally: {err}");
        }
    }
}

impl TickerRuntime {
    /// Runs the engine on a background task. Bus updates are applied as they
    /// arrive; the data file is re-read every poll interval to catch writes
    /// from other processes.
    pub fn spawn(
        self,
        bus: &UpdateBus,
        initial: DashboardData,
        completed: BTreeSet<String>,
        frames: watch::Sender<TickerFrame>,
    ) -> TickerHandle {
        let subscription = bus.subscribe();
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(self.run(subscription, initial, completed, frames, shutdown_rx));
        TickerHandle { shutdown, task }
    }

    async fn run(
        self,
        mut subscription: Subscription,
        initial: DashboardData,
        completed: BTreeSet<String>,
        frames: watch::Sender<TickerFrame>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let start = Instant::now();
        let mut rng = StdRng::from_os_rng();
        let mut saved_at = initial.saved_at.clone();
        let mut engine = TickerEngine::new(
            self.timing,
            initial,
            CompletionTracker::new(completed),
            start.elapsed(),
        );

        let mut poll = interval(self.timing.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut frame_tick = interval(self.timing.frame_interval);
        frame_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            poll_ms = self.timing.poll_interval.as_millis() as u64,
            rotation_ms = self.timing.rotation_interval.as_millis() as u64,
            "ticker runtime started"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                update = subscription.recv() => match update {
                    Some(update) => engine.handle_update(update, start.elapsed()),
                    None => {
                        debug!("update bus closed");
                        break;
                    }
                },
                _ = poll.tick() => {
                    // an unreadable file keeps the data the engine already has
                    if let Some(snapshot) = read_data(&self.data_path).await {
                        if snapshot.saved_at != saved_at {
                            saved_at = snapshot.saved_at.clone();
                            engine.observe(snapshot, start.elapsed());
                        }
                    }
                }
                _ = frame_tick.tick() => {}
            }

            let now = start.elapsed();
            engine.tick(now, &mut rng);
            frames.send_replace(engine.frame(now));

            if let Some(ids) = engine.take_completions_change() {
                if let Err(err) = persist_completed(&self.completed_path, &ids).await {
                    error!("failed to persist celebrated goals: {err}");
                }
            }
        }

        subscription.unsubscribe();
        info!("ticker runtime stopped");
    }
}

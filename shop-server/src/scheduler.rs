//! Periodic job scheduling
//!
//! Jobs implement [`PeriodicJob`]; a [`Scheduler`] decides how they run.
//! [`IntervalScheduler`] drives them on a tokio interval inside
//! [`BackgroundTasks`], stopping on the shared shutdown token.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::tasks::{BackgroundTasks, TaskKind};

/// Shortest period a job may be scheduled at
pub const MIN_PERIOD: Duration = Duration::from_secs(1);

#[async_trait]
pub trait PeriodicJob: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn run(&self) -> anyhow::Result<()>;
}

pub trait Scheduler {
    /// Run `job` every `every` (at least [`MIN_PERIOD`]), first tick immediately
    fn schedule(&mut self, job: Arc<dyn PeriodicJob>, every: Duration);
}

pub struct IntervalScheduler<'a> {
    tasks: &'a mut BackgroundTasks,
}

impl<'a> IntervalScheduler<'a> {
    pub fn new(tasks: &'a mut BackgroundTasks) -> Self {
        Self { tasks }
    }
}

impl Scheduler for IntervalScheduler<'_> {
    fn schedule(&mut self, job: Arc<dyn PeriodicJob>, every: Duration) {
        let token = self.tasks.shutdown_token();
        let name = job.name();
        if every < MIN_PERIOD {
            tracing::warn!(job = name, ?every, "Period too short, using {MIN_PERIOD:?}");
        }
        let every = every.max(MIN_PERIOD);
        self.tasks.spawn(name, TaskKind::Periodic, async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = job.run().await {
                            tracing::error!(job = name, error = %e, "Periodic job failed");
                        }
                    }
                }
            }
            tracing::debug!(job = name, "Periodic job stopped");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(Arc<AtomicUsize>);

    #[async_trait]
    impl PeriodicJob for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn run(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl PeriodicJob for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn run(&self) -> anyhow::Result<()> {
            anyhow::bail!("always fails")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_scheduler_runs_until_shutdown() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut tasks = BackgroundTasks::new();
        {
            let mut scheduler = IntervalScheduler::new(&mut tasks);
            scheduler.schedule(Arc::new(Counter(count.clone())), Duration::from_secs(60));
            scheduler.schedule(Arc::new(Failing), Duration::from_secs(60));
        }

        tokio::time::sleep(Duration::from_secs(150)).await;
        let seen = count.load(Ordering::SeqCst);
        assert!(seen >= 3, "expected ticks at 0s, 60s, 120s, got {seen}");

        tasks.shutdown().await;
        let after = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_clamped() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut tasks = BackgroundTasks::new();
        IntervalScheduler::new(&mut tasks)
            .schedule(Arc::new(Counter(count.clone())), Duration::ZERO);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let seen = count.load(Ordering::SeqCst);
        assert!((1..=3).contains(&seen), "expected one tick per second, got {seen}");

        tasks.shutdown().await;
    }
}

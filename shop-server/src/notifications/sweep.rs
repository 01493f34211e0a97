//! Delivery of scheduled notifications

use async_trait::async_trait;
use shared::util::now_millis;
use sqlx::PgPool;

use super::push;
use crate::db;
use crate::realtime::RealtimeHub;
use crate::scheduler::PeriodicJob;

const BATCH: i64 = 200;

pub struct NotificationSweep {
    pool: PgPool,
    realtime: RealtimeHub,
}

impl NotificationSweep {
    pub fn new(pool: PgPool, realtime: RealtimeHub) -> Self {
        Self { pool, realtime }
    }
}

#[async_trait]
impl PeriodicJob for NotificationSweep {
    fn name(&self) -> &'static str {
        "notification_sweep"
    }

    async fn run(&self) -> anyhow::Result<()> {
        loop {
            let due = db::notifications::claim_due(&self.pool, now_millis(), BATCH).await?;
            let claimed = due.len() as i64;
            for notification in &due {
                push(&self.realtime, notification).await;
            }
            if claimed > 0 {
                tracing::info!(count = claimed, "Delivered scheduled notifications");
            }
            if claimed < BATCH {
                return Ok(());
            }
        }
    }
}

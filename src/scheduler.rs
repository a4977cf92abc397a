use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::auth::SessionService;
use crate::config::SchedulerConfig;

/// Periodic expired-session sweep. Validation already rejects expired
/// sessions lazily, so this job only keeps stale rows from piling up; it
/// never changes observable behavior.
pub struct Sweeper {
    sessions: Arc<SessionService>,
    config: SchedulerConfig,
}

impl Sweeper {
    #[must_use]
    pub const fn new(sessions: Arc<SessionService>, config: SchedulerConfig) -> Self {
        Self { sessions, config }
    }

    pub async fn start(&self) -> Result<JobScheduler> {
        let scheduler = JobScheduler::new().await?;

        let sessions = self.sessions.clone();
        let job = Job::new_async(self.config.session_sweep_cron.as_str(), move |_id, _sched| {
            let sessions = sessions.clone();
            Box::pin(async move {
                match sessions.prune_expired().await {
                    Ok(0) => {}
                    Ok(pruned) => info!("Pruned {pruned} expired sessions"),
                    Err(e) => error!("Session sweep failed: {e}"),
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;

        info!(
            "Session sweep scheduled ({})",
            self.config.session_sweep_cron
        );
        Ok(scheduler)
    }
}

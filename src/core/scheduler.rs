use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::core::error::{AgentError, Result};
use crate::core::pipeline::Pipeline;

/// Accepts the common 5-field cron form by prepending a seconds column.
/// 6- and 7-field expressions pass through untouched.
pub fn normalize_cron(expr: &str) -> Result<String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        n => Err(AgentError::config(format!(
            "SCHEDULE_CRON must have 5, 6 or 7 fields, got {}: {:?}",
            n, expr
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    Published(u64),
    Failed,
    Skipped,
}

/// Drives the pipeline on a cron schedule. Fires that land while a run is
/// still in flight are skipped rather than queued, and a failed run never
/// takes the scheduler down.
pub struct CronRunner {
    pipeline: Arc<Pipeline>,
    gate: tokio::sync::Mutex<()>,
}

impl CronRunner {
    pub fn new(pipeline: Arc<Pipeline>) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            gate: tokio::sync::Mutex::new(()),
        })
    }

    pub async fn fire(&self) -> FireOutcome {
        let Ok(_guard) = self.gate.try_lock() else {
            warn!("previous scheduled run still in progress, skipping this fire");
            return FireOutcome::Skipped;
        };

        match self.pipeline.run_once(None, None, None).await {
            Ok(result) => {
                info!("scheduled run published post {}", result.post_id);
                FireOutcome::Published(result.post_id)
            }
            Err(e) => {
                error!("scheduled run failed: {}", e);
                FireOutcome::Failed
            }
        }
    }

    pub async fn run_forever(self: Arc<Self>, cron_expr: &str) -> anyhow::Result<()> {
        let normalized = normalize_cron(cron_expr)?;

        let mut scheduler = JobScheduler::new().await?;
        let runner = self.clone();
        let job = Job::new_async(normalized.as_str(), move |_uuid, mut _l| {
            let runner = runner.clone();
            Box::pin(async move {
                runner.fire().await;
            })
        })?;
        let job_id = scheduler.add(job).await?;
        scheduler.start().await?;
        info!("scheduler started: job {} on '{}'", job_id, normalized);

        tokio::signal::ctrl_c().await?;
        info!("shutting down scheduler");
        if let Err(e) = scheduler.shutdown().await {
            warn!("scheduler shutdown reported an error: {}", e);
        }
        Ok(())
    }
}

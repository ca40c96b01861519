//! Mock job queue.
//!
//! Stands in for a real broker: jobs live in an unbounded in-process list
//! and a background task "processes" each one with a simulated delay, a
//! random failure roll and linear backoff between attempts.

use rand::Rng;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Job, JobStatus, JobType};

/// Tuning for the simulated worker.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    /// Attempts allowed before a job is marked failed.
    pub max_retries: u32,
    /// Simulated processing time per attempt.
    pub process_delay: Duration,
    /// Backoff unit; attempt `n` waits `n * retry_backoff` before retrying.
    pub retry_backoff: Duration,
    /// Probability in `[0, 1]` that an attempt fails.
    pub failure_rate: f64,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            process_delay: Duration::from_millis(2000),
            retry_backoff: Duration::from_millis(1000),
            failure_rate: 0.1,
        }
    }
}

impl QueueSettings {
    /// Queue tuning taken from the `QUEUE_*` environment settings.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.queue_max_retries,
            process_delay: Duration::from_millis(config.queue_process_delay_ms),
            retry_backoff: Duration::from_millis(config.queue_retry_backoff_ms),
            failure_rate: config.queue_failure_rate,
        }
    }

    /// Wait before retrying after the `attempts`-th failed attempt.
    pub fn backoff_for(&self, attempts: u32) -> Duration {
        self.retry_backoff.saturating_mul(attempts)
    }
}

/// Decides whether a processing attempt fails.
pub type FailureRoll = Arc<dyn Fn() -> bool + Send + Sync>;

/// In-process job list plus the simulated worker. Clones share the list.
#[derive(Clone)]
pub struct QueueService {
    settings: Arc<QueueSettings>,
    jobs: Arc<RwLock<Vec<Job>>>,
    roll: FailureRoll,
}

impl QueueService {
    /// Queue whose attempts fail at random with `settings.failure_rate`.
    pub fn new(settings: QueueSettings) -> Self {
        let failure_rate = settings.failure_rate;
        Self::with_failure_roll(
            settings,
            Arc::new(move || rand::thread_rng().gen::<f64>() < failure_rate),
        )
    }

    /// Queue whose attempt outcomes come from `roll` instead of the random
    /// draw. `settings.failure_rate` is ignored.
    ///
    /// # Arguments
    ///
    /// * `settings` - retry limit, processing delay and backoff unit.
    /// * `roll` - called once per attempt; `true` fails the attempt.
    pub fn with_failure_roll(settings: QueueSettings, roll: FailureRoll) -> Self {
        Self {
            settings: Arc::new(settings),
            jobs: Arc::new(RwLock::new(Vec::new())),
            roll,
        }
    }

    /// Records a job and starts processing it in the background.
    ///
    /// Returns the job as enqueued; later state is only visible through
    /// [`jobs_by_lead`](Self::jobs_by_lead) and [`job`](Self::job).
    pub async fn add_job(&self, job_type: JobType, data: Value) -> Job {
        let job = Job {
            id: Uuid::new_v4(),
            job_type,
            data,
            status: JobStatus::Pending,
            attempts: 0,
            max_retries: self.settings.max_retries,
        };
        self.jobs.write().await.push(job.clone());
        tracing::info!("[Queue] Added job {} of type {:?}", job.id, job_type);

        let queue = self.clone();
        let id = job.id;
        tokio::spawn(async move { queue.process(id).await });

        job
    }

    /// Jobs whose payload carries `leadId == lead_id`, in enqueue order.
    pub async fn jobs_by_lead(&self, lead_id: &str) -> Vec<Job> {
        self.jobs
            .read()
            .await
            .iter()
            .filter(|job| job.data.get("leadId").and_then(Value::as_str) == Some(lead_id))
            .cloned()
            .collect()
    }

    /// Current snapshot of one job.
    pub async fn job(&self, id: Uuid) -> Option<Job> {
        self.jobs.read().await.iter().find(|job| job.id == id).cloned()
    }

    async fn process(&self, id: Uuid) {
        loop {
            let Some(job) = self.job(id).await else {
                return;
            };

            if job.attempts >= job.max_retries {
                self.set_status(id, JobStatus::Failed).await;
                tracing::error!("[Queue] Job {} FAILED after {} attempts.", id, job.attempts);
                return;
            }

            let attempts = job.attempts + 1;
            self.update(id, |job| {
                job.attempts = attempts;
                job.status = JobStatus::Pending;
            })
            .await;

            tokio::time::sleep(self.settings.process_delay).await;

            if (self.roll)() {
                tracing::warn!(
                    "[Queue] Job {} failed attempt {}. Retrying...",
                    id,
                    attempts
                );
                self.set_status(id, JobStatus::Retrying).await;
                tokio::time::sleep(self.settings.backoff_for(attempts)).await;
            } else {
                self.set_status(id, JobStatus::Completed).await;
                tracing::info!(
                    "[Queue] Job {} ({:?}) completed successfully.",
                    id,
                    job.job_type
                );
                return;
            }
        }
    }

    async fn set_status(&self, id: Uuid, status: JobStatus) {
        self.update(id, |job| job.status = status).await;
    }

    async fn update<F>(&self, id: Uuid, f: F)
    where
        F: FnOnce(&mut Job),
    {
        if let Some(job) = self.jobs.write().await.iter_mut().find(|job| job.id == id) {
            f(job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32, failure_rate: f64) -> QueueService {
        QueueService::new(QueueSettings {
            max_retries,
            process_delay: Duration::from_millis(1),
            retry_backoff: Duration::from_millis(1),
            failure_rate,
        })
    }

    async fn wait_until_settled(queue: &QueueService, id: Uuid) -> Job {
        for _ in 0..500 {
            let job = queue.job(id).await.unwrap();
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("job {} never settled", id);
    }

    #[tokio::test]
    async fn new_job_is_pending_with_no_attempts() {
        let queue = fast(3, 0.0);
        let job = queue
            .add_job(JobType::SendEmail, json!({ "leadId": "abc" }))
            .await;

        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_retries, 3);
    }

    #[tokio::test]
    async fn job_completes_when_nothing_fails() {
        let queue = fast(3, 0.0);
        let job = queue
            .add_job(JobType::SendEmail, json!({ "leadId": "abc" }))
            .await;

        let settled = wait_until_settled(&queue, job.id).await;
        assert_eq!(settled.status, JobStatus::Completed);
        assert_eq!(settled.attempts, 1);
    }

    #[tokio::test]
    async fn job_fails_after_exhausting_retries() {
        let queue = fast(3, 1.0);
        let job = queue
            .add_job(JobType::GenerateAiReply, json!({ "leadId": "abc" }))
            .await;

        let settled = wait_until_settled(&queue, job.id).await;
        assert_eq!(settled.status, JobStatus::Failed);
        assert_eq!(settled.attempts, 3);
    }

    #[tokio::test]
    async fn zero_retries_fails_without_attempting() {
        let queue = fast(0, 0.0);
        let job = queue
            .add_job(JobType::SendEmail, json!({ "leadId": "abc" }))
            .await;

        let settled = wait_until_settled(&queue, job.id).await;
        assert_eq!(settled.status, JobStatus::Failed);
        assert_eq!(settled.attempts, 0);
    }

    #[tokio::test]
    async fn jobs_are_filtered_by_lead() {
        let queue = fast(1, 0.0);
        let first = queue
            .add_job(JobType::SendEmail, json!({ "leadId": "a" }))
            .await;
        queue
            .add_job(JobType::SendEmail, json!({ "leadId": "b" }))
            .await;
        let third = queue
            .add_job(JobType::GenerateAiReply, json!({ "leadId": "a", "aiContent": "hi" }))
            .await;
        queue.add_job(JobType::SendEmail, json!({})).await;

        let ids: Vec<Uuid> = queue.jobs_by_lead("a").await.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![first.id, third.id]);
        assert!(queue.jobs_by_lead("missing").await.is_empty());
    }

    async fn wait_for_status(queue: &QueueService, id: Uuid, status: JobStatus) -> Job {
        for _ in 0..500 {
            let job = queue.job(id).await.unwrap();
            if job.status == status {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("job {} never reached {:?}", id, status);
    }

    #[tokio::test]
    async fn failed_attempt_is_retrying_during_backoff() {
        let queue = QueueService::new(QueueSettings {
            max_retries: 3,
            process_delay: Duration::from_millis(1),
            retry_backoff: Duration::from_millis(500),
            failure_rate: 1.0,
        });
        let job = queue
            .add_job(JobType::SendEmail, json!({ "leadId": "abc" }))
            .await;

        let retrying = wait_for_status(&queue, job.id, JobStatus::Retrying).await;
        assert_eq!(retrying.attempts, 1);
        assert!(!retrying.status.is_terminal());
    }

    #[tokio::test]
    async fn job_recovers_after_a_failed_attempt() {
        let rolls = Arc::new(AtomicU32::new(0));
        let counter = rolls.clone();
        let queue = QueueService::with_failure_roll(
            QueueSettings {
                max_retries: 3,
                process_delay: Duration::from_millis(1),
                retry_backoff: Duration::from_millis(1),
                failure_rate: 0.0,
            },
            Arc::new(move || counter.fetch_add(1, Ordering::SeqCst) == 0),
        );
        let job = queue
            .add_job(JobType::GenerateAiReply, json!({ "leadId": "abc" }))
            .await;

        let settled = wait_until_settled(&queue, job.id).await;
        assert_eq!(settled.status, JobStatus::Completed);
        assert_eq!(settled.attempts, 2);
        assert_eq!(rolls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_grows_linearly() {
        let settings = QueueSettings::default();
        assert_eq!(settings.backoff_for(1), Duration::from_secs(1));
        assert_eq!(settings.backoff_for(3), Duration::from_secs(3));
    }
}

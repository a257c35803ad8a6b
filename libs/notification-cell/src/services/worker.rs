use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, instrument};

use crate::services::{email::EmailSender, templates::render_email};
use crate::{NotificationError, NotificationJob, WorkerConfig};

/// Consumer side of the notification queue.
///
/// Runs until every `NotificationDispatcher` has been dropped. A failed
/// delivery is logged and the worker moves on to the next job.
pub struct NotificationWorker {
    config: WorkerConfig,
    sender: Arc<dyn EmailSender>,
}

impl NotificationWorker {
    pub fn new(config: WorkerConfig, sender: Arc<dyn EmailSender>) -> Self {
        Self { config, sender }
    }

    pub fn spawn(self, receiver: mpsc::Receiver<NotificationJob>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(receiver).await })
    }

    pub async fn run(self, mut receiver: mpsc::Receiver<NotificationJob>) {
        info!("Starting notification worker {}", self.config.worker_id);

        while let Some(job) = receiver.recv().await {
            let job_id = job.job_id;
            if let Err(e) = self.process_job(job).await {
                error!("Worker {} failed to deliver job {}: {}", self.config.worker_id, job_id, e);
            }
        }

        info!("Notification queue closed, worker {} stopping", self.config.worker_id);
    }

    #[instrument(skip(self, job), fields(job_id = %job.job_id, kind = ?job.kind))]
    pub async fn process_job(&self, job: NotificationJob) -> Result<(), NotificationError> {
        let message = render_email(&job, &self.config);
        let limit = Duration::from_secs(self.config.job_timeout_seconds);

        match timeout(limit, self.sender.send(&message)).await {
            Ok(Ok(())) => {
                debug!("Delivered {:?} email for appointment {}", job.kind, job.notice.appointment_id);
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(NotificationError::WorkerTimeout {
                timeout_seconds: self.config.job_timeout_seconds,
            }),
        }
    }
}

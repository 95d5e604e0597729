use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::broker::{BrokerStatus, Task, TaskBroker, TaskId};
use crate::config::RunnerConfig;
use crate::error::Result;
use crate::loader;
use crate::results::ResultLog;
use crate::sweeper::Sweeper;
use crate::worker::{CheckReport, MersenneExecutor};

/// Wires the broker, the sweeper, and a pool of local workers together.
///
/// The broker sits behind one `RwLock`; every operation below takes the lock
/// for a single synchronous call, so the four broker operations and the
/// sweeper scan all exclude each other. Cloning a `Runner` clones handles to
/// the same broker and result sink.
#[derive(Clone)]
pub struct Runner {
    config: RunnerConfig,
    broker: Arc<RwLock<TaskBroker>>,
    results: Option<Arc<Mutex<ResultLog>>>,
}

impl Runner {
    /// Build a runner from a validated configuration. Opens the result sink
    /// eagerly so a bad path fails here instead of mid-run.
    pub fn new(config: RunnerConfig) -> Result<Self> {
        config.validate()?;

        let results = match &config.results_path {
            Some(path) => {
                let log = ResultLog::open(path)?;
                tracing::info!(path = %log.path().display(), "Recording results");
                Some(Arc::new(Mutex::new(log)))
            }
            None => None,
        };
        let broker = Arc::new(RwLock::new(TaskBroker::new(config.lease_ttl)));

        Ok(Self {
            config,
            broker,
            results,
        })
    }

    /// Read the task source and enqueue everything it contains.
    /// Returns the number of tasks enqueued.
    pub async fn load_tasks(&self, source: &Path) -> Result<usize> {
        let tasks = loader::load_tasks(source)?;
        let mut broker = self.broker.write().await;
        let mut enqueued = 0;
        for task in tasks {
            if broker.enqueue(task) {
                enqueued += 1;
            }
        }
        Ok(enqueued)
    }

    /// Lease the next ready task, if any.
    pub async fn request_task(&self) -> Option<Task> {
        self.broker.write().await.dequeue(Instant::now())
    }

    /// Acknowledge `id` and record its report.
    ///
    /// Returns false when the task held no lease, i.e. a late or duplicate
    /// completion. The report is dropped in that case: the first valid
    /// acknowledgment wins, and whoever re-leased the task will deliver
    /// the one that counts.
    pub async fn complete_task(&self, id: TaskId, report: CheckReport) -> bool {
        let acknowledged = self.broker.write().await.acknowledge(id);
        if !acknowledged {
            tracing::warn!(task_id = %id, "Dropping report for task with no active lease");
            return false;
        }

        // Sink I/O stays outside the broker's critical section.
        if let Some(results) = &self.results {
            if let Err(e) = results.lock().await.append(&report) {
                tracing::error!(task_id = %id, error = %e, "Failed to record result");
            }
        }
        true
    }

    /// A worker handing its task back explicitly. The task returns to the
    /// head of the ready queue.
    pub async fn report_failure(&self, id: TaskId) -> bool {
        self.broker.write().await.requeue(id)
    }

    pub async fn status(&self) -> BrokerStatus {
        self.broker.read().await.status()
    }

    /// Shared handle to the broker, for collaborators that drive it
    /// directly (the sweeper, tests).
    pub fn broker(&self) -> Arc<RwLock<TaskBroker>> {
        self.broker.clone()
    }

    /// Run the full pipeline until the backlog drains or `shutdown` fires.
    ///
    /// Spawns the sweeper and `config.workers` polling worker loops, then
    /// watches the broker until no task is queued or leased. All loops stop
    /// through a child of the shutdown token; this method joins them before
    /// returning the final status.
    pub async fn run(&self, shutdown: CancellationToken) -> BrokerStatus {
        let stop = shutdown.child_token();
        let mut handles = Vec::new();

        let sweeper = Sweeper::new(self.config.sweep_interval);
        let sweep_broker = self.broker.clone();
        let sweep_stop = stop.clone();
        handles.push(tokio::spawn(async move {
            sweeper.run(sweep_broker, sweep_stop).await;
        }));

        for worker_id in 0..self.config.workers {
            let runner = self.clone();
            let worker_stop = stop.clone();
            handles.push(tokio::spawn(async move {
                runner.worker_loop(worker_id, worker_stop).await;
            }));
        }

        let mut interval = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if self.broker.read().await.is_drained() {
                        tracing::info!("Backlog drained, stopping");
                        stop.cancel();
                        break;
                    }
                }
                _ = stop.cancelled() => break,
            }
        }

        for handle in handles {
            let _ = handle.await;
        }

        self.status().await
    }

    /// One polling worker: lease, check, acknowledge, repeat.
    ///
    /// Malformed payloads are acknowledged without a report so they cannot
    /// circulate forever; a panicked check hands the task back for another
    /// worker instead.
    async fn worker_loop(self, worker_id: usize, shutdown: CancellationToken) {
        let executor = MersenneExecutor::new();
        let mut interval = tokio::time::interval(self.config.poll_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.cancelled() => {
                    tracing::debug!(worker_id, "Worker stopped");
                    break;
                }
            }

            let Some(task) = self.request_task().await else {
                continue;
            };
            let id = task.id;

            let Some(request) = MersenneExecutor::parse_request(&task) else {
                tracing::error!(task_id = %id, worker_id, "Malformed payload, discarding task");
                self.broker.write().await.acknowledge(id);
                continue;
            };

            tracing::debug!(
                task_id = %id,
                worker_id,
                exponent = request.exponent,
                "Worker picked up task"
            );

            let exec = executor.clone();
            match tokio::task::spawn_blocking(move || exec.check(request)).await {
                Ok(report) => {
                    self.complete_task(id, report).await;
                }
                Err(e) => {
                    tracing::error!(
                        task_id = %id,
                        worker_id,
                        error = %e,
                        "Check did not finish, handing task back"
                    );
                    self.report_failure(id).await;
                }
            }
        }
    }
}

//! Cooperative background scheduler. Tasks are named, run strictly
//! sequentially within a tick, and survive their own failures: a recurring
//! task that errors is logged and rescheduled for its next normal interval,
//! a one-shot task is removed after its single attempt. Time comes in
//! through `Clock` so tests can drive ticks without real waits.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use tokio::task::JoinHandle;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().expect("clock mutex poisoned");
        *guard = *guard + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type TaskFn = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

struct ScheduledTask {
    func: TaskFn,
    /// `None` means one-shot.
    interval: Option<Duration>,
    next_run: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
    run_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStatus {
    pub id: String,
    pub interval_secs: Option<i64>,
    pub next_run: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub run_count: u64,
}

pub struct Scheduler {
    tasks: BTreeMap<String, ScheduledTask>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: BTreeMap::new(),
            clock,
        }
    }

    /// Register a recurring task; the first run lands one interval from now.
    pub fn schedule_recurring<F>(&mut self, id: &str, interval: Duration, func: F)
    where
        F: Fn() -> TaskFuture + Send + Sync + 'static,
    {
        let next_run = self.clock.now() + interval;
        self.tasks.insert(
            id.to_string(),
            ScheduledTask {
                func: Arc::new(func),
                interval: Some(interval),
                next_run,
                last_run: None,
                run_count: 0,
            },
        );
        tracing::info!(task = id, interval_secs = interval.num_seconds(), "scheduled recurring task");
    }

    /// Register a task that runs once after `delay` and is then removed.
    pub fn schedule_once<F>(&mut self, id: &str, delay: Duration, func: F)
    where
        F: Fn() -> TaskFuture + Send + Sync + 'static,
    {
        let next_run = self.clock.now() + delay;
        self.tasks.insert(
            id.to_string(),
            ScheduledTask {
                func: Arc::new(func),
                interval: None,
                next_run,
                last_run: None,
                run_count: 0,
            },
        );
        tracing::info!(task = id, delay_secs = delay.num_seconds(), "scheduled one-shot task");
    }

    pub fn cancel(&mut self, id: &str) -> bool {
        let removed = self.tasks.remove(id).is_some();
        if removed {
            tracing::info!(task = id, "task cancelled");
        }
        removed
    }

    pub fn status(&self) -> Vec<TaskStatus> {
        self.tasks
            .iter()
            .map(|(id, t)| TaskStatus {
                id: id.clone(),
                interval_secs: t.interval.map(|i| i.num_seconds()),
                next_run: t.next_run,
                last_run: t.last_run,
                run_count: t.run_count,
            })
            .collect()
    }

    /// Evaluate every task against the clock and run the due ones, one at a
    /// time. A task never overlaps itself: execution happens on this call's
    /// stack, so a slow task delays later checks instead of double-firing.
    pub async fn tick(&mut self) {
        let now = self.clock.now();
        let due: Vec<String> = self
            .tasks
            .iter()
            .filter(|(_, t)| t.next_run <= now)
            .map(|(id, _)| id.clone())
            .collect();

        for id in due {
            self.run_task(&id).await;
        }
    }

    async fn run_task(&mut self, id: &str) {
        let started = self.clock.now();
        let (func, interval) = match self.tasks.get_mut(id) {
            Some(task) => {
                task.last_run = Some(started);
                task.run_count += 1;
                (task.func.clone(), task.interval)
            }
            None => return,
        };

        tracing::info!(task = id, "executing task");
        counter!("scheduler_task_runs_total").increment(1);
        if let Err(e) = func().await {
            // Failures never disable a recurring job.
            tracing::error!(error = ?e, task = id, "task failed");
            counter!("scheduler_task_failures_total").increment(1);
        }

        match interval {
            Some(interval) => {
                let next = self.clock.now() + interval;
                if let Some(task) = self.tasks.get_mut(id) {
                    task.next_run = next;
                }
            }
            None => {
                self.tasks.remove(id);
                tracing::info!(task = id, "one-shot task completed and removed");
            }
        }
    }

    /// Run the scheduler loop on its own tokio task, checking every
    /// `tick_every` of real time.
    pub fn spawn(mut self, tick_every: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }
}

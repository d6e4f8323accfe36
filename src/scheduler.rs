//! Task scheduler.
//!
//! Runs every recurring activity and the edge handler on one dedicated
//! thread, using `edge-executor` for cooperative scheduling and
//! `async-io-mini` reactor timers for the periods.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  sched thread (App core)                                     │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  edge_executor::LocalExecutor                          │  │
//! │  │                                                        │  │
//! │  │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────┐  │  │
//! │  │  │ liveness │  │ light    │  │ temp     │  │ edge   │  │  │
//! │  │  │ 1 s ⏱    │  │ 60 s ⏱   │  │ 60 s ⏱   │  │ latch  │  │  │
//! │  │  └──────────┘  └──────────┘  └──────────┘  └────────┘  │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A recurring task first fires one full period after the scheduler
//! starts, then on a fixed cadence measured from that start (a slow firing
//! does not push later deadlines back).  The edge task sleeps on the
//! [`EdgeLatch`] and wakes only when the interrupt publishes an edge.

use std::io;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::app::edge::EdgeLatch;
use crate::app::ports::EdgeInput;
use crate::drivers::task_pin::{self, Core};

/// Executor task capacity.
pub const MAX_TASKS: usize = 8;

const SCHED_PRIORITY: u8 = 5;
const SCHED_STACK_KB: usize = 12;

type Action = Box<dyn FnMut() + Send>;
type EdgeHandler = Box<dyn FnMut(bool, &mut dyn EdgeInput) + Send>;

struct RecurringTask {
    label: &'static str,
    period: Duration,
    action: Action,
}

struct EdgeBinding {
    input: Box<dyn EdgeInput>,
    latch: &'static EdgeLatch,
    handler: EdgeHandler,
}

/// Collects tasks at boot, then runs them forever on its own thread.
#[derive(Default)]
pub struct Scheduler {
    recurring: Vec<RecurringTask>,
    edge: Option<EdgeBinding>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("recurring", &self.recurring.iter().map(|t| t.label).collect::<Vec<_>>())
            .field("edge", &self.edge.is_some())
            .finish()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a recurring task.  Returns its slot, or `None` if the period is
    /// zero or the executor is full.
    pub fn every(
        &mut self,
        label: &'static str,
        period: Duration,
        action: impl FnMut() + Send + 'static,
    ) -> Option<usize> {
        if period.is_zero() {
            warn!("Scheduler: '{}' rejected (zero period)", label);
            return None;
        }
        if self.task_count() >= MAX_TASKS {
            warn!("Scheduler: '{}' rejected (executor full)", label);
            return None;
        }
        info!("Scheduler: armed '{}' every {} ms", label, period.as_millis());
        self.recurring.push(RecurringTask {
            label,
            period,
            action: Box::new(action),
        });
        Some(self.recurring.len() - 1)
    }

    /// Register the edge handler.  Replaces any earlier registration.
    pub fn on_edge(
        &mut self,
        input: impl EdgeInput + 'static,
        latch: &'static EdgeLatch,
        handler: impl FnMut(bool, &mut dyn EdgeInput) + Send + 'static,
    ) {
        info!("Scheduler: edge handler registered on port {}", input.port());
        self.edge = Some(EdgeBinding {
            input: Box::new(input),
            latch,
            handler: Box::new(handler),
        });
    }

    /// Number of tasks the executor will run.
    pub fn task_count(&self) -> usize {
        self.recurring.len() + usize::from(self.edge.is_some())
    }

    /// Start the scheduler thread.
    pub fn spawn(self) -> io::Result<JoinHandle<()>> {
        task_pin::spawn_on_core(Core::App, SCHED_PRIORITY, SCHED_STACK_KB, "sched\0", move || self.run())
    }

    /// Drive every task on the calling thread.  Never returns.
    pub fn run(self) {
        let executor: edge_executor::LocalExecutor<'_, MAX_TASKS> = edge_executor::LocalExecutor::new();
        let started = Instant::now();
        let count = self.task_count();

        for task in self.recurring {
            executor.spawn(recurring_loop(task, started)).detach();
        }
        if let Some(edge) = self.edge {
            executor.spawn(edge_loop(edge)).detach();
        }

        info!("Scheduler: running {} task(s)", count);
        block_on(executor.run(core::future::pending::<()>()));
    }
}

/// Next firing on the `started + k * period` grid strictly after `now`.
///
/// Deadlines missed while the executor was stalled are skipped, not replayed.
fn next_deadline(deadline: Instant, period: Duration, now: Instant) -> Instant {
    let mut next = deadline + period;
    while next <= now {
        next += period;
    }
    next
}

async fn recurring_loop(mut task: RecurringTask, started: Instant) {
    let mut deadline = started;
    loop {
        let now = Instant::now();
        let next = next_deadline(deadline, task.period, now);
        if next > deadline + task.period {
            log::debug!("Scheduler: '{}' skipped missed firings", task.label);
        }
        deadline = next;
        async_io_mini::Timer::after(deadline.saturating_duration_since(now)).await;
        log::trace!("Scheduler: fire '{}'", task.label);
        (task.action)();
    }
}

async fn edge_loop(mut edge: EdgeBinding) {
    loop {
        let level = edge.latch.wait().await;
        (edge.handler)(level, &mut *edge.input);
    }
}

/// The ESP-IDF variant parks on a FreeRTOS task notification, which the
/// edge interrupt can raise safely.
#[cfg(target_os = "espidf")]
fn block_on<F: core::future::Future>(fut: F) -> F::Output {
    esp_idf_svc::hal::task::block_on(fut)
}

#[cfg(not(target_os = "espidf"))]
fn block_on<F: core::future::Future>(fut: F) -> F::Output {
    futures_lite::future::block_on(fut)
}

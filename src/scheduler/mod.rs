//! Periodic collection scheduler
//!
//! A [`Scheduler`] owns one dispatcher task holding the interval timer and a
//! command queue. Every run, timed or manual, executes in its own task, so
//! callers never wait on collection and runs may overlap. Recording a run's
//! outcome is a single write under the state lock, which keeps `status()`
//! consistent while runs complete concurrently.

mod pipeline;

pub use pipeline::{Pipeline, RunObserver, RunOutcome};

use crate::model::{Change, RunResult};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use uuid::Uuid;

/// Scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between timed runs
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Run once as soon as the scheduler starts
    #[serde(default = "default_run_immediately")]
    pub run_immediately: bool,

    /// Skip a trigger while another run is still in flight
    #[serde(default)]
    pub single_flight: bool,

    /// Size of the trailing change window reported by `status()`
    #[serde(default = "default_recent_changes")]
    pub recent_changes: usize,
}

fn default_interval_secs() -> u64 {
    3600
}
fn default_run_immediately() -> bool {
    true
}
fn default_recent_changes() -> usize {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            run_immediately: default_run_immediately(),
            single_flight: false,
            recent_changes: default_recent_changes(),
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Point-in-time view of the scheduler
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub is_running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub interval_secs: u64,
    pub last_run_id: Option<Uuid>,
    pub runs_completed: u64,
    /// Runs executing right now
    pub in_flight: usize,
    pub last_results: Vec<RunResult>,
    /// Trailing window of the last run's changes
    pub recent_changes: Vec<Change>,
}

/// What caused a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Timer,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Trigger::Startup => "startup",
            Trigger::Timer => "timer",
            Trigger::Manual => "manual",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
enum Command {
    Arm,
    Disarm,
    Run(Trigger),
}

#[derive(Default)]
struct SchedulerState {
    running: bool,
    next_run: Option<DateTime<Utc>>,
    last_run: Option<DateTime<Utc>>,
    last_run_id: Option<Uuid>,
    runs_completed: u64,
    last_results: Vec<RunResult>,
    last_changes: Vec<Change>,
}

struct Inner {
    pipeline: Pipeline,
    config: SchedulerConfig,
    period: Duration,
    state: RwLock<SchedulerState>,
    in_flight: AtomicUsize,
    observers: std::sync::RwLock<Vec<Arc<dyn RunObserver>>>,
}

/// Handle to a running dispatcher. Dropping it ends the dispatcher; runs
/// already in flight still finish.
pub struct Scheduler {
    inner: Arc<Inner>,
    commands: mpsc::UnboundedSender<Command>,
}

impl Scheduler {
    /// Create a stopped scheduler. Must be called inside a tokio runtime.
    pub fn new(pipeline: Pipeline, config: SchedulerConfig) -> Self {
        let period = config.interval();
        Self::with_period(pipeline, config, period)
    }

    /// Create a stopped scheduler firing every `period`, ignoring
    /// `interval_secs`
    pub fn with_period(pipeline: Pipeline, config: SchedulerConfig, period: Duration) -> Self {
        let inner = Arc::new(Inner {
            pipeline,
            config,
            period,
            state: RwLock::new(SchedulerState::default()),
            in_flight: AtomicUsize::new(0),
            observers: std::sync::RwLock::new(vec![]),
        });

        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(Arc::clone(&inner), receiver));

        Self { inner, commands }
    }

    /// Register an observer for every subsequent run
    pub fn with_observer(self, observer: Arc<dyn RunObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    pub fn add_observer(&self, observer: Arc<dyn RunObserver>) {
        self.inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.inner.pipeline
    }

    /// Arm the timer, first tick one interval from now.
    ///
    /// Returns `false` without doing anything when already running.
    pub async fn start(&self, run_immediately: bool) -> bool {
        {
            let mut state = self.inner.state.write().await;
            if state.running {
                tracing::warn!("Scheduler is already running");
                return false;
            }
            state.running = true;
            state.next_run = self.inner.next_fire();
        }

        self.send(Command::Arm);
        tracing::info!(
            interval_secs = self.inner.period.as_secs(),
            "Scheduler started"
        );

        if run_immediately {
            tracing::info!("Running initial collection");
            self.send(Command::Run(Trigger::Startup));
        }
        true
    }

    /// Disarm the timer. Runs already in flight finish normally.
    ///
    /// Returns `false` when the scheduler was not running.
    pub async fn stop(&self) -> bool {
        {
            let mut state = self.inner.state.write().await;
            if !state.running {
                return false;
            }
            state.running = false;
            state.next_run = None;
        }

        self.send(Command::Disarm);
        tracing::info!("Scheduler stopped");
        true
    }

    /// Queue one out-of-band run without touching the timer
    pub fn run_now(&self) {
        tracing::info!("Manual collection triggered");
        self.send(Command::Run(Trigger::Manual));
    }

    pub async fn is_running(&self) -> bool {
        self.inner.state.read().await.running
    }

    pub async fn status(&self) -> SchedulerStatus {
        let state = self.inner.state.read().await;
        let window = self.inner.config.recent_changes;
        let skip = state.last_changes.len().saturating_sub(window);

        SchedulerStatus {
            is_running: state.running,
            last_run: state.last_run,
            next_run: state.next_run,
            interval_secs: self.inner.period.as_secs(),
            last_run_id: state.last_run_id,
            runs_completed: state.runs_completed,
            in_flight: self.inner.in_flight.load(Ordering::SeqCst),
            last_results: state.last_results.clone(),
            recent_changes: state.last_changes[skip..].to_vec(),
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::error!("Scheduler dispatcher has exited");
        }
    }
}

async fn dispatch(inner: Arc<Inner>, mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut timer: Option<Interval> = None;

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Arm) => {
                    let mut interval = tokio::time::interval_at(Instant::now() + inner.period, inner.period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    timer = Some(interval);
                }
                Some(Command::Disarm) => timer = None,
                Some(Command::Run(trigger)) => spawn_run(&inner, trigger),
                None => break,
            },

            _ = next_tick(&mut timer) => {
                {
                    let mut state = inner.state.write().await;
                    if !state.running {
                        continue;
                    }
                    state.next_run = inner.next_fire();
                }
                spawn_run(&inner, Trigger::Timer);
            }
        }
    }

    tracing::debug!("Scheduler dispatcher exiting");
}

async fn next_tick(timer: &mut Option<Interval>) {
    match timer {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn spawn_run(inner: &Arc<Inner>, trigger: Trigger) {
    let Some(guard) = InFlight::acquire(inner) else {
        tracing::info!(%trigger, "Previous run still in flight, skipping");
        return;
    };

    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        let _guard = guard;
        inner.run(trigger).await;
    });
}

impl Inner {
    /// One period from now
    fn next_fire(&self) -> Option<DateTime<Utc>> {
        TimeDelta::from_std(self.period)
            .ok()
            .and_then(|period| Utc::now().checked_add_signed(period))
    }

    async fn run(&self, trigger: Trigger) {
        tracing::info!(%trigger, "Scheduled job starting");
        let outcome = self.pipeline.execute().await;

        {
            let mut state = self.state.write().await;
            state.last_run = Some(outcome.finished_at);
            state.last_run_id = Some(outcome.run_id);
            state.runs_completed += 1;
            state.last_results = outcome.results.clone();
            state.last_changes = outcome.changes.clone();
        }

        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in &observers {
            observer.on_complete(&outcome.results);
            if !outcome.changes.is_empty() {
                observer.on_change(&outcome.changes);
            }
        }

        tracing::info!(%trigger, run_id = %outcome.run_id, "Scheduled job completed");
    }
}

/// Counts a run as in flight until dropped
struct InFlight {
    inner: Arc<Inner>,
}

impl InFlight {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        if inner.config.single_flight {
            inner
                .in_flight
                .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .ok()?;
        } else {
            inner.in_flight.fetch_add(1, Ordering::SeqCst);
        }
        Some(Self {
            inner: Arc::clone(inner),
        })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Holds at most one scheduler for the process
#[derive(Default)]
pub struct SchedulerSlot {
    current: Mutex<Option<Arc<Scheduler>>>,
}

impl SchedulerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the running scheduler, or build, start and keep a new one
    pub async fn init(
        &self,
        build: impl FnOnce() -> Scheduler,
        run_immediately: bool,
    ) -> Arc<Scheduler> {
        let mut current = self.current.lock().await;
        if let Some(existing) = current.as_ref() {
            if existing.is_running().await {
                return Arc::clone(existing);
            }
        }

        let scheduler = Arc::new(build());
        scheduler.start(run_immediately).await;
        *current = Some(Arc::clone(&scheduler));
        scheduler
    }

    pub async fn get(&self) -> Option<Arc<Scheduler>> {
        self.current.lock().await.clone()
    }
}

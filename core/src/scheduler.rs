//! Debounced revalidation. A single actor task owns the timer and the in-flight flag; passes
//! run on the blocking pool so the caller never waits on analysis.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinHandle};
use tokio::time::{Instant, sleep_until};

use crate::event::{EventBus, SessionEvent};
use crate::orchestrator::{Orchestrator, ValidationReport};
use crate::params::ParameterDefinition;
use crate::scope::ScopeTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    PendingDebounce,
    Validating,
}

/// Everything one validation pass needs, captured at edit time.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub text: Arc<str>,
    pub scope: Arc<ScopeTree>,
    pub parameters: Arc<[ParameterDefinition]>,
}

enum Command {
    Edit(ValidationRequest),
    Shutdown,
}

pub struct RevalidationScheduler {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SchedulerState>,
    task: Option<JoinHandle<()>>,
}

impl RevalidationScheduler {
    /// Start the scheduler on the current tokio runtime.
    pub fn spawn(orchestrator: Arc<Orchestrator>, events: EventBus, debounce: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().context("revalidation requires a tokio runtime")?;
        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SchedulerState::Idle);
        let actor = Actor {
            orchestrator,
            events,
            debounce,
            state: state_tx,
        };
        let task = runtime.spawn(actor.run(rx));
        Ok(Self {
            commands,
            state,
            task: Some(task),
        })
    }

    /// Record an edit; (re)arms the debounce timer.
    pub fn schedule(&self, request: ValidationRequest) {
        if self.commands.send(Command::Edit(request)).is_err() {
            tracing::debug!("edit ignored, scheduler stopped");
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    /// Stop the timer and the actor. A pass already running finishes on the blocking pool but
    /// its result is discarded.
    pub fn shutdown(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for RevalidationScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Actor {
    orchestrator: Arc<Orchestrator>,
    events: EventBus,
    debounce: Duration,
    state: watch::Sender<SchedulerState>,
}

impl Actor {
    async fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        let mut pending: Option<ValidationRequest> = None;
        let mut deadline: Option<Instant> = None;
        let mut running: Option<JoinHandle<ValidationReport>> = None;
        // The timer fired while a pass was in flight and no edit has arrived since.
        let mut rerun = false;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Edit(request)) => {
                        pending = Some(request);
                        deadline = Some(Instant::now() + self.debounce);
                        rerun = false;
                        if running.is_none() {
                            self.set_state(SchedulerState::PendingDebounce);
                        }
                    }
                    Some(Command::Shutdown) | None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    deadline = None;
                    if running.is_some() {
                        rerun = true;
                    } else if let Some(request) = pending.take() {
                        running = Some(self.start(request));
                    } else {
                        self.set_state(SchedulerState::Idle);
                    }
                }
                report = join(&mut running), if running.is_some() => {
                    running = None;
                    match report {
                        Some(report) => self.publish(report),
                        None => tracing::warn!("validation pass aborted"),
                    }
                    // A newer edit re-arms the timer and withdraws the follow-up.
                    let follow_up = std::mem::take(&mut rerun) && deadline.is_none();
                    if follow_up && let Some(request) = pending.take() {
                        running = Some(self.start(request));
                    } else if deadline.is_some() {
                        self.set_state(SchedulerState::PendingDebounce);
                    } else {
                        self.set_state(SchedulerState::Idle);
                    }
                }
            }
        }
        self.set_state(SchedulerState::Idle);
        tracing::debug!("revalidation scheduler stopped");
    }

    fn start(&self, request: ValidationRequest) -> JoinHandle<ValidationReport> {
        self.set_state(SchedulerState::Validating);
        tracing::debug!(bytes = request.text.len(), "validation pass started");
        let orchestrator = self.orchestrator.clone();
        task::spawn_blocking(move || orchestrator.validate(&request.text, request.scope, &request.parameters))
    }

    fn publish(&self, report: ValidationReport) {
        self.events.publish(SessionEvent::Diagnostics(report.diagnostics.into()));
        self.events.publish(SessionEvent::Status(report.status));
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            tracing::trace!(from = ?current, to = ?state, "scheduler transition");
            *current = state;
            true
        });
    }
}

async fn join(handle: &mut Option<JoinHandle<ValidationReport>>) -> Option<ValidationReport> {
    match handle {
        Some(handle) => handle.await.ok(),
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, mpsc as std_mpsc};

    use tokio::time::{advance, sleep, timeout};

    use super::*;
    use crate::check::{CheckContext, Checker};
    use crate::config::AnalysisConfig;
    use crate::diag::{Diagnostic, DiagnosticSource};
    use crate::scope::build_scope_tree;

    const DEBOUNCE: Duration = Duration::from_millis(400);

    fn request(text: &str) -> ValidationRequest {
        ValidationRequest {
            text: text.into(),
            scope: Arc::new(build_scope_tree(text)),
            parameters: Arc::from(Vec::new()),
        }
    }

    /// Counts passes; optionally holds the blocking thread for a while.
    struct CountingChecker {
        passes: Arc<AtomicUsize>,
        hold: Duration,
    }

    impl Checker for CountingChecker {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn source(&self) -> DiagnosticSource {
            DiagnosticSource::Validator
        }

        fn check(&self, _cx: &CheckContext<'_>) -> anyhow::Result<Vec<Diagnostic>> {
            self.passes.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.hold);
            Ok(Vec::new())
        }
    }

    fn scheduler_with(checker: Box<dyn Checker>, debounce: Duration) -> (RevalidationScheduler, EventBus) {
        let orchestrator = Orchestrator::with_checkers(&AnalysisConfig::default(), vec![checker]);
        let events = EventBus::new(16);
        let scheduler = RevalidationScheduler::spawn(Arc::new(orchestrator), events.clone(), debounce).unwrap();
        (scheduler, events)
    }

    fn counting_scheduler(hold: Duration) -> (RevalidationScheduler, EventBus, Arc<AtomicUsize>) {
        let passes = Arc::new(AtomicUsize::new(0));
        let checker = CountingChecker {
            passes: passes.clone(),
            hold,
        };
        let (scheduler, events) = scheduler_with(Box::new(checker), DEBOUNCE);
        (scheduler, events, passes)
    }

    /// Counts passes and blocks each one until the test releases it.
    struct GatedChecker {
        passes: Arc<AtomicUsize>,
        gate: Mutex<std_mpsc::Receiver<()>>,
    }

    impl Checker for GatedChecker {
        fn name(&self) -> &'static str {
            "gated"
        }

        fn source(&self) -> DiagnosticSource {
            DiagnosticSource::Validator
        }

        fn check(&self, _cx: &CheckContext<'_>) -> anyhow::Result<Vec<Diagnostic>> {
            self.passes.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.lock().map_err(|_| anyhow::anyhow!("gate poisoned"))?;
            gate.recv()?;
            Ok(Vec::new())
        }
    }

    async fn settle() {
        for _ in 0..8 {
            task::yield_now().await;
        }
    }

    async fn next_diagnostics(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Option<Arc<[Diagnostic]>> {
        loop {
            match rx.recv().await.ok()? {
                SessionEvent::Diagnostics(list) => return Some(list),
                _ => continue,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_runs_one_pass_after_last_edit() {
        let (scheduler, events, passes) = counting_scheduler(Duration::ZERO);
        let mut rx = events.subscribe();
        let started = Instant::now();

        for i in 0..5 {
            if i > 0 {
                sleep(Duration::from_millis(100)).await;
            }
            scheduler.schedule(request(&format!("let a = {i};")));
        }
        let last_edit = Instant::now();
        assert_eq!(last_edit - started, Duration::from_millis(400));

        assert!(next_diagnostics(&mut rx).await.is_some());
        assert!(Instant::now() - last_edit >= DEBOUNCE);
        assert!(timeout(Duration::from_secs(5), next_diagnostics(&mut rx)).await.is_err());
        assert_eq!(passes.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions() {
        let (scheduler, events, _passes) = counting_scheduler(Duration::ZERO);
        let mut rx = events.subscribe();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.schedule(request("x"));
        let mut state = scheduler.watch_state();
        state.wait_for(|s| *s == SchedulerState::PendingDebounce).await.unwrap();

        assert!(next_diagnostics(&mut rx).await.is_some());
        match rx.recv().await.unwrap() {
            SessionEvent::Status(status) => assert_eq!(status, "✓ passed"),
            other => panic!("unexpected event {other:?}"),
        }
        state.wait_for(|s| *s == SchedulerState::Idle).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_during_validation_schedules_follow_up() {
        let (scheduler, events, passes) = counting_scheduler(Duration::from_millis(50));
        let mut rx = events.subscribe();

        scheduler.schedule(request("a"));
        let mut state = scheduler.watch_state();
        state.wait_for(|s| *s == SchedulerState::Validating).await.unwrap();
        scheduler.schedule(request("ab"));

        assert!(next_diagnostics(&mut rx).await.is_some());
        assert!(next_diagnostics(&mut rx).await.is_some());
        assert!(timeout(Duration::from_secs(5), next_diagnostics(&mut rx)).await.is_err());
        assert_eq!(passes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_up_waits_for_newest_debounce() {
        const SHORT: Duration = Duration::from_millis(200);
        let passes = Arc::new(AtomicUsize::new(0));
        let (release, gate) = std_mpsc::channel();
        let checker = GatedChecker {
            passes: passes.clone(),
            gate: Mutex::new(gate),
        };
        let (scheduler, events) = scheduler_with(Box::new(checker), SHORT);
        let mut rx = events.subscribe();
        let mut state = scheduler.watch_state();

        // t=0: first edit, its pass starts at t=200 and stays blocked.
        scheduler.schedule(request("a"));
        state.wait_for(|s| *s == SchedulerState::Validating).await.unwrap();

        // t=300: edit during the pass; its timer fires at t=500 while still validating.
        advance(Duration::from_millis(100)).await;
        scheduler.schedule(request("ab"));
        settle().await;
        advance(Duration::from_millis(200)).await;
        settle().await;

        // t=1100: another edit re-arms the timer for t=1300.
        advance(Duration::from_millis(600)).await;
        scheduler.schedule(request("abc"));
        let last_edit = Instant::now();
        settle().await;

        // t=1200: the first pass completes before the newest debounce has elapsed.
        advance(Duration::from_millis(100)).await;
        release.send(()).unwrap();
        assert!(next_diagnostics(&mut rx).await.is_some());
        assert_eq!(scheduler.state(), SchedulerState::PendingDebounce);
        assert_eq!(passes.load(Ordering::SeqCst), 1);

        release.send(()).unwrap();
        assert!(next_diagnostics(&mut rx).await.is_some());
        assert!(Instant::now() - last_edit >= SHORT);
        state.wait_for(|s| *s == SchedulerState::Idle).await.unwrap();

        assert!(timeout(Duration::from_millis(2500), next_diagnostics(&mut rx)).await.is_err());
        assert_eq!(passes.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_pass() {
        let (mut scheduler, events, passes) = counting_scheduler(Duration::ZERO);
        let mut rx = events.subscribe();

        scheduler.schedule(request("x"));
        scheduler.shutdown();
        assert!(!scheduler.is_running());
        scheduler.schedule(request("y"));

        sleep(DEBOUNCE * 3).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(passes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_spawn_outside_runtime_is_error() {
        let orchestrator = Arc::new(Orchestrator::with_defaults());
        assert!(RevalidationScheduler::spawn(orchestrator, EventBus::default(), DEBOUNCE).is_err());
    }
}

//! Test decision adapters — scripted `DecisionAdapter` implementations.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use standoff_core::decision::{Decision, DecisionAdapter, DecisionContext, DecisionError};
use standoff_core::input::PlayerInput;
use tokio::sync::{Semaphore, watch};

#[derive(Debug)]
struct Step {
    result: Result<Decision, DecisionError>,
    delay: Option<Duration>,
}

/// Decrements the in-flight counter even when the call is cancelled by a
/// timeout.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A decision adapter that answers from a predetermined script, one step per
/// call. Records every context and input it receives and tracks how many
/// calls were in flight at once.
///
/// Once the script is exhausted every call fails with
/// `DecisionError::Malformed`.
#[derive(Debug)]
pub struct ScriptedDecisionAdapter {
    steps: Mutex<VecDeque<Step>>,
    gate: Option<Semaphore>,
    started: watch::Sender<usize>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    contexts: Mutex<Vec<DecisionContext>>,
    inputs: Mutex<Vec<PlayerInput>>,
}

impl Default for ScriptedDecisionAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedDecisionAdapter {
    /// Creates an adapter with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            gate: None,
            started: watch::Sender::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            contexts: Mutex::new(Vec::new()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Makes every call wait until [`release`](Self::release) lets it through.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Appends a step that answers with `decision`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn then_decide(self, decision: Decision) -> Self {
        self.push(Ok(decision), None)
    }

    /// Appends a step that fails with `error`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn then_fail(self, error: DecisionError) -> Self {
        self.push(Err(error), None)
    }

    /// Appends a step that waits `delay` before answering with `decision`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn then_stall(self, delay: Duration, decision: Decision) -> Self {
        self.push(Ok(decision), Some(delay))
    }

    fn push(self, result: Result<Decision, DecisionError>, delay: Option<Duration>) -> Self {
        self.steps
            .lock()
            .unwrap()
            .push_back(Step { result, delay });
        self
    }

    /// Lets `calls` gated calls proceed.
    ///
    /// # Panics
    ///
    /// Panics if the adapter was not built with [`gated`](Self::gated).
    pub fn release(&self, calls: usize) {
        self.gate
            .as_ref()
            .expect("release requires a gated adapter")
            .add_permits(calls);
    }

    /// Waits until at least `count` calls have started.
    ///
    /// # Panics
    ///
    /// Never; the sender lives as long as the adapter.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut started = self.started.subscribe();
        started.wait_for(|n| *n >= count).await.unwrap();
    }

    /// Number of calls started so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.started.borrow()
    }

    /// Highest number of calls observed in flight at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Every context received, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn contexts(&self) -> Vec<DecisionContext> {
        self.contexts.lock().unwrap().clone()
    }

    /// Every input received, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn inputs(&self) -> Vec<PlayerInput> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionAdapter for ScriptedDecisionAdapter {
    async fn decide(
        &self,
        context: &DecisionContext,
        input: &PlayerInput,
    ) -> Result<Decision, DecisionError> {
        let step = self.steps.lock().unwrap().pop_front();
        self.contexts.lock().unwrap().push(context.clone());
        self.inputs.lock().unwrap().push(input.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.started.send_modify(|n| *n += 1);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let Some(step) = step else {
            return Err(DecisionError::Malformed("script exhausted".into()));
        };
        if let Some(delay) = step.delay {
            tokio::time::sleep(delay).await;
        }
        step.result
    }
}

/// A decision adapter whose service is always unreachable.
#[derive(Debug, Default)]
pub struct FailingDecisionAdapter {
    calls: AtomicUsize,
}

impl FailingDecisionAdapter {
    /// Number of calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionAdapter for FailingDecisionAdapter {
    async fn decide(
        &self,
        _context: &DecisionContext,
        _input: &PlayerInput,
    ) -> Result<Decision, DecisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DecisionError::Unavailable("connection refused".into()))
    }
}

//! Frame-budgeted request processing.
//!
//! [`FrameBudgetProcessor`] is the queue the render loop drains once per
//! frame. It executes requests in submission order until the queue is empty
//! or the frame budget is spent; whatever is left waits for the next frame.
//! At teardown [`process_all`](FrameBudgetProcessor::process_all) runs the
//! remainder regardless of the budget.
//!
//! # Budget rule
//!
//! The budget is checked *after* each request. A request is never interrupted,
//! so one slow request can overrun the budget; the budget only decides whether
//! the *next* request is started. A budget of zero or less starts nothing, and
//! so does a non-finite one (NaN or infinity).

use crate::{
    clock::{Clock, InstantClock},
    queue::{RequestQueue, Submitter},
    request::{Request, RequestKind, run_logged},
};

/// Statistics about one processing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassReport {
    pub kind: RequestKind,
    /// Requests that ran, including failed ones.
    pub executed: usize,
    /// Requests whose `execute` returned an error.
    pub failed: usize,
    /// Requests still queued after the pass.
    pub pending: usize,
    pub elapsed_ms: f64,
    /// The pass stopped on the budget while work was still queued.
    pub exhausted: bool,
}

impl PassReport {
    pub fn empty(kind: RequestKind) -> Self {
        Self {
            kind,
            executed: 0,
            failed: 0,
            pending: 0,
            elapsed_ms: 0.0,
            exhausted: false,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.executed - self.failed
    }

    /// Fold a later pass of the same kind into this one.
    pub fn merge(&mut self, later: PassReport) {
        debug_assert_eq!(self.kind, later.kind);
        self.executed += later.executed;
        self.failed += later.failed;
        self.pending = later.pending;
        self.elapsed_ms += later.elapsed_ms;
        self.exhausted = later.exhausted;
    }
}

/// A processor for one [`RequestKind`].
///
/// The host calls [`update`](Self::update) once per frame and
/// [`flush`](Self::flush) once before tearing down the resources pending
/// requests refer to.
pub trait Processor {
    fn kind(&self) -> RequestKind;

    fn submit(&self, request: Box<dyn Request>);

    fn update(&mut self) -> PassReport;

    fn flush(&mut self) -> PassReport;

    fn pending_count(&self) -> usize;
}

/// A FIFO of graphics requests drained under a per-frame time budget.
///
/// `process_budgeted` and `process_all` must be called from the thread that
/// owns the GPU context. Other threads enqueue through a [`Submitter`].
///
/// Dropping the processor runs whatever is still queued. Requests that borrow
/// GPU objects (a `wgpu::Queue`, a buffer) then execute during the drop, so call
/// [`process_all`](Self::process_all) or drop the processor before those
/// objects are released.
pub struct FrameBudgetProcessor<C: Clock = InstantClock> {
    queue: RequestQueue,
    clock: C,
    budget_ms: f64,
    starving: bool,
}

impl<C: Clock> FrameBudgetProcessor<C> {
    pub const KIND: RequestKind = RequestKind::Graphics;

    pub fn new(clock: C, budget_ms: f64) -> Self {
        Self {
            queue: RequestQueue::new(Self::KIND),
            clock,
            budget_ms,
            starving: false,
        }
    }

    pub fn kind(&self) -> RequestKind {
        Self::KIND
    }

    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    pub fn set_budget_ms(&mut self, budget_ms: f64) {
        self.budget_ms = budget_ms;
        self.starving = false;
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// A handle for enqueueing from other threads.
    pub fn submitter(&self) -> Submitter {
        self.queue.submitter()
    }

    pub fn enqueue(&self, request: impl Request + 'static) {
        self.queue.push(Box::new(request));
    }

    /// Enqueue an already boxed request. `None` is ignored.
    pub fn enqueue_boxed(&self, request: Option<Box<dyn Request>>) {
        if let Some(request) = request {
            self.queue.push(request);
        }
    }

    /// Run queued requests until the queue is empty or the budget is spent.
    ///
    /// Requests enqueued while the pass runs are picked up by the same pass
    /// if the budget still allows it.
    pub fn process_budgeted(&mut self) -> PassReport {
        let mut report = PassReport::empty(Self::KIND);

        if !self.budget_ms.is_finite() || self.budget_ms <= 0.0 {
            report.pending = self.queue.len();
            report.exhausted = report.pending > 0;
            if report.exhausted && !self.starving {
                log::warn!(
                    "Graphics budget is {} ms, {} request(s) will wait until the queue is flushed",
                    self.budget_ms,
                    report.pending
                );
                self.starving = true;
            }
            return report;
        }

        let pass_start = self.clock.now_ms();
        let mut start = pass_start;
        let mut remaining = self.budget_ms;

        while let Some(request) = self.queue.pop() {
            report.executed += 1;
            if !run_logged(Self::KIND, request) {
                report.failed += 1;
            }

            let end = self.clock.now_ms();
            remaining -= end - start;
            start = end;

            if remaining < 0.0 {
                break;
            }
        }

        report.elapsed_ms = start - pass_start;
        report.pending = self.queue.len();
        report.exhausted = report.pending > 0;
        if report.executed > 0 {
            log::debug!(
                "Graphics pass ran {} request(s) in {:.3} ms, {} pending",
                report.executed,
                report.elapsed_ms,
                report.pending
            );
        }
        report
    }

    /// Run every queued request, ignoring the budget.
    pub fn process_all(&mut self) -> PassReport {
        let mut report = PassReport::empty(Self::KIND);
        let start = self.clock.now_ms();

        while let Some(request) = self.queue.pop() {
            report.executed += 1;
            if !run_logged(Self::KIND, request) {
                report.failed += 1;
            }
        }

        report.elapsed_ms = self.clock.now_ms() - start;
        self.starving = false;
        if report.executed > 0 {
            log::debug!(
                "Graphics flush ran {} request(s) in {:.3} ms",
                report.executed,
                report.elapsed_ms
            );
        }
        report
    }
}

impl<C: Clock> Processor for FrameBudgetProcessor<C> {
    fn kind(&self) -> RequestKind {
        Self::KIND
    }

    fn submit(&self, request: Box<dyn Request>) {
        self.queue.push(request);
    }

    fn update(&mut self) -> PassReport {
        self.process_budgeted()
    }

    fn flush(&mut self) -> PassReport {
        self.process_all()
    }

    fn pending_count(&self) -> usize {
        self.queue.len()
    }
}

impl<C: Clock> Drop for FrameBudgetProcessor<C> {
    fn drop(&mut self) {
        if !self.queue.is_empty() {
            log::warn!(
                "Graphics processor dropped with {} pending request(s), flushing them now",
                self.queue.len()
            );
            self.process_all();
        }
    }
}

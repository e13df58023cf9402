//! Routing of deferred work to the processor responsible for it.
//!
//! [`Processing`] owns one processor per [`RequestKind`]:
//!
//! - `Graphics` goes to a [`FrameBudgetProcessor`] drained by the render loop
//! - `Resource` goes to a [`ResourceProcessor`] running on its own thread, or
//!   inline during [`Processing::update`] on WASM
//!
//! # Lifecycle
//!
//! 1. Build it once next to the GPU context with [`Processing::new`]
//! 2. Hand [`ProcessingSubmitter`]s to loader threads
//! 3. Call [`Processing::update`] once per frame
//! 4. Call [`Processing::shutdown`] before releasing GPU resources
//!
//! Dropping a `Processing` that was never shut down flushes both queues, so
//! graphics requests still holding a `wgpu::Queue` run at that point. Drop or
//! shut it down before the device and queue go away.

use crate::{
    clock::{Clock, InstantClock},
    config::ProcessingConfig,
    processor::{FrameBudgetProcessor, PassReport, Processor},
    queue::Submitter,
    request::{Deferred, Request, RequestKind},
    resource::{ResourceProcessor, ResourceSubmitter},
};

pub struct Processing<C: Clock = InstantClock> {
    // Field order matters on drop: resource work may still enqueue graphics work.
    resources: ResourceProcessor,
    graphics: FrameBudgetProcessor<C>,
    shut_down: bool,
}

impl Processing<InstantClock> {
    pub fn from_config(config: &ProcessingConfig) -> anyhow::Result<Self> {
        Self::new(InstantClock::new(), config)
    }
}

impl<C: Clock> Processing<C> {
    pub fn new(clock: C, config: &ProcessingConfig) -> anyhow::Result<Self> {
        let resources = ResourceProcessor::new(&config.resource_thread_name)?;
        let graphics = FrameBudgetProcessor::new(clock, config.graphics_budget_ms);
        log::info!(
            "Processing started: graphics budget {} ms, resource worker '{}'",
            config.graphics_budget_ms,
            config.resource_thread_name
        );
        Ok(Self {
            resources,
            graphics,
            shut_down: false,
        })
    }

    /// Route a request to the processor for its kind.
    pub fn submit(&self, deferred: Deferred) {
        match deferred {
            Deferred::Graphics(request) => self.graphics.submit(request),
            Deferred::Resource(request) => self.resources.submit(request),
        }
    }

    pub fn submit_graphics(&self, request: impl Request + 'static) {
        self.graphics.enqueue(request);
    }

    pub fn submit_resource(&self, request: impl Request + 'static) {
        self.resources.enqueue(request);
    }

    pub fn submitter(&self) -> ProcessingSubmitter {
        ProcessingSubmitter {
            graphics: self.graphics.submitter(),
            resources: self.resources.submitter(),
        }
    }

    pub fn processor(&self, kind: RequestKind) -> &dyn Processor {
        match kind {
            RequestKind::Graphics => &self.graphics,
            RequestKind::Resource => &self.resources,
        }
    }

    pub fn graphics(&self) -> &FrameBudgetProcessor<C> {
        &self.graphics
    }

    pub fn graphics_mut(&mut self) -> &mut FrameBudgetProcessor<C> {
        &mut self.graphics
    }

    pub fn pending_count(&self) -> usize {
        RequestKind::ALL
            .iter()
            .map(|kind| self.processor(*kind).pending_count())
            .sum()
    }

    /// One frame tick: collect resource results (running them here when there
    /// is no worker thread), then a budgeted pass over the graphics queue.
    pub fn update(&mut self) -> PassReport {
        let resources = self.resources.update();
        if resources.failed > 0 {
            log::warn!("{} resource request(s) failed since the last frame", resources.failed);
        }
        self.graphics.process_budgeted()
    }

    /// Drain everything. Resource work is finished first so the graphics
    /// uploads it produces are included in the graphics flush.
    ///
    /// Calling it again only flushes graphics work submitted since.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let resources = if self.shut_down {
            PassReport::empty(RequestKind::Resource)
        } else {
            self.resources.flush()
        };
        let graphics = self.graphics.process_all();
        self.shut_down = true;
        log::info!(
            "Processing shut down: {} resource and {} graphics request(s) flushed",
            resources.executed,
            graphics.executed
        );
        ShutdownReport {
            resources,
            graphics,
        }
    }
}

impl<C: Clock> Drop for Processing<C> {
    fn drop(&mut self) {
        if !self.shut_down {
            self.shutdown();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShutdownReport {
    pub resources: PassReport,
    pub graphics: PassReport,
}

/// A cloneable, thread-safe handle that routes requests like
/// [`Processing::submit`].
#[derive(Debug, Clone)]
pub struct ProcessingSubmitter {
    graphics: Submitter,
    resources: ResourceSubmitter,
}

impl ProcessingSubmitter {
    pub fn submit(&self, deferred: Deferred) {
        match deferred {
            Deferred::Graphics(request) => self.graphics.enqueue_boxed(Some(request)),
            Deferred::Resource(request) => self.resources.enqueue_boxed(Some(request)),
        }
    }

    pub fn graphics(&self) -> &Submitter {
        &self.graphics
    }

    pub fn resources(&self) -> &ResourceSubmitter {
        &self.resources
    }
}

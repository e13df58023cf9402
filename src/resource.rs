//! Background execution of resource requests.
//!
//! Resource requests (reading files, decoding images, parsing models) do not
//! touch the GPU context, so they run on a dedicated worker thread instead of
//! the frame loop. A resource request usually ends by submitting graphics
//! follow-up work (the upload) through a [`Submitter`](crate::queue::Submitter).

use std::sync::{Arc, Mutex, RwLock};
#[cfg(not(target_arch = "wasm32"))]
use std::thread::{self, JoinHandle};

#[cfg(not(target_arch = "wasm32"))]
use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};

use crate::{
    processor::{PassReport, Processor},
    request::{Request, RequestKind, run_logged},
};

type Slot = Arc<RwLock<Option<Sender<Box<dyn Request>>>>>;

#[derive(Debug, Default, Clone, Copy)]
struct WorkerStats {
    executed: usize,
    failed: usize,
}

/// Both counters move under one lock so a report never sees a failure
/// without its execution.
type SharedStats = Arc<Mutex<WorkerStats>>;

#[derive(Debug)]
enum Mode {
    /// A worker thread drains the channel as requests arrive.
    #[cfg(not(target_arch = "wasm32"))]
    Worker(JoinHandle<()>),
    /// Requests wait in the channel and run on the owner's thread in `update`.
    Inline(Receiver<Box<dyn Request>>),
}

/// Runs resource requests in FIFO order on a named worker thread.
///
/// On WASM there are no threads: requests run on the owning thread each
/// time the processor is updated, see [`ResourceProcessor::inline`].
///
/// Dropping the processor flushes it: everything already queued runs and the
/// worker is joined.
#[derive(Debug)]
pub struct ResourceProcessor {
    sender: Slot,
    mode: Option<Mode>,
    stats: SharedStats,
    reported: WorkerStats,
}

impl ResourceProcessor {
    pub const KIND: RequestKind = RequestKind::Resource;

    #[cfg(not(target_arch = "wasm32"))]
    pub fn new(thread_name: &str) -> anyhow::Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded::<Box<dyn Request>>();
        let stats = SharedStats::default();

        let worker_stats = stats.clone();
        let worker = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                // Ends once every sender is gone and the channel is drained.
                for request in receiver.iter() {
                    run_counted(&worker_stats, request);
                }
            })
            .with_context(|| format!("Failed to spawn resource worker '{thread_name}'"))?;

        Ok(Self::with_mode(sender, Mode::Worker(worker), stats))
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new(thread_name: &str) -> anyhow::Result<Self> {
        log::info!("No threads on this platform, '{thread_name}' runs resource requests inline");
        Ok(Self::inline())
    }

    /// A processor without a worker thread. Queued requests run on the
    /// calling thread during [`update`](Processor::update) and
    /// [`shutdown`](Self::shutdown).
    pub fn inline() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded::<Box<dyn Request>>();
        Self::with_mode(sender, Mode::Inline(receiver), SharedStats::default())
    }

    fn with_mode(sender: Sender<Box<dyn Request>>, mode: Mode, stats: SharedStats) -> Self {
        Self {
            sender: Arc::new(RwLock::new(Some(sender))),
            mode: Some(mode),
            stats,
            reported: WorkerStats::default(),
        }
    }

    pub fn submitter(&self) -> ResourceSubmitter {
        ResourceSubmitter {
            sender: self.sender.clone(),
        }
    }

    pub fn enqueue(&self, request: impl Request + 'static) {
        submit_to(&self.sender, Box::new(request));
    }

    /// Requests waiting to run. One currently executing on the worker is not counted.
    pub fn pending_count(&self) -> usize {
        match self.sender.read() {
            Ok(slot) => slot.as_ref().map_or(0, |sender| sender.len()),
            Err(_) => 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.mode.is_some()
    }

    /// Run whatever is queued if there is no worker to do it.
    fn run_inline(&self) {
        if let Some(Mode::Inline(receiver)) = &self.mode {
            for request in receiver.try_iter() {
                run_counted(&self.stats, request);
            }
        }
    }

    /// Counts since the previous report.
    fn report(&mut self) -> PassReport {
        let stats = match self.stats.lock() {
            Ok(stats) => *stats,
            Err(poisoned) => *poisoned.into_inner(),
        };
        let mut report = PassReport::empty(Self::KIND);
        report.executed = stats.executed - self.reported.executed;
        report.failed = stats.failed - self.reported.failed;
        report.pending = self.pending_count();
        self.reported = stats;
        report
    }

    /// Close the queue, run everything still in it and join the worker.
    ///
    /// Later submissions run inline on the submitting thread.
    pub fn shutdown(&mut self) -> PassReport {
        let sender = match self.sender.write() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        self.run_inline();
        match self.mode.take() {
            #[cfg(not(target_arch = "wasm32"))]
            Some(Mode::Worker(worker)) => {
                if worker.join().is_err() {
                    log::error!("Resource worker panicked, remaining resource requests were lost");
                }
            }
            Some(Mode::Inline(_)) | None => (),
        }
        self.report()
    }
}

impl Processor for ResourceProcessor {
    fn kind(&self) -> RequestKind {
        Self::KIND
    }

    fn submit(&self, request: Box<dyn Request>) {
        submit_to(&self.sender, request);
    }

    fn update(&mut self) -> PassReport {
        self.run_inline();
        self.report()
    }

    fn flush(&mut self) -> PassReport {
        self.shutdown()
    }

    fn pending_count(&self) -> usize {
        ResourceProcessor::pending_count(self)
    }
}

impl Drop for ResourceProcessor {
    fn drop(&mut self) {
        if self.mode.is_some() {
            self.shutdown();
        }
    }
}

/// A cloneable handle that enqueues resource requests from any thread.
#[derive(Debug, Clone)]
pub struct ResourceSubmitter {
    sender: Slot,
}

impl ResourceSubmitter {
    pub fn enqueue(&self, request: impl Request + 'static) {
        submit_to(&self.sender, Box::new(request));
    }

    pub fn enqueue_boxed(&self, request: Option<Box<dyn Request>>) {
        if let Some(request) = request {
            submit_to(&self.sender, request);
        }
    }
}

fn submit_to(slot: &Slot, request: Box<dyn Request>) {
    // Hold the read lock across the send so a concurrent shutdown cannot
    // close the channel between the check and the send.
    let late = {
        let guard = match slot.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match guard.as_ref() {
            Some(sender) => sender.send(request).err().map(|e| e.0),
            None => Some(request),
        }
    };

    if let Some(request) = late {
        log::warn!(
            "Resource request '{}' submitted after shutdown, running it inline",
            request.label()
        );
        run_logged(RequestKind::Resource, request);
    }
}

fn run_counted(stats: &Mutex<WorkerStats>, request: Box<dyn Request>) {
    let ok = run_logged(RequestKind::Resource, request);
    let mut stats = match stats.lock() {
        Ok(stats) => stats,
        Err(poisoned) => poisoned.into_inner(),
    };
    stats.executed += 1;
    if !ok {
        stats.failed += 1;
    }
}

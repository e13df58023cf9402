//! Deferred work items and the tags used to route them.
//!
//! A [`Request`] is a unit of work that is queued now and executed later on
//! the thread that owns the matching processor. Every request belongs to a
//! [`RequestKind`]; the [`Deferred`] enum pairs a request with its kind so a
//! dispatcher can route it with an exhaustive `match`.

use std::fmt::Debug;

/// A unit of deferred work.
///
/// Ownership moves into the queue on submission and is consumed by
/// [`execute`](Self::execute), so a request can never run twice.
///
/// Closures returning `anyhow::Result<()>` are requests:
///
/// ```
/// use flow_processing::request::Request;
///
/// let request: Box<dyn Request> = Box::new(|| -> anyhow::Result<()> {
///     // upload something
///     Ok(())
/// });
/// assert!(request.execute().is_ok());
/// ```
pub trait Request: Send {
    /// Run the work. May block for an arbitrary amount of time.
    fn execute(self: Box<Self>) -> anyhow::Result<()>;

    /// Short human readable name used in log output.
    fn label(&self) -> &str {
        "request"
    }
}

impl<F> Request for F
where
    F: FnOnce() -> anyhow::Result<()> + Send,
{
    fn execute(self: Box<Self>) -> anyhow::Result<()> {
        (*self)()
    }

    fn label(&self) -> &str {
        "closure"
    }
}

impl Debug for dyn Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Request({})", self.label())
    }
}

/// What kind of deferred work a queue handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Work that touches the GPU context and must run on its owning thread
    /// under the frame budget.
    Graphics,
    /// Work that may run anywhere, e.g. reading and decoding files.
    Resource,
}

impl RequestKind {
    pub const ALL: [RequestKind; 2] = [RequestKind::Graphics, RequestKind::Resource];
}

/// A request tagged with the kind of processor that has to execute it.
pub enum Deferred {
    Graphics(Box<dyn Request>),
    Resource(Box<dyn Request>),
}

impl Deferred {
    pub fn graphics(request: impl Request + 'static) -> Self {
        Self::Graphics(Box::new(request))
    }

    pub fn resource(request: impl Request + 'static) -> Self {
        Self::Resource(Box::new(request))
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Deferred::Graphics(_) => RequestKind::Graphics,
            Deferred::Resource(_) => RequestKind::Resource,
        }
    }

    pub fn into_request(self) -> Box<dyn Request> {
        match self {
            Deferred::Graphics(request) | Deferred::Resource(request) => request,
        }
    }
}

impl Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graphics(request) => f.debug_tuple("Graphics").field(request).finish(),
            Self::Resource(request) => f.debug_tuple("Resource").field(request).finish(),
        }
    }
}

/// Execute a request, logging instead of propagating a failure.
///
/// Returns `true` if the request succeeded. A failed request is not retried.
pub(crate) fn run_logged(kind: RequestKind, request: Box<dyn Request>) -> bool {
    let label = request.label().to_owned();
    match request.execute() {
        Ok(()) => true,
        Err(e) => {
            log::error!("{:?} request '{}' failed: {:#}", kind, label, e);
            false
        }
    }
}

//! flow-processing
//!
//! Deferred work processing for the flow engine. GPU-bound requests are
//! queued from anywhere and executed on the render thread under a per-frame
//! time budget, so uploads never stall a frame for long. Work that does not
//! fit waits for the next frame; a flush at teardown runs whatever is left.
//!
//! High-level modules
//! - `clock`: injectable millisecond time sources
//! - `config`: processing settings and their environment overrides
//! - `gpu`: buffer and texture writes as graphics requests
//! - `processing`: routing of tagged requests to their processors
//! - `processor`: the frame-budgeted graphics queue
//! - `queue`: the multi-producer FIFO behind the processors
//! - `request`: the request trait and request kinds
//! - `resource`: background worker for resource requests
//!

pub mod clock;
pub mod config;
pub mod gpu;
pub mod processing;
pub mod processor;
pub mod queue;
pub mod request;
pub mod resource;

pub use clock::{Clock, InstantClock, ManualClock};
pub use config::ProcessingConfig;
pub use processing::{Processing, ProcessingSubmitter, ShutdownReport};
pub use processor::{FrameBudgetProcessor, PassReport, Processor};
pub use request::{Deferred, Request, RequestKind};

/// Set up logging for the current platform.
///
/// Uses `env_logger` natively (configure with `RUST_LOG`) and the browser
/// console on WASM. Calling it again only reports that a logger is already set.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::warn!("Could not initialize console logger: {}", e);
        }
    }
}

use std::sync::{Arc, Mutex};

use flow_processing::{ManualClock, Request};

/// Records which requests ran, in order.
#[derive(Clone, Default)]
pub(crate) struct Trace {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: &str) {
        self.entries.lock().unwrap().push(entry.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// A request that records `name` and takes no time.
    pub fn record(&self, name: &str) -> impl Request + use<> {
        let trace = self.clone();
        let name = name.to_string();
        move || -> anyhow::Result<()> {
            trace.push(&name);
            Ok(())
        }
    }

    /// A request that records `name` and spends `cost_ms` on `clock`.
    pub fn costly(&self, clock: &ManualClock, name: &str, cost_ms: f64) -> impl Request + use<> {
        let trace = self.clone();
        let clock = clock.clone();
        let name = name.to_string();
        move || -> anyhow::Result<()> {
            clock.advance(cost_ms);
            trace.push(&name);
            Ok(())
        }
    }

    /// A request that records `name` and then fails.
    pub fn failing(&self, name: &str) -> impl Request + use<> {
        let trace = self.clone();
        let name = name.to_string();
        move || -> anyhow::Result<()> {
            trace.push(&name);
            anyhow::bail!("{} failed on purpose", name)
        }
    }
}

pub(crate) fn names(prefix: &str, amount: usize) -> Vec<String> {
    (0..amount).map(|i| format!("{prefix}{i}")).collect()
}

/// A device and queue without a surface, or `None` when no adapter is available.
#[cfg(feature = "integration-tests")]
pub(crate) fn headless_gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..wgpu::InstanceDescriptor::new_without_display_handle()
    });
    futures::executor::block_on(async {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        adapter
            .request_device(&wgpu::DeviceDescriptor::default())
            .await
            .ok()
    })
}

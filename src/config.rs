//! Configuration for the processing subsystem.

use std::env;

use anyhow::Context;

/// Per-frame allowance for graphics requests, in milliseconds.
pub const DEFAULT_GRAPHICS_BUDGET_MS: f64 = 8.0;

pub const ENV_GRAPHICS_BUDGET_MS: &str = "FLOW_GRAPHICS_BUDGET_MS";
pub const ENV_RESOURCE_THREAD: &str = "FLOW_RESOURCE_THREAD";

/// Settings for [`Processing`](crate::processing::Processing).
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingConfig {
    /// Time the graphics queue may spend per frame. Zero or less means
    /// nothing runs until the queue is flushed.
    pub graphics_budget_ms: f64,
    /// Name of the worker thread executing resource requests.
    pub resource_thread_name: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            graphics_budget_ms: DEFAULT_GRAPHICS_BUDGET_MS,
            resource_thread_name: "Flow Resource Processor".to_string(),
        }
    }
}

impl ProcessingConfig {
    /// Defaults overridden by `FLOW_GRAPHICS_BUDGET_MS` and `FLOW_RESOURCE_THREAD`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();
        if let Some(budget) = lookup(ENV_GRAPHICS_BUDGET_MS) {
            config.graphics_budget_ms = budget.trim().parse().with_context(|| {
                format!("{ENV_GRAPHICS_BUDGET_MS}={budget:?} is not a number of milliseconds")
            })?;
            anyhow::ensure!(
                config.graphics_budget_ms.is_finite(),
                "{ENV_GRAPHICS_BUDGET_MS} must be finite, got {budget:?}"
            );
        }
        if let Some(name) = lookup(ENV_RESOURCE_THREAD) {
            if !name.is_empty() {
                config.resource_thread_name = name;
            }
        }
        Ok(config)
    }

    pub fn with_graphics_budget_ms(mut self, budget_ms: f64) -> Self {
        self.graphics_budget_ms = budget_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_without_overrides() {
        let config = ProcessingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ProcessingConfig::default());
        assert_eq!(config.graphics_budget_ms, 8.0);
    }

    #[test]
    fn budget_and_thread_name_are_overridden() {
        let config = ProcessingConfig::from_lookup(lookup(&[
            (ENV_GRAPHICS_BUDGET_MS, " 4.5 "),
            (ENV_RESOURCE_THREAD, "loader"),
        ]))
        .unwrap();
        assert_eq!(config.graphics_budget_ms, 4.5);
        assert_eq!(config.resource_thread_name, "loader");
    }

    #[test]
    fn zero_budget_is_accepted() {
        let config =
            ProcessingConfig::from_lookup(lookup(&[(ENV_GRAPHICS_BUDGET_MS, "0")])).unwrap();
        assert_eq!(config.graphics_budget_ms, 0.0);
    }

    #[test]
    fn unparsable_budget_is_an_error() {
        let err = ProcessingConfig::from_lookup(lookup(&[(ENV_GRAPHICS_BUDGET_MS, "fast")]))
            .unwrap_err();
        assert!(format!("{err:#}").contains(ENV_GRAPHICS_BUDGET_MS));

        assert!(ProcessingConfig::from_lookup(lookup(&[(ENV_GRAPHICS_BUDGET_MS, "inf")])).is_err());
    }
}

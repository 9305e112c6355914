//! Step descriptions.
//!
//! A `Describer` turns a transformation kind and its selectors into prose.
//! Describers may be remote and slow, so the engine only ever talks to one
//! through `GuardedDescriber`, which bounds the wait and falls back to a
//! fixed template.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use provflow_core::error::Result;
use provflow_operators::{Selectors, TransformKind};

pub trait Describer: Send + Sync {
    fn describe(&self, kind: TransformKind, selectors: &Selectors) -> Result<String>;
}

/// The text used whenever a describer fails or times out.
pub fn fallback_description(kind: TransformKind) -> String {
    format!("Processing step: {}", kind.as_str())
}

/// Local describer built from the kind's label and the selected columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateDescriber;

impl Describer for TemplateDescriber {
    fn describe(&self, kind: TransformKind, selectors: &Selectors) -> Result<String> {
        let label = kind.label();
        let text = match kind {
            TransformKind::Merge => {
                let keys: Vec<String> = selectors
                    .columns_1
                    .iter()
                    .zip(&selectors.columns_2)
                    .map(|(l, r)| if l == r { l.clone() } else { format!("{l} = {r}") })
                    .collect();
                format!("{label}: inner join on {}", keys.join(", "))
            }
            _ if selectors.columns_1.is_empty() => format!("{label} over all columns"),
            _ => format!("{label} on {}", selectors.columns_1.join(", ")),
        };
        Ok(text)
    }
}

/// Runs the inner describer on a helper thread and waits at most `timeout`.
/// A late answer is dropped with the channel.
#[derive(Clone)]
pub struct GuardedDescriber {
    inner: Arc<dyn Describer>,
    timeout: Duration,
}

impl GuardedDescriber {
    pub fn new(inner: Arc<dyn Describer>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Never fails: errors, panics and timeouts all yield the fallback.
    pub fn describe(&self, kind: TransformKind, selectors: &Selectors) -> String {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let selectors = selectors.clone();
        let spawned = thread::Builder::new()
            .name("provflow-describe".into())
            .spawn(move || {
                let _ = tx.send(inner.describe(kind, &selectors));
            });
        if let Err(e) = spawned {
            tracing::warn!(kind = %kind, error = %e, "describer thread not started, using fallback");
            return fallback_description(kind);
        }

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(kind = %kind, error = %e, "describer failed, using fallback");
                fallback_description(kind)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    kind = %kind,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "describer timed out, using fallback"
                );
                fallback_description(kind)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::warn!(kind = %kind, "describer gave no answer, using fallback");
                fallback_description(kind)
            }
        }
    }
}

impl Default for GuardedDescriber {
    fn default() -> Self {
        Self::new(Arc::new(TemplateDescriber), Duration::from_millis(5000))
    }
}

impl std::fmt::Debug for GuardedDescriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedDescriber")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

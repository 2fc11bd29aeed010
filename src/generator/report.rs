//! Run report and per-item lifecycle

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::Error;

/// Lifecycle of one content item within a run.
/// `Loaded -> Resolved -> Composed`, or `-> Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Loaded,
    Resolved,
    Composed,
    Failed,
}

impl ItemState {
    /// Layout chain found
    pub fn resolve(self) -> Self {
        match self {
            ItemState::Loaded => ItemState::Resolved,
            other => other,
        }
    }

    /// Page rendered
    pub fn compose(self) -> Self {
        match self {
            ItemState::Resolved => ItemState::Composed,
            other => other,
        }
    }

    pub fn fail(self) -> Self {
        match self {
            ItemState::Composed => ItemState::Composed,
            _ => ItemState::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ItemState::Composed | ItemState::Failed)
    }
}

/// A skipped item (or listing page) and why
#[derive(Debug)]
pub struct Failure {
    pub source: String,
    pub error: Error,
}

/// Outcome of one generation run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Final state per content item, keyed by source
    pub states: BTreeMap<String, ItemState>,
    pub listing_pages: usize,
    pub unpublished: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl RunReport {
    pub fn record(&mut self, source: String, state: ItemState) {
        self.states.insert(source, state);
    }

    pub fn fail(&mut self, source: String, error: Error) {
        tracing::warn!("Skipping {}: {}", source, error);
        if let Some(state) = self.states.get_mut(&source) {
            *state = state.fail();
        }
        self.failures.push(Failure { source, error });
    }

    /// Failures from loading, where no item exists yet
    pub fn absorb_load_failures(&mut self, failures: Vec<Error>, unpublished: Vec<PathBuf>) {
        for error in failures {
            let source = match &error {
                Error::Parse { path, .. } | Error::Io { path, .. } => {
                    path.to_string_lossy().to_string()
                }
                other => other.kind().to_string(),
            };
            self.failures.push(Failure { source, error });
        }
        self.unpublished.extend(unpublished);
    }

    pub fn composed(&self) -> usize {
        self.states
            .values()
            .filter(|s| **s == ItemState::Composed)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.failures.len()
    }

    /// Failure counts per error kind
    pub fn skipped_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.error.kind()).or_insert(0) += 1;
        }
        counts
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} items composed, {} listing pages, {} skipped",
            self.composed(),
            self.listing_pages,
            self.skipped()
        )?;

        let kinds = self.skipped_by_kind();
        if !kinds.is_empty() {
            let parts: Vec<_> = kinds
                .iter()
                .map(|(kind, count)| format!("{} {}", count, kind))
                .collect();
            write!(f, " ({})", parts.join(", "))?;
        }
        if !self.unpublished.is_empty() {
            write!(f, ", {} unpublished", self.unpublished.len())?;
        }

        for failure in &self.failures {
            write!(f, "\n  - {}: {}", failure.source, failure.error)?;
        }
        Ok(())
    }
}

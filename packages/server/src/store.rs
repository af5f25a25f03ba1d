//! In-memory cache of the latest pipeline run.

use std::sync::Arc;

use arc_swap::ArcSwap;
use raid_map_report_models::PipelineRun;

/// Holds the most recent complete [`PipelineRun`].
///
/// Replacement swaps the whole run behind an `Arc`, so readers see either
/// the previous run or the new one, never a mix.
pub struct ReportStore {
    current: ArcSwap<PipelineRun>,
}

impl ReportStore {
    /// Creates a store holding `run`.
    #[must_use]
    pub fn new(run: PipelineRun) -> Self {
        Self {
            current: ArcSwap::from_pointee(run),
        }
    }

    /// Returns the current run.
    #[must_use]
    pub fn get(&self) -> Arc<PipelineRun> {
        self.current.load_full()
    }

    /// Replaces the current run, returning the previous one.
    pub fn replace(&self, run: PipelineRun) -> Arc<PipelineRun> {
        self.current.swap(Arc::new(run))
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new(PipelineRun::empty())
    }
}

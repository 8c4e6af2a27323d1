use core::fmt::Display;
use std::time::{Duration, Instant};

use li_core::{Error, Image};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::InspectConfig;
use crate::defect::Defect;
use crate::inspect::{Verdict, inspect};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Inspected {
        defects: Vec<Defect>,
        verdict: Verdict,
        elapsed: Duration,
    },
    /// The source could not be loaded or inspected.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem<S> {
    pub source: S,
    pub outcome: BatchOutcome,
}

/// Pass/fail/error counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_items<S>(items: &[BatchItem<S>]) -> Self {
        let mut summary = Self::default();
        for item in items {
            match &item.outcome {
                BatchOutcome::Inspected {
                    verdict: Verdict::Pass,
                    ..
                } => summary.passed += 1,
                BatchOutcome::Inspected {
                    verdict: Verdict::Fail,
                    ..
                } => summary.failed += 1,
                BatchOutcome::Failed { .. } => summary.errors += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errors
    }
}

/// Loads and inspects every source; output order equals input order.
///
/// The configuration is validated once up front. Per-item load or inspection
/// errors become [`BatchOutcome::Failed`] and do not stop the batch.
pub fn inspect_batch<S, L, E>(
    sources: Vec<S>,
    cfg: &InspectConfig,
    load: L,
) -> Result<Vec<BatchItem<S>>, Error>
where
    S: Send,
    L: Fn(&S) -> Result<Image<u16>, E> + Sync,
    E: Display,
{
    cfg.validate()?;
    let total = sources.len();
    let started = Instant::now();

    let run = |source: S| {
        let outcome = inspect_one(&source, cfg, &load);
        BatchItem { source, outcome }
    };

    #[cfg(feature = "parallel")]
    let items: Vec<BatchItem<S>> = {
        use rayon::prelude::*;
        sources.into_par_iter().map(run).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let items: Vec<BatchItem<S>> = sources.into_iter().map(run).collect();

    let summary = BatchSummary::from_items(&items);
    info!(
        "batch of {} done in {:.2?}: {} pass, {} fail, {} errors",
        total,
        started.elapsed(),
        summary.passed,
        summary.failed,
        summary.errors
    );
    Ok(items)
}

fn inspect_one<S, L, E>(source: &S, cfg: &InspectConfig, load: &L) -> BatchOutcome
where
    L: Fn(&S) -> Result<Image<u16>, E>,
    E: Display,
{
    let started = Instant::now();
    let img = match load(source) {
        Ok(img) => img,
        Err(e) => {
            warn!("load failed: {e}");
            return BatchOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    match inspect(&img.as_view(), cfg) {
        Ok(res) => BatchOutcome::Inspected {
            verdict: res.verdict(),
            defects: res.defects,
            elapsed: started.elapsed(),
        },
        Err(e) => {
            warn!("inspection failed: {e}");
            BatchOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

//! Pipeline driver
//!
//! Runs one batch through START → LOADED → (EMPTY_EXIT | RECONCILED) →
//! DATED → FILTERED → IDENTIFIED → PARTITIONED → DONE.
//!
//! Row-level problems are counted, never fatal. A source failure ends the
//! run before anything is staged; a sink failure aborts the sink so
//! nothing is committed.

use super::types::{PipelineContext, PipelineState, RunSummary};
use crate::dates::{DateResolution, DateResolver};
use crate::error::{Error, Result};
use crate::identity::{IdentifierSynthesizer, Identified, SequenceCounter, SequenceRange};
use crate::output::PartitionedSink;
use crate::partition::{PartitionedWriter, WriterOptions};
use crate::reconcile::{ReconciledRow, Reconciler};
use crate::source::BatchSource;
use crate::types::{CanonicalRow, RawRow};
use chrono::NaiveDate;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Rows per identification chunk; each chunk reserves one sequence range
pub const CHUNK_SIZE: usize = 4096;

/// Drives one batch from source to committed output
#[derive(Clone)]
pub struct PipelineDriver {
    source: Arc<dyn BatchSource>,
    sink: Arc<dyn PartitionedSink>,
    reconciler: Arc<Reconciler>,
    synthesizer: Arc<IdentifierSynthesizer>,
}

impl PipelineDriver {
    /// Create a driver with the standard alias table and placeholder
    pub fn new(source: Arc<dyn BatchSource>, sink: Arc<dyn PartitionedSink>) -> Self {
        Self {
            source,
            sink,
            reconciler: Arc::new(Reconciler::default()),
            synthesizer: Arc::new(IdentifierSynthesizer::default()),
        }
    }

    /// Use a custom reconciler
    #[must_use]
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = Arc::new(reconciler);
        self
    }

    /// Use a custom identifier synthesizer
    #[must_use]
    pub fn with_synthesizer(mut self, synthesizer: IdentifierSynthesizer) -> Self {
        self.synthesizer = Arc::new(synthesizer);
        self
    }

    /// Run the pipeline once
    pub async fn run(&self, ctx: &PipelineContext) -> Result<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary::new(ctx);
        info!(
            state = %summary.state,
            run_id = %ctx.run_id,
            input = %ctx.input,
            output = %ctx.output,
            process_date = %ctx.process_date,
            "pipeline started"
        );

        let batch = self.source.load(&ctx.input).await?;
        summary.files_read = batch.files.len();
        summary.rows_read = batch.len();
        summary.lossy_cells = batch.lossy_cells;
        transition(&mut summary, PipelineState::Loaded);

        if batch.is_empty() {
            summary.state = PipelineState::EmptyExit;
            warn!(
                state = %summary.state,
                input = %ctx.input,
                "no input rows, nothing to write"
            );
            summary.set_duration(elapsed_ms(started));
            return Ok(summary);
        }

        // Row work is CPU bound; keep it off the runtime's worker threads
        let driver = self.clone();
        let task_ctx = ctx.clone();
        let (rows, mut summary) = tokio::task::spawn_blocking(move || {
            let rows = driver.normalize(&task_ctx, batch.rows, &mut summary)?;
            Ok::<_, Error>((rows, summary))
        })
        .await
        .map_err(|e| Error::Other(format!("normalization task failed: {e}")))??;

        let writer = PartitionedWriter::new(Arc::clone(&self.sink)).with_options(
            WriterOptions::new().with_max_concurrent_writes(ctx.max_concurrent_writes),
        );
        let report = match writer.write(rows).await {
            Ok(report) => report,
            Err(e) => return Err(self.abort(e).await),
        };
        summary.set_write_report(report);
        transition(&mut summary, PipelineState::Partitioned);

        summary.files_committed = match self.sink.commit().await {
            Ok(files) => files,
            Err(e) => return Err(self.abort(e).await),
        };
        summary.set_duration(elapsed_ms(started));
        transition(&mut summary, PipelineState::Done);
        info!(
            rows_read = summary.rows_read,
            rows_written = summary.rows_written,
            rows_excluded = summary.total_excluded(),
            partitions = summary.rows_per_partition.len(),
            duration_ms = summary.duration_ms,
            "pipeline finished"
        );
        Ok(summary)
    }

    /// Reconcile, date, filter and identify a batch
    ///
    /// Row work runs on a rayon pool of `ctx.parallelism` threads; results
    /// keep input order, so the output does not depend on thread count.
    pub fn normalize(
        &self,
        ctx: &PipelineContext,
        rows: Vec<RawRow>,
        summary: &mut RunSummary,
    ) -> Result<Vec<CanonicalRow>> {
        let pool = build_pool(ctx.parallelism)?;

        let profile = self.reconciler.profile(&rows);
        let reconciled: Vec<ReconciledRow> =
            pool.install(|| rows.par_iter().map(|r| self.reconciler.reconcile(r)).collect());
        drop(rows);
        summary.coercion_failures = reconciled.iter().map(|r| r.coercion_failures.len()).sum();
        transition(summary, PipelineState::Reconciled);

        let resolver = DateResolver::new(ctx.process_date, profile.has_date_column);
        let resolutions: Vec<DateResolution> =
            pool.install(|| reconciled.par_iter().map(|r| resolver.resolve(r)).collect());
        info!(
            uses_row_dates = resolver.uses_row_dates(),
            "resolved partition dates"
        );
        transition(summary, PipelineState::Dated);

        let mut dated: Vec<(ReconciledRow, NaiveDate)> = Vec::with_capacity(reconciled.len());
        for (row, resolution) in reconciled.into_iter().zip(resolutions) {
            match resolution {
                DateResolution::Resolved(date) => dated.push((row, date)),
                DateResolution::Excluded(reason) => summary.add_exclusion(reason),
            }
        }
        if summary.total_excluded() > 0 {
            warn!(excluded = ?summary.rows_excluded, "excluded rows without a usable date");
        }
        transition(summary, PipelineState::Filtered);

        let counter = SequenceCounter::default();
        let mut chunks: Vec<Vec<(ReconciledRow, NaiveDate)>> = Vec::new();
        let mut rest = dated.into_iter().peekable();
        while rest.peek().is_some() {
            chunks.push(rest.by_ref().take(CHUNK_SIZE).collect());
        }
        let ranges: Vec<SequenceRange> = chunks.iter().map(|c| counter.reserve(c.len())).collect();

        let identified: Vec<Vec<Identified>> = pool.install(|| {
            chunks
                .into_par_iter()
                .zip(ranges)
                .map(|(chunk, range)| {
                    chunk
                        .into_iter()
                        .zip(range)
                        .map(|((row, date), seq)| self.synthesizer.identify(row, date, seq))
                        .collect()
                })
                .collect()
        });

        let mut canonical = Vec::with_capacity(identified.iter().map(Vec::len).sum());
        for item in identified.into_iter().flatten() {
            if item.synthesized {
                summary.ids_synthesized += 1;
            }
            canonical.push(item.row);
        }
        transition(summary, PipelineState::Identified);

        Ok(canonical)
    }

    /// Abort the sink after a failure and hand the original error back
    async fn abort(&self, cause: Error) -> Error {
        error!(error = %cause, "write failed, aborting run");
        if let Err(e) = self.sink.abort().await {
            error!(error = %e, "abort failed, staged files may remain");
        }
        cause
    }
}

fn transition(summary: &mut RunSummary, state: PipelineState) {
    summary.state = state;
    info!(
        state = %state,
        rows_read = summary.rows_read,
        rows_excluded = summary.total_excluded(),
        coercion_failures = summary.coercion_failures,
        ids_synthesized = summary.ids_synthesized,
        "state transition"
    );
}

fn build_pool(threads: usize) -> Result<ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("orders-normalize-{i}"))
        .build()
        .map_err(|e| Error::config(format!("Failed to build worker pool: {e}")))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

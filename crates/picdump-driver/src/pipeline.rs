use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use picdump_decoder::{DecodeError, SnapshotDecoder, SnapshotEvent};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinSet;

use crate::error::ExportError;
use crate::exporter::Exporter;

/// Counters for one or more pipeline runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Timesteps decoded and fully exported.
    pub timesteps: usize,
    /// Dataset events decoded.
    pub datasets: usize,
    pub exports_written: usize,
    pub exports_failed: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: RunSummary) {
        self.timesteps += other.timesteps;
        self.datasets += other.datasets;
        self.exports_written += other.exports_written;
        self.exports_failed += other.exports_failed;
    }
}

type TaskOutput = (PathBuf, Result<(), ExportError>);

/// Decodes a snapshot stream and fans exports out to blocking tasks.
///
/// Decoding stays sequential on the calling task. Chunk reads block; on a
/// multi-thread runtime they run under `block_in_place`, so the worker's
/// other tasks move to another thread meanwhile. On a current-thread
/// runtime nothing else runs during a read. Every export job runs on
/// tokio's blocking pool, and all jobs of timestep `N` are joined when its
/// `End` event arrives, before timestep `N + 1` is read.
///
/// ```text
///   decoder ──event──▶ plan ──jobs──▶ JoinSet (spawn_blocking)
///      ▲                                    │
///      └──────── End { N }: join all ◀──────┘
/// ```
///
/// A failed export is logged and counted; it never stops sibling exports
/// or decoding. A decode error stops the run once the exports already in
/// flight have finished.
pub struct Pipeline<E> {
    exporter: Arc<E>,
}

impl<E: Exporter + 'static> Pipeline<E> {
    pub fn new(exporter: E) -> Self {
        Self {
            exporter: Arc::new(exporter),
        }
    }

    #[must_use]
    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    /// Run until the decoder reports a clean end of stream.
    ///
    /// # Errors
    ///
    /// The first [`DecodeError`] from `decoder`. The decoder's
    /// [`timesteps_completed`](SnapshotDecoder::timesteps_completed) and
    /// [`last_record`](SnapshotDecoder::last_record) describe where it
    /// stopped.
    pub async fn run<R: Read>(
        &self,
        decoder: &mut SnapshotDecoder<R>,
    ) -> Result<RunSummary, DecodeError> {
        let mut summary = RunSummary::default();
        let mut tasks: JoinSet<TaskOutput> = JoinSet::new();
        let mut current = decoder.next_index();
        let mut started = Instant::now();

        while let Some(event) = next_event(decoder) {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    join_timestep(&mut tasks, &mut summary).await;
                    return Err(e);
                }
            };

            match event {
                SnapshotEvent::Begin { index, .. } => {
                    current = index;
                    started = Instant::now();
                }
                SnapshotEvent::End { index } => {
                    let before = summary;
                    join_timestep(&mut tasks, &mut summary).await;
                    summary.timesteps += 1;
                    tracing::info!(
                        index,
                        written = summary.exports_written - before.exports_written,
                        failed = summary.exports_failed - before.exports_failed,
                        elapsed_ms = started.elapsed().as_millis(),
                        "timestep complete"
                    );
                }
                _ => {
                    summary.datasets += 1;
                }
            }

            for job in self.exporter.plan(current, &event) {
                tasks.spawn_blocking(move || {
                    let result = job.run();
                    (job.path, result)
                });
            }
        }

        Ok(summary)
    }
}

fn next_event<R: Read>(decoder: &mut SnapshotDecoder<R>) -> Option<Result<SnapshotEvent, DecodeError>> {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| decoder.next()),
        _ => decoder.next(),
    }
}

async fn join_timestep(tasks: &mut JoinSet<TaskOutput>, summary: &mut RunSummary) {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((path, Ok(()))) => {
                summary.exports_written += 1;
                tracing::debug!(path = %path.display(), "exported");
            }
            Ok((_, Err(e))) => {
                summary.exports_failed += 1;
                tracing::error!("{e}");
            }
            Err(e) => {
                summary.exports_failed += 1;
                tracing::error!("{}", ExportError::from(e));
            }
        }
    }
}

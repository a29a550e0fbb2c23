use std::collections::BTreeMap;
use std::io::Write;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::sync::{Condvar, Mutex};
use std::thread;

use indicatif::ProgressBar;
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::debug;

use crate::batch::Batch;
use crate::encoder::encode_row;
use crate::error::{CustomError, Result};
use crate::model::{EncodedRow, EncodingFormat, MarkerRow};
use crate::output::ChunkWriter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveSummary {
    pub n_markers: usize,
    pub n_batches: usize,
}

pub fn encode_batch(batch: Batch<MarkerRow>, format: EncodingFormat) -> Result<Batch<EncodedRow>> {
    let rows = batch
        .rows
        .into_iter()
        .map(|row| encode_row(row, format))
        .collect::<Result<Vec<_>>>()?;
    Ok(Batch {
        index: batch.index,
        rows,
    })
}

/// Caps how far dispatch may run ahead of the writer. A batch is only handed
/// to a worker once it is fewer than `size` batches past the next one to be
/// written, so at most `size` encoded batches wait in the reorder buffer.
struct Window {
    size: usize,
    state: Mutex<WindowState>,
    moved: Condvar,
}

#[derive(Default)]
struct WindowState {
    next: usize,
    stopped: bool,
}

impl Window {
    fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            state: Mutex::new(WindowState::default()),
            moved: Condvar::new(),
        }
    }

    /// Blocks until batch `index` fits in the window. Returns false once the
    /// run has been stopped.
    fn admit(&self, index: usize) -> bool {
        let Ok(state) = self.state.lock() else {
            return false;
        };
        match self.moved.wait_while(state, |s| !s.stopped && index >= s.next + self.size) {
            Ok(state) => !state.stopped,
            Err(_) => false,
        }
    }

    fn advance(&self, next: usize) {
        if let Ok(mut state) = self.state.lock() {
            state.next = next;
        }
        self.moved.notify_all();
    }

    fn stop(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.stopped = true;
        }
        self.moved.notify_all();
    }
}

/// Encodes every batch on `pool` and pushes the rows into `sink` in input order.
///
/// Batches are pulled from `batches` as workers free up and may finish in any
/// order. Finished batches are held until every earlier batch has been written;
/// dispatch pauses while twice the pool's thread count are waiting. The first
/// failing batch stops the run; rows already pushed to `sink` are left for the
/// caller to discard.
pub fn drive<I, W>(
    batches: I,
    format: EncodingFormat,
    pool: &ThreadPool,
    sink: &mut ChunkWriter<W>,
    pb: &ProgressBar,
) -> Result<DriveSummary>
where
    I: Iterator<Item = Result<Batch<MarkerRow>>> + Send,
    W: Write,
{
    let n_threads = pool.current_num_threads();
    let (tx, rx) = sync_channel::<Batch<EncodedRow>>(n_threads);
    let window = Window::new(2 * n_threads);
    let window = &window;

    thread::scope(|scope| {
        let workers = scope.spawn(move || {
            // Dispatch only ends early once some other error has been recorded
            let admitted = batches.map_while(|batch| {
                if let Ok(b) = &batch {
                    if !window.admit(b.index) {
                        return None;
                    }
                }
                Some(batch)
            });
            pool.install(|| {
                admitted.par_bridge().try_for_each_with(tx, |tx, batch| {
                    send_encoded(tx, batch, format).inspect_err(|_| window.stop())
                })
            })
        });

        // Consumes `rx`, so workers see a closed channel if writing fails.
        let written = write_in_order(rx, sink, pb, window);
        window.stop();
        let encoded = match workers.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        match (encoded, written) {
            (Err(CustomError::WorkerDisconnected), Err(e)) => Err(e),
            (Err(e), _) => Err(e),
            (Ok(()), written) => written,
        }
    })
}

fn send_encoded(
    tx: &SyncSender<Batch<EncodedRow>>,
    batch: Result<Batch<MarkerRow>>,
    format: EncodingFormat,
) -> Result<()> {
    let encoded = encode_batch(batch?, format)?;
    debug!(
        batch = encoded.index,
        rows = encoded.rows.len(),
        "batch encoded"
    );
    tx.send(encoded)
        .map_err(|_| CustomError::WorkerDisconnected)
}

fn write_in_order<W: Write>(
    rx: Receiver<Batch<EncodedRow>>,
    sink: &mut ChunkWriter<W>,
    pb: &ProgressBar,
    window: &Window,
) -> Result<DriveSummary> {
    let mut pending: BTreeMap<usize, Vec<EncodedRow>> = BTreeMap::new();
    let mut summary = DriveSummary::default();

    for batch in rx {
        pending.insert(batch.index, batch.rows);
        let before = summary.n_batches;
        while let Some(rows) = pending.remove(&summary.n_batches) {
            summary.n_markers += rows.len();
            pb.inc(rows.len() as u64);
            for row in rows {
                sink.push(row)?;
            }
            summary.n_batches += 1;
        }
        if summary.n_batches > before {
            window.advance(summary.n_batches);
        }
    }

    // A gap means some batch never arrived
    if !pending.is_empty() {
        return Err(CustomError::WorkerDisconnected);
    }
    Ok(summary)
}

//! Background signal worker: all pipeline runs happen off the caller's thread.
//!
//! Communication is via `mpsc` channels. The worker owns a private
//! `rayon::ThreadPool` (not the global pool) and runs each job on it.
//!
//! Requests are single-flight per symbol with latest-wins delivery:
//! - `submit` bumps the symbol's generation before the command is sent.
//! - A running job polls its generation between pipeline stages and abandons
//!   the run as soon as a newer request for the same symbol exists.
//! - `recv_latest` / `try_recv_latest` drop any response whose generation is
//!   no longer the newest for its symbol.
//!
//! Results from different requests are never merged.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use confluence_core::{AnnotatedSeries, BarSeries, Pipeline, PipelineError, SignalParams};

/// Commands sent to the worker thread.
#[derive(Debug)]
pub enum WorkerCommand {
    Compute {
        symbol: String,
        generation: u64,
        series: BarSeries,
        params: SignalParams,
    },
    Shutdown,
}

/// Responses sent back from the worker.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Completed {
        symbol: String,
        generation: u64,
        result: Box<AnnotatedSeries>,
    },
    Failed {
        symbol: String,
        generation: u64,
        error: String,
    },
}

impl WorkerResponse {
    pub fn symbol(&self) -> &str {
        match self {
            WorkerResponse::Completed { symbol, .. } | WorkerResponse::Failed { symbol, .. } => {
                symbol
            }
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            WorkerResponse::Completed { generation, .. }
            | WorkerResponse::Failed { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("failed to build worker thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("worker has shut down")]
    Disconnected,
}

/// Newest generation per symbol, shared by callers and jobs.
#[derive(Debug, Clone, Default)]
struct Generations(Arc<Mutex<HashMap<String, u64>>>);

impl Generations {
    fn bump(&self, symbol: &str) -> u64 {
        let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let next = map.get(symbol).copied().unwrap_or(0) + 1;
        map.insert(symbol.to_string(), next);
        next
    }

    fn is_current(&self, symbol: &str, generation: u64) -> bool {
        let map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(symbol) == Some(&generation)
    }
}

/// Handle to the background worker.
///
/// Dropping the handle shuts the worker down and joins its thread.
pub struct SignalWorker {
    tx: Sender<WorkerCommand>,
    rx: Receiver<WorkerResponse>,
    generations: Generations,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SignalWorker {
    /// Spawn the worker thread with a private pool of `threads` threads.
    pub fn spawn(threads: usize) -> Result<Self, WorkerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("confluence-pool-{i}"))
            .build()?;

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let generations = Generations::default();
        let cancel = Arc::new(AtomicBool::new(false));

        let handle = {
            let generations = generations.clone();
            let cancel = Arc::clone(&cancel);
            thread::Builder::new()
                .name("confluence-worker".into())
                .spawn(move || worker_loop(cmd_rx, resp_tx, pool, generations, cancel))?
        };

        Ok(Self {
            tx: cmd_tx,
            rx: resp_rx,
            generations,
            cancel,
            handle: Some(handle),
        })
    }

    /// Queue a pipeline run and return its generation.
    ///
    /// Any earlier request for the same symbol is superseded immediately.
    pub fn submit(
        &self,
        symbol: impl Into<String>,
        series: BarSeries,
        params: SignalParams,
    ) -> Result<u64, WorkerError> {
        let symbol = symbol.into();
        let generation = self.generations.bump(&symbol);
        debug!(symbol = %symbol, generation, bars = series.len(), "submitting signal job");
        self.tx
            .send(WorkerCommand::Compute {
                symbol,
                generation,
                series,
                params,
            })
            .map_err(|_| WorkerError::Disconnected)?;
        Ok(generation)
    }

    /// True if `generation` is still the newest request for `symbol`.
    pub fn is_current(&self, symbol: &str, generation: u64) -> bool {
        self.generations.is_current(symbol, generation)
    }

    fn keep(&self, response: &WorkerResponse) -> bool {
        let current = self.is_current(response.symbol(), response.generation());
        if !current {
            debug!(
                symbol = response.symbol(),
                generation = response.generation(),
                "dropping stale response"
            );
        }
        current
    }

    /// Block until a current response arrives. `None` once the worker is gone.
    pub fn recv_latest(&self) -> Option<WorkerResponse> {
        loop {
            let response = self.rx.recv().ok()?;
            if self.keep(&response) {
                return Some(response);
            }
        }
    }

    /// Like [`SignalWorker::recv_latest`], giving up after `timeout`.
    pub fn recv_latest_timeout(&self, timeout: Duration) -> Option<WorkerResponse> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(response) if self.keep(&response) => return Some(response),
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Non-blocking: the next current response already waiting, if any.
    pub fn try_recv_latest(&self) -> Option<WorkerResponse> {
        loop {
            match self.rx.try_recv() {
                Ok(response) if self.keep(&response) => return Some(response),
                Ok(_) => continue,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return None,
            }
        }
    }

    /// Stop the worker, abandon in-flight jobs and join the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("signal worker thread panicked");
            }
        }
    }
}

impl Drop for SignalWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    pool: rayon::ThreadPool,
    generations: Generations,
    cancel: Arc<AtomicBool>,
) {
    loop {
        match rx.recv() {
            Ok(WorkerCommand::Shutdown) | Err(_) => break,
            Ok(WorkerCommand::Compute {
                symbol,
                generation,
                series,
                params,
            }) => {
                let tx = tx.clone();
                let generations = generations.clone();
                let cancel = Arc::clone(&cancel);
                pool.spawn(move || {
                    run_job(symbol, generation, series, params, &tx, &generations, &cancel);
                });
            }
        }
    }
    debug!("signal worker stopped");
}

fn run_job(
    symbol: String,
    generation: u64,
    series: BarSeries,
    params: SignalParams,
    tx: &Sender<WorkerResponse>,
    generations: &Generations,
    cancel: &AtomicBool,
) {
    let superseded =
        || cancel.load(Ordering::Relaxed) || !generations.is_current(&symbol, generation);

    let outcome = Pipeline::new(params)
        .map_err(PipelineError::from)
        .and_then(|pipeline| pipeline.run_until(&series, superseded));

    let response = match outcome {
        Ok(annotated) => WorkerResponse::Completed {
            symbol,
            generation,
            result: Box::new(annotated),
        },
        Err(PipelineError::Superseded) => {
            debug!(symbol = %symbol, generation, "signal job abandoned");
            return;
        }
        Err(e) => {
            warn!(symbol = %symbol, generation, error = %e, "signal job failed");
            WorkerResponse::Failed {
                symbol,
                generation,
                error: e.to_string(),
            }
        }
    };
    let _ = tx.send(response);
}

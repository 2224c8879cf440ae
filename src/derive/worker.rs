//! Background preparation of full wallpaper images.
//!
//! Decoding and colorizing a full document is the one CPU-heavy step, so it
//! runs on a small pool of threads. Each job carries the sender of the cache
//! that asked for it; results travel back over that channel and are applied
//! when the owner polls.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use flume::{Receiver, Sender};
use image::RgbaImage;
use tracing::{debug, trace, warn};

use super::prepare::{
    prepare_blurred_preview, prepare_scaled_from_full, preprocess_background_image, PatternParams,
};
use crate::decode::decode_document;
use crate::error::ImageLoadError;
use crate::pixmap::PaperImage;
use crate::settings::RendererSettings;

/// What a job starts from.
#[derive(Debug, Clone)]
pub enum JobSource {
    /// Document bytes as downloaded.
    Encoded(Arc<Vec<u8>>),
    /// A full image decoded by an earlier job, re-derived with new params.
    Decoded(Arc<RgbaImage>),
}

/// A full document waiting to be prepared.
#[derive(Debug, Clone)]
pub struct PreparationJob {
    pub generation: u64,
    pub source: JobSource,
    pub params: PatternParams,
    pub settings: RendererSettings,
    pub reply: Sender<PreparationResult>,
}

/// Images produced from one full document.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    /// The decoded document after aspect clipping and fitting.
    pub full: Arc<RgbaImage>,
    /// Preview box, colorized for patterns, premultiplied.
    pub scaled: PaperImage,
    /// Blurred preview box; photos only.
    pub blurred: Option<PaperImage>,
}

#[derive(Debug)]
pub struct PreparationResult {
    pub generation: u64,
    pub outcome: Result<Prepared, ImageLoadError>,
}

/// Decodes and prepares one document on the calling thread.
pub fn prepare_document(
    source: &JobSource,
    params: &PatternParams,
    settings: &RendererSettings,
) -> Result<Prepared, ImageLoadError> {
    let full = match source {
        JobSource::Encoded(bytes) => {
            let decoded = decode_document(bytes, settings.max_side)?;
            Arc::new(preprocess_background_image(decoded, settings.max_side))
        }
        JobSource::Decoded(full) => Arc::clone(full),
    };
    let scaled = prepare_scaled_from_full(&full, params, settings, false);
    let blurred = (!params.is_pattern).then(|| prepare_blurred_preview(&full, settings));
    Ok(Prepared {
        full,
        scaled,
        blurred,
    })
}

/// Fixed set of threads preparing full images.
///
/// Dropping the pool closes the job queue and joins the threads after they
/// finish their current job.
pub struct PreparationPool {
    jobs: Option<Sender<PreparationJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl PreparationPool {
    /// Starts `threads` workers (at least one).
    pub fn new(threads: usize) -> io::Result<Self> {
        let (jobs, queue) = flume::unbounded::<PreparationJob>();
        let workers = (0..threads.max(1))
            .map(|index| {
                let queue = queue.clone();
                thread::Builder::new()
                    .name(format!("wallpaper-prepare-{index}"))
                    .spawn(move || worker_loop(index, queue))
            })
            .collect::<io::Result<Vec<_>>>()?;
        debug!(threads = workers.len(), "preparation pool started");
        Ok(Self {
            jobs: Some(jobs),
            workers,
        })
    }

    pub fn from_settings(settings: &RendererSettings) -> io::Result<Self> {
        Self::new(settings.worker_threads)
    }

    /// Queues a job. Returns false if the pool is shutting down.
    pub fn submit(&self, job: PreparationJob) -> bool {
        match &self.jobs {
            Some(jobs) => jobs.send(job).is_ok(),
            None => false,
        }
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for PreparationPool {
    fn drop(&mut self) {
        self.jobs.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                warn!("preparation worker panicked");
            }
        }
        debug!("preparation pool stopped");
    }
}

fn worker_loop(index: usize, queue: Receiver<PreparationJob>) {
    while let Ok(job) = queue.recv() {
        trace!(worker = index, generation = job.generation, "preparing document");
        let outcome = prepare_document(&job.source, &job.params, &job.settings);
        let result = PreparationResult {
            generation: job.generation,
            outcome,
        };
        // The owner may be gone; its result is no longer wanted.
        if job.reply.send(result).is_err() {
            trace!(worker = index, generation = job.generation, "result owner dropped");
        }
    }
}

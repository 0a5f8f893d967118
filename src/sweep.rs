//! SNR sweep over a pool of worker threads
//!
//! Every (SNR, repeat) pair is an independent trial with its own generator,
//! seeded from the base seed and the trial index, so a sweep gives the same
//! numbers whatever the worker count or completion order. Results land in a
//! slot per trial and are averaged per SNR point once all of that point's
//! repeats are in.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dsss::trial::TrialRunner;
use crate::error::{Result, SimError};

/// Upper bound on the number of SNR points in one sweep
pub const MAX_SWEEP_POINTS: usize = 10_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepParams {
    pub from_db: f64,
    pub to_db: f64,
    pub step_db: f64,
    pub repeat_count: usize,
}

impl SweepParams {
    pub fn validate(&self) -> Result<()> {
        self.snr_points().map(|_| ())
    }

    /// `round((to - from) / step) + 1` evenly spaced values from `from_db`
    /// to `to_db` inclusive
    pub fn snr_points(&self) -> Result<Vec<f64>> {
        if !self.from_db.is_finite() {
            return Err(SimError::sweep("from_db", "must be finite"));
        }
        if !self.to_db.is_finite() {
            return Err(SimError::sweep("to_db", "must be finite"));
        }
        if !self.step_db.is_finite() || self.step_db == 0.0 {
            return Err(SimError::sweep("step_db", "must be finite and non-zero"));
        }
        if self.repeat_count == 0 {
            return Err(SimError::sweep("repeat_count", "must be at least 1"));
        }

        let steps = ((self.to_db - self.from_db) / self.step_db).round();
        if steps < 0.0 {
            return Err(SimError::sweep(
                "step_db",
                format!(
                    "a step of {} dB never reaches {} dB from {} dB",
                    self.step_db, self.to_db, self.from_db
                ),
            ));
        }
        if steps >= MAX_SWEEP_POINTS as f64 {
            return Err(SimError::sweep(
                "step_db",
                format!("sweep would have more than {MAX_SWEEP_POINTS} points"),
            ));
        }

        let count = steps as usize + 1;
        if count == 1 {
            return Ok(vec![self.from_db]);
        }
        let delta = (self.to_db - self.from_db) / (count - 1) as f64;
        let mut points: Vec<f64> = (0..count)
            .map(|i| self.from_db + i as f64 * delta)
            .collect();
        points[count - 1] = self.to_db;
        Ok(points)
    }
}

#[derive(Clone, Debug)]
pub struct SweepOptions {
    pub workers: usize,
    pub seed: u64,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            seed: crate::utils::consts::DEFAULT_SEED,
        }
    }
}

/// Average BER at one SNR
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepPoint {
    pub snr_db: f64,
    pub average_ber: f64,
    pub trials: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SweepReport {
    /// Completed points in increasing SNR order
    pub points: Vec<SweepPoint>,
    /// Set when the sweep stopped early; only finished points are reported
    pub cancelled: bool,
}

/// Progress callbacks, invoked from the thread that called [`run_sweep`]
pub trait SweepObserver {
    fn on_trial_complete(&self, _completed: usize, _total: usize) {}
    fn on_point_complete(&self, _point: &SweepPoint) {}
}

/// Observer that ignores everything
pub struct Silent;

impl SweepObserver for Silent {}

struct Job {
    index: usize,
    snr_db: f64,
}

/// Average a point's slots in repeat order
fn finish_point(bers: &[Option<f64>], point: usize, repeat: usize, snr_db: f64) -> SweepPoint {
    let sum: f64 = bers[point * repeat..(point + 1) * repeat]
        .iter()
        .flatten()
        .sum();
    SweepPoint {
        snr_db,
        average_ber: sum / repeat as f64,
        trials: repeat,
    }
}

/// Run `repeat_count` trials at every SNR point across `options.workers`
/// threads.
///
/// Setting `cancel` stops workers before their next trial; the report then
/// holds only the points whose repeats all finished. The first trial error
/// stops the sweep and is returned.
pub fn run_sweep(
    runner: &TrialRunner,
    params: &SweepParams,
    options: &SweepOptions,
    cancel: &AtomicBool,
    observer: &dyn SweepObserver,
) -> Result<SweepReport> {
    let snr_points = params.snr_points()?;
    if options.workers == 0 {
        return Err(SimError::sweep("workers", "must be at least 1"));
    }

    let repeat = params.repeat_count;
    let total = snr_points.len() * repeat;
    let workers = options.workers.min(total);
    info!(
        "Sweep: {} SNR points x {} repeats on {} workers",
        snr_points.len(),
        repeat,
        workers
    );

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
    for (point, &snr_db) in snr_points.iter().enumerate() {
        for r in 0..repeat {
            // receiver is alive, this cannot fail
            let _ = job_tx.send(Job {
                index: point * repeat + r,
                snr_db,
            });
        }
    }
    drop(job_tx);

    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, Result<f64>)>();
    let abort = AtomicBool::new(false);

    let mut bers: Vec<Option<f64>> = vec![None; total];
    let mut done_per_point = vec![0usize; snr_points.len()];
    let mut completed = 0usize;
    let mut first_error: Option<SimError> = None;

    thread::scope(|scope| {
        for worker in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let abort = &abort;
            let seed = options.seed;
            scope.spawn(move || {
                for job in job_rx.iter() {
                    if cancel.load(Ordering::SeqCst) || abort.load(Ordering::SeqCst) {
                        break;
                    }
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(job.index as u64));
                    let outcome = runner
                        .run_trial_at(job.snr_db, &mut rng)
                        .map(|result| result.ber);
                    if result_tx.send((job.index, outcome)).is_err() {
                        break;
                    }
                }
                debug!("Sweep worker {} finished", worker);
            });
        }
        drop(result_tx);

        for (index, outcome) in result_rx.iter() {
            match outcome {
                Ok(ber) => {
                    let point = index / repeat;
                    bers[index] = Some(ber);
                    done_per_point[point] += 1;
                    completed += 1;
                    observer.on_trial_complete(completed, total);

                    if done_per_point[point] == repeat {
                        let finished = finish_point(&bers, point, repeat, snr_points[point]);
                        info!(
                            "SNR {:>7.2} dB -> BER {:.5}",
                            finished.snr_db, finished.average_ber
                        );
                        observer.on_point_complete(&finished);
                    }
                }
                Err(err) => {
                    abort.store(true, Ordering::SeqCst);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
    });

    if let Some(err) = first_error {
        return Err(err);
    }

    let mut points: Vec<SweepPoint> = snr_points
        .iter()
        .enumerate()
        .filter(|(point, _)| done_per_point[*point] == repeat)
        .map(|(point, &snr_db)| finish_point(&bers, point, repeat, snr_db))
        .collect();
    points.sort_by(|a, b| a.snr_db.total_cmp(&b.snr_db));

    let cancelled = completed < total;
    if cancelled {
        warn!(
            "Sweep cancelled after {}/{} trials, {} of {} points complete",
            completed,
            total,
            points.len(),
            snr_points.len()
        );
    }

    Ok(SweepReport { points, cancelled })
}

use crate::{
    Prober, ScanTarget, StopCondition, SubnetScanner, SweepConfig, SweepError, SweepResult, WriteQueue,
    WriteSerializer,
};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetState {
    Pending,
    Scanning,
    Live,
    NotLive,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanSummary {
    /// Final state of each target, in input order.
    pub states: Vec<TargetState>,
    pub interrupted: bool,
}

impl ScanSummary {
    fn count(&self, state: TargetState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }

    pub fn live(&self) -> usize {
        self.count(TargetState::Live)
    }

    pub fn not_live(&self) -> usize {
        self.count(TargetState::NotLive)
    }

    pub fn scanned(&self) -> usize {
        self.live() + self.not_live()
    }

    /// Targets never completed: still pending, or cut short by a stop.
    pub fn unfinished(&self) -> usize {
        self.states.len() - self.scanned()
    }
}

type JobQueue = Arc<Mutex<VecDeque<(usize, ScanTarget)>>>;
type StateSender = mpsc::Sender<(usize, TargetState)>;

/// Runs one [`SubnetScanner`] per target on a fixed-size worker pool and
/// sends live subnets to a [`WriteSerializer`].
pub struct ScanOrchestrator<P> {
    prober: Arc<P>,
    threads: usize,
    stop: StopCondition,
}

impl<P> ScanOrchestrator<P>
where
    P: Prober + 'static,
{
    pub fn new(prober: P, config: &SweepConfig) -> Self {
        ScanOrchestrator { prober: Arc::new(prober), threads: config.threads, stop: StopCondition::new() }
    }

    /// Use `stop` to cancel the run from outside, e.g. from a signal handler.
    #[must_use]
    pub fn with_stop_condition(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    pub(crate) fn worker_count(&self, n_targets: usize) -> usize {
        self.threads.min(n_targets)
    }

    /// Scans every target and appends live subnets to `output`.
    ///
    /// A fatal error in any worker stops dispatch and is returned once the
    /// writer has drained. A stop request is not an error; it shows up as
    /// `interrupted` in the summary.
    pub fn run<W>(&self, targets: &[ScanTarget], output: W) -> SweepResult<ScanSummary>
    where
        W: Write + Send + 'static,
    {
        let mut states = vec![TargetState::Pending; targets.len()];
        let workers = self.worker_count(targets.len());
        tracing::info!(targets = targets.len(), workers, "starting scan");

        let jobs: JobQueue = Arc::new(Mutex::new(targets.iter().cloned().enumerate().collect()));
        let first_error: Arc<Mutex<Option<SweepError>>> = Arc::new(Mutex::new(None));
        let (state_tx, state_rx) = mpsc::channel::<(usize, TargetState)>();
        let serializer = WriteSerializer::start(output);

        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    prober: Arc::clone(&self.prober),
                    jobs: Arc::clone(&jobs),
                    state_tx: state_tx.clone(),
                    queue: serializer.queue(),
                    stop: self.stop.clone(),
                    first_error: Arc::clone(&first_error),
                };
                std::thread::spawn(move || worker.run())
            })
            .collect();
        drop(state_tx);

        let mut panicked = false;
        for handle in handles {
            panicked |= handle.join().is_err();
        }
        for (idx, state) in state_rx {
            states[idx] = state;
        }
        let writer_result = serializer.shutdown();

        if let Some(error) = first_error.lock().unwrap_or_else(PoisonError::into_inner).take() {
            return Err(error);
        }
        if panicked {
            return Err(SweepError::WorkerPanicked);
        }
        writer_result?;

        let summary = ScanSummary { states, interrupted: self.stop.get_should_stop() };
        tracing::info!(
            live = summary.live(),
            not_live = summary.not_live(),
            unfinished = summary.unfinished(),
            interrupted = summary.interrupted,
            "scan finished"
        );
        Ok(summary)
    }
}

struct Worker<P> {
    id: usize,
    prober: Arc<P>,
    jobs: JobQueue,
    state_tx: StateSender,
    queue: WriteQueue,
    stop: StopCondition,
    first_error: Arc<Mutex<Option<SweepError>>>,
}

impl<P> Worker<P>
where
    P: Prober,
{
    fn run(self) {
        let _span = tracing::debug_span!("worker", id = self.id).entered();
        tracing::trace!("worker thread start");

        while !self.stop.get_should_stop() {
            let next = self.jobs.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
            let Some((idx, target)) = next else {
                break;
            };
            // The orchestrator drains the state channel only after joining us.
            let _ = self.state_tx.send((idx, TargetState::Scanning));

            match self.scan(&target) {
                Ok(state) => {
                    let _ = self.state_tx.send((idx, state));
                }
                Err(SweepError::Interrupted) => {
                    tracing::debug!(subnet = %target.subnet(), "scan stopped before completion");
                    break;
                }
                Err(error) => {
                    tracing::error!(subnet = %target.subnet(), "aborting scan: {}", error);
                    self.first_error
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .get_or_insert(error);
                    self.stop.set_should_stop();
                    break;
                }
            }
        }
        tracing::trace!("worker thread end");
    }

    fn scan(&self, target: &ScanTarget) -> SweepResult<TargetState> {
        let result = SubnetScanner::new(&*self.prober).with_stop_condition(&self.stop).scan(target)?;
        if result.is_live() {
            self.queue.enqueue(result.output_line())?;
            Ok(TargetState::Live)
        } else {
            Ok(TargetState::NotLive)
        }
    }
}

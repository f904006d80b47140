use crate::{Prober, ScanResult, ScanTarget, StopCondition, SweepError, SweepResult};

/// Probes the candidate hosts of one /24 in order and stops at the first
/// host that answers.
pub struct SubnetScanner<'a, P: ?Sized> {
    prober: &'a P,
    stop: Option<&'a StopCondition>,
}

impl<'a, P> SubnetScanner<'a, P>
where
    P: Prober + ?Sized,
{
    pub fn new(prober: &'a P) -> Self {
        SubnetScanner { prober, stop: None }
    }

    /// Checked before every probe; a set flag ends the scan with
    /// [`SweepError::Interrupted`].
    #[must_use]
    pub fn with_stop_condition(mut self, stop: &'a StopCondition) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn scan(&self, target: &ScanTarget) -> SweepResult<ScanResult> {
        let subnet = target.subnet();
        tracing::info!(%subnet, "scanning subnet");

        for address in target.candidates() {
            if self.stop.is_some_and(StopCondition::get_should_stop) {
                return Err(SweepError::Interrupted);
            }
            if self.prober.probe(address)? {
                tracing::info!(%subnet, host = %address, "subnet is live");
                return Ok(ScanResult { subnet, live_host: Some(address) });
            }
        }

        tracing::debug!(%subnet, "subnet is not live");
        Ok(ScanResult { subnet, live_host: None })
    }
}

/// True when at least one of `target`'s candidate hosts answers.
pub fn scan_subnet<P>(prober: &P, target: &ScanTarget) -> SweepResult<bool>
where
    P: Prober + ?Sized,
{
    Ok(SubnetScanner::new(prober).scan(target)?.is_live())
}

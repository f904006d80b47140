use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use subnet_sweep::{
    load_rules, open_output, resolve_output_path, IcmpProber, ScanOrchestrator, ScanSummary, StopCondition,
    SweepConfig, DEFAULT_THREADS, DEFAULT_TIMEOUT_SECS, MAX_THREADS,
};

const EXIT_SUCCESS: u8 = 0;
const EXIT_INTERRUPTED: u8 = 130;

#[derive(argh::FromArgs)]
/// subnet-sweep - find the /24 subnets with at least one host answering ICMP echo
struct Args {
    #[argh(option, short = 'i')]
    /// rule file, one `CIDR;suffix,suffix,...` per line
    input: PathBuf,

    #[argh(option, short = 'o')]
    /// output file for live subnets (.txt is appended if missing)
    output: PathBuf,

    #[argh(option, short = 't', default = "DEFAULT_TIMEOUT_SECS")]
    /// seconds to wait for each echo reply (default 2)
    timeout: u64,

    #[argh(option, short = 'T', default = "DEFAULT_THREADS")]
    /// number of subnets scanned in parallel (default 4, at most 4)
    threads: usize,

    #[argh(option, default = "tracing::Level::INFO")]
    /// log level: error, warn, info, debug or trace (default info)
    log_level: tracing::Level,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let config = SweepConfig::new(args.timeout, args.threads)
        .with_context(|| format!("use a timeout of at least 1s and 1 to {MAX_THREADS} threads"))?;
    if !args.input.exists() {
        anyhow::bail!("file {} could not be found", args.input.display());
    }
    let targets = load_rules(&args.input)?;

    let output_path = resolve_output_path(&args.output);
    let output = open_output(&output_path).with_context(|| format!("cannot open {}", output_path.display()))?;

    let stop = StopCondition::new();
    let stop_on_signal = stop.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupted, waiting for in-flight probes");
        stop_on_signal.set_should_stop();
    })
    .context("could not install interrupt handler")?;

    tracing::info!(output = %output_path.display(), subnets = targets.len(), "starting sweep");
    let orchestrator = ScanOrchestrator::new(IcmpProber::raw(config.timeout), &config).with_stop_condition(stop);
    let summary = orchestrator.run(&targets, output)?;

    if summary.interrupted {
        tracing::warn!(scanned = summary.scanned(), unfinished = summary.unfinished(), "sweep interrupted");
    } else {
        tracing::info!(live = summary.live(), scanned = summary.scanned(), "finished execution");
    }
    Ok(ExitCode::from(exit_status(&summary)))
}

/// 130 (128 + SIGINT) for a sweep cut short by Ctrl-C.
fn exit_status(summary: &ScanSummary) -> u8 {
    if summary.interrupted {
        EXIT_INTERRUPTED
    } else {
        EXIT_SUCCESS
    }
}

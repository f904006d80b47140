#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub use config::*;
pub use orchestrator::{ScanOrchestrator, ScanSummary, TargetState};
pub use output::{open_output, resolve_output_path};
pub use probe::{IcmpProber, Prober};
pub use rules::{load_rules, parse_rules};
pub use stop_condition::StopCondition;
pub use subnet_scanner::{scan_subnet, SubnetScanner};
pub use sweep_error::{SweepError, SweepResult};
pub use target::{split_into_subnets, HostSuffix, ScanResult, ScanTarget};
pub use write_serializer::{WriteQueue, WriteSerializer};

pub mod icmp;

mod config;
mod orchestrator;
mod output;
mod probe;
mod rules;
mod stop_condition;
mod subnet_scanner;
mod sweep_error;
mod target;
mod write_serializer;

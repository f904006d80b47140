//! The rule file: one `CIDR;suffix,suffix,...` rule per line.
//!
//! ```text
//! 192.168.0.0/16;
//! 172.16.0.0/12;
//! 10.0.0.0/8;1,2,3,10,100,254
//! ```
//!
//! An empty suffix list probes every host of each /24. Blank lines and lines
//! starting with `#` are ignored. A /24 named by several rules is scanned once,
//! at its first position, with the suffix lists merged.
use crate::{split_into_subnets, HostSuffix, ScanTarget, SweepError, SweepResult};
use ipnet::Ipv4Net;
use std::collections::hash_map::{Entry, HashMap};
use std::net::Ipv4Addr;
use std::path::Path;

pub fn parse_rules(text: &str) -> SweepResult<Vec<ScanTarget>> {
    let mut targets: Vec<ScanTarget> = Vec::new();
    let mut positions: HashMap<Ipv4Net, usize> = HashMap::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (net, suffixes) = parse_rule(idx + 1, line)?;
        for subnet in split_into_subnets(net) {
            let target = ScanTarget::new(subnet, suffixes.clone());
            match positions.entry(target.subnet()) {
                Entry::Occupied(position) => targets[*position.get()].merge(&target),
                Entry::Vacant(position) => {
                    position.insert(targets.len());
                    targets.push(target);
                }
            }
        }
    }
    tracing::debug!(subnets = targets.len(), "parsed rules");
    Ok(targets)
}

pub fn load_rules(path: &Path) -> SweepResult<Vec<ScanTarget>> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| SweepError::ReadInput { path: path.to_path_buf(), source })?;
    parse_rules(&text)
}

fn parse_rule(line_no: usize, line: &str) -> SweepResult<(Ipv4Net, Vec<HostSuffix>)> {
    let (cidr, suffixes) = line
        .split_once(';')
        .ok_or_else(|| SweepError::input(line_no, format!("expected 'CIDR;suffixes', got '{line}'")))?;
    let net = parse_net(cidr.trim()).ok_or_else(|| SweepError::input(line_no, format!("invalid CIDR '{}'", cidr.trim())))?;

    let suffixes = suffixes.trim();
    if suffixes.is_empty() {
        return Ok((net, Vec::new()));
    }
    let suffixes = suffixes
        .split(',')
        .map(|s| {
            s.parse::<HostSuffix>()
                .map_err(|_| SweepError::input(line_no, format!("invalid host suffix '{}'", s.trim())))
        })
        .collect::<SweepResult<Vec<_>>>()?;
    Ok((net, suffixes))
}

/// A bare address is taken as a /32.
fn parse_net(s: &str) -> Option<Ipv4Net> {
    if s.contains('/') {
        s.parse::<Ipv4Net>().ok()
    } else {
        s.parse::<Ipv4Addr>().ok().map(Ipv4Net::from)
    }
}

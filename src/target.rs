use ipnet::Ipv4Net;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

const SUBNET_PREFIX_LEN: u8 = 24;

/// The last octet of a candidate host inside a /24, written `.N`.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct HostSuffix(pub u8);

impl HostSuffix {
    /// `.0` through `.255`, in order.
    pub fn all() -> Vec<HostSuffix> {
        (0..=u8::MAX).map(HostSuffix).collect()
    }
}

impl fmt::Display for HostSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".{}", self.0)
    }
}

impl FromStr for HostSuffix {
    type Err = std::num::ParseIntError;

    /// Accepts both `7` and `.7`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        s.strip_prefix('.').unwrap_or(s).parse::<u8>().map(HostSuffix)
    }
}

/// Widens `net` to the /24 containing it, or splits it into /24s.
pub fn split_into_subnets(net: Ipv4Net) -> Vec<Ipv4Net> {
    if net.prefix_len() >= SUBNET_PREFIX_LEN {
        return vec![enclosing_subnet(net.network())];
    }
    net.trunc()
        .subnets(SUBNET_PREFIX_LEN)
        .map(|subnets| subnets.collect())
        .unwrap_or_default()
}

fn enclosing_subnet(addr: Ipv4Addr) -> Ipv4Net {
    Ipv4Net::new(addr, SUBNET_PREFIX_LEN).expect("/24 is always valid").trunc()
}

/// One /24 subnet and the hosts to try in it, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanTarget {
    subnet: Ipv4Net,
    suffixes: Vec<HostSuffix>,
}

impl ScanTarget {
    /// `subnet` is normalized to the /24 containing its network address. An
    /// empty suffix list means every suffix.
    pub fn new(subnet: Ipv4Net, suffixes: Vec<HostSuffix>) -> Self {
        let suffixes = if suffixes.is_empty() { HostSuffix::all() } else { suffixes };
        ScanTarget { subnet: enclosing_subnet(subnet.network()), suffixes }
    }

    /// Appends the suffixes of `other` not tried yet, keeping their order.
    pub(crate) fn merge(&mut self, other: &ScanTarget) {
        for suffix in &other.suffixes {
            if !self.suffixes.contains(suffix) {
                self.suffixes.push(*suffix);
            }
        }
    }

    pub fn subnet(&self) -> Ipv4Net {
        self.subnet
    }

    pub fn suffixes(&self) -> &[HostSuffix] {
        &self.suffixes
    }

    /// The subnet's network address with its last octet replaced by `suffix`.
    pub fn address(&self, suffix: HostSuffix) -> Ipv4Addr {
        let [a, b, c, _] = self.subnet.network().octets();
        Ipv4Addr::new(a, b, c, suffix.0)
    }

    pub fn candidates(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.suffixes.iter().map(|suffix| self.address(*suffix))
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subnet)
    }
}

/// Outcome of scanning one subnet. Only live results are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanResult {
    pub subnet: Ipv4Net,
    /// The first host that answered.
    pub live_host: Option<Ipv4Addr>,
}

impl ScanResult {
    pub fn is_live(&self) -> bool {
        self.live_host.is_some()
    }

    /// The line written to the output file, e.g. `10.1.2.0/24\n`.
    pub fn output_line(&self) -> String {
        format!("{}\n", self.subnet)
    }
}

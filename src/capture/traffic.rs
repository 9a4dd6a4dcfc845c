//! Classification of captured packets by lab role
//!
//! Every container of the fuzzing lab lives in 172.22.0.0/16. The third
//! octet names the role (one value per resolver implementation, 101 for the
//! fuzzing client, 201 for the forwarder) and the host octet is the unit
//! number of the test.

use std::convert::TryFrom;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use derive_more::{Display, Error};

use crate::capture::packet::{NetworkObservation, Transport};

const LAB_PREFIX: [u8; 2] = [172, 22];
const CLIENT_OCTET: u8 = 101;
const FORWARDER_OCTET: u8 = 201;

/// Resolver implementations under test
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resolver {
    Bind9,
    Unbound,
    Knot,
    PowerDns,
    Technitium,
    MaraDns,
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display(fmt = "unknown resolver {:?}", name)]
pub struct UnknownResolver {
    pub name: String,
}

impl Resolver {
    /// All resolvers in the order a round is visited
    pub const ALL: [Resolver; 6] = [
        Resolver::Bind9,
        Resolver::Unbound,
        Resolver::Knot,
        Resolver::PowerDns,
        Resolver::Technitium,
        Resolver::MaraDns,
    ];

    /// Directory name of the resolver inside a round
    pub fn as_str(&self) -> &'static str {
        match *self {
            Resolver::Bind9 => "bind9",
            Resolver::Unbound => "unbound",
            Resolver::Knot => "knot",
            Resolver::PowerDns => "powerdns",
            Resolver::Technitium => "technitium",
            Resolver::MaraDns => "maradns",
        }
    }

    /// Identity as emitted to the monitor
    pub fn tag(&self) -> String {
        self.as_str().to_uppercase()
    }

    /// Third octet of the resolver's lab address
    pub fn role_octet(&self) -> u8 {
        match *self {
            Resolver::Bind9 => 1,
            Resolver::Unbound => 2,
            Resolver::PowerDns => 3,
            Resolver::Knot => 4,
            Resolver::MaraDns => 5,
            Resolver::Technitium => 6,
        }
    }
}

impl fmt::Display for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Resolver {
    type Err = UnknownResolver;

    fn from_str(s: &str) -> Result<Resolver, UnknownResolver> {
        let lower = s.trim().to_lowercase();
        Resolver::ALL
            .iter()
            .find(|r| r.as_str() == lower)
            .copied()
            .ok_or(UnknownResolver {
                name: s.to_string(),
            })
    }
}

/// How the resolver under test is recognized in the capture
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ResolverMatch {
    /// The resolver's own address. `None` when the unit number does not fit
    /// a host octet, in which case no packet is attributed to it.
    Exact(Option<Ipv4Addr>),
    /// Any lab address outside the client and forwarder ranges
    LabRange,
}

/// Addresses of the roles taking part in one unit's test
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleTable {
    client: Option<Ipv4Addr>,
    forwarder: Option<Ipv4Addr>,
    resolver: ResolverMatch,
}

fn lab_address(role: u8, unit: u32) -> Option<Ipv4Addr> {
    let host = u8::try_from(unit).ok()?;
    Some(Ipv4Addr::new(LAB_PREFIX[0], LAB_PREFIX[1], role, host))
}

fn in_lab(addr: &Ipv4Addr) -> bool {
    addr.octets()[..2] == LAB_PREFIX
}

fn in_role_range(addr: &Ipv4Addr, role: u8) -> bool {
    in_lab(addr) && addr.octets()[2] == role
}

impl RoleTable {
    pub fn new(unit: u32, resolver: Option<Resolver>) -> RoleTable {
        let resolver = match resolver {
            Some(r) => ResolverMatch::Exact(lab_address(r.role_octet(), unit)),
            None => ResolverMatch::LabRange,
        };

        RoleTable {
            client: lab_address(CLIENT_OCTET, unit),
            forwarder: lab_address(FORWARDER_OCTET, unit),
            resolver,
        }
    }

    pub fn client(&self) -> Option<Ipv4Addr> {
        self.client
    }

    pub fn forwarder(&self) -> Option<Ipv4Addr> {
        self.forwarder
    }

    pub fn is_resolver(&self, addr: &Ipv4Addr) -> bool {
        match self.resolver {
            ResolverMatch::Exact(own) => own.as_ref() == Some(addr),
            ResolverMatch::LabRange => {
                in_lab(addr)
                    && !in_role_range(addr, CLIENT_OCTET)
                    && !in_role_range(addr, FORWARDER_OCTET)
            }
        }
    }

    fn is_client(&self, addr: &Ipv4Addr) -> bool {
        self.client.as_ref() == Some(addr)
    }

    fn is_forwarder(&self, addr: &Ipv4Addr) -> bool {
        self.forwarder.as_ref() == Some(addr)
    }
}

/// Upstream traffic of the resolver as seen in its capture
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrafficSummary {
    pub udp_query_seen: bool,
    pub tcp_retry_seen: bool,
    pub response_seen: bool,
    pub auth_query_seen: bool,
    pub auth_response_seen: bool,
    pub auth_target_correct: bool,
    pub forwarder_query_seen: bool,
    pub unexpected_external: bool,
    pub udp_query_count: u32,
    pub tcp_query_count: u32,
    pub max_udp_response_size: u16,
}

impl TrafficSummary {
    fn observe_udp(&mut self, obs: &NetworkObservation, roles: &RoleTable) {
        if roles.is_resolver(&obs.src) && obs.dst_port == 53 && obs.dns_qr != Some(true) {
            self.udp_query_seen = true;
            self.udp_query_count += 1;

            if roles.is_forwarder(&obs.dst) {
                self.forwarder_query_seen = true;
                self.auth_target_correct = true;
            } else if roles.is_client(&obs.dst) {
                // queries towards the client are not upstream traffic
            } else if in_role_range(&obs.dst, FORWARDER_OCTET) {
                self.forwarder_query_seen = true;
            } else if in_lab(&obs.dst) {
                self.auth_query_seen = true;
            } else {
                self.unexpected_external = true;
            }
        }

        if roles.is_resolver(&obs.dst) && obs.src_port == 53 && obs.dns_qr != Some(false) {
            self.response_seen = true;
            self.max_udp_response_size = self.max_udp_response_size.max(obs.size);
            if roles.is_forwarder(&obs.src) || in_role_range(&obs.src, FORWARDER_OCTET) {
                self.auth_response_seen = true;
            }
        }
    }

    fn observe_tcp(&mut self, obs: &NetworkObservation) {
        if obs.dst_port == 53 {
            self.tcp_retry_seen = true;
            self.tcp_query_count += 1;
        }
        if obs.src_port == 53 {
            self.response_seen = true;
        }
    }
}

/// Folds `observations`, in capture order, into a summary.
pub fn summarize(observations: &[NetworkObservation], roles: &RoleTable) -> TrafficSummary {
    let mut summary = TrafficSummary::default();

    for obs in observations {
        match obs.transport {
            Transport::Udp => summary.observe_udp(obs, roles),
            Transport::Tcp => summary.observe_tcp(obs),
        }
    }

    log::debug!(
        "traffic: {} udp queries, {} tcp queries, max response {}",
        summary.udp_query_count,
        summary.tcp_query_count,
        summary.max_udp_response_size
    );

    summary
}

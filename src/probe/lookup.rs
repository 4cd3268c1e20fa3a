//! Typed lookup obligations.
//!
//! The probe program is assembled from a flat sequence of
//! [`LookupObligation`] records, one per evidence artifact the program
//! promises to produce. The obligation model carries everything needed to
//! render a step; rendering itself lives in [`crate::probe::compiler`].

use std::net::Ipv4Addr;

use crate::probe::evidence::{Channel, EvidenceId};

/// DNS record type requested by a lookup step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    A,
    Srv,
    Ptr,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::A => "A",
            RecordKind::Srv => "SRV",
            RecordKind::Ptr => "PTR",
        }
    }
}

/// A name the probe must resolve over DNS.
///
/// Names with the leading `_` service marker are queried as SRV records,
/// everything else as A records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    name: String,
    record: RecordKind,
}

impl Query {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let record = if name.starts_with('_') {
            RecordKind::Srv
        } else {
            RecordKind::A
        };
        Self { name, record }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record(&self) -> RecordKind {
        self.record
    }
}

/// Address whose reverse (pointer) resolution the probe must observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseTarget(Ipv4Addr);

impl ReverseTarget {
    pub fn new(address: Ipv4Addr) -> Self {
        Self(address)
    }

    /// Reverse-notation lookup name: octets reversed, `.in-addr.arpa.`
    /// suffix. `10.0.0.5` becomes `5.0.0.10.in-addr.arpa.`.
    pub fn reverse_name(&self) -> String {
        let [a, b, c, d] = self.0.octets();
        format!("{d}.{c}.{b}.{a}.in-addr.arpa.")
    }
}

/// Subject of a DNS lookup step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupName {
    /// Name known when the probe is compiled.
    Literal(String),
    /// The workload's own pod-address record. The probe derives the name at
    /// runtime from its own address (dash-joined octets plus `suffix`); the
    /// compiler never knows the address in advance.
    OwnPodRecord {
        /// `<namespace>.pod.<domain>` part appended after the octets.
        suffix: String,
    },
}

/// One evidence obligation: a single idempotent probe step plus the
/// evidence file it writes on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupObligation {
    /// DNS lookup over the channel recorded in `evidence`.
    Dns {
        name: LookupName,
        record: RecordKind,
        evidence: EvidenceId,
    },
    /// Static hosts-file lookup of a literal name.
    HostsFile { name: String, evidence: EvidenceId },
}

impl LookupObligation {
    pub fn evidence(&self) -> &EvidenceId {
        match self {
            LookupObligation::Dns { evidence, .. } => evidence,
            LookupObligation::HostsFile { evidence, .. } => evidence,
        }
    }

    /// Renders the obligation as one shell step that writes `marker` under
    /// `results_dir` when the lookup answers. Steps are idempotent: a
    /// marker that already exists is simply rewritten.
    pub(crate) fn shell_step(&self, results_dir: &str, marker: &str) -> String {
        let file = self.evidence();
        match self {
            LookupObligation::Dns {
                name,
                record,
                evidence,
            } => {
                let transport_flag = if evidence.channel() == Channel::Tcp {
                    "+tcp"
                } else {
                    "+notcp"
                };
                let subject = match name {
                    LookupName::Literal(literal) => literal.clone(),
                    LookupName::OwnPodRecord { .. } => "${podARec}".to_string(),
                };
                format!(
                    r#"check="$(dig {transport_flag} +noall +answer +search {subject} {record})" && test -n "$check" && echo {marker} > {results_dir}/{file};"#,
                    record = record.as_str(),
                )
            }
            LookupObligation::HostsFile { name, .. } => {
                format!(
                    r#"test -n "$(getent hosts {name})" && echo {marker} > {results_dir}/{file};"#
                )
            }
        }
    }
}

//! Probe program compilation.
//!
//! [`ProbeBuilder`] assembles the obligation sequence for one runtime
//! variant; [`ShellRenderer`] turns that sequence into the POSIX shell
//! program embedded as the querier container's entry command. [`compile`]
//! is the one-call facade the scenario layer uses.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use thiserror::Error;

use crate::probe::evidence::{Channel, EvidenceId};
use crate::probe::lookup::{LookupName, LookupObligation, Query, RecordKind, ReverseTarget};

/// Subject token for the workload's own pod-address record lookups.
pub const POD_A_RECORD_SUBJECT: &str = "PodARecord";
/// Subject token for reverse-lookup obligations.
pub const PTR_SUBJECT: &str = "PTR";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("invalid reverse lookup address {address:?}: {reason}")]
    InvalidReverseTarget { address: String, reason: String },
}

/// Parses a dotted-quad reverse-lookup address, failing fast on malformed
/// input. This is the only input validation the compiler performs.
pub fn parse_reverse_target(address: &str) -> Result<ReverseTarget, CompileError> {
    address
        .parse::<Ipv4Addr>()
        .map(ReverseTarget::new)
        .map_err(|e| CompileError::InvalidReverseTarget {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Assembles the lookup obligations for one runtime variant.
///
/// Obligations keep input order: queries (UDP then TCP each), host entries,
/// the two mandatory pod-address-record lookups, then the reverse-target
/// lookups when one is set. An obligation whose evidence ID was already
/// emitted is skipped, keeping IDs pairwise distinct for any input.
pub struct ProbeBuilder {
    prefix: String,
    namespace: String,
    domain: String,
    reverse: Option<ReverseTarget>,
    obligations: Vec<LookupObligation>,
    emitted: HashSet<String>,
}

impl ProbeBuilder {
    pub fn new(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
            domain: domain.into(),
            reverse: None,
            obligations: Vec::new(),
            emitted: HashSet::new(),
        }
    }

    fn push(&mut self, obligation: LookupObligation) {
        if self.emitted.insert(obligation.evidence().to_string()) {
            self.obligations.push(obligation);
        }
    }

    /// Adds UDP and TCP lookups of the query's name.
    pub fn query(&mut self, query: &Query) -> &mut Self {
        for channel in [Channel::Udp, Channel::Tcp] {
            self.push(LookupObligation::Dns {
                name: LookupName::Literal(query.name().to_string()),
                record: query.record(),
                evidence: EvidenceId::new(&self.prefix, channel, query.name()),
            });
        }
        self
    }

    /// Adds a static hosts-file lookup of `name`.
    pub fn host_entry(&mut self, name: &str) -> &mut Self {
        self.push(LookupObligation::HostsFile {
            name: name.to_string(),
            evidence: EvidenceId::new(&self.prefix, Channel::Hosts, name),
        });
        self
    }

    /// Requests UDP and TCP pointer lookups of the target's
    /// reverse-notation name. Emitted last by [`ProbeBuilder::finish`].
    pub fn reverse_target(&mut self, target: ReverseTarget) -> &mut Self {
        self.reverse = Some(target);
        self
    }

    /// Appends the mandatory pod-address-record obligations and any
    /// reverse-target obligations, then returns the full sequence.
    pub fn finish(mut self) -> Vec<LookupObligation> {
        let suffix = format!("{}.pod.{}", self.namespace, self.domain);
        for channel in [Channel::Udp, Channel::Tcp] {
            self.push(LookupObligation::Dns {
                name: LookupName::OwnPodRecord {
                    suffix: suffix.clone(),
                },
                record: RecordKind::A,
                evidence: EvidenceId::new(&self.prefix, channel, POD_A_RECORD_SUBJECT),
            });
        }

        if let Some(target) = self.reverse.take() {
            let reverse_name = target.reverse_name();
            for channel in [Channel::Udp, Channel::Tcp] {
                self.push(LookupObligation::Dns {
                    name: LookupName::Literal(reverse_name.clone()),
                    record: RecordKind::Ptr,
                    evidence: EvidenceId::new(&self.prefix, channel, PTR_SUBJECT),
                });
            }
        }

        self.obligations
    }
}

/// Renders an obligation sequence into the probe's shell program.
///
/// The program re-runs every step once per `interval_secs` for
/// `iterations` rounds and then exits. It never stops early on success:
/// the validator only needs to observe one marker write per artifact, and
/// a resolution path that comes up late during workload startup still gets
/// observed before the loop ends.
#[derive(Debug, Clone)]
pub struct ShellRenderer {
    pub iterations: u32,
    pub interval_secs: u64,
    pub results_dir: String,
    pub marker: String,
}

impl Default for ShellRenderer {
    fn default() -> Self {
        Self {
            iterations: 600,
            interval_secs: 1,
            results_dir: "/results".to_string(),
            marker: "OK".to_string(),
        }
    }
}

impl ShellRenderer {
    pub fn render(&self, obligations: &[LookupObligation]) -> String {
        let mut program = format!("for i in $(seq 1 {}); do ", self.iterations);
        let mut pod_record_derived = false;
        for obligation in obligations {
            if let LookupObligation::Dns {
                name: LookupName::OwnPodRecord { suffix },
                ..
            } = obligation
            {
                if !pod_record_derived {
                    program.push_str(&format!(
                        r#"podARec=$(hostname -i | awk -F. '{{print $1"-"$2"-"$3"-"$4".{suffix}"}}');"#
                    ));
                    pod_record_derived = true;
                }
            }
            program.push_str(&obligation.shell_step(&self.results_dir, &self.marker));
        }
        program.push_str(&format!("sleep {}; done", self.interval_secs));
        program
    }
}

/// Output of one compiler invocation: the probe program and the exact
/// ordered evidence IDs it promises to eventually satisfy.
#[derive(Debug, Clone)]
pub struct CompiledProbe {
    pub program: String,
    pub evidence: Vec<EvidenceId>,
}

/// Compiles the full probe for one runtime variant.
///
/// `reverse_target` is a dotted-quad address; passing a malformed one is
/// the compiler's only failure mode. Empty `queries` and `host_entries`
/// are legal: the program still carries the pod-address-record checks.
pub fn compile(
    queries: &[Query],
    host_entries: &[String],
    reverse_target: Option<&str>,
    prefix: &str,
    namespace: &str,
    domain: &str,
    renderer: &ShellRenderer,
) -> Result<CompiledProbe, CompileError> {
    let mut builder = ProbeBuilder::new(prefix, namespace, domain);
    for query in queries {
        builder.query(query);
    }
    for entry in host_entries {
        builder.host_entry(entry);
    }
    if let Some(address) = reverse_target {
        builder.reverse_target(parse_reverse_target(address)?);
    }

    let obligations = builder.finish();
    let evidence = obligations
        .iter()
        .map(|obligation| obligation.evidence().clone())
        .collect();
    Ok(CompiledProbe {
        program: renderer.render(&obligations),
        evidence,
    })
}

//! Evidence artifact identifiers.
//!
//! Every lookup the probe program performs maps to one evidence file the
//! workload writes under the shared results directory. The file's relative
//! name is the [`EvidenceId`], formatted `<prefix>_<channel>@<subject>`.
//! The validator tokenizes IDs with the same separators the compiler used,
//! so the format is load-bearing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Channel over which the probe performed a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// DNS query over UDP.
    Udp,
    /// DNS query over TCP.
    Tcp,
    /// Static hosts-file lookup, no DNS involved.
    Hosts,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Udp => "udp",
            Channel::Tcp => "tcp",
            Channel::Hosts => "hosts",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one expected probe outcome.
///
/// IDs double as the evidence file's relative name inside the results
/// directory, so they must stay plain strings with no path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvidenceId {
    prefix: String,
    channel: Channel,
    subject: String,
}

impl EvidenceId {
    pub fn new(prefix: impl Into<String>, channel: Channel, subject: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            channel,
            subject: subject.into(),
        }
    }

    /// Runtime-variant prefix this ID was compiled for.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// The query name, host entry, or one of the literal tokens
    /// `PodARecord` / `PTR`.
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}@{}", self.prefix, self.channel, self.subject)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseEvidenceIdError {
    #[error("evidence id {0:?} has no `_<channel>@` separator")]
    MissingSeparator(String),
}

impl FromStr for EvidenceId {
    type Err = ParseEvidenceIdError;

    /// Splits on the earliest `_<channel>@` separator. Subjects may
    /// themselves contain tokens like `_tcp.` (SRV names), but never a
    /// full separator, so the earliest match is always the real one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const CHANNELS: [Channel; 3] = [Channel::Udp, Channel::Tcp, Channel::Hosts];

        let mut earliest: Option<(usize, Channel)> = None;
        for channel in CHANNELS {
            let separator = format!("_{channel}@");
            if let Some(idx) = s.find(&separator) {
                if earliest.is_none_or(|(best, _)| idx < best) {
                    earliest = Some((idx, channel));
                }
            }
        }

        let (idx, channel) =
            earliest.ok_or_else(|| ParseEvidenceIdError::MissingSeparator(s.to_string()))?;
        let subject_start = idx + channel.as_str().len() + 2;
        Ok(Self {
            prefix: s[..idx].to_string(),
            channel,
            subject: s[subject_start..].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_channel_separator() {
        let id = EvidenceId::new("wheezy", Channel::Udp, "kubernetes.default");
        assert_eq!(id.to_string(), "wheezy_udp@kubernetes.default");
    }

    #[test]
    fn parses_back_into_parts() {
        let id: EvidenceId = "jessie_tcp@PodARecord".parse().expect("parse");
        assert_eq!(id.prefix(), "jessie");
        assert_eq!(id.channel(), Channel::Tcp);
        assert_eq!(id.subject(), "PodARecord");
    }

    #[test]
    fn round_trips_srv_subject_containing_transport_token() {
        let original = EvidenceId::new("wheezy", Channel::Tcp, "_http._tcp.dns-test-service");
        let parsed: EvidenceId = original.to_string().parse().expect("parse");
        assert_eq!(parsed, original);
    }

    #[test]
    fn parses_hosts_channel() {
        let id: EvidenceId = "wheezy_hosts@dns-querier-1".parse().expect("parse");
        assert_eq!(id.channel(), Channel::Hosts);
        assert_eq!(id.subject(), "dns-querier-1");
    }

    #[test]
    fn rejects_id_without_separator() {
        let err = "no-separator-here".parse::<EvidenceId>().unwrap_err();
        assert!(matches!(err, ParseEvidenceIdError::MissingSeparator(_)));
    }
}

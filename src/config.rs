//! Harness configuration.

use std::fs;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the cluster API server, e.g. `http://127.0.0.1:6443`.
    pub api_addr: String,
    /// Namespace the probe pod is created in.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Cluster DNS domain.
    #[serde(default = "default_dns_domain")]
    pub dns_domain: String,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

fn default_namespace() -> String {
    "dns-test".to_string()
}

fn default_dns_domain() -> String {
    "cluster.local".to_string()
}

/// Validator knobs. The per-call fetch deadline and the tick cadence are
/// independent: the right values depend on cluster latency, not on the
/// validation algorithm.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_fetch_deadline_secs")]
    pub fetch_deadline_secs: u64,
    #[serde(default = "default_pod_ready_timeout_secs")]
    pub pod_ready_timeout_secs: u64,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_fetch_deadline_secs() -> u64 {
    30
}

fn default_pod_ready_timeout_secs() -> u64 {
    300
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            fetch_deadline_secs: default_fetch_deadline_secs(),
            pod_ready_timeout_secs: default_pod_ready_timeout_secs(),
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn fetch_deadline(&self) -> Duration {
        Duration::from_secs(self.fetch_deadline_secs)
    }

    pub fn pod_ready_timeout(&self) -> Duration {
        Duration::from_secs(self.pod_ready_timeout_secs)
    }
}

/// Probe-program knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Rounds the in-pod retry loop runs before exiting.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Seconds between rounds.
    #[serde(default = "default_probe_interval_secs")]
    pub interval_secs: u64,
}

fn default_iterations() -> u32 {
    600
}

fn default_probe_interval_secs() -> u64 {
    1
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            iterations: default_iterations(),
            interval_secs: default_probe_interval_secs(),
        }
    }
}

pub fn load_config(path: &str) -> anyhow::Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read config from {path}"))?;
    let cfg = serde_yaml::from_str(&content).context("Failed to parse YAML config")?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg: Config = serde_yaml::from_str("api_addr: http://127.0.0.1:6443\n").expect("parse");
        assert_eq!(cfg.namespace, "dns-test");
        assert_eq!(cfg.dns_domain, "cluster.local");
        assert_eq!(cfg.poll.interval(), Duration::from_secs(5));
        assert_eq!(cfg.poll.timeout(), Duration::from_secs(600));
        assert_eq!(cfg.probe.iterations, 600);
    }

    #[test]
    fn poll_knobs_are_independent() {
        let cfg: Config = serde_yaml::from_str(
            "api_addr: http://127.0.0.1:6443\npoll:\n  interval_secs: 2\n  fetch_deadline_secs: 7\n",
        )
        .expect("parse");
        assert_eq!(cfg.poll.interval(), Duration::from_secs(2));
        assert_eq!(cfg.poll.fetch_deadline(), Duration::from_secs(7));
        assert_eq!(cfg.poll.timeout(), Duration::from_secs(600));
    }

    #[test]
    fn load_config_reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "api_addr: http://10.0.0.1:6443\nnamespace: conformance").expect("write");
        let cfg = load_config(file.path().to_str().expect("path")).expect("load");
        assert_eq!(cfg.api_addr, "http://10.0.0.1:6443");
        assert_eq!(cfg.namespace, "conformance");
    }

    #[test]
    fn load_config_errors_on_missing_file() {
        assert!(load_config("/nonexistent/rkconform.yaml").is_err());
    }
}

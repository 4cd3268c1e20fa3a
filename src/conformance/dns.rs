//! Cluster DNS conformance scenario.
//!
//! Deploys a probe pod that resolves the platform's internal service names
//! from inside the cluster and confirms every expected lookup through the
//! evidence validator. The probe pod is always deleted afterwards, pass or
//! fail.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::config::Config;
use crate::probe::compiler::{CompiledProbe, ShellRenderer, compile};
use crate::probe::evidence::EvidenceId;
use crate::probe::lookup::Query;
use crate::validate::clock::TokioClock;
use crate::validate::validator::{
    EvidenceValidator, ValidationResult, ValidatorOptions,
};
use crate::workload::client::{PodProxyFetcher, WorkloadClient};
use crate::workload::spec::{PodTask, QuerierSpec, dns_probe_pod};

/// Proxy path under which the pod's webserver exposes the results volume.
const RESULTS_PROXY_DIR: &str = "results";

/// Hostname given to the probe pod; resolvable as a static hosts entry.
pub const PROBE_POD_HOSTNAME: &str = "dns-querier-1";
/// Headless service name the probe pod is grouped under.
pub const PROBE_SERVICE_NAME: &str = "dns-test-service";

/// Querier userland variant. Each variant runs the same obligations under
/// its own evidence prefix, so a resolver quirk in one userland cannot
/// mask a failure in the other.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeVariant {
    pub prefix: &'static str,
    pub image: &'static str,
}

pub const RUNTIME_VARIANTS: [RuntimeVariant; 2] = [
    RuntimeVariant {
        prefix: "wheezy",
        image: "dnsutils",
    },
    RuntimeVariant {
        prefix: "jessie",
        image: "jessie-dnsutils",
    },
];

fn internal_service_names(domain: &str) -> Vec<String> {
    vec![
        "kubernetes.default".to_string(),
        "kubernetes.default.svc".to_string(),
        format!("kubernetes.default.svc.{domain}"),
    ]
}

/// Runs the internal-service resolution suite: the API service's short,
/// partially-qualified, and fully-qualified names over DNS plus the probe
/// pod's own names via static host entries.
pub async fn run_cluster_suite<C: WorkloadClient + 'static>(
    client: Arc<C>,
    cfg: &Config,
) -> Result<()> {
    let queries: Vec<Query> = internal_service_names(&cfg.dns_domain)
        .into_iter()
        .map(Query::new)
        .collect();
    let host_fqdn = format!(
        "{PROBE_POD_HOSTNAME}.{PROBE_SERVICE_NAME}.{}.svc.{}",
        cfg.namespace, cfg.dns_domain
    );
    let host_entries = vec![host_fqdn, PROBE_POD_HOSTNAME.to_string()];

    let renderer = ShellRenderer {
        iterations: cfg.probe.iterations,
        interval_secs: cfg.probe.interval_secs,
        ..ShellRenderer::default()
    };

    let mut queriers = Vec::new();
    let mut expected = Vec::new();
    for variant in &RUNTIME_VARIANTS {
        let CompiledProbe { program, evidence } = compile(
            &queries,
            &host_entries,
            None,
            variant.prefix,
            &cfg.namespace,
            &cfg.dns_domain,
            &renderer,
        )?;
        info!(prefix = variant.prefix, program = %program, "compiled probe program");
        queriers.push(QuerierSpec {
            name: format!("{}-querier", variant.prefix),
            image: variant.image.to_string(),
            program,
        });
        expected.extend(evidence);
    }

    let pod = dns_probe_pod(&cfg.namespace, &queriers, PROBE_POD_HOSTNAME, PROBE_SERVICE_NAME);
    validate_probe_pod(client, cfg, pod, expected).await
}

/// Deploys the probe pod, waits for it to run, and polls its evidence
/// files until all expected IDs are confirmed. Deletes the pod before
/// returning, whatever the outcome.
pub async fn validate_probe_pod<C: WorkloadClient + 'static>(
    client: Arc<C>,
    cfg: &Config,
    pod: PodTask,
    expected: Vec<EvidenceId>,
) -> Result<()> {
    let namespace = pod.metadata.namespace.clone();
    let pod_name = pod.metadata.name.clone();

    client
        .create_pod(&pod)
        .await
        .with_context(|| format!("failed to create probe pod {namespace}/{pod_name}"))?;

    let outcome = watch_evidence(client.clone(), cfg, &namespace, &pod_name, &expected).await;

    if let Err(e) = client.delete_pod(&namespace, &pod_name).await {
        warn!(pod = %pod_name, namespace = %namespace, error = %e, "failed to delete probe pod");
    }

    outcome
}

async fn watch_evidence<C: WorkloadClient + 'static>(
    client: Arc<C>,
    cfg: &Config,
    namespace: &str,
    pod_name: &str,
    expected: &[EvidenceId],
) -> Result<()> {
    client
        .wait_pod_running(namespace, pod_name, cfg.poll.pod_ready_timeout())
        .await?;

    let fetcher = PodProxyFetcher::new(client, namespace, pod_name, RESULTS_PROXY_DIR);
    let validator = EvidenceValidator::new(
        fetcher,
        TokioClock,
        ValidatorOptions {
            poll_interval: cfg.poll.interval(),
            timeout: cfg.poll.timeout(),
            expected_content: None,
        },
    );

    match validator.validate(expected).await {
        ValidationResult::Complete => {
            info!(pod = %pod_name, namespace = %namespace, "DNS probes succeeded");
            Ok(())
        }
        ValidationResult::TimedOut { residual } => {
            let detail: Vec<String> = residual
                .iter()
                .map(|entry| format!("{} ({:?})", entry.id, entry.cause))
                .collect();
            bail!(
                "timed out waiting for DNS evidence from {namespace}/{pod_name}; unconfirmed: {}",
                detail.join(", ")
            )
        }
    }
}

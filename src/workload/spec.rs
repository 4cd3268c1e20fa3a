//! Probe workload specification.
//!
//! A minimal pod model, deep enough to describe the DNS probe pod: a
//! webserver exposing the shared results directory plus one querier
//! container per runtime variant, all mounting the same emptyDir volume.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the shared results volume.
pub const RESULTS_VOLUME: &str = "results";
/// Mount path of the results volume in every container. The probe
/// compiler's default results directory must match it.
pub const RESULTS_MOUNT_PATH: &str = "/results";

const WEBSERVER_IMAGE: &str = "test-webserver";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    "default".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PodTask {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
    #[serde(default)]
    pub status: PodStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PodSpec {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub subdomain: Option<String>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub ports: Vec<Port>,
    #[serde(rename = "volumeMounts", default)]
    pub volume_mounts: Vec<VolumeMount>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Port {
    #[serde(rename = "containerPort")]
    pub container_port: i32,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Volume {
    pub name: String,
    #[serde(rename = "emptyDir", default)]
    pub empty_dir: Option<EmptyDir>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EmptyDir {}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VolumeMount {
    pub name: String,
    #[serde(rename = "mountPath")]
    pub mount_path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PodStatus {
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(rename = "podIP", default)]
    pub pod_ip: Option<String>,
}

/// One querier container to embed in the probe pod.
#[derive(Debug, Clone)]
pub struct QuerierSpec {
    pub name: String,
    pub image: String,
    /// Probe program executed via `sh -c`.
    pub program: String,
}

fn results_mount() -> VolumeMount {
    VolumeMount {
        name: RESULTS_VOLUME.to_string(),
        mount_path: RESULTS_MOUNT_PATH.to_string(),
    }
}

/// Builds the DNS probe pod: one webserver serving the results volume over
/// port 80 plus the given querier containers. Hostname and subdomain are
/// set so the pod's own FQDN resolves through the cluster's service
/// records.
pub fn dns_probe_pod(
    namespace: &str,
    queriers: &[QuerierSpec],
    host_name: &str,
    service_name: &str,
) -> PodTask {
    let mut containers = vec![ContainerSpec {
        name: "webserver".to_string(),
        image: WEBSERVER_IMAGE.to_string(),
        command: Vec::new(),
        ports: vec![Port {
            container_port: 80,
            name: Some("http".to_string()),
        }],
        volume_mounts: vec![results_mount()],
    }];
    for querier in queriers {
        containers.push(ContainerSpec {
            name: querier.name.clone(),
            image: querier.image.clone(),
            command: vec![
                "sh".to_string(),
                "-c".to_string(),
                querier.program.clone(),
            ],
            ports: Vec::new(),
            volume_mounts: vec![results_mount()],
        });
    }

    PodTask {
        api_version: "v1".to_string(),
        kind: "Pod".to_string(),
        metadata: ObjectMeta {
            name: format!("dns-probe-{}", Uuid::new_v4()),
            namespace: namespace.to_string(),
        },
        spec: PodSpec {
            hostname: Some(host_name.to_string()),
            subdomain: Some(service_name.to_string()),
            volumes: vec![Volume {
                name: RESULTS_VOLUME.to_string(),
                empty_dir: Some(EmptyDir::default()),
            }],
            containers,
        },
        status: PodStatus::default(),
    }
}

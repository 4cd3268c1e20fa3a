use std::collections::HashSet;

use rkconform::probe::compiler::{CompiledProbe, ShellRenderer, compile};
use rkconform::probe::evidence::EvidenceId;
use rkconform::probe::lookup::Query;

fn compile_default(
    names: &[&str],
    host_entries: &[&str],
    reverse: Option<&str>,
) -> CompiledProbe {
    let queries: Vec<Query> = names.iter().map(|name| Query::new(*name)).collect();
    let host_entries: Vec<String> = host_entries.iter().map(|s| s.to_string()).collect();
    compile(
        &queries,
        &host_entries,
        reverse,
        "wheezy",
        "dns-test",
        "cluster.local",
        &ShellRenderer::default(),
    )
    .expect("compile")
}

fn id_strings(compiled: &CompiledProbe) -> Vec<String> {
    compiled.evidence.iter().map(|id| id.to_string()).collect()
}

#[test]
fn evidence_count_is_a_pure_function_of_input_sizes() {
    let compiled = compile_default(
        &["kubernetes.default", "kubernetes.default.svc", "_http._tcp.dns-test-service"],
        &["dns-querier-1", "dns-querier-1.dns-test-service.dns-test.svc.cluster.local"],
        Some("10.0.0.5"),
    );
    // 2 per query + 1 per host entry + 2 pod A record + 2 PTR
    assert_eq!(compiled.evidence.len(), 3 * 2 + 2 + 2 + 2);
}

#[test]
fn single_query_yields_exactly_four_ids_in_order() {
    let compiled = compile_default(&["kubernetes.default"], &[], None);
    assert_eq!(
        id_strings(&compiled),
        vec![
            "wheezy_udp@kubernetes.default",
            "wheezy_tcp@kubernetes.default",
            "wheezy_udp@PodARecord",
            "wheezy_tcp@PodARecord",
        ]
    );
}

#[test]
fn reverse_target_adds_ptr_ids_and_reversed_subject() {
    let compiled = compile_default(&[], &[], Some("10.0.0.5"));
    let ids = id_strings(&compiled);
    assert!(ids.contains(&"wheezy_udp@PTR".to_string()));
    assert!(ids.contains(&"wheezy_tcp@PTR".to_string()));
    assert!(compiled.program.contains("5.0.0.10.in-addr.arpa. PTR"));
}

#[test]
fn every_emitted_id_round_trips_through_parsing() {
    let compiled = compile_default(
        &["kubernetes.default", "_http._tcp.dns-test-service"],
        &["dns-querier-1"],
        Some("10.0.0.5"),
    );
    for id in &compiled.evidence {
        let parsed: EvidenceId = id.to_string().parse().expect("parse");
        assert_eq!(&parsed, id);
    }
}

#[test]
fn ids_are_pairwise_distinct_even_for_colliding_inputs() {
    let compiled = compile_default(
        &["kubernetes.default", "kubernetes.default", "dns-querier-1"],
        &["dns-querier-1", "dns-querier-1"],
        None,
    );
    let unique: HashSet<String> = id_strings(&compiled).into_iter().collect();
    assert_eq!(unique.len(), compiled.evidence.len());
}

#[test]
fn service_marker_queries_compile_to_srv_lookups() {
    let compiled = compile_default(&["_http._tcp.dns-test-service"], &[], None);
    assert!(compiled
        .program
        .contains("dig +notcp +noall +answer +search _http._tcp.dns-test-service SRV"));
    assert!(compiled
        .program
        .contains("dig +tcp +noall +answer +search _http._tcp.dns-test-service SRV"));
}

#[test]
fn host_entries_compile_to_getent_steps() {
    let compiled = compile_default(&[], &["dns-querier-1"], None);
    assert!(compiled.program.contains(r#"test -n "$(getent hosts dns-querier-1)""#));
    assert!(id_strings(&compiled).contains(&"wheezy_hosts@dns-querier-1".to_string()));
}

#[test]
fn program_repeats_obligations_in_a_bounded_loop() {
    let compiled = compile_default(&["kubernetes.default"], &[], None);
    assert!(compiled.program.starts_with("for i in $(seq 1 600); do "));
    assert!(compiled.program.ends_with("sleep 1; done"));
}

#[test]
fn pod_record_name_is_derived_inside_the_program() {
    let compiled = compile_default(&[], &[], None);
    assert!(compiled
        .program
        .contains(r#"podARec=$(hostname -i | awk -F. '{print $1"-"$2"-"$3"-"$4".dns-test.pod.cluster.local"}');"#));
    assert!(compiled.program.contains("${podARec} A"));
}

#[test]
fn prefix_flows_into_every_id() {
    let queries = vec![Query::new("kubernetes.default")];
    let compiled = compile(
        &queries,
        &[],
        None,
        "jessie",
        "dns-test",
        "cluster.local",
        &ShellRenderer::default(),
    )
    .expect("compile");
    assert!(compiled.evidence.iter().all(|id| id.prefix() == "jessie"));
}

use std::sync::Arc;

use clap::Parser;
use tracing::error;

use rkconform::cli::{Cli, Commands};
use rkconform::config::load_config;
use rkconform::conformance::dns::run_cluster_suite;
use rkconform::probe::compiler::{ShellRenderer, compile};
use rkconform::probe::lookup::Query;
use rkconform::workload::client::HttpWorkloadClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let cli = Cli::parse();
    run(cli).await.inspect_err(|err| error!("Failed to run: {err}"))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Check { config } => {
            let cfg = load_config(config.to_str().unwrap())?;
            let client = Arc::new(HttpWorkloadClient::new(
                cfg.api_addr.clone(),
                cfg.poll.fetch_deadline(),
            )?);
            run_cluster_suite(client, &cfg).await
        }
        Commands::Render {
            names,
            host_entries,
            reverse,
            prefix,
            namespace,
            domain,
        } => {
            let queries: Vec<Query> = names.into_iter().map(Query::new).collect();
            let compiled = compile(
                &queries,
                &host_entries,
                reverse.as_deref(),
                &prefix,
                &namespace,
                &domain,
                &ShellRenderer::default(),
            )?;
            println!("{}", compiled.program);
            for id in &compiled.evidence {
                println!("{id}");
            }
            Ok(())
        }
    }
}

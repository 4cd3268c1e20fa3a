use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rkconform", version, about = "DNS conformance harness for rk8s clusters")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the cluster DNS conformance suite with a config file
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Compile a probe program and print it with its evidence IDs
    Render {
        /// Name to resolve over DNS; repeatable
        #[arg(long = "name")]
        names: Vec<String>,
        /// Static host entry expected to resolve without DNS; repeatable
        #[arg(long = "host-entry")]
        host_entries: Vec<String>,
        /// Dotted-quad address to verify via reverse lookup
        #[arg(long)]
        reverse: Option<String>,
        #[arg(long, default_value = "probe")]
        prefix: String,
        #[arg(long, default_value = "default")]
        namespace: String,
        #[arg(long, default_value = "cluster.local")]
        domain: String,
    },
}

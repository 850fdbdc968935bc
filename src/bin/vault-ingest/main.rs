use clap::Parser;
use miette::{IntoDiagnostic, Result};

mod check_config;
mod common;
mod run;

#[derive(Parser)]
#[clap(name = "vault-ingest")]
#[clap(bin_name = "vault-ingest")]
#[clap(author, version, about, long_about = None)]
enum VaultIngest {
    /// Attach to the shared-memory region and stream pool-touching rows to the sink.
    Run(run::Args),
    /// Validate configuration, the hot-address seed file, and shared-memory attach, then exit.
    CheckConfig(check_config::Args),
}

fn main() -> Result<()> {
    let args = VaultIngest::parse();

    match args {
        VaultIngest::Run(x) => run::run(&x).into_diagnostic()?,
        VaultIngest::CheckConfig(x) => check_config::run(&x).into_diagnostic()?,
    };

    Ok(())
}

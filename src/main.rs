use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pg_decode_check::{cases, ConnectionConfig, Runner};

/// Checks how a Postgres-compatible server encodes arrays, records and
/// special numeric values in binary and text results.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionConfig,

    /// Run only the named check; repeat to run several
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// Also fetch every check in the other format and compare both decodings
    #[arg(long)]
    cross_check: bool,

    /// Print the checks and exit without connecting
    #[arg(long)]
    list: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    let cli = Cli::parse();
    let cases = cases::select(cases::extended_mode_cases(), &cli.only)?;

    if cli.list {
        for case in &cases {
            println!("{:<20} {:<6} {}", case.name, case.mode, case.sql);
        }
        return Ok(());
    }

    let mut runner = Runner::connect(&cli.connection)
        .await
        .with_context(|| format!("connecting to {}", cli.connection.describe()))?
        .cross_check(cli.cross_check);

    let summary = runner.run(&cases).await?;
    runner.close().await?;

    if cli.cross_check {
        println!(
            "{} checks passed, {} cross-checked",
            summary.passed, summary.cross_checked
        );
    } else {
        println!("{} checks passed", summary.passed);
    }
    Ok(())
}

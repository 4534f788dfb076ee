mod cli;
mod error;
mod output;
mod resources;

use crate::cli::{Cli, setup_logging};
use crate::error::{ErrorKind, Result};
use crate::output::Printer;
use clap::Parser;
use exn::ResultExt;
use futures::StreamExt;
use snuffle_walk::{CancellationToken, RunSummary, enumerate};
use std::io::BufWriter;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = snuffle_config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    config.validate().or_raise(|| ErrorKind::Config)?;

    let rules = config.rules.build();
    let options = config.walk_options();
    let resources = resources::build(&config.resources, &cli.shares, &cli.buckets).await;
    if resources.is_empty() {
        tracing::warn!("Nothing to walk: configure resources, or pass --share or --bucket");
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted; stopping walks");
                cancel.cancel();
            }
        }
    });

    let mut printer = Printer::new(cli.format, BufWriter::new(std::io::stdout()));
    let mut summary = RunSummary::default();
    let mut reports = std::pin::pin!(enumerate(&resources, &rules, &options, &cancel));
    while let Some(report) = reports.next().await {
        summary.record(&report);
        printer.report(&report).or_raise(|| ErrorKind::Output)?;
    }
    printer.summary(&summary).or_raise(|| ErrorKind::Output)?;
    Ok(())
}

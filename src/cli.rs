use crate::output::Format;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "snuffle",
    version = env!("CARGO_PKG_VERSION"),
    about = "Find files that probably hold credentials across shares and object buckets",
    long_about = "Walks every share and bucket of the configured resources (plus any directories given on \
                  the command line) and reports paths whose name, extension or location suggests secrets. \
                  Nothing is ever read beyond listings."
)]
pub struct Cli {
    /// Use a specific configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "SNUFFLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress log output; findings are still printed
    #[arg(short, long)]
    pub quiet: bool,

    /// Containers walked at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Deepest directory nesting to descend into
    #[arg(long)]
    pub max_depth: Option<usize>,

    #[arg(long, value_enum, default_value_t = Format::Text, env = "SNUFFLE_FORMAT")]
    pub format: Format,

    /// Walk a local directory as a share (can be repeated)
    #[arg(long = "share", value_name = "DIR")]
    pub shares: Vec<PathBuf>,

    /// Walk a local directory as a bucket, keyed by relative path (can be repeated)
    #[arg(long = "bucket", value_name = "DIR")]
    pub buckets: Vec<PathBuf>,
}

/// Logs go to stderr so they never mix with findings on stdout.
pub fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => tracing_subscriber::EnvFilter::new("warn"),
        1 => tracing_subscriber::EnvFilter::new("info,aws=warn,hyper=warn"),
        2 => tracing_subscriber::EnvFilter::new("debug,aws=info,hyper=info"),
        _ => tracing_subscriber::EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

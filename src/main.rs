//! Command-line interface for protofuzz
//!
//! # Usage Examples
//!
//! ```bash
//! # Ten instances of test.v1.All in text format
//! protofuzz generate --proto protos/test/v1/test.proto --message test.v1.All --count 10
//!
//! # Reproduce a fuzzer input as binary (base64) and check invariants
//! protofuzz generate --proto protos/test/v1/test.proto --message All \
//!   --input corpus/entry --format base64 --verify
//!
//! # Custom generator settings
//! protofuzz generate --proto api.proto --message Request --config protofuzz.yaml
//!
//! # Message types in a schema
//! protofuzz list --proto protos/test/v1/test.proto
//! ```
//!
//! Set `RUST_LOG=debug` for per-message logging.

use clap::Parser;
use protofuzz::{run_generate, run_list, Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Generate(args) => run_generate(&args, &mut out),
        Commands::List { schema } => run_list(&schema, &mut out),
    }
}

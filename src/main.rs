//! arbiter0 CLI
//!
//! Usage:
//!   arbiter0 --text "query here"            # One-shot checkpoint
//!   arbiter0 --text "query" --draft "ans"   # Checkpoint a candidate answer
//!   arbiter0 --serve                        # HTTP API server
//!   arbiter0 --stdio                        # MCP over stdin/stdout
//!   arbiter0 --text "query" --json          # JSON output

use clap::Parser;
use colored::Colorize;
use std::sync::Arc;

use arbiter0::core::{run_server, Config, Pipeline};
use arbiter0::core::mcp;
use arbiter0::types::Verdict;
use arbiter0::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "arbiter0",
    version = VERSION,
    about = "Constitutional governance filter - verdict pipeline with a sealed audit ledger",
    long_about = "arbiter0 screens queries (and candidate answers) through thirteen\n\
                  constitutional floors and returns one of four verdicts:\n\n  \
                  APPROVE      - all floors passed\n  \
                  CONDITIONAL  - soft floor failed, proceed with care\n  \
                  REJECT       - hard floor failed or truth gate missed\n  \
                  ESCALATE     - human review required\n\n\
                  Every decision is sealed into an append-only, hash-chained\n\
                  ledger with a Merkle root binding session, verdict, query\n\
                  and timestamp.\n\n\
                  Modes:\n  \
                  --text   One-shot checkpoint from the command line\n  \
                  --serve  HTTP API server (PORT, default 8000)\n  \
                  --stdio  MCP transport on stdin/stdout (default)"
)]
struct Args {
    /// Query to checkpoint (one-shot mode)
    #[arg(short, long)]
    text: Option<String>,

    /// Candidate answer reviewed alongside the query
    #[arg(long)]
    draft: Option<String>,

    /// Authority token (GUEST when absent)
    #[arg(long)]
    authority_token: Option<String>,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Run as MCP server on stdin/stdout
    #[arg(long)]
    stdio: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            std::process::exit(2);
        }
    };
    let pipeline = match Pipeline::new(config) {
        Ok(pipeline) => Arc::new(pipeline),
        Err(e) => {
            eprintln!("ledger error: {}", e);
            std::process::exit(2);
        }
    };

    if let Some(ref text) = args.text {
        run_single(&pipeline, text, &args).await;
    } else if args.serve {
        if let Err(e) = run_server(pipeline).await {
            eprintln!("server error: {}", e);
            std::process::exit(1);
        }
    } else {
        // MCP stdio is the default mode
        if let Err(e) = mcp::run_stdio(pipeline).await {
            eprintln!("stdio transport error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so stdout stays clean for MCP frames and CLI output
fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arbiter0=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// One-shot checkpoint from the command line
async fn run_single(pipeline: &Pipeline, text: &str, args: &Args) {
    let outcome = pipeline
        .checkpoint(
            text,
            args.draft.as_deref(),
            None,
            args.authority_token.as_deref(),
        )
        .await;

    match outcome {
        Ok(outcome) => {
            if args.json {
                match serde_json::to_string_pretty(&outcome) {
                    Ok(body) => println!("{}", body),
                    Err(e) => {
                        eprintln!("serialization error: {}", e);
                        std::process::exit(1);
                    }
                }
                return;
            }

            println!("{}  [{} | {}]", paint(outcome.verdict), outcome.lane, outcome.stakes);
            println!("  {}", outcome.summary);
            println!("  p_truth: {:.4} | cooling: {}", outcome.p_truth, outcome.cooling_tier);
            let failed: Vec<&str> = outcome
                .floors
                .values()
                .filter(|s| !s.passed)
                .map(|s| s.floor.label())
                .collect();
            if !failed.is_empty() {
                println!("  failed floors: {}", failed.join(", "));
            }
            println!("  merkle root: {}", outcome.merkle_root);
            println!("  ledger hash: {}", outcome.ledger_hash);
        }
        Err(refusal) => {
            if args.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&refusal).unwrap_or_else(|_| "{}".to_string())
                );
                return;
            }
            println!("{}  {}", paint(refusal.verdict), refusal.reason.description());
            println!("  {}", refusal.detail);
        }
    }
}

fn paint(verdict: Verdict) -> colored::ColoredString {
    let name = verdict.to_string();
    match verdict {
        Verdict::Approve => name.green().bold(),
        Verdict::Conditional => name.yellow().bold(),
        Verdict::Reject => name.red().bold(),
        Verdict::Escalate => name.magenta().bold(),
    }
}

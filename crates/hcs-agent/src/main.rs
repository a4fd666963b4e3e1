//! The `hcs-agent` command: a terminal chat with the HCS agent.

#[macro_use]
extern crate tracing;

mod cli;

use std::process::ExitCode;

use clap::Parser;
use hcs_agent::SessionBuilder;
use hcs_agent::ledger::HederaLedger;
use hcs_agent::llm::LlmClient;
use hcs_agent::prompt::read_prompt;
use tokio::io::{self, BufReader};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::Args;

/// Parses `RUST_LOG`-style directives, showing info and above when none
/// are given.
fn log_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            &std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default(),
        ))
        .with_writer(std::io::stderr)
        .init();

    // A missing .env file is fine, settings may come from the environment.
    if let Err(err) = dotenvy::dotenv() {
        debug!("no .env loaded: {err}");
    }

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let session = match build_session(&args) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("An error occurred: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut stdin = BufReader::new(io::stdin());
    loop {
        println!("You:\n");
        let prompt = match read_prompt(&mut stdin).await {
            Ok(Some(prompt)) => prompt,
            Ok(None) => break,
            Err(err) => {
                error!("error reading input: {err}");
                return ExitCode::FAILURE;
            }
        };
        if prompt.is_empty() {
            continue;
        }
        debug!("user prompt: {prompt}");

        println!("Agent:\n");
        match session.send_message(&prompt).await {
            Ok(reply) => println!("{reply}\n"),
            Err(err) => eprintln!("An error occurred: {err}\n"),
        }
    }

    ExitCode::SUCCESS
}

fn build_session(
    args: &Args,
) -> Result<hcs_agent::Session, hcs_agent::config::ConfigError> {
    let llm_client = LlmClient::from_config(&args.llm_config())?;
    let ledger = HederaLedger::new(&args.hedera_config()?)?;

    let mut builder = SessionBuilder::with_llm_client(llm_client)
        .with_thread_id(&args.thread_id);
    if let Some(system_prompt) = &args.system_prompt {
        builder = builder.with_system_prompt(system_prompt);
    }
    Ok(builder.build(ledger))
}

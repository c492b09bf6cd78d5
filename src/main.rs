use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use docqa_core::bootstrap::{
    build_session, create_provider, health_check, load_config_from_env, resolve_config_path,
};
use docqa_core::{Answer, Session};
use docqa_llm::LlmProvider;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "docqa", version, about = "Ask questions about your documents", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, cache and index files, then print their tag
    Index {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Answer a single question
    Ask {
        /// Files to index before answering
        #[arg(required_unless_present = "tag")]
        files: Vec<PathBuf>,
        /// Reuse the index persisted under this tag
        #[arg(long, conflicts_with = "files")]
        tag: Option<String>,
        #[arg(short, long)]
        question: String,
    },
    /// Index files, then answer questions read from stdin
    Chat {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_subscriber();

    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config_from_env(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), backend = %config.backend(), "configuration loaded");

    let provider = create_provider(&config)?;
    health_check(&provider).await;
    let mut session = build_session(&config, provider)?;

    match cli.command {
        Command::Index { files } => {
            let report = session.ingest(&files).await?;
            println!(
                "Indexed {} document(s) into {} chunk(s){}",
                report.documents,
                report.chunks,
                if report.from_cache { " (cached)" } else { "" }
            );
            println!("{}", report.tag);
        }
        Command::Ask {
            files,
            tag,
            question,
        } => {
            if let Some(tag) = tag {
                session
                    .open(&tag)
                    .await
                    .with_context(|| format!("no usable index for tag {tag}"))?;
            } else {
                session.ingest(&files).await?;
            }
            let answer = session.ask(&question).await?;
            print_answer(&answer);
        }
        Command::Chat { files } => {
            let report = session.ingest(&files).await?;
            println!(
                "Ready: {} document(s), {} chunk(s). Type a question, /load <files>, /clear or /quit.",
                report.documents, report.chunks
            );
            chat_loop(&mut session).await?;
        }
    }

    Ok(())
}

async fn chat_loop<P: LlmProvider>(session: &mut Session<P, P>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => {}
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear().await;
                println!("Session cleared. Use /load <files> to start again.");
            }
            _ if line.starts_with("/load") => {
                let files: Vec<PathBuf> = line
                    .trim_start_matches("/load")
                    .split_whitespace()
                    .map(PathBuf::from)
                    .collect();
                match session.ingest(&files).await {
                    Ok(report) => println!(
                        "Indexed {} document(s) into {} chunk(s).",
                        report.documents, report.chunks
                    ),
                    Err(e) => eprintln!("error ({}): {e}", e.kind()),
                }
            }
            question => match session.ask(question).await {
                Ok(answer) => print_answer(&answer),
                Err(e) => eprintln!("error ({}): {e}", e.kind()),
            },
        }
    }
    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    if answer.sources.is_empty() {
        return;
    }
    println!("\nSources:");
    for (i, chunk) in answer.sources.iter().enumerate() {
        println!(
            "{}. {} — page {}",
            i + 1,
            chunk.metadata.source_file,
            chunk.metadata.page
        );
    }
}

fn init_subscriber() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

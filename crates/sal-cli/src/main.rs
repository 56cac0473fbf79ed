mod server;
mod source;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rmcp::{ServiceExt, transport::stdio};
use sal_core::{Session, SimilarityMatch, tokenize};
use sal_store::Config;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "sal", about = "Perturbation-based token salience over word embeddings")]
struct Cli {
    /// Embedding source: file path or http(s) URL
    #[arg(long, global = true)]
    embeddings: Option<String>,

    /// Config file (defaults to $SAL_CONFIG, then ./sal.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio transport
    Serve,

    /// Split text into tokens
    Tokenize {
        /// Text to tokenize
        text: String,
    },

    /// Attention-and-Synthesis: leave-one-out token impact
    #[command(name = "as")]
    As {
        /// Text to analyze
        text: String,

        /// Minimum number of important tokens to select
        #[arg(long)]
        min_important: Option<usize>,
    },

    /// Enhanced Attention-and-Synthesis: AS plus pairwise influence gradients
    Eas {
        /// Text to analyze
        text: String,
    },

    /// Cosine similarity of every token to a target token
    Similar {
        /// Text to analyze
        text: String,

        /// Target token
        #[arg(long)]
        target: String,
    },

    /// Windowed n-gram perturbation around a target token
    Ngram {
        /// Text to analyze
        text: String,

        /// Target token
        #[arg(long)]
        target: String,

        /// Largest window size
        #[arg(long)]
        max_n: Option<usize>,
    },

    /// Influence of every token on every other
    Pairwise {
        /// Text to analyze
        text: String,

        /// Only print the strongest N pairs
        #[arg(long)]
        top: Option<usize>,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::discover(cli.config.as_deref()).context("failed to load config")?;

    // Tokenizing needs no embeddings; skip the load.
    let session = match &cli.command {
        Commands::Tokenize { .. } => Session::default(),
        _ => open_session(&cli, &config).await,
    };

    match &cli.command {
        Commands::Serve => cmd_serve(session, config).await,
        Commands::Tokenize { text } => cmd_tokenize(&cli, text),
        Commands::As {
            text,
            min_important,
        } => cmd_as(
            &cli,
            session,
            text,
            min_important.unwrap_or(config.analysis.min_important_tokens),
        ),
        Commands::Eas { text } => cmd_eas(&cli, session, text),
        Commands::Similar { text, target } => cmd_similar(&cli, &session, text, target),
        Commands::Ngram {
            text,
            target,
            max_n,
        } => cmd_ngram(
            &cli,
            &session,
            text,
            target,
            max_n.unwrap_or(config.analysis.max_ngram_size),
        ),
        Commands::Pairwise { text, top } => cmd_pairwise(&cli, &session, text, *top),
    }
}

async fn open_session(cli: &Cli, config: &Config) -> Session {
    let source = config.embeddings_source(cli.embeddings.as_deref());
    let table = source::load_or_empty(source.as_deref(), config.load_options()).await;
    Session::new(table)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize result")?;
    println!("{json}");
    Ok(())
}

async fn cmd_serve(session: Session, config: Config) -> Result<()> {
    tracing::info!(
        entries = session.table().len(),
        "starting MCP server on stdio"
    );
    let server = server::SalServer::new(session, config);
    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    tracing::info!("MCP server stopped");
    Ok(())
}

fn cmd_tokenize(cli: &Cli, text: &str) -> Result<()> {
    let tokens = tokenize(text);
    if cli.json {
        return print_json(&tokens);
    }
    for token in tokens {
        println!("{token}");
    }
    Ok(())
}

fn cmd_as(cli: &Cli, mut session: Session, text: &str, min_important: usize) -> Result<()> {
    let report = session
        .run_as(text, min_important)
        .context("AS analysis failed")?;
    if cli.json {
        return print_json(&report);
    }

    println!("{}", report.summary);
    println!();
    print!("{}", report.relations_analysis);
    if !report.relations_analysis.ends_with('\n') {
        println!();
    }
    if cli.verbose {
        eprintln!(
            "--- tokens={}, scored={}, important={}, {:.2}ms ---",
            report.token_count,
            report.token_impacts.len(),
            report.important_tokens.len(),
            report.execution_time_ms
        );
    }
    Ok(())
}

fn cmd_eas(cli: &Cli, mut session: Session, text: &str) -> Result<()> {
    let report = session.run_eas(text).context("EAS analysis failed")?;
    if cli.json {
        return print_json(&report);
    }

    println!("{}", report.summary);
    if report.final_weights.is_empty() {
        return Ok(());
    }
    println!();
    println!("attention: {}", report.attention_tokens.join(" "));
    for weight in &report.final_weights {
        println!("{:<20} {:.4}", weight.token, weight.weight);
    }
    if cli.verbose {
        eprintln!(
            "--- attention={}, weights={}, {:.2}ms ---",
            report.attention_tokens.len(),
            report.final_weights.len(),
            report.execution_time_ms
        );
    }
    Ok(())
}

fn cmd_similar(cli: &Cli, session: &Session, text: &str, target: &str) -> Result<()> {
    let results = session.target_token_importance(text, target);
    if cli.json {
        return print_json(&results);
    }

    if !session.table().contains(target) {
        println!("(no embedding for target '{target}')");
        return Ok(());
    }
    for r in &results {
        match r.matched {
            SimilarityMatch::Scored { similarity } => {
                println!("{} (position {}): {similarity:.4}", r.token, r.original_index)
            }
            SimilarityMatch::NoEmbedding => {
                println!("{} (position {}): no embedding", r.token, r.original_index)
            }
        }
    }
    Ok(())
}

fn cmd_ngram(cli: &Cli, session: &Session, text: &str, target: &str, max_n: usize) -> Result<()> {
    let result = session
        .contiguous_ngram_importance(text, target, max_n)
        .context("n-gram analysis failed")?;
    if cli.json {
        return print_json(&result);
    }

    for g in &result.n_gram_impacts {
        println!(
            "n={} [{}] @{}: impact {:.4}",
            g.n, g.n_gram, g.target_token_index, g.impact
        );
    }
    println!("total importance: {:.4}", result.total_importance);
    Ok(())
}

fn cmd_pairwise(cli: &Cli, session: &Session, text: &str, top: Option<usize>) -> Result<()> {
    let mut pairs = session
        .pairwise_importance(text)
        .context("pairwise analysis failed")?;
    if let Some(top) = top {
        pairs.truncate(top);
    }
    if cli.json {
        return print_json(&pairs);
    }

    if pairs.is_empty() {
        println!("(no scorable token pairs)");
    }
    for p in &pairs {
        println!("{} -> {}: {:.4}", p.influencer, p.influenced, p.influence);
    }
    Ok(())
}

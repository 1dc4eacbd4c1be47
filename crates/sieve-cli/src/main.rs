//! sieve CLI
//!
//! A thin wrapper around the sieve library for inspecting and running queries.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use sieve::{
    EntityResolver, EntityVocabulary, MemoryStore, TokenKind, compile, dump, rank, search,
    tokenize,
};

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Entity search query language")]
#[command(after_help = "\
EXAMPLES:
    # Show how a query is tokenized
    sieve tokens '/note/tag=rust -and \"parser notes\"'

    # Print the canonical form of a query
    sieve fmt 'a -and (b -or c)'

    # Run a query against a JSON entity store
    sieve search --store store.json '$some(parser %linkTo(id=ada type=person))'

STORE FORMAT:
    {\"entities\": [{\"id\": \"n1\", \"type\": \"note\", \"text\": \"...\", \"tags\": {\"/tag\": \"rust\"}}],
     \"links\": [{\"from\": {\"type\": \"person\", \"id\": \"ada\"}, \"to\": {\"type\": \"note\", \"id\": \"n1\"}}]}
")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tokens of a query with their positions
    Tokens { query: String },

    /// Check that a query compiles with the default vocabulary
    Check { query: String },

    /// Print the canonical form of a query
    Fmt { query: String },

    /// Run a query against a JSON entity store
    Search {
        /// Path to the JSON store file
        #[arg(short, long)]
        store: PathBuf,

        /// Maximum number of hits to print. Use 0 for unlimited.
        #[arg(short, long, default_value = "20")]
        limit: usize,

        /// Print hits as JSON
        #[arg(long)]
        json: bool,

        query: String,
    },
}

#[derive(Serialize)]
struct HitOutput<'a> {
    id: &'a str,
    weight: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Tokens { query } => {
            let tokens = match tokenize(&query) {
                Ok(tokens) => tokens,
                Err(e) => return Ok(report(e)),
            };
            for token in tokens {
                let kind = match &token.kind {
                    TokenKind::Symbol(_) => "symbol",
                    TokenKind::Path(_) => "path",
                    TokenKind::Space => continue,
                    TokenKind::Value { quote: Some(_), .. } => "quoted",
                    TokenKind::Value { quote: None, .. } => "value",
                };
                let start = token.span.start;
                println!("{}:{}\t{kind}\t{}", start.row, start.col, token.text);
            }
        }
        Command::Check { query } => match compile(&query, &EntityVocabulary) {
            Ok(_) => println!("ok"),
            Err(e) => return Ok(report(e)),
        },
        Command::Fmt { query } => match compile(&query, &EntityVocabulary) {
            Ok(compiled) => println!("{}", dump(&compiled, true)),
            Err(e) => return Ok(report(e)),
        },
        Command::Search {
            store,
            limit,
            json,
            query,
        } => {
            let data = tokio::fs::read_to_string(&store)
                .await
                .with_context(|| format!("reading store {}", store.display()))?;
            let store = MemoryStore::from_json(&data)
                .with_context(|| format!("parsing store {}", store.display()))?;
            let resolver = EntityResolver::new(store);

            let hits = match search(&query, &resolver).await {
                Ok(hits) => rank(hits),
                Err(e) => return Ok(report(e)),
            };
            log::info!("{} hits", hits.len());

            let shown = if limit == 0 { hits.len() } else { limit.min(hits.len()) };
            let hits = &hits[..shown];
            if json {
                let out: Vec<HitOutput> = hits
                    .iter()
                    .map(|h| HitOutput {
                        id: &h.id,
                        weight: h.weight,
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                for hit in hits {
                    println!("{}\t{}", hit.weight, hit.id);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn report(err: impl std::fmt::Display) -> ExitCode {
    eprintln!("{err}");
    ExitCode::FAILURE
}

//! hybrid-rag - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use hybrid_rag::{
    cli::{Args, Commands, Verbosity},
    config::RetrievalConfig,
    graph::{GraphSnapshot, GraphStore, InMemoryGraph},
    keyword::{InMemoryKeywordIndex, KeywordIndex},
    rag::reranking::{HttpReranker, HttpRerankerConfig, LexicalReranker, Reranker},
    rag::{RetrievalOrchestrator, RetrieveOptions},
    telemetry::RetrievalTelemetry,
    types::{RetrievalResult, Source},
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbosity());

    let config = RetrievalConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    match &args.command {
        Commands::Query {
            text,
            top_k,
            threshold,
            graph,
            corpus,
            reranker_url,
            node_types,
            json,
        } => {
            let mut options = RetrieveOptions::from_config(&config);
            if let Some(top_k) = top_k {
                options.top_k = *top_k;
            }
            if let Some(threshold) = threshold {
                options.score_threshold = *threshold;
            }
            if !node_types.is_empty() {
                options = options.with_node_types(node_types.clone());
            }

            let sources = Sources {
                graph: graph.as_deref(),
                corpus: corpus.as_deref(),
                reranker_url: reranker_url.as_deref(),
            };
            run_query(&args, config, sources, text, &options, *json).await?;
        }
        Commands::Stats { graph, json } => {
            show_stats(graph, *json).await?;
        }
        Commands::Config => {
            show_config(&args, &config)?;
        }
    }

    Ok(())
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Data files and endpoints a query runs against
struct Sources<'a> {
    graph: Option<&'a Path>,
    corpus: Option<&'a Path>,
    reranker_url: Option<&'a str>,
}

async fn load_graph(path: Option<&Path>) -> Result<InMemoryGraph> {
    match path {
        Some(path) => {
            let snapshot = GraphSnapshot::load(path)
                .with_context(|| format!("Failed to load graph snapshot {}", path.display()))?;
            Ok(InMemoryGraph::from_snapshot(snapshot).await)
        }
        None => Ok(InMemoryGraph::new()),
    }
}

async fn load_corpus(path: Option<&Path>) -> Result<InMemoryKeywordIndex> {
    match path {
        Some(path) => InMemoryKeywordIndex::load_corpus(path)
            .await
            .with_context(|| format!("Failed to load keyword corpus {}", path.display())),
        None => Ok(InMemoryKeywordIndex::new()),
    }
}

fn build_reranker(config: &RetrievalConfig, url: Option<&str>) -> Result<Arc<dyn Reranker>> {
    let endpoint = url.map(str::to_string).or_else(|| config.rerank.endpoint.clone());
    match endpoint {
        Some(endpoint) => {
            let reranker = HttpReranker::new(HttpRerankerConfig {
                endpoint,
                timeout: config.rerank_timeout(),
                max_retries: config.rerank.max_retries,
            })
            .context("Failed to build HTTP reranker")?;
            Ok(Arc::new(reranker))
        }
        None => Ok(Arc::new(LexicalReranker::new())),
    }
}

async fn run_query(
    args: &Args,
    config: RetrievalConfig,
    sources: Sources<'_>,
    query: &str,
    options: &RetrieveOptions,
    json: bool,
) -> Result<()> {
    let graph = Arc::new(GraphStore::new(Arc::new(load_graph(sources.graph).await?)));
    let keyword: Arc<dyn KeywordIndex> = Arc::new(load_corpus(sources.corpus).await?);
    let reranker = build_reranker(&config, sources.reranker_url)?;

    let telemetry = RetrievalTelemetry::new();
    let orchestrator = RetrievalOrchestrator::new(graph, keyword, reranker, config)
        .with_telemetry(telemetry.clone());

    let outcome = orchestrator.retrieve_with(query, options).await;
    orchestrator.close().await;
    let result = outcome.context("Retrieval failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(query, &result, args.verbosity());
        if args.verbosity().show_details() {
            println!("\n{}", "Telemetry".bold());
            println!("{}", telemetry.summary());
        }
    }

    Ok(())
}

fn print_result(query: &str, result: &RetrievalResult, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!(
            "\n{} {} ({} documents, {:.1} ms)\n",
            "Query:".bold(),
            query,
            result.len(),
            result.latency_ms
        );
    }

    if result.is_empty() {
        println!("{}", "No documents found.".yellow());
    }

    for (rank, doc) in result.documents.iter().enumerate() {
        let source = match doc.source {
            Source::Graph => "graph".cyan(),
            Source::Keyword => "keyword".green(),
        };
        println!("{:>2}. [{:.3}] {:<7} {}", rank + 1, doc.score, source, doc.content);
    }

    if verbosity.show_details() {
        println!();
        println!("Graph candidates:    {}", result.graph_candidates);
        println!("Keyword candidates:  {}", result.keyword_candidates);
        println!("Duplicates removed:  {}", result.duplicates_removed);
    }

    if result.reranker_fallback {
        println!(
            "\n{}",
            "Reranker unavailable; results use source-local scores.".yellow()
        );
    }
}

async fn show_stats(path: &Path, json: bool) -> Result<()> {
    let graph = load_graph(Some(path)).await?;
    let stats = graph.statistics().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n{} {}\n", "Graph:".bold(), path.display());
    println!("Nodes:           {}", stats.node_count);
    println!("Relations:       {}", stats.relation_count);
    println!("Average degree:  {:.2}", stats.average_degree);

    if !stats.node_types.is_empty() {
        println!("\nNode types:");
        for (node_type, count) in &stats.node_types {
            println!("  {:<20} {}", node_type, count);
        }
    }
    if !stats.relation_types.is_empty() {
        println!("\nRelation types:");
        for (relation_type, count) in &stats.relation_types {
            println!("  {:<20} {}", relation_type, count);
        }
    }
    println!();

    Ok(())
}

fn show_config(args: &Args, config: &RetrievalConfig) -> Result<()> {
    let source = match (&args.config, RetrievalConfig::default_path()) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(path)) if path.exists() => path.display().to_string(),
        _ => "built-in defaults".to_string(),
    };

    println!("{} {}\n", "Configuration:".bold(), source);
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    println!("{}", rendered);
    println!("Verbosity: {}", args.verbosity().as_str());

    Ok(())
}

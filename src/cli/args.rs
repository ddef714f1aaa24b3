//! Command-line argument parsing for hybrid-rag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hybrid-rag - Fuse knowledge-graph and keyword evidence into one ranked list
#[derive(Parser, Debug)]
#[command(name = "hybrid-rag")]
#[command(version)]
#[command(about = "Hybrid graph + keyword retrieval with reranking", long_about = None)]
pub struct Args {
    /// Configuration file path (default: ~/.hybrid-rag/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Retrieve ranked evidence for a query
    Query {
        /// Query text
        #[arg(value_name = "TEXT")]
        text: String,

        /// Maximum number of documents (config default when omitted)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum score a document must reach
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Graph snapshot JSON file
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Keyword corpus JSON file
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Cross-encoder rerank endpoint (overrides config)
        #[arg(long)]
        reranker_url: Option<String>,

        /// Restrict graph seeds to a node type (repeatable)
        #[arg(long = "node-type")]
        node_types: Vec<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print statistics for a graph snapshot
    Stats {
        /// Graph snapshot JSON file
        #[arg(value_name = "GRAPH")]
        graph: PathBuf,

        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn log_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "hybrid_rag=info",
            Verbosity::VeryVerbose => "hybrid_rag=debug",
        }
    }

    /// Check if should show per-source diagnostics
    pub fn show_details(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_command() {
        let args = Args::parse_from([
            "hybrid-rag",
            "query",
            "气虚体质的表现",
            "-k",
            "3",
            "--graph",
            "graph.json",
            "--node-type",
            "Constitution",
            "--node-type",
            "Symptom",
        ]);
        match args.command {
            Commands::Query {
                text,
                top_k,
                threshold,
                graph,
                node_types,
                json,
                ..
            } => {
                assert_eq!(text, "气虚体质的表现");
                assert_eq!(top_k, Some(3));
                assert_eq!(threshold, None);
                assert_eq!(graph, Some(PathBuf::from("graph.json")));
                assert_eq!(node_types, vec!["Constitution", "Symptom"]);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_verbosity_flags() {
        let args = Args::parse_from(["hybrid-rag", "config"]);
        assert_eq!(args.verbosity(), Verbosity::Normal);

        let args = Args::parse_from(["hybrid-rag", "-q", "config"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);

        let args = Args::parse_from(["hybrid-rag", "config", "-vv"]);
        assert_eq!(args.verbosity(), Verbosity::VeryVerbose);
        assert_eq!(args.verbosity().log_directive(), "hybrid_rag=debug");
    }

    #[test]
    fn test_verbosity_details() {
        assert!(!Verbosity::Normal.show_details());
        assert!(Verbosity::Verbose.show_details());
        assert_eq!(Verbosity::Quiet.as_str(), "quiet");
    }

    #[test]
    fn test_stats_requires_graph() {
        assert!(Args::try_parse_from(["hybrid-rag", "stats"]).is_err());
        let args = Args::parse_from(["hybrid-rag", "stats", "g.json", "--json"]);
        assert!(matches!(args.command, Commands::Stats { json: true, .. }));
    }
}

//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// FiscalScope: NF-e auditing and exploratory analysis
#[derive(Parser)]
#[command(name = "fiscalscope")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Describe a dataset: overview, outliers, clusters, trends, relationships
    Analyze {
        /// Path to the data file (CSV/TSV/JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the fiscal rules over an NF-e item table
    Validate {
        /// Path to the data file (CSV/TSV/JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Show the flagged rows of one rule (e.g. cfop_destino)
        #[arg(short, long, value_name = "ID")]
        rule: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the consolidated audit report
    Audit {
        /// Path to the data file (CSV/TSV/JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show fiscal KPIs: notes, items, totals, timeline, top groups
    Summary {
        /// Path to the data file (CSV/TSV/JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invoke an agent tool by name and print its text
    Tool {
        /// Path to the data file (CSV/TSV/JSON)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Tool name (e.g. resumo_riscos, outlier_report)
        #[arg(value_name = "NAME")]
        name: String,

        /// Free-text input passed to the tool
        #[arg(value_name = "INPUT", default_value = "")]
        input: String,
    },
}

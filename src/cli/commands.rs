//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Price catalog to data lake pipeline
#[derive(Parser, Debug)]
#[command(name = "price-lake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Offer filter file (YAML with `include` / `exclude` lists)
    #[arg(short, long, global = true)]
    pub filter_file: Option<PathBuf>,

    /// Root folder for partitioned output files
    #[arg(long, global = true)]
    pub price_folder: Option<PathBuf>,

    /// Folder for table definition files
    #[arg(long, global = true)]
    pub ddl_folder: Option<PathBuf>,

    /// Target database
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Bucket backing tables and query results
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Query service endpoint
    #[arg(long, global = true)]
    pub query_endpoint: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run every stage (the default)
    Run,

    /// Download offers, write partitions and table definitions
    Ingest,

    /// Upload the partition tree to the destination
    Upload,

    /// Create the database and every defined table
    CreateTables,

    /// Discover the partitions of every defined table
    RepairPartitions,
}

//! EntiOData CLI
//!
//! Command-line front end for the EntiOData in-memory producer, serving a
//! built-in sample catalog of products, categories and suppliers.
//!
//! # Commands
//!
//! - `metadata` - Print the generated metadata
//! - `query` - Run a query and print the result page as JSON
//! - `count` - Count the entities a query selects

mod catalog;
mod commands;
mod filter;

use clap::{Parser, Subcommand};
use commands::query::QueryArgs;
use entiodata_core::ProducerConfig;
use tracing_subscriber::EnvFilter;

/// EntiOData command-line tools.
#[derive(Parser)]
#[command(name = "entiodata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum number of entities per page
    #[arg(global = true, long, default_value_t = entiodata_core::DEFAULT_MAX_RESULTS)]
    max_results: usize,

    /// Leave null properties out of result pages
    #[arg(global = true, long)]
    omit_nulls: bool,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the generated metadata
    Metadata {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Query an entity set
    Query {
        /// Entity set name
        set: String,

        /// Filter expression, e.g. "UnitPrice gt 20 and Discontinued eq false"
        #[arg(long)]
        filter: Option<String>,

        /// Ordering, e.g. "UnitPrice desc,ProductID"
        #[arg(long)]
        order_by: Option<String>,

        /// Maximum number of entities
        #[arg(long)]
        top: Option<usize>,

        /// Number of entities to skip
        #[arg(long)]
        skip: Option<usize>,

        /// Resume after the entity with this key string
        #[arg(long)]
        skip_token: Option<String>,

        /// Include the count of all matching entities
        #[arg(long)]
        inline_count: bool,

        /// Comma-separated property paths to select
        #[arg(long)]
        select: Option<String>,

        /// Comma-separated navigation paths to expand
        #[arg(long)]
        expand: Option<String>,
    },

    /// Count the entities of a set
    Count {
        /// Entity set name
        set: String,

        /// Filter expression
        #[arg(long)]
        filter: Option<String>,

        /// Maximum number of entities counted
        #[arg(long)]
        top: Option<usize>,

        /// Number of entities to skip
        #[arg(long)]
        skip: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ProducerConfig::new()
        .namespace("Catalog")
        .max_results(cli.max_results)
        .include_null_properties(!cli.omit_nulls);
    let producer = catalog::producer(config)?;

    match cli.command {
        Commands::Metadata { format } => {
            commands::metadata::run(&producer, &format)?;
        }
        Commands::Query {
            set,
            filter,
            order_by,
            top,
            skip,
            skip_token,
            inline_count,
            select,
            expand,
        } => {
            let args = QueryArgs {
                filter,
                order_by,
                top,
                skip,
                skip_token,
                inline_count,
                select,
                expand,
            };
            commands::query::run(&producer, &set, &args)?;
        }
        Commands::Count {
            set,
            filter,
            top,
            skip,
            format,
        } => {
            commands::count::run(&producer, &set, filter.as_deref(), top, skip, &format)?;
        }
        Commands::Version => {
            println!("EntiOData CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("EntiOData Core v{}", entiodata_core::VERSION);
        }
    }

    Ok(())
}

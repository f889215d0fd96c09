//! CaskKV CLI
//!
//! Command-line interface for a CaskKV data directory.

use clap::{Parser, Subcommand};
use caskkv::{Config, Store};
use tracing_subscriber::{fmt, EnvFilter};

/// CaskKV CLI
#[derive(Parser, Debug)]
#[command(name = "caskkv-cli")]
#[command(about = "CLI for the CaskKV log-structured key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./caskkv_data")]
    dir: String,

    /// fsync every write before returning
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Delete {
        /// The key to delete
        key: String,
    },

    /// List all live keys
    List,

    /// Compact the data directory
    Merge,

    /// Show key and segment counts
    Stats,
}

impl Commands {
    fn mutates(&self) -> bool {
        matches!(self, Commands::Put { .. } | Commands::Delete { .. } | Commands::Merge)
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,caskkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> caskkv::Result<()> {
    let config = Config::builder()
        .data_dir(&args.dir)
        .read_write(args.command.mutates())
        .sync_on_write(args.sync)
        .build();

    let store = Store::open(config)?;

    match &args.command {
        Commands::Get { key } => match store.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("not found"),
        },
        Commands::Put { key, value } => {
            store.put(key.as_bytes(), value.as_bytes())?;
            println!("ok");
        }
        Commands::Delete { key } => {
            store.delete(key.as_bytes())?;
            println!("ok");
        }
        Commands::List => {
            let mut keys = store.list_keys();
            keys.sort();
            for key in keys {
                println!("{}", String::from_utf8_lossy(&key));
            }
        }
        Commands::Merge => {
            let result = store.merge()?;
            println!(
                "ok ({} records kept, {} segments removed, {} -> {} bytes)",
                result.records_written,
                result.segments_removed,
                result.bytes_before,
                result.bytes_after
            );
        }
        Commands::Stats => {
            println!("keys:     {}", store.key_count());
            println!("segments: {}", store.segment_count()?);
        }
    }

    store.close()
}

//! CLI for eca30: Rule 30 cellular automaton output on tap.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "eca30")]
#[command(about = "eca30: byte generator driven by the Rule 30 cellular automaton")]
#[command(version = eca30_core::VERSION)]
struct Cli {
    /// JSON engine config file (flags below override its values)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Startup procedure: rule30 (deterministic, default) or entropy (seed from the OS)
    #[arg(long, global = true, value_parser = ["rule30", "entropy"])]
    bootstrap: Option<String>,

    /// Bytes extracted per copy (1-65536)
    #[arg(long, global = true)]
    block_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream automaton bytes to stdout (pipe-friendly)
    Stream {
        /// Output format
        #[arg(long, default_value = "raw", value_parser = ["raw", "hex", "base64"])]
        format: String,

        /// Bytes/sec rate limit (0 = unlimited)
        #[arg(long, default_value = "0")]
        rate: usize,

        /// Total bytes (0 = infinite)
        #[arg(long, default_value = "0")]
        bytes: usize,

        /// Mix this file into the pool before streaming
        #[arg(long)]
        inject: Option<String>,
    },

    /// Create a FIFO (named pipe) that acts as a Rule 30 device
    Device {
        /// Path to FIFO
        #[arg(default_value = "/tmp/eca30")]
        path: String,

        /// Write buffer size in bytes
        #[arg(long, default_value = "4096")]
        buffer_size: usize,
    },

    /// Check the automaton against the canonical Rule 30 vector
    Selftest,

    /// Measure throughput and output quality
    Bench {
        /// Bytes to generate
        #[arg(long, default_value = "1048576")]
        bytes: usize,
    },

    /// Print engine status as JSON
    Status,

    /// Start an HTTP server for automaton output
    Server {
        /// Port to listen on
        #[arg(long, default_value = "8030")]
        port: u16,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Reject POST /api/v1/entropy
        #[arg(long)]
        read_only: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let opts = commands::EngineOptions {
        config: cli.config.as_deref(),
        bootstrap: cli.bootstrap.as_deref(),
        block_size: cli.block_size,
    };

    match cli.command {
        Commands::Stream {
            format,
            rate,
            bytes,
            inject,
        } => commands::stream::run(&opts, &format, rate, bytes, inject.as_deref()),
        Commands::Device { path, buffer_size } => {
            commands::device::run(&opts, &path, buffer_size)
        }
        Commands::Selftest => commands::selftest::run(),
        Commands::Bench { bytes } => commands::bench::run(&opts, bytes),
        Commands::Status => commands::status::run(&opts),
        Commands::Server {
            port,
            host,
            read_only,
        } => commands::server::run(&opts, &host, port, read_only),
    }
}

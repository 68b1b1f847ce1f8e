//! CLI entrypoint for the bridge harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use t3bridge_harness::session;

/// Exercise a built T3000 WebView bridge library.
#[derive(Debug, Parser)]
#[command(name = "t3bridge-harness")]
#[command(about = "Load a T3000 WebView bridge and exercise its exports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Force resolution and print the bridge's resolution report.
    Probe {
        /// Path to the built bridge library.
        #[arg(long)]
        library: PathBuf,
    },
    /// Forward one WebView message and print the reply.
    Invoke {
        /// Path to the built bridge library.
        #[arg(long)]
        library: PathBuf,
        /// WebView action code (see `actions`).
        #[arg(long, allow_negative_numbers = true)]
        action: i32,
        /// Request text placed in the buffer before the call.
        #[arg(long, default_value = "")]
        input: String,
        /// Buffer size handed to the bridge.
        #[arg(long, default_value_t = session::DEFAULT_INVOKE_CAPACITY)]
        capacity: usize,
    },
    /// Print whether the bridge can reach a host entry point.
    Available {
        /// Path to the built bridge library.
        #[arg(long)]
        library: PathBuf,
    },
    /// List the WebView action codes.
    Actions,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Probe { library } => {
            let report = session::probe(&library)?;
            if !report.resolved {
                eprintln!("No host entry point resolved; see the T3WebLog trail for probes.");
            }
            print_json(&report)?;
        }
        Command::Invoke {
            library,
            action,
            input,
            capacity,
        } => {
            let report = session::invoke(&library, action, &input, capacity)?;
            print_json(&report)?;
            if report.return_code != 0 {
                std::process::exit(1);
            }
        }
        Command::Available { library } => {
            let report = session::available(&library)?;
            print_json(&report)?;
            if !report.available {
                std::process::exit(1);
            }
        }
        Command::Actions => {
            for entry in session::actions() {
                println!("{:>3}  {}", entry.code, entry.name);
            }
        }
    }

    Ok(())
}

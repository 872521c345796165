//! wanlog-report
//!
//! Prints what the dashboard would plot from a router log, or the known
//! problems it contains.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use wanlog_dashboard::logs::report::{render_conn_state, render_signals};
use wanlog_dashboard::logs::{
    ConnStateParser, LogCategory, LogFile, LogScanner, ScanDatabase, SignalQualityParser,
};

#[derive(Debug, Parser)]
#[command(name = "wanlog-report")]
#[command(about = "Router log reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// WAN connection state changes per device
    States {
        /// Log file
        file: PathBuf,
        /// Print CSV (datetime,uid,stateEnum,details) instead of series
        #[arg(long)]
        csv: bool,
    },
    /// Signal readings per device and metric
    Signals {
        /// Log file
        file: PathBuf,
    },
    /// Lines matching the known-message database
    Scan {
        /// Log file
        file: PathBuf,
        /// Message database (JSON)
        #[arg(short, long, env = "LOG_MESSAGE_DATABASE")]
        database: PathBuf,
        /// Category to scan; repeat for several (default: all)
        #[arg(short, long)]
        category: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let text = match cli.command {
        Commands::States { file, csv } => {
            let log = LogFile::open(&file)?;
            if csv {
                ConnStateParser.csv(&log)
            } else {
                render_conn_state(&ConnStateParser.parse_log(&log))
            }
        }
        Commands::Signals { file } => {
            let log = LogFile::open(&file)?;
            render_signals(&SignalQualityParser.parse_log(&log))
        }
        Commands::Scan {
            file,
            database,
            category,
        } => {
            let log = LogFile::open(&file)?;
            let database = ScanDatabase::load(&database)
                .with_context(|| format!("loading {}", database.display()))?;
            let mut scanner = LogScanner::new(&database);
            if !category.is_empty() {
                scanner = scanner.only(Vec::<LogCategory>::new());
                for name in &category {
                    scanner.add_category(name)?;
                }
            }
            let problems = scanner.scan(&log);
            if problems.is_empty() {
                "No known problems found.\n".to_string()
            } else {
                problems.iter().map(|p| format!("{p}\n\n")).collect()
            }
        }
    };

    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

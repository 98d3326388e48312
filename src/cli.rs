use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::entities::ItemKind;
use crate::time::HourTime;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Store:  flat JSON files\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Day-grid scheduler: tasks, work sessions and time blocks
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable debug logging to file (default: daygrid.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Custom data directory holding the JSON store
    #[arg(short = 'd', long = "data-dir", value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the REST API server
    Serve {
        /// Port to listen on (default: from config)
        #[arg(short = 'p', long = "port", value_name = "PORT")]
        port: Option<u16>,
    },

    /// Print scheduled items per day
    Agenda {
        /// First day, YYYY-MM-DD (default: today in the configured timezone)
        #[arg(value_name = "DATE")]
        date: Option<NaiveDate>,

        /// Number of days to print
        #[arg(short = 'n', long = "days", value_name = "N", default_value_t = 1)]
        days: usize,
    },

    /// Place an item at a time, with the same checks as a drop on the grid
    Schedule {
        /// task or work-session
        #[arg(value_name = "KIND")]
        kind: ItemKind,

        #[arg(value_name = "ID")]
        id: u64,

        /// Day, YYYY-MM-DD
        #[arg(value_name = "DATE")]
        date: NaiveDate,

        /// Start time, HH:MM (24h) or "2:15 PM"
        #[arg(value_name = "TIME")]
        time: HourTime,

        /// Duration in minutes (default: the item's current duration)
        #[arg(short = 'm', long = "minutes", value_name = "MIN")]
        minutes: Option<i64>,
    },

    /// Print the Monday-first month grid with item counts per day
    Month {
        /// Any day of the month, YYYY-MM-DD (default: today)
        #[arg(value_name = "DATE")]
        date: Option<NaiveDate>,

        /// Months to move forward (negative: back)
        #[arg(short = 's', long = "shift", value_name = "N", default_value_t = 0, allow_negative_numbers = true)]
        shift: i32,
    },

    /// Move an item to the backlog
    Backlog {
        /// task or work-session
        #[arg(value_name = "KIND")]
        kind: ItemKind,

        #[arg(value_name = "ID")]
        id: u64,
    },
}

//! Command-line interface definition.

use clap::{ArgGroup, Parser, Subcommand};

use crate::api::DEFAULT_BACKEND_URL;

/// calbot - talk to your calendar
#[derive(Debug, Parser)]
#[command(name = "calbot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Calendar backend URL
    #[arg(long, env = "CALBOT_BACKEND_URL", default_value = DEFAULT_BACKEND_URL, global = true)]
    pub backend_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    pub timeout: u64,

    /// Print raw JSON responses
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat with the assistant (default)
    Chat,

    /// List free slots in a range such as "next week"
    Availability {
        /// Natural-language range
        #[arg(required = true, num_args = 1..)]
        range: Vec<String>,

        /// Slot length in minutes
        #[arg(long)]
        slot_minutes: Option<u32>,
    },

    /// List events in a range or between two timestamps
    #[command(group(ArgGroup::new("window").required(true).args(["range", "start"])))]
    Events {
        /// Natural-language range
        #[arg(long, conflicts_with_all = ["start", "end"])]
        range: Option<String>,

        /// ISO8601 start
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// ISO8601 end
        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Book an event
    Book {
        #[arg(long)]
        title: String,

        /// ISO8601 timestamp or a phrase like "tomorrow at 3pm"
        #[arg(long)]
        start: String,

        /// Duration in minutes
        #[arg(long, default_value = "30")]
        duration: i64,

        #[arg(long)]
        description: Option<String>,
    },

    /// Send one prompt to the assistant
    Ask {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Check that the backend is up
    Health,
}

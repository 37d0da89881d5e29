//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// slotbook - book appointments from the terminal
#[derive(Debug, Parser)]
#[command(name = "slotbook")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "SLOTBOOK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Base URL of the booking backend
    #[arg(long, env = "SLOTBOOK_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show a booking page and its services
    Page {
        /// Booking page slug
        slug: String,
    },

    /// Show which days of a month have open slots
    Availability {
        /// Booking page slug
        slug: String,

        /// Service identifier
        #[arg(long)]
        service: String,

        /// Month to check (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<String>,

        /// Timezone slots are shown in
        #[arg(long)]
        timezone: Option<String>,
    },

    /// Book a slot
    Book(BookArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `slotbook book`.
#[derive(Debug, clap::Args)]
pub struct BookArgs {
    /// Booking page slug
    pub slug: String,

    /// Service identifier
    #[arg(long)]
    pub service: String,

    /// Day to book (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,

    /// Slot start time as displayed (HH:MM)
    #[arg(long)]
    pub time: String,

    /// Your name
    #[arg(long)]
    pub name: String,

    /// Your email address
    #[arg(long)]
    pub email: String,

    /// Your phone number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Notes for the host
    #[arg(long, default_value = "")]
    pub notes: String,

    /// Answer to a custom question, as `question_id=text` (can be repeated)
    #[arg(long = "answer", action = clap::ArgAction::Append)]
    pub answers: Vec<String>,

    /// Timezone the time is given in
    #[arg(long)]
    pub timezone: Option<String>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_book_command() {
        let cli = Cli::try_parse_from([
            "slotbook",
            "--json",
            "book",
            "studio",
            "--service",
            "svc-1",
            "--date",
            "2025-06-10",
            "--time",
            "09:00",
            "--name",
            "Alex",
            "--email",
            "alex@example.com",
            "--answer",
            "q1=Pricing",
            "--answer",
            "q2=A friend",
        ])
        .unwrap();

        assert!(cli.json);
        let Command::Book(args) = cli.command else {
            panic!("expected book command");
        };
        assert_eq!(args.slug, "studio");
        assert_eq!(args.answers, ["q1=Pricing", "q2=A friend"]);
        assert!(args.phone.is_empty());
        assert!(args.timezone.is_none());
    }

    #[test]
    fn availability_requires_service() {
        assert!(Cli::try_parse_from(["slotbook", "availability", "studio"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "slotbook",
            "page",
            "studio",
            "--base-url",
            "https://book.example.com",
            "-v",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.base_url.as_deref(), Some("https://book.example.com"));
    }
}

//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ct_core::MAX_DAY_COUNT;

/// Menstrual cycle tracker.
///
/// Logs periods, symptoms, moods and medications, then estimates the
/// current cycle phase and summarises the history.
#[derive(Debug, Parser)]
#[command(name = "ct", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a user identity and default profile.
    Init {
        /// Display name stored in the profile.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show or change profile settings.
    #[command(subcommand)]
    Profile(ProfileAction),

    /// Record periods, symptoms, moods and medications.
    #[command(subcommand)]
    Log(LogEntry),

    /// Show the current cycle day, phase and next period.
    Home {
        /// Date to estimate for (defaults to today).
        #[arg(long)]
        today: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a month calendar with logged days marked.
    Calendar {
        /// Date to highlight; its month is shown (defaults to today).
        #[arg(long)]
        selected: Option<String>,

        /// Output every marked date as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show everything logged on one day.
    Day {
        /// Date to show (defaults to today).
        date: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show cycle averages and most frequent symptoms and moods.
    Stats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export all stored data as JSON to stdout.
    Export,
}

/// Profile subcommands.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// Print the current profile.
    Show,

    /// Update profile fields; omitted fields are left unchanged.
    Set {
        /// Typical cycle length in days.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DAY_COUNT)))]
        cycle_length: Option<u32>,

        /// Typical period length in days.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DAY_COUNT)))]
        period_length: Option<u32>,

        /// Display name.
        #[arg(long)]
        name: Option<String>,

        /// Birth date (YYYY-MM-DD).
        #[arg(long)]
        birth_date: Option<String>,
    },
}

/// Entries that can be logged.
#[derive(Debug, Subcommand)]
pub enum LogEntry {
    /// Log the start of a period.
    Period {
        /// First day of bleeding.
        #[arg(long)]
        start: String,

        /// Last day of bleeding, if already known.
        #[arg(long, conflicts_with = "length")]
        end: Option<String>,

        /// Period length in days, if known but no end date is given.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DAY_COUNT)))]
        length: Option<u32>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Record the end of a previously logged period.
    PeriodEnd {
        /// Cycle ID printed by `ct log period`.
        #[arg(long)]
        id: i64,

        /// Last day of bleeding.
        #[arg(long)]
        end: String,
    },

    /// Delete a logged period.
    PeriodDelete {
        /// Cycle ID to delete.
        #[arg(long)]
        id: i64,
    },

    /// Log one or more symptoms.
    Symptom {
        /// Symptom type (e.g. cramps, headache). Repeat for several.
        #[arg(long = "type", required = true)]
        kinds: Vec<String>,

        /// light, medium or severe.
        #[arg(long)]
        intensity: String,

        /// Day the symptoms occurred (defaults to today).
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Log one or more moods.
    Mood {
        /// Mood type (e.g. happy, anxious). Repeat for several.
        #[arg(long = "type", required = true)]
        kinds: Vec<String>,

        /// slight, moderate or strong.
        #[arg(long)]
        intensity: String,

        /// Day the moods occurred (defaults to today).
        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Log a medication dose.
    Medication {
        #[arg(long)]
        name: String,

        #[arg(long)]
        dosage: String,

        /// Day of the dose (defaults to today).
        #[arg(long)]
        date: Option<String>,

        /// Time of the dose, as displayed (e.g. 08:30).
        #[arg(long, default_value = "08:00")]
        time: String,

        /// Mark the dose as already taken.
        #[arg(long)]
        taken: bool,

        /// Weekday the dose repeats on. Repeat for several.
        #[arg(long = "recurring-day")]
        recurring_days: Vec<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a logged medication dose as taken.
    MedicationTaken {
        /// Medication ID printed by `ct log medication`.
        #[arg(long)]
        id: i64,

        /// Mark as not taken instead.
        #[arg(long)]
        undo: bool,
    },
}

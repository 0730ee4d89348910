use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use ct_core::Tracker;
use tracing_subscriber::EnvFilter;

use ct_cli::commands::util::parse_date;
use ct_cli::commands::{calendar, day, export, home, init, log, profile, stats};
use ct_cli::{Cli, Commands, Config, LogEntry, ProfileAction, user};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ct_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ct_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

#[expect(
    clippy::too_many_lines,
    reason = "CLI command dispatch is inherently verbose"
)]
fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (db, config) = open_database(cli.config.as_deref())?;
    let today = Local::now().date_naive();
    let mut stdout = std::io::stdout().lock();

    if let Commands::Init { name } = command {
        return init::run(&mut stdout, &db, &config, name.as_deref());
    }

    let user_id = user::require_user(&config)?;
    let tracker = Tracker::new(&db, config.service_config());

    match command {
        Commands::Init { .. } => {}
        Commands::Profile(ProfileAction::Show) => profile::show(&mut stdout, &db, &user_id)?,
        Commands::Profile(ProfileAction::Set {
            cycle_length,
            period_length,
            name,
            birth_date,
        }) => {
            let args = profile::ProfileArgs {
                cycle_length: *cycle_length,
                period_length: *period_length,
                name: name.as_deref(),
                birth_date: birth_date.as_deref(),
            };
            profile::set(&mut stdout, &db, &user_id, &args, today)?;
        }
        Commands::Log(entry) => match entry {
            LogEntry::Period {
                start,
                end,
                length,
                notes,
            } => {
                log::period(
                    &mut stdout,
                    &db,
                    &user_id,
                    start,
                    end.as_deref(),
                    *length,
                    notes.clone(),
                    today,
                )?;
            }
            LogEntry::PeriodEnd { id, end } => {
                log::period_end(&mut stdout, &db, &user_id, *id, end, today)?;
            }
            LogEntry::PeriodDelete { id } => {
                log::period_delete(&mut stdout, &db, &user_id, *id)?;
            }
            LogEntry::Symptom {
                kinds,
                intensity,
                date,
                notes,
            } => {
                log::symptoms(
                    &mut stdout,
                    &db,
                    &user_id,
                    kinds,
                    intensity,
                    date.as_deref(),
                    notes.as_deref(),
                    today,
                )?;
            }
            LogEntry::Mood {
                kinds,
                intensity,
                date,
                notes,
            } => {
                log::moods(
                    &mut stdout,
                    &db,
                    &user_id,
                    kinds,
                    intensity,
                    date.as_deref(),
                    notes.as_deref(),
                    today,
                )?;
            }
            LogEntry::Medication {
                name,
                dosage,
                date,
                time,
                taken,
                recurring_days,
                notes,
            } => {
                let args = log::MedicationArgs {
                    name,
                    dosage,
                    date: date.as_deref(),
                    time,
                    taken: *taken,
                    recurring_days,
                    notes: notes.as_deref(),
                };
                log::medication(&mut stdout, &db, &user_id, &args, today)?;
            }
            LogEntry::MedicationTaken { id, undo } => {
                log::medication_taken(&mut stdout, &db, &user_id, *id, !*undo)?;
            }
        },
        Commands::Home { today: on, json } => {
            let on = on.as_deref().map_or(Ok(today), |d| parse_date(d, today))?;
            home::run(&mut stdout, &tracker, &user_id, on, *json)?;
        }
        Commands::Calendar { selected, json } => {
            let selected = selected
                .as_deref()
                .map_or(Ok(today), |d| parse_date(d, today))?;
            calendar::run(&mut stdout, &tracker, &user_id, selected, today, *json)?;
        }
        Commands::Day { date, json } => {
            let date = date.as_deref().map_or(Ok(today), |d| parse_date(d, today))?;
            day::run(&mut stdout, &tracker, &user_id, date, *json)?;
        }
        Commands::Stats { json } => {
            stats::run(
                &mut stdout,
                &tracker,
                &user_id,
                today,
                config.stats_lookback_days,
                *json,
            )?;
        }
        Commands::Export => {
            export::run(&mut stdout, &db, &user_id, Utc::now())?;
        }
    }

    Ok(())
}

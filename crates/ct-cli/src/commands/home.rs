//! Home command: where today falls in the current cycle.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use ct_core::{HomeSummary, RecordStore, Tracker, UserId};

use super::util::print_warnings;

const BAR_WIDTH: usize = 10;

pub fn run<W: Write, S: RecordStore + Sync>(
    writer: &mut W,
    tracker: &Tracker<'_, S>,
    user_id: &UserId,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let report = tracker.home_summary(user_id, today);
    print_warnings(&report.warnings);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report.value)?)?;
    } else {
        write!(writer, "{}", format_home(&report.value))?;
    }
    Ok(())
}

pub fn format_home(summary: &HomeSummary) -> String {
    let mut output = String::new();

    match (summary.phase, summary.cycle_day) {
        (Some(phase), Some(cycle_day)) => {
            let _ = writeln!(
                output,
                "Cycle day {cycle_day} of {}",
                summary.cycle_average_length
            );
            let _ = writeln!(output, "Phase: {phase}");
            let _ = writeln!(
                output,
                "[{}] {}%",
                progress_bar(summary.progress_fraction),
                percent(summary.progress_fraction)
            );
            if let (Some(date), Some(days)) =
                (summary.next_period_date, summary.days_until_next_period)
            {
                let _ = writeln!(output, "Next period: {date} ({})", describe_countdown(days));
            }
            let _ = writeln!(output, "Tip: {}", phase.tip());
        }
        _ => {
            let _ = writeln!(output, "No cycles logged yet.");
            let _ = writeln!(output, "Log a period with: ct log period --start YYYY-MM-DD");
        }
    }

    let _ = writeln!(
        output,
        "Averages: {}-day cycle, {}-day period",
        summary.cycle_average_length, summary.period_average_length
    );
    output
}

fn describe_countdown(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "in 1 day".to_string(),
        -1 => "1 day late".to_string(),
        d if d < 0 => format!("{} days late", -d),
        d => format!("in {d} days"),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(fraction: f64) -> u32 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// Renders a fraction in \[0, 1\] as a fixed-width bar.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn progress_bar(fraction: f64) -> String {
    let filled = (fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    use ct_core::Phase;
    use insta::assert_snapshot;

    fn known(cycle_day: i64, days_until: i64, fraction: f64, phase: Phase) -> HomeSummary {
        HomeSummary {
            phase: Some(phase),
            cycle_day: Some(cycle_day),
            next_period_date: NaiveDate::from_ymd_opt(2024, 1, 29),
            days_until_next_period: Some(days_until),
            progress_fraction: fraction,
            cycle_average_length: 28,
            period_average_length: 5,
        }
    }

    #[test]
    fn home_known_cycle() {
        let output = format_home(&known(5, 24, 5.0 / 28.0, Phase::Menstrual));
        assert_snapshot!(output, @r"
        Cycle day 5 of 28
        Phase: Menstrual
        [██░░░░░░░░] 18%
        Next period: 2024-01-29 (in 24 days)
        Tip: A warm shower can help ease cramps during menstruation.
        Averages: 28-day cycle, 5-day period
        ");
    }

    #[test]
    fn home_overdue_cycle() {
        let output = format_home(&known(31, -3, 1.0, Phase::Luteal));
        assert_snapshot!(output, @r"
        Cycle day 31 of 28
        Phase: Luteal
        [██████████] 100%
        Next period: 2024-01-29 (3 days late)
        Tip: Look after yourself in the luteal phase and make room for rest.
        Averages: 28-day cycle, 5-day period
        ");
    }

    #[test]
    fn home_without_cycles() {
        let summary = HomeSummary {
            phase: None,
            cycle_day: None,
            next_period_date: None,
            days_until_next_period: None,
            progress_fraction: 0.0,
            cycle_average_length: 30,
            period_average_length: 4,
        };
        assert_snapshot!(format_home(&summary), @r"
        No cycles logged yet.
        Log a period with: ct log period --start YYYY-MM-DD
        Averages: 30-day cycle, 4-day period
        ");
    }

    #[test]
    fn countdown_wording() {
        assert_eq!(describe_countdown(0), "today");
        assert_eq!(describe_countdown(1), "in 1 day");
        assert_eq!(describe_countdown(-1), "1 day late");
        assert_eq!(describe_countdown(12), "in 12 days");
    }

    #[test]
    fn progress_bar_bounds() {
        assert_eq!(progress_bar(0.0), "░░░░░░░░░░");
        assert_eq!(progress_bar(1.5), "██████████");
        assert_eq!(progress_bar(0.5), "█████░░░░░");
    }
}

//! Plain-text rendering of an analysis report.

use crate::analysis::{BracketCounts, MeasureAnalysis, TransitionRecord};
use crate::assembler::test_label;
use crate::bracket::Bracket;
use crate::development::{Measure, UserAssessment};
use crate::domain::Metric;
use crate::pipeline::AnalysisReport;
use crate::region::RegionAnalysis;

/// Formats an optional number, rendering absence as "N/A".
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => "N/A".to_string(),
    }
}

/// Formats an optional percentage change with its sign.
pub fn format_change(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.1}%", v),
        None => "N/A".to_string(),
    }
}

fn format_bracket(bracket: Option<Bracket>) -> &'static str {
    bracket.map(|b| b.label()).unwrap_or("N/A")
}

fn format_records(records: &[TransitionRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{} ({} -> {})", r.user, r.from, r.to))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prints the dataset, group and region sections.
pub fn print_summary(report: &AnalysisReport) {
    print_activity(report);
    print_group(report);
    for region in &report.regions {
        print_region(region);
    }
}

fn print_activity(report: &AnalysisReport) {
    let activity = &report.activity;

    println!();
    println!("=== Dataset Summary ===");
    println!();
    println!("Total observations: {}", activity.observations);
    println!("Users: {} ({} with test data)", activity.users, activity.users_with_tests);
    if let Some((user, count)) = &activity.most_active_user {
        println!("Most active user: {} ({} executions)", user, count);
    }
    println!();

    for row in activity.exercises.iter().filter(|row| row.executions > 0) {
        let resistances = row
            .top_resistances
            .iter()
            .map(|(r, n)| format!("{} x{}", r, n))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "{:42} {:5} executions  [{}]",
            row.exercise.to_string(),
            row.executions,
            resistances
        );
    }
}

fn print_group(report: &AnalysisReport) {
    let group = &report.group;

    println!();
    println!("=== Group Analysis ===");
    println!();
    println!("Multi-test users: {}", group.multi_test_users.len());
    println!("Single-test users: {}", group.single_test.users.len());
    if !group.single_test.users.is_empty() {
        println!(
            "Single-test averages: power {}, acceleration {}",
            format_value(group.single_test.average_power),
            format_value(group.single_test.average_acceleration)
        );
    }

    let spacing = &group.spacing;
    println!(
        "Average days between tests: {}",
        format_value(spacing.unconstrained_days)
    );
    if spacing.min_days > 0 {
        println!(
            "Average days between tests (minimum {} days): {}",
            spacing.min_days,
            format_value(spacing.constrained_days)
        );
    }

    let labels = group.test_labels();
    for measure in &group.measures {
        print_measure(measure, &labels);
    }
}

fn print_distribution_row(label: &str, counts: &[BracketCounts], bracket: Bracket) {
    let cells: String = counts
        .iter()
        .map(|c| format!("{:>8}", c.get(bracket)))
        .collect();
    println!("{:16}{}", label, cells);
}

fn print_measure(analysis: &MeasureAnalysis, labels: &[String]) {
    println!();
    println!("--- {} ---", analysis.measure);

    let header: String = labels.iter().map(|l| format!("{:>8}", l)).collect();
    println!("{:16}{}", "", header);
    for bracket in Bracket::descending() {
        print_distribution_row(bracket.label(), &analysis.distribution, *bracket);
    }

    for period in &analysis.periods {
        println!();
        println!(
            "{}: average change {} ({} users)",
            period.period,
            format_change(period.average_change),
            period.change_users
        );

        let header: String = Bracket::descending()
            .iter()
            .map(|b| format!("{:>16}", b.label()))
            .collect();
        println!("{:16}{}", "from \\ to", header);
        for from in Bracket::descending() {
            let row: String = Bracket::descending()
                .iter()
                .map(|to| format!("{:>16}", period.matrix.get(*from, *to)))
                .collect();
            println!("{:16}{}", from.label(), row);
        }

        if !period.regressions.is_empty() {
            println!("Regressions: {}", format_records(&period.regressions));
        }
        if !period.jumps.is_empty() {
            println!("Jumps: {}", format_records(&period.jumps));
        }
    }

    let p = &analysis.progression;
    println!();
    println!(
        "Totals: {} level-ups, {} jumps, {} regressions, {} unchanged",
        p.level_ups, p.jumps, p.regressions, p.no_change
    );
}

fn print_region(region: &RegionAnalysis) {
    println!();
    println!("=== {} ({} users) ===", region.region, region.users);

    for measure in &region.measures {
        println!();
        println!("--- {} ---", measure.measure);
        for row in &measure.exercises {
            let cells: String = row
                .averages
                .iter()
                .map(|v| format!("{:>8}", format_value(*v)))
                .collect();
            println!("{:42}{}", row.exercise.to_string(), cells);
        }
        let cells: String = measure
            .averages
            .iter()
            .map(|v| format!("{:>8}", format_value(*v)))
            .collect();
        println!("{:42}{}", "Region average", cells);

        for period in &measure.periods {
            let underperformers = period
                .underperformers
                .iter()
                .map(|u| format!("{} ({})", u.user, format_change(Some(u.change))))
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "{}: threshold {} over {} users; below: {}",
                period.period,
                format_change(period.threshold),
                period.contributors,
                if underperformers.is_empty() { "none" } else { underperformers.as_str() }
            );
        }
    }
}

/// Prints one user's raw values, development scores, averages and brackets.
pub fn print_user(user: &UserAssessment) {
    let matrix = user.matrix();
    let labels: String = (0..user.test_count())
        .map(|slot| format!("{:>10}", test_label(slot)))
        .collect();

    println!();
    println!("=== {} ({}) ===", user.user(), user.sex());

    for metric in Metric::all() {
        println!();
        println!("--- {} ---", metric);
        println!("{:42}{}", "", labels);
        let development = user.development(*metric);
        for (exercise, row) in matrix.metric_rows(*metric) {
            let cells: String = row
                .iter()
                .enumerate()
                .map(|(slot, raw)| {
                    let cell = match (raw, development.get(slot, exercise)) {
                        (Some(v), Some(score)) => format!("{:.0} ({:.0}%)", v, score),
                        _ => "N/A".to_string(),
                    };
                    format!("{:>10}", cell)
                })
                .collect();
            println!("{:42}{}", exercise.to_string(), cells);
        }
    }

    println!();
    for measure in Measure::all() {
        let cells: String = (0..user.test_count())
            .map(|slot| {
                format!(
                    "{:>10}",
                    format!(
                        "{} {}",
                        format_value(user.average(slot, *measure)),
                        format_bracket(user.bracket(slot, *measure))
                    )
                )
            })
            .collect();
        println!("{:42}{}", format!("{} average", measure), cells);
    }

    let wording: String = (0..user.test_count())
        .map(|slot| {
            let label = user.presentation(slot).map(|p| p.label()).unwrap_or("N/A");
            format!("{:>26}", label)
        })
        .collect();
    println!("{:42}{}", "Overall level", wording);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value_renders_absence() {
        assert_eq!(format_value(None), "N/A");
        assert_eq!(format_value(Some(72.345)), "72.3");
    }

    #[test]
    fn test_format_change_is_signed() {
        assert_eq!(format_change(Some(12.0)), "+12.0%");
        assert_eq!(format_change(Some(-3.24)), "-3.2%");
        assert_eq!(format_change(None), "N/A");
    }
}

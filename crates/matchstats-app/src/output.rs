// Presentation of run reports: aligned tables, JSON, and CSV.

use std::io::Write;

use anyhow::Context;
use serde::Serialize;

use matchstats_core::lookup::{PlayerProfile, PlayerRef};
use matchstats_core::team::TeamOverview;
use matchstats_core::{AveragedStatRecord, LeagueReport, MatchSpan, StatsReport};

use crate::cli::OutputFormat;

pub const NO_MATCHES: &str = "no matches found";

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    player: &'a PlayerRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<&'a PlayerProfile>,
    #[serde(flatten)]
    report: &'a T,
}

/// A labelled averaged record, one table column or CSV row.
struct Group<'a> {
    label: String,
    record: &'a AveragedStatRecord,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

pub fn render_stats<W: Write>(
    out: &mut W,
    format: OutputFormat,
    player: &PlayerRef,
    profile: Option<&PlayerProfile>,
    report: &StatsReport,
) -> anyhow::Result<()> {
    let Some(record) = report.record.as_ref() else {
        writeln!(out, "{NO_MATCHES}")?;
        return Ok(());
    };
    let groups = [Group {
        label: "overall".into(),
        record,
    }];

    match format {
        OutputFormat::Json => write_json(
            out,
            &Envelope {
                player,
                profile,
                report,
            },
        ),
        OutputFormat::Csv => write_csv(out, &groups),
        OutputFormat::Table => {
            writeln!(
                out,
                "{} ({}) | {} stats | {} of {} matchmaking matches",
                player.nickname, player.player_id, report.schema, report.aggregated, report.qualifying
            )?;
            write_profile(out, profile)?;
            write_span(out, report.span)?;
            if report.truncated {
                writeln!(out, "note: match history was cut short by an upstream error")?;
            }
            writeln!(out)?;
            write_group_table(out, &groups)
        }
    }
}

pub fn render_league<W: Write>(
    out: &mut W,
    format: OutputFormat,
    player: &PlayerRef,
    profile: Option<&PlayerProfile>,
    report: &LeagueReport,
) -> anyhow::Result<()> {
    let Some(overall) = report.overall.as_ref() else {
        writeln!(out, "{NO_MATCHES}")?;
        return Ok(());
    };

    let mut groups = vec![Group {
        label: "overall".into(),
        record: overall,
    }];
    groups.extend(report.seasons.iter().map(|s| Group {
        label: s.group.clone(),
        record: &s.record,
    }));
    if let Some(unclassified) = report.unclassified.as_ref() {
        groups.push(Group {
            label: "unclassified".into(),
            record: unclassified,
        });
    }

    match format {
        OutputFormat::Json => write_json(
            out,
            &Envelope {
                player,
                profile,
                report,
            },
        ),
        OutputFormat::Csv => write_csv(out, &groups),
        OutputFormat::Table => {
            writeln!(
                out,
                "{} ({}) | league {} stats | {} matches over {} season(s)",
                player.nickname,
                player.player_id,
                report.schema,
                report.total_matches,
                report.seasons.len()
            )?;
            write_profile(out, profile)?;
            write_span(out, report.span)?;
            if report.unclassified_count > 0 {
                writeln!(
                    out,
                    "{} league match(es) had an unrecognised name",
                    report.unclassified_count
                )?;
            }
            if report.truncated {
                writeln!(out, "note: match history was cut short by an upstream error")?;
            }
            writeln!(out)?;
            write_group_table(out, &groups)
        }
    }
}

pub fn render_team<W: Write>(
    out: &mut W,
    format: OutputFormat,
    overview: &TeamOverview,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => write_json(out, overview),
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(["map", "matches", "wins", "win_rate"])?;
            for map in &overview.maps {
                writer.write_record([
                    map.map.clone(),
                    map.matches.to_string(),
                    map.wins.to_string(),
                    format!("{:.2}", map.win_rate),
                ])?;
            }
            writer.flush().context("failed to write CSV")?;
            Ok(())
        }
        OutputFormat::Table => {
            let info = &overview.info;
            let life = &overview.lifetime;
            writeln!(out, "{} ({})", info.name, info.team_id)?;
            writeln!(
                out,
                "{} matches, {} wins ({:.2}%), current streak {}, longest streak {}",
                life.matches, life.wins, life.win_rate, life.current_streak, life.longest_streak
            )?;
            let recent: String = life
                .recent_results
                .iter()
                .map(|won| if *won { 'W' } else { 'L' })
                .collect();
            if !recent.is_empty() {
                writeln!(out, "recent: {recent}")?;
            }

            writeln!(out)?;
            let rows: Vec<Vec<String>> = info
                .members
                .iter()
                .map(|m| vec![m.nickname.clone(), m.elo.to_string()])
                .collect();
            write_table(out, &["player".into(), "elo".into()], &rows)?;

            if !overview.maps.is_empty() {
                writeln!(out)?;
                let rows: Vec<Vec<String>> = overview
                    .maps
                    .iter()
                    .map(|m| {
                        vec![
                            m.map.clone(),
                            m.matches.to_string(),
                            m.wins.to_string(),
                            format!("{:.2}", m.win_rate),
                        ]
                    })
                    .collect();
                write_table(
                    out,
                    &["map".into(), "matches".into(), "wins".into(), "win %".into()],
                    &rows,
                )?;
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialize report")?;
    writeln!(out)?;
    Ok(())
}

/// One row per group: label, match count, then every stat in schema order.
fn write_csv<W: Write>(out: &mut W, groups: &[Group<'_>]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if let Some(first) = groups.first() {
        let mut header = vec!["group".to_owned(), "match_count".to_owned()];
        header.extend(first.record.stats.iter().map(|(name, _)| name.clone()));
        writer.write_record(&header)?;
    }
    for group in groups {
        let mut row = vec![group.label.clone(), group.record.match_count.to_string()];
        row.extend(group.record.stats.iter().map(|(_, v)| format!("{v:.2}")));
        writer.write_record(&row)?;
    }
    writer.flush().context("failed to write CSV")?;
    Ok(())
}

/// Stats down the side, one column per group.
fn write_group_table<W: Write>(out: &mut W, groups: &[Group<'_>]) -> anyhow::Result<()> {
    let Some(first) = groups.first() else {
        return Ok(());
    };
    let mut headers = vec!["stat".to_owned()];
    headers.extend(groups.iter().map(|g| g.label.clone()));

    let mut rows = vec![{
        let mut row = vec!["matches".to_owned()];
        row.extend(groups.iter().map(|g| g.record.match_count.to_string()));
        row
    }];
    for (idx, (name, _)) in first.record.stats.iter().enumerate() {
        let mut row = vec![name.clone()];
        row.extend(groups.iter().map(|g| {
            g.record
                .stats
                .get(idx)
                .map(|(_, v)| format!("{v:.2}"))
                .unwrap_or_default()
        }));
        rows.push(row);
    }
    write_table(out, &headers, &rows)
}

/// First column left-aligned, the rest right-aligned.
fn write_table<W: Write>(out: &mut W, headers: &[String], rows: &[Vec<String>]) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(idx) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(idx, (cell, &width))| {
                if idx == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    writeln!(out, "{}", line(headers))?;
    for row in rows {
        writeln!(out, "{}", line(row.as_slice()))?;
    }
    Ok(())
}

fn write_profile<W: Write>(out: &mut W, profile: Option<&PlayerProfile>) -> anyhow::Result<()> {
    if let Some(profile) = profile {
        let level = profile
            .skill_level
            .map_or_else(|| "-".to_owned(), |level| level.to_string());
        writeln!(out, "elo {} | level {}", profile.elo, level)?;
    }
    Ok(())
}

fn write_span<W: Write>(out: &mut W, span: Option<MatchSpan>) -> anyhow::Result<()> {
    if let Some(span) = span {
        writeln!(
            out,
            "matches played {} to {}",
            span.first.format("%Y-%m-%d"),
            span.last.format("%Y-%m-%d")
        )?;
    }
    Ok(())
}

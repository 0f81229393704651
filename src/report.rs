//! Timeline report.
//!
//! Post-processes a solved schedule for display: contiguous idle gaps per
//! station, a flat list of timeline bars (jobs and idle blocks) with
//! wall-clock times, and a per-station cost annotation. The model's
//! aggregate idle value is used for costing only; the gaps here are
//! reconstructed from the rows.

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::config::ReportConfig;
use crate::models::{CarId, JobTypeId, ScheduledJob, ShopProblem, StationId};
use crate::scheduler::SolveOutcome;

/// A free interval `[start, finish)` on a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleGap {
    pub start: i64,
    pub finish: i64,
}

impl IdleGap {
    pub fn duration(&self) -> i64 {
        self.finish - self.start
    }
}

/// Idle gaps on one station.
///
/// Returns the complement of the rows' intervals within
/// `[0, max(shift_minutes, last finish)]`. Zero-length rows are ignored.
pub fn idle_gaps(rows: &[ScheduledJob], shift_minutes: i64) -> Vec<IdleGap> {
    let mut busy: Vec<(i64, i64)> = rows
        .iter()
        .filter(|r| r.finish > r.start)
        .map(|r| (r.start, r.finish))
        .collect();
    busy.sort_unstable();

    let mut gaps = Vec::new();
    let mut cursor = 0;
    for (start, finish) in busy {
        if start > cursor {
            gaps.push(IdleGap {
                start: cursor,
                finish: start,
            });
        }
        cursor = cursor.max(finish);
    }
    if cursor < shift_minutes {
        gaps.push(IdleGap {
            start: cursor,
            finish: shift_minutes,
        });
    }
    gaps
}

/// What a timeline bar represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BarKind {
    Job { car: CarId, job: JobTypeId },
    Idle,
}

/// One bar of the station timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub station: StationId,
    #[serde(flatten)]
    pub kind: BarKind,
    /// Minutes from the origin.
    pub start: i64,
    pub finish: i64,
    pub start_at: NaiveDateTime,
    pub finish_at: NaiveDateTime,
    pub label: String,
}

impl TimelineEntry {
    fn new(station: StationId, kind: BarKind, start: i64, finish: i64, origin: NaiveDateTime) -> Self {
        let label = match kind {
            BarKind::Job { car, .. } => format!("car {car}"),
            BarKind::Idle => format!("idle = {} m", finish - start),
        };
        Self {
            station,
            kind,
            start,
            finish,
            start_at: wall_clock(origin, start),
            finish_at: wall_clock(origin, finish),
            label,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.kind == BarKind::Idle
    }
}

/// Timeline bars for every station, ascending by station then start.
///
/// Job bars are labelled `car <id>`, idle bars `idle = <n> m`. A station
/// without jobs gets one idle bar over its whole shift.
pub fn build_timeline(
    outcome: &SolveOutcome,
    problem: &ShopProblem,
    origin: NaiveDateTime,
) -> Vec<TimelineEntry> {
    let mut entries = Vec::new();

    for station in problem.stations.values() {
        let r = station.id;
        let rows: Vec<ScheduledJob> = outcome
            .schedule
            .jobs_for_station(r)
            .into_iter()
            .filter(|j| j.finish > j.start)
            .copied()
            .collect();

        let mut bars: Vec<TimelineEntry> = idle_gaps(&rows, station.shift_minutes)
            .into_iter()
            .map(|gap| TimelineEntry::new(r, BarKind::Idle, gap.start, gap.finish, origin))
            .collect();
        bars.extend(rows.iter().map(|row| {
            TimelineEntry::new(
                r,
                BarKind::Job {
                    car: row.car,
                    job: row.job,
                },
                row.start,
                row.finish,
                origin,
            )
        }));
        bars.sort_by_key(|b| (b.start, b.finish));
        entries.extend(bars);
    }

    entries
}

/// Cost summary shown next to a station's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationAnnotation {
    pub station: StationId,
    pub cost: f64,
    pub overtime: i64,
    pub idle: i64,
    /// `shift + cap`; `None` when overtime is uncapped.
    pub max_minutes: Option<i64>,
    /// Minute right after the later of shift end and last finish.
    pub anchor: i64,
    pub anchor_at: NaiveDateTime,
    pub text: String,
}

/// One annotation per station, ascending.
pub fn station_annotations(
    outcome: &SolveOutcome,
    problem: &ShopProblem,
    origin: NaiveDateTime,
) -> Vec<StationAnnotation> {
    problem
        .stations
        .values()
        .map(|station| {
            let stats = outcome
                .station_stats
                .get(&station.id)
                .copied()
                .unwrap_or_default();
            let max_minutes = station.max_minutes();
            let mut text = format!(
                "cost {:.1} / OT {}m / idle {}m",
                stats.cost, stats.overtime, stats.idle
            );
            if let Some(max) = max_minutes {
                text.push_str(&format!(" / Max {max}m"));
            }
            let anchor = outcome
                .schedule
                .last_finish(station.id)
                .max(station.shift_minutes)
                + 1;
            StationAnnotation {
                station: station.id,
                cost: stats.cost,
                overtime: stats.overtime,
                idle: stats.idle,
                max_minutes,
                anchor,
                anchor_at: wall_clock(origin, anchor),
                text,
            }
        })
        .collect()
}

/// Timeline and annotations together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub timeline: Vec<TimelineEntry>,
    pub annotations: Vec<StationAnnotation>,
}

impl ScheduleReport {
    pub fn build(outcome: &SolveOutcome, problem: &ShopProblem, config: &ReportConfig) -> Self {
        Self {
            timeline: build_timeline(outcome, problem, config.origin),
            annotations: station_annotations(outcome, problem, config.origin),
        }
    }
}

fn wall_clock(origin: NaiveDateTime, minutes: i64) -> NaiveDateTime {
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| origin.checked_add_signed(delta))
        .unwrap_or(origin)
}

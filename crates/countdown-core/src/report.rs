//! Tables and series behind the Logs, Calendar and Trends windows.

use chrono::{Datelike, NaiveDate, NaiveTime};
use std::collections::BTreeMap;
use std::path::Path;

use crate::calendar::{add_months, date_key, month_start, shift_days};
use crate::color::Rgb;
use crate::format::{format_hms, format_hours_clock, format_long, format_percent};
use crate::log_store::{ClockTime, LogBook, LogEntry, LogFile};
use crate::profile::{color_key, palette_color, ProfileRegistry};
use crate::settings::{SettingsStore, UiSettings};
use crate::tracker::Tracker;

pub const CALENDAR_SCALE_MINUTES_MIN: u32 = 5;
pub const CALENDAR_SCALE_MINUTES_MAX: u32 = 120;
const SECONDS_PER_DAY: i64 = 24 * 3600;

/// One profile's loaded log together with the goal used where a day has none.
#[derive(Debug, Clone)]
pub struct ProfileLog {
    pub label: String,
    pub book: LogBook,
    pub fallback_goal_seconds: i64,
}

/// Resolves the line, dot and fill colors of each profile.
#[derive(Debug, Clone)]
pub struct ProfileColors {
    explicit: BTreeMap<String, Rgb>,
    active: String,
    line: Rgb,
    dot: Rgb,
    fill: Rgb,
}

impl ProfileColors {
    pub fn new(explicit: BTreeMap<String, Rgb>, active: &str, ui: &UiSettings) -> Self {
        Self {
            explicit,
            active: active.to_owned(),
            line: ui.graph_line_color,
            dot: ui.graph_dot_color,
            fill: ui.graph_fill_color,
        }
    }

    fn pick(&self, label: &str, active_color: Rgb) -> Rgb {
        if let Some(color) = self.explicit.get(&color_key(label)) {
            return *color;
        }
        if label == self.active {
            active_color
        } else {
            palette_color(label)
        }
    }

    pub fn line(&self, label: &str) -> Rgb {
        self.pick(label, self.line)
    }

    pub fn dot(&self, label: &str) -> Rgb {
        self.pick(label, self.dot)
    }

    pub fn fill(&self, label: &str) -> Rgb {
        self.pick(label, self.fill)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogRange {
    #[default]
    Day,
    Week,
}

impl LogRange {
    pub fn label(self) -> &'static str {
        match self {
            LogRange::Day => "Day",
            LogRange::Week => "Week (7 days)",
        }
    }

    /// First and last day shown when `selected` is picked.
    pub fn span(self, selected: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            LogRange::Day => (selected, selected),
            LogRange::Week => (selected, shift_days(selected, 6)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub date: String,
    pub profile: Option<String>,
    pub started: String,
    pub paused: String,
    pub duration: String,
    pub percent: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTable {
    pub rows: Vec<LogRow>,
    /// Row tint per row when several profiles are listed.
    pub row_colors: Vec<Option<Rgb>>,
    pub goal_text: String,
    /// `Week total: H:MM:SS` for the seven-day range.
    pub week_total: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl LogTable {
    pub fn headers(&self, all_profiles: bool) -> &'static [&'static str] {
        if all_profiles {
            &["Date", "Profile", "Started", "Paused", "Duration", "% Goal"]
        } else {
            &["Date", "Started", "Paused", "Duration", "% Goal"]
        }
    }
}

/// Rows of the Logs window. With more than one profile the table gains a
/// profile column and percentages use the goal stored with each row.
pub fn log_table(
    logs: &[ProfileLog],
    all_profiles: bool,
    selected: NaiveDate,
    range: LogRange,
    colors: Option<&ProfileColors>,
) -> LogTable {
    let (start, end) = range.span(selected);
    let goal_for = |log: &ProfileLog, date: NaiveDate| {
        log.book
            .goals
            .get(&date)
            .copied()
            .unwrap_or(log.fallback_goal_seconds)
    };

    let mut picked: Vec<(&ProfileLog, &LogEntry)> = logs
        .iter()
        .flat_map(|log| log.book.entries.iter().map(move |entry| (log, entry)))
        .filter(|(_, entry)| entry.date >= start && entry.date <= end)
        .collect();
    // Unknown start times list after every clock time of the day.
    picked.sort_by_key(|(_, entry)| {
        (entry.date, entry.start_time.time().is_none(), entry.start_time)
    });

    let mut rows = Vec::with_capacity(picked.len());
    let mut row_colors = Vec::with_capacity(picked.len());
    for (log, entry) in picked {
        let goal = if all_profiles {
            entry.goal_seconds
        } else {
            goal_for(log, entry.date)
        };
        rows.push(LogRow {
            date: date_key(entry.date),
            profile: all_profiles.then(|| log.label.clone()),
            started: entry.start_time.to_string(),
            paused: entry.end_time.to_string(),
            duration: format_hms(entry.duration_seconds),
            percent: format_percent(entry.duration_seconds, goal),
        });
        row_colors.push(
            colors
                .filter(|_| all_profiles)
                .map(|colors| colors.line(&log.label)),
        );
    }

    let goal_text = match logs.first() {
        Some(log) if !all_profiles => {
            let goal = goal_for(log, selected);
            if goal > 0 {
                format!("Daily super goal: {}", format_hms(goal))
            } else {
                "Daily super goal: not set".to_owned()
            }
        }
        _ => "Daily super goal: varies by profile".to_owned(),
    };

    let week_total = (range == LogRange::Week).then(|| {
        let total: i64 = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| logs.iter().map(|log| log.book.total_for(date)).sum::<i64>())
            .sum();
        format!("Week total: {}", format_hours_clock(total))
    });

    LogTable {
        rows,
        row_colors,
        goal_text,
        week_total,
        start,
        end,
    }
}

/// Seconds logged on each of the seven days starting at `week_start`.
pub fn week_day_totals<'a, I>(entries: I, week_start: NaiveDate) -> [i64; 7]
where
    I: IntoIterator<Item = &'a LogEntry>,
{
    let mut totals = [0; 7];
    for entry in entries {
        if entry.duration_seconds <= 0 {
            continue;
        }
        let index = (entry.date - week_start).num_days();
        if (0..7).contains(&index) {
            totals[index as usize] += entry.duration_seconds;
        }
    }
    totals
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarBlock {
    pub day_index: u32,
    pub start_seconds: i64,
    pub end_seconds: i64,
    pub label: String,
    pub color: Rgb,
    pub profile: String,
}

pub fn format_clock_time(time: NaiveTime, use_24h: bool) -> String {
    if use_24h {
        time.format("%H:%M").to_string()
    } else {
        time.format("%-I:%M %p").to_string()
    }
}

pub fn format_hour_label(hour: u32, use_24h: bool) -> String {
    let time = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    if use_24h {
        time.format("%H:%M").to_string()
    } else {
        time.format("%-I %p").to_string()
    }
}

/// Compact block duration: `45s`, `20m`, `2h`, `1h 5m`.
pub fn format_block_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    let (hours, rem) = (minutes / 60, minutes % 60);
    match (hours, rem) {
        (0, _) => format!("{minutes}m"),
        (_, 0) => format!("{hours}h"),
        _ => format!("{hours}h {rem}m"),
    }
}

/// Session blocks inside the week starting at `week_start`. Entries without a
/// known start, or that would wrap past midnight, are left out.
pub fn calendar_blocks<'a, I>(entries: I, week_start: NaiveDate, use_24h: bool) -> Vec<CalendarBlock>
where
    I: IntoIterator<Item = (&'a LogEntry, &'a str, Rgb)>,
{
    let mut blocks: Vec<CalendarBlock> = entries
        .into_iter()
        .filter_map(|(entry, profile, color)| {
            let day_index = (entry.date - week_start).num_days();
            if !(0..7).contains(&day_index) {
                return None;
            }
            let start = entry.start_time.time()?;
            let end = match entry.end_time {
                ClockTime::At(end) => end,
                ClockTime::Unknown if entry.duration_seconds > 0 => entry
                    .start_time
                    .plus_seconds(entry.duration_seconds)
                    .time()?,
                ClockTime::Unknown => return None,
            };
            let start_seconds = ClockTime::At(start).seconds()?.clamp(0, SECONDS_PER_DAY);
            let end_seconds = ClockTime::At(end).seconds()?.clamp(0, SECONDS_PER_DAY);
            if end_seconds <= start_seconds {
                return None;
            }
            Some(CalendarBlock {
                day_index: day_index as u32,
                start_seconds,
                end_seconds,
                label: format!(
                    "{} - {}",
                    format_clock_time(start, use_24h),
                    format_clock_time(end, use_24h)
                ),
                color,
                profile: profile.to_owned(),
            })
        })
        .collect();
    blocks.sort_by_key(|block| (block.day_index, block.start_seconds));
    blocks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendRange {
    #[default]
    Days7,
    Days30,
    Days90,
    Days365,
    Months12,
}

impl TrendRange {
    pub const ALL: [TrendRange; 5] = [
        TrendRange::Days7,
        TrendRange::Days30,
        TrendRange::Days90,
        TrendRange::Days365,
        TrendRange::Months12,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TrendRange::Days7 => "7 days",
            TrendRange::Days30 => "30 days",
            TrendRange::Days90 => "90 days",
            TrendRange::Days365 => "365 days",
            TrendRange::Months12 => "12 months",
        }
    }

    pub fn point_count(self) -> usize {
        match self {
            TrendRange::Days7 => 7,
            TrendRange::Days30 => 30,
            TrendRange::Days90 => 90,
            TrendRange::Days365 => 365,
            TrendRange::Months12 => 12,
        }
    }

    pub fn is_monthly(self) -> bool {
        self == TrendRange::Months12
    }

    /// Days (or month starts) ending with the one containing `today`.
    pub fn dates(self, today: NaiveDate) -> Vec<NaiveDate> {
        let count = self.point_count();
        if self.is_monthly() {
            let current = month_start(today);
            return (0..count as i32)
                .rev()
                .filter_map(|back| add_months(current, -back))
                .collect();
        }
        let first = shift_days(today, -(count as i64 - 1));
        first.iter_days().take(count).collect()
    }

    pub fn values(self, totals: &BTreeMap<NaiveDate, i64>, dates: &[NaiveDate]) -> Vec<i64> {
        if !self.is_monthly() {
            return dates
                .iter()
                .map(|date| totals.get(date).copied().unwrap_or(0))
                .collect();
        }
        let mut monthly: BTreeMap<(i32, u32), i64> = BTreeMap::new();
        for (date, seconds) in totals {
            *monthly.entry((date.year(), date.month())).or_insert(0) += *seconds;
        }
        dates
            .iter()
            .map(|date| {
                monthly
                    .get(&(date.year(), date.month()))
                    .copied()
                    .unwrap_or(0)
            })
            .collect()
    }

    pub fn date_label(self, date: NaiveDate) -> String {
        if self.is_monthly() {
            date.format("%b %Y").to_string()
        } else {
            date_key(date)
        }
    }

    pub fn axis_label(self, date: NaiveDate) -> String {
        if self.is_monthly() {
            date.format("%b").to_string()
        } else {
            date.format("%m-%d").to_string()
        }
    }
}

/// Which x-axis positions get a label: all of them up to seven points, else
/// every `ceil(count / 7)`-th.
pub fn label_indices(count: usize, show_all: bool) -> Vec<usize> {
    if show_all || count <= 7 {
        return (0..count).collect();
    }
    let step = count.div_ceil(7).max(1);
    (0..count).step_by(step).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub label: String,
    pub values: Vec<i64>,
    pub line: Rgb,
    pub dot: Rgb,
    pub fill: Rgb,
}

pub fn trend_series(
    logs: &[ProfileLog],
    range: TrendRange,
    dates: &[NaiveDate],
    colors: &ProfileColors,
) -> Vec<TrendSeries> {
    logs.iter()
        .map(|log| TrendSeries {
            label: log.label.clone(),
            values: range.values(&log.book.totals, dates),
            line: colors.line(&log.label),
            dot: colors.dot(&log.label),
            fill: colors.fill(&log.label),
        })
        .collect()
}

/// Hover text for one x position, listing profiles with activity.
pub fn trend_tooltip(
    range: TrendRange,
    date: NaiveDate,
    index: usize,
    series: &[&TrendSeries],
) -> String {
    let mut lines = vec![format!("Date: {}", range.date_label(date))];
    let before = lines.len();
    for entry in series {
        let seconds = entry.values.get(index).copied().unwrap_or(0);
        if seconds > 0 {
            lines.push(format!("{}: {}", entry.label, format_long(seconds)));
        }
    }
    if lines.len() == before {
        lines.push("No activity".to_owned());
    }
    lines.join("\n")
}

/// Every profile's log in display order. The active profile comes from the
/// tracker so entries written this run are included; a log that cannot be read
/// shows up empty.
pub fn load_profile_logs(
    data_dir: &Path,
    registry: &ProfileRegistry,
    settings: &mut SettingsStore,
    active: &Tracker,
) -> Vec<ProfileLog> {
    registry
        .labels()
        .into_iter()
        .map(|label| {
            if label == active.label() {
                return ProfileLog {
                    book: active.book().clone(),
                    fallback_goal_seconds: active.super_goal_seconds(),
                    label,
                };
            }
            let fallback_goal_seconds = settings.profile_super_goal(&label);
            let log = LogFile::new(registry.file_path(data_dir, &label));
            let book = log.load(fallback_goal_seconds).unwrap_or_else(|err| {
                tracing::warn!(profile = %label, "failed to load profile log: {err:#}");
                LogBook::default()
            });
            ProfileLog {
                label,
                book,
                fallback_goal_seconds,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> ClockTime {
        ClockTime::At(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn entry(day: NaiveDate, start: ClockTime, seconds: i64, goal: i64) -> LogEntry {
        LogEntry {
            date: day,
            start_time: start,
            end_time: start.plus_seconds(seconds),
            duration_seconds: seconds,
            goal_seconds: goal,
        }
    }

    fn profile(label: &str, entries: Vec<LogEntry>, fallback: i64) -> ProfileLog {
        let mut book = LogBook::default();
        for item in entries {
            book.goals.insert(item.date, item.goal_seconds);
            book.push(item);
        }
        ProfileLog {
            label: label.to_owned(),
            book,
            fallback_goal_seconds: fallback,
        }
    }

    #[test]
    fn day_table_for_one_profile() {
        let day = date(2024, 5, 10);
        let log = profile(
            "Output",
            vec![
                entry(day, time(14, 0), 900, 3_600),
                entry(day, time(9, 0), 1_800, 3_600),
                entry(date(2024, 5, 11), time(9, 0), 60, 3_600),
            ],
            7_200,
        );
        let table = log_table(&[log], false, day, LogRange::Day, None);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].started, "09:00:00");
        assert_eq!(table.rows[0].paused, "09:30:00");
        assert_eq!(table.rows[0].duration, "0h 30m 0s");
        assert_eq!(table.rows[0].percent, "50%");
        assert_eq!(table.rows[0].profile, None);
        assert_eq!(table.goal_text, "Daily super goal: 1h 0m 0s");
        assert_eq!(table.week_total, None);
    }

    #[test]
    fn unknown_start_times_sort_last() {
        let day = date(2024, 5, 10);
        let log = profile(
            "Output",
            vec![
                entry(day, ClockTime::Unknown, 300, 3_600),
                entry(day, time(21, 0), 600, 3_600),
                entry(day, time(7, 0), 600, 3_600),
            ],
            3_600,
        );
        let table = log_table(&[log], false, day, LogRange::Day, None);
        let started: Vec<&str> = table.rows.iter().map(|row| row.started.as_str()).collect();
        assert_eq!(started, ["07:00:00", "21:00:00", "N/A"]);
    }

    #[test]
    fn week_table_across_profiles() {
        let start = date(2024, 5, 6);
        let colors = ProfileColors::new(BTreeMap::new(), "Output", &UiSettings::default());
        let output = profile("Output", vec![entry(start, time(8, 0), 3_600, 0)], 0);
        let soroban = profile(
            "Soroban",
            vec![
                entry(shift_days(start, 6), time(8, 0), 1_800, 3_600),
                entry(shift_days(start, 7), time(8, 0), 999, 3_600),
            ],
            0,
        );
        let table = log_table(&[output, soroban], true, start, LogRange::Week, Some(&colors));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].profile.as_deref(), Some("Soroban"));
        assert_eq!(table.rows[0].percent, "N/A");
        assert_eq!(table.rows[1].percent, "50%");
        assert_eq!(table.week_total.as_deref(), Some("Week total: 1:30:00"));
        assert_eq!(table.goal_text, "Daily super goal: varies by profile");
        assert_eq!(table.row_colors[0], Some(UiSettings::default().graph_line_color));
        assert_eq!(table.headers(true).len(), 6);
    }

    #[test]
    fn calendar_blocks_skip_unknown_and_wrapping_entries() {
        let monday = date(2024, 5, 6);
        let color = Rgb::new(1, 2, 3);
        let entries = [
            entry(shift_days(monday, 2), time(13, 0), 5_400, 0),
            entry(monday, time(23, 30), 3_600, 0),
            entry(monday, ClockTime::Unknown, 600, 0),
            entry(shift_days(monday, 1), time(6, 15), 900, 0),
            entry(shift_days(monday, 7), time(6, 15), 900, 0),
        ];
        let blocks = calendar_blocks(
            entries.iter().map(|item| (item, "Output", color)),
            monday,
            true,
        );
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].day_index, 1);
        assert_eq!(blocks[0].label, "06:15 - 06:30");
        assert_eq!(blocks[1].start_seconds, 13 * 3600);
        assert_eq!(blocks[1].end_seconds, 14 * 3600 + 1_800);

        let twelve_hour = calendar_blocks(
            entries[..1].iter().map(|item| (item, "Output", color)),
            monday,
            false,
        );
        assert_eq!(twelve_hour[0].label, "1:00 PM - 2:30 PM");
    }

    #[test]
    fn week_totals_by_day() {
        let monday = date(2024, 5, 6);
        let entries = [
            entry(monday, time(8, 0), 60, 0),
            entry(monday, time(9, 0), 30, 0),
            entry(shift_days(monday, 6), time(9, 0), 10, 0),
            entry(shift_days(monday, -1), time(9, 0), 999, 0),
        ];
        assert_eq!(week_day_totals(&entries, monday), [90, 0, 0, 0, 0, 0, 10]);
    }

    #[test]
    fn trend_dates_and_values() {
        let today = date(2024, 3, 15);
        let daily = TrendRange::Days7.dates(today);
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0], date(2024, 3, 9));
        assert_eq!(daily[6], today);

        let months = TrendRange::Months12.dates(today);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], date(2023, 4, 1));
        assert_eq!(months[11], date(2024, 3, 1));

        let mut totals = BTreeMap::new();
        totals.insert(date(2024, 3, 1), 100);
        totals.insert(date(2024, 3, 15), 50);
        totals.insert(date(2023, 4, 30), 7);
        assert_eq!(TrendRange::Days7.values(&totals, &daily)[6], 50);
        let monthly = TrendRange::Months12.values(&totals, &months);
        assert_eq!(monthly[0], 7);
        assert_eq!(monthly[11], 150);
        assert_eq!(TrendRange::Months12.date_label(months[0]), "Apr 2023");
    }

    #[test]
    fn axis_labels_thin_out() {
        assert_eq!(label_indices(5, false), vec![0, 1, 2, 3, 4]);
        assert_eq!(label_indices(30, false), vec![0, 5, 10, 15, 20, 25]);
        assert_eq!(label_indices(30, true).len(), 30);
    }

    #[test]
    fn tooltip_lists_active_profiles() {
        let series = TrendSeries {
            label: "Output".to_owned(),
            values: vec![0, 3_661],
            line: Rgb::new(0, 0, 0),
            dot: Rgb::new(0, 0, 0),
            fill: Rgb::new(0, 0, 0),
        };
        let day = date(2024, 5, 1);
        assert_eq!(
            trend_tooltip(TrendRange::Days7, day, 1, &[&series]),
            "Date: 2024-05-01\nOutput: 1 hours 1 min 1 sec"
        );
        assert_eq!(
            trend_tooltip(TrendRange::Days7, day, 0, &[&series]),
            "Date: 2024-05-01\nNo activity"
        );
    }

    #[test]
    fn colors_prefer_explicit_then_active_then_palette() {
        let ui = UiSettings::default();
        let mut explicit = BTreeMap::new();
        explicit.insert("soroban".to_owned(), Rgb::new(9, 9, 9));
        let colors = ProfileColors::new(explicit, "Output", &ui);
        assert_eq!(colors.line("Soroban"), Rgb::new(9, 9, 9));
        assert_eq!(colors.dot("Output"), ui.graph_dot_color);
        assert_eq!(colors.fill("Kanji"), palette_color("Kanji"));
        assert_eq!(format_block_duration(45), "45s");
        assert_eq!(format_block_duration(3_900), "1h 5m");
        assert_eq!(format_block_duration(7_200), "2h");
    }

    #[test]
    fn loads_every_profile_with_active_from_memory() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let registry = ProfileRegistry::new(["Kanji"]);
        let mut settings = SettingsStore::open(dir.path().join("settings.ini"));
        let output = LogFile::new(registry.file_path(dir.path(), "Output"));
        output.append_entry(&entry(date(2024, 5, 1), time(9, 0), 600, 3_600))?;

        let mut tracker = Tracker::open(dir.path(), &registry, "Kanji", &mut settings)?;
        tracker.add_time(date(2024, 5, 2), NaiveTime::from_hms_opt(8, 0, 0).unwrap(), 900)?;

        let logs = load_profile_logs(dir.path(), &registry, &mut settings, &tracker);
        assert_eq!(logs.len(), 7);
        let output = logs.iter().find(|log| log.label == "Output").unwrap();
        assert_eq!(output.book.total_for(date(2024, 5, 1)), 600);
        assert_eq!(output.fallback_goal_seconds, 7_200);
        let kanji = logs.last().unwrap();
        assert_eq!(kanji.label, "Kanji");
        assert_eq!(kanji.book.total_for(date(2024, 5, 2)), 900);
        Ok(())
    }
}

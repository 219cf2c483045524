use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, Timelike};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::calendar::{date_key, parse_date_key};

pub const LOG_HEADER: [&str; 5] = [
    "date",
    "start_time",
    "end_time",
    "duration_seconds",
    "goal_seconds",
];
const LEGACY_TIME_COLUMN: &str = "time";
const GOAL_MARKER: &str = "goal";
const UNKNOWN_TIME: &str = "N/A";

/// Wall-clock time of a session boundary; legacy rows may not carry one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClockTime {
    Unknown,
    At(NaiveTime),
}

impl ClockTime {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
            .map(ClockTime::At)
            .unwrap_or(ClockTime::Unknown)
    }

    pub fn time(self) -> Option<NaiveTime> {
        match self {
            ClockTime::At(time) => Some(time),
            ClockTime::Unknown => None,
        }
    }

    /// Seconds since midnight.
    pub fn seconds(self) -> Option<i64> {
        self.time()
            .map(|time| i64::from(time.num_seconds_from_midnight()))
    }

    /// Adds `seconds`, wrapping past midnight.
    pub fn plus_seconds(self, seconds: i64) -> Self {
        match self {
            ClockTime::At(time) => {
                ClockTime::At(time.overflowing_add_signed(chrono::Duration::seconds(seconds)).0)
            }
            ClockTime::Unknown => ClockTime::Unknown,
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockTime::At(time) => write!(f, "{}", time.format("%H:%M:%S")),
            ClockTime::Unknown => f.write_str(UNKNOWN_TIME),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub duration_seconds: i64,
    pub goal_seconds: i64,
}

impl LogEntry {
    fn to_record(&self) -> [String; 5] {
        [
            date_key(self.date),
            self.start_time.to_string(),
            self.end_time.to_string(),
            self.duration_seconds.to_string(),
            self.goal_seconds.to_string(),
        ]
    }
}

/// Everything loaded from one profile's log: session entries, per-day totals and
/// the goal recorded for each day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBook {
    pub entries: Vec<LogEntry>,
    pub totals: BTreeMap<NaiveDate, i64>,
    pub goals: BTreeMap<NaiveDate, i64>,
}

impl LogBook {
    pub fn push(&mut self, entry: LogEntry) {
        *self.totals.entry(entry.date).or_insert(0) += entry.duration_seconds;
        self.entries.push(entry);
    }

    pub fn total_for(&self, date: NaiveDate) -> i64 {
        self.totals.get(&date).copied().unwrap_or(0)
    }

    /// Removes one entry equal to `entry`, preferring `hint` when it still points at it.
    /// The day's total is lowered and dropped once it reaches zero.
    pub fn remove_entry(&mut self, entry: &LogEntry, hint: Option<usize>) -> bool {
        let idx = match hint.filter(|idx| self.entries.get(*idx) == Some(entry)) {
            Some(idx) => idx,
            None => match self.entries.iter().rposition(|existing| existing == entry) {
                Some(idx) => idx,
                None => return false,
            },
        };
        let removed = self.entries.remove(idx);
        let updated = (self.total_for(removed.date) - removed.duration_seconds).max(0);
        if updated <= 0 {
            self.totals.remove(&removed.date);
        } else {
            self.totals.insert(removed.date, updated);
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct LogColumns {
    date: Option<usize>,
    start_time: Option<usize>,
    legacy_time: Option<usize>,
    end_time: Option<usize>,
    duration: Option<usize>,
    goal: Option<usize>,
}

impl LogColumns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|header| header.trim() == name);
        Self {
            date: find("date"),
            start_time: find("start_time"),
            legacy_time: find(LEGACY_TIME_COLUMN),
            end_time: find("end_time"),
            duration: find("duration_seconds"),
            goal: find("goal_seconds"),
        }
    }

    fn needs_migration(&self) -> bool {
        self.legacy_time.is_some()
            || self.start_time.is_none()
            || self.end_time.is_none()
            || self.goal.is_none()
    }
}

/// One profile's CSV session log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file with a header row when it is missing or empty.
    pub fn ensure(&self) -> Result<()> {
        let is_empty = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);
        if !is_empty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create log directory: {}", parent.display())
            })?;
        }
        let mut writer = WriterBuilder::new()
            .from_path(&self.path)
            .with_context(|| format!("failed to create log file: {}", self.path.display()))?;
        writer
            .write_record(LOG_HEADER)
            .context("failed to write log header")?;
        writer.flush().context("failed to flush log header")?;
        Ok(())
    }

    /// Reads the whole log. Rows that cannot be understood are skipped; files in an
    /// older column layout are rewritten in the current one.
    pub fn load(&self, fallback_goal_seconds: i64) -> Result<LogBook> {
        self.ensure()?;
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("failed to open log file: {}", self.path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("failed to read log header: {}", self.path.display()))?
            .clone();
        let columns = LogColumns::from_headers(&headers);
        let fallback_goal = fallback_goal_seconds.max(0);

        let mut book = LogBook::default();
        let mut skipped = 0_usize;
        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(err) => {
                    tracing::debug!(path = %self.path.display(), "skipping unreadable log row: {err}");
                    skipped += 1;
                    continue;
                }
            };
            if !parse_row(&record, &columns, fallback_goal, &mut book) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            tracing::warn!(path = %self.path.display(), skipped, "ignored malformed log rows");
        }

        if columns.needs_migration() {
            tracing::info!(path = %self.path.display(), "migrating log file to current columns");
            self.rewrite(&book)?;
        }
        Ok(book)
    }

    pub fn append_entry(&self, entry: &LogEntry) -> Result<()> {
        self.append_record(&entry.to_record())
    }

    /// Records that `date`'s goal changed without adding any time.
    pub fn append_goal_update(&self, date: NaiveDate, goal_seconds: i64) -> Result<()> {
        self.append_record(&[
            date_key(date),
            GOAL_MARKER.to_owned(),
            GOAL_MARKER.to_owned(),
            "0".to_owned(),
            goal_seconds.to_string(),
        ])
    }

    /// Overwrites the file with `book`. Goals that the entries alone would not
    /// reproduce on reload are written as goal rows after the entries.
    pub fn rewrite(&self, book: &LogBook) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create log directory: {}", parent.display())
            })?;
        }
        let mut writer = WriterBuilder::new()
            .from_path(&self.path)
            .with_context(|| format!("failed to rewrite log file: {}", self.path.display()))?;
        writer
            .write_record(LOG_HEADER)
            .context("failed to write log header")?;

        let mut implied_goals: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for entry in &book.entries {
            writer
                .write_record(entry.to_record())
                .context("failed to write log row")?;
            implied_goals.insert(entry.date, entry.goal_seconds);
        }
        for (date, goal) in &book.goals {
            if implied_goals.get(date) != Some(goal) {
                writer
                    .write_record([
                        date_key(*date),
                        GOAL_MARKER.to_owned(),
                        GOAL_MARKER.to_owned(),
                        "0".to_owned(),
                        goal.to_string(),
                    ])
                    .context("failed to write goal row")?;
            }
        }
        writer.flush().context("failed to flush log file")?;
        Ok(())
    }

    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("failed to delete log file: {}", self.path.display()))?;
        }
        Ok(())
    }

    fn append_record(&self, record: &[String; 5]) -> Result<()> {
        self.ensure()?;
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open log file for append: {}", self.path.display()))?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer
            .write_record(record)
            .context("failed to append log row")?;
        writer.flush().context("failed to flush log row")?;
        Ok(())
    }
}

fn record_text<'a>(record: &'a StringRecord, idx: Option<usize>) -> Option<&'a str> {
    idx.and_then(|i| record.get(i)).map(str::trim)
}

/// Folds one CSV row into `book`. Returns false when the row had to be dropped.
fn parse_row(
    record: &StringRecord,
    columns: &LogColumns,
    fallback_goal: i64,
    book: &mut LogBook,
) -> bool {
    let Some(date) = record_text(record, columns.date)
        .filter(|value| !value.is_empty())
        .and_then(parse_date_key)
    else {
        return false;
    };
    let Some(duration_text) = record_text(record, columns.duration) else {
        return false;
    };

    let goal_seconds = record_text(record, columns.goal)
        .filter(|value| !value.is_empty())
        .map(|value| value.parse::<i64>().unwrap_or(fallback_goal))
        .unwrap_or(fallback_goal);
    book.goals.insert(date, goal_seconds);

    let Ok(duration_seconds) = duration_text.parse::<i64>() else {
        return false;
    };
    if duration_seconds <= 0 {
        // Goal rows and empty sessions only carry the goal.
        return true;
    }

    let start_text = if columns.start_time.is_some() {
        record_text(record, columns.start_time)
    } else {
        record_text(record, columns.legacy_time)
    };
    let start_time = start_text.map(ClockTime::parse).unwrap_or(ClockTime::Unknown);
    let end_time = match record_text(record, columns.end_time).filter(|value| !value.is_empty()) {
        Some(value) => ClockTime::parse(value),
        None => start_time.plus_seconds(duration_seconds),
    };

    book.push(LogEntry {
        date,
        start_time,
        end_time,
        duration_seconds,
        goal_seconds,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> ClockTime {
        ClockTime::At(NaiveTime::from_hms_opt(h, m, s).unwrap())
    }

    fn entry(day: u32, start: ClockTime, duration: i64, goal: i64) -> LogEntry {
        LogEntry {
            date: date(2024, 5, day),
            start_time: start,
            end_time: start.plus_seconds(duration),
            duration_seconds: duration,
            goal_seconds: goal,
        }
    }

    #[test]
    fn missing_file_is_created_with_header() -> Result<()> {
        let dir = tempdir()?;
        let log = LogFile::new(dir.path().join("nested").join("active.csv"));
        let book = log.load(3600)?;
        assert!(book.entries.is_empty());
        let text = fs::read_to_string(log.path())?;
        assert_eq!(text.trim_end(), LOG_HEADER.join(","));
        Ok(())
    }

    #[test]
    fn totals_equal_sum_of_appended_sessions() -> Result<()> {
        let dir = tempdir()?;
        let log = LogFile::new(dir.path().join("active.csv"));
        log.append_entry(&entry(1, at(8, 0, 0), 1_200, 3_600))?;
        log.append_entry(&entry(1, at(9, 0, 0), 600, 3_600))?;
        log.append_entry(&entry(2, at(9, 0, 0), 45, 3_600))?;
        log.append_goal_update(date(2024, 5, 2), 7_200)?;

        let book = log.load(0)?;
        assert_eq!(book.entries.len(), 3);
        assert_eq!(book.total_for(date(2024, 5, 1)), 1_800);
        assert_eq!(book.total_for(date(2024, 5, 2)), 45);
        assert_eq!(book.goals.get(&date(2024, 5, 2)), Some(&7_200));
        Ok(())
    }

    #[test]
    fn legacy_layout_is_migrated() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("legacy.csv");
        fs::write(
            &path,
            "date,time,duration_seconds\n2024-05-01,23:50:00,1200\n2024-05-02,,300\nbad-date,10:00,60\n",
        )?;
        let log = LogFile::new(&path);
        let book = log.load(5_400)?;

        assert_eq!(book.entries.len(), 2);
        assert_eq!(book.entries[0].start_time, at(23, 50, 0));
        assert_eq!(book.entries[0].end_time, at(0, 10, 0));
        assert_eq!(book.entries[0].goal_seconds, 5_400);
        assert_eq!(book.entries[1].start_time, ClockTime::Unknown);
        assert_eq!(book.entries[1].end_time, ClockTime::Unknown);

        let text = fs::read_to_string(&path)?;
        assert!(text.starts_with("date,start_time,end_time,duration_seconds,goal_seconds"));
        assert!(text.contains("2024-05-01,23:50:00,00:10:00,1200,5400"));
        assert!(text.contains("2024-05-02,N/A,N/A,300,5400"));

        assert_eq!(log.load(0)?, book);
        Ok(())
    }

    #[test]
    fn rewrite_keeps_goal_only_days() -> Result<()> {
        let dir = tempdir()?;
        let log = LogFile::new(dir.path().join("active.csv"));
        log.append_entry(&entry(1, at(8, 0, 0), 600, 3_600))?;
        log.append_goal_update(date(2024, 5, 1), 1_800)?;
        log.append_goal_update(date(2024, 5, 3), 900)?;
        let book = log.load(0)?;

        log.rewrite(&book)?;
        let reloaded = log.load(0)?;
        assert_eq!(reloaded.goals, book.goals);
        assert_eq!(reloaded.goals.get(&date(2024, 5, 1)), Some(&1_800));
        assert_eq!(reloaded.entries, book.entries);
        Ok(())
    }

    #[test]
    fn remove_entry_prefers_hint_and_clears_empty_days() {
        let mut book = LogBook::default();
        let first = entry(1, at(8, 0, 0), 600, 0);
        let second = entry(1, at(9, 0, 0), 300, 0);
        book.push(first.clone());
        book.push(second.clone());

        assert!(book.remove_entry(&second, Some(0)));
        assert_eq!(book.total_for(date(2024, 5, 1)), 600);
        assert!(book.remove_entry(&first, Some(0)));
        assert!(!book.totals.contains_key(&date(2024, 5, 1)));
        assert!(!book.remove_entry(&first, None));
    }

    #[test]
    fn clock_time_parsing() {
        assert_eq!(ClockTime::parse("07:05"), at(7, 5, 0));
        assert_eq!(ClockTime::parse("goal"), ClockTime::Unknown);
        assert_eq!(at(7, 5, 9).to_string(), "07:05:09");
        assert_eq!(ClockTime::Unknown.to_string(), "N/A");
        assert_eq!(at(0, 1, 40).seconds(), Some(100));
    }
}

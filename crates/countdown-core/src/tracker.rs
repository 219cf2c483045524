use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::path::Path;

use crate::calendar::{shift_days, week_range_ending};
use crate::format::{format_clock, format_hours_clock};
use crate::log_store::{ClockTime, LogBook, LogEntry, LogFile};
use crate::profile::ProfileRegistry;
use crate::settings::{SettingsStore, YearTotalDisplay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveSession {
    start: NaiveDateTime,
    date: NaiveDate,
    seconds: i64,
}

/// Outcome of "Undo added time".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    NothingToUndo,
    NotFound,
    Undone(LogEntry),
}

impl UndoOutcome {
    pub fn status_text(&self) -> &'static str {
        match self {
            UndoOutcome::NothingToUndo => "No added time to undo",
            UndoOutcome::NotFound => "Undo failed: entry not found",
            UndoOutcome::Undone(_) => "Undid added time",
        }
    }
}

/// Daily totals and goals of one profile, plus the session being timed right now.
pub struct Tracker {
    label: String,
    log: LogFile,
    book: LogBook,
    super_goal_seconds: i64,
    session: Option<ActiveSession>,
    last_added: Option<(LogEntry, usize)>,
}

impl Tracker {
    pub fn open(
        data_dir: &Path,
        registry: &ProfileRegistry,
        label: &str,
        settings: &mut SettingsStore,
    ) -> Result<Self> {
        let super_goal_seconds = settings.profile_super_goal(label);
        let log = LogFile::new(registry.file_path(data_dir, label));
        let book = log.load(super_goal_seconds)?;
        tracing::info!(
            profile = label,
            path = %log.path().display(),
            entries = book.entries.len(),
            "loaded profile log"
        );
        Ok(Self::from_parts(label, log, book, super_goal_seconds))
    }

    pub fn from_parts(label: &str, log: LogFile, book: LogBook, super_goal_seconds: i64) -> Self {
        Self {
            label: label.to_owned(),
            log,
            book,
            super_goal_seconds: super_goal_seconds.max(0),
            session: None,
            last_added: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn log_file(&self) -> &LogFile {
        &self.log
    }

    pub fn book(&self) -> &LogBook {
        &self.book
    }

    pub fn super_goal_seconds(&self) -> i64 {
        self.super_goal_seconds
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn begin_session(&mut self, now: NaiveDateTime) {
        self.session = Some(ActiveSession {
            start: now,
            date: now.date(),
            seconds: 0,
        });
    }

    /// Credits `seconds` to the running session, starting one if needed. When the
    /// local date has changed since the session began, the old session is written
    /// out and a new one starts today. Returns true on such a rollover.
    pub fn record_progress(&mut self, now: NaiveDateTime, seconds: i64) -> Result<bool> {
        if seconds <= 0 {
            return Ok(false);
        }
        let mut rolled_over = false;
        match self.session {
            None => self.begin_session(now),
            Some(session) if session.date != now.date() => {
                tracing::debug!(profile = %self.label, from = %session.date, "day rolled over mid-session");
                self.finalize_session(now)?;
                self.begin_session(now);
                rolled_over = true;
            }
            Some(_) => {}
        }
        if let Some(session) = self.session.as_mut() {
            session.seconds += seconds;
        }
        Ok(rolled_over)
    }

    /// Writes the running session to the log. Empty sessions are dropped.
    pub fn finalize_session(&mut self, now: NaiveDateTime) -> Result<Option<LogEntry>> {
        let Some(session) = self.session.take() else {
            return Ok(None);
        };
        if session.seconds <= 0 {
            return Ok(None);
        }
        let entry = LogEntry {
            date: session.date,
            start_time: ClockTime::At(whole_seconds(session.start.time())),
            end_time: ClockTime::At(whole_seconds(now.time())),
            duration_seconds: session.seconds,
            goal_seconds: self.super_goal_seconds,
        };
        self.book.goals.insert(session.date, self.super_goal_seconds);
        self.log.append_entry(&entry)?;
        self.book.push(entry.clone());
        tracing::debug!(profile = %self.label, seconds = entry.duration_seconds, "session logged");
        Ok(Some(entry))
    }

    pub fn total_for_day(&self, date: NaiveDate) -> i64 {
        let live = self
            .session
            .filter(|session| session.date == date)
            .map(|session| session.seconds)
            .unwrap_or(0);
        self.book.total_for(date) + live
    }

    pub fn goal_for_day(&self, date: NaiveDate, today: NaiveDate) -> i64 {
        if let Some(goal) = self.book.goals.get(&date) {
            return *goal;
        }
        if date == today {
            self.super_goal_seconds
        } else {
            0
        }
    }

    fn set_daily_goal(&mut self, date: NaiveDate, goal_seconds: i64, record: bool) -> Result<()> {
        if self.book.goals.get(&date) == Some(&goal_seconds) {
            return Ok(());
        }
        self.book.goals.insert(date, goal_seconds);
        if record {
            self.log.append_goal_update(date, goal_seconds)?;
        }
        Ok(())
    }

    /// Stores the profile's new daily goal and applies it to today.
    pub fn set_super_goal(
        &mut self,
        settings: &mut SettingsStore,
        today: NaiveDate,
        seconds: i64,
    ) -> Result<()> {
        self.super_goal_seconds = seconds.max(0);
        settings.set_profile_super_goal(&self.label, self.super_goal_seconds);
        settings.save()?;
        self.set_daily_goal(today, self.super_goal_seconds, true)
    }

    /// Logs a manual entry for `today`. Returns `None` when there is nothing to add.
    pub fn add_time(
        &mut self,
        today: NaiveDate,
        start: NaiveTime,
        seconds: i64,
    ) -> Result<Option<LogEntry>> {
        if seconds <= 0 {
            return Ok(None);
        }
        let start = ClockTime::At(
            NaiveTime::from_hms_opt(start.hour(), start.minute(), 0).unwrap_or(start),
        );
        let goal_seconds = self.goal_for_day(today, today);
        self.book.goals.insert(today, goal_seconds);
        let entry = LogEntry {
            date: today,
            start_time: start,
            end_time: start.plus_seconds(seconds),
            duration_seconds: seconds,
            goal_seconds,
        };
        self.log.append_entry(&entry)?;
        self.book.push(entry.clone());
        self.last_added = Some((entry.clone(), self.book.entries.len() - 1));
        tracing::info!(profile = %self.label, seconds, "added manual time");
        Ok(Some(entry))
    }

    pub fn can_undo(&self) -> bool {
        self.last_added.is_some()
    }

    pub fn undo_added_time(&mut self) -> Result<UndoOutcome> {
        let Some((entry, hint)) = self.last_added.take() else {
            return Ok(UndoOutcome::NothingToUndo);
        };
        if !self.book.remove_entry(&entry, Some(hint)) {
            return Ok(UndoOutcome::NotFound);
        }
        self.log.rewrite(&self.book)?;
        tracing::info!(profile = %self.label, seconds = entry.duration_seconds, "undid manual time");
        Ok(UndoOutcome::Undone(entry))
    }

    pub fn super_goal_left(&self, today: NaiveDate) -> i64 {
        let goal = self.goal_for_day(today, today);
        if goal <= 0 {
            return 0;
        }
        (goal - self.total_for_day(today)).max(0)
    }

    /// Fraction of today's goal reached, unbounded above. `None` without a goal.
    pub fn super_goal_progress(&self, today: NaiveDate) -> Option<f64> {
        let goal = self.goal_for_day(today, today);
        (goal > 0).then(|| self.total_for_day(today) as f64 / goal as f64)
    }

    fn goal_met(&self, date: NaiveDate) -> bool {
        match self.book.goals.get(&date) {
            Some(goal) if *goal > 0 => self.total_for_day(date) >= *goal,
            _ => false,
        }
    }

    /// `(longest, current)` runs of consecutive days on which a positive goal was met.
    pub fn streaks(&self, today: NaiveDate) -> (u32, u32) {
        let goal_dates: Vec<NaiveDate> = self
            .book
            .goals
            .iter()
            .filter(|(_, goal)| **goal > 0)
            .map(|(date, _)| *date)
            .collect();

        let mut longest = 0;
        let mut running = 0;
        let mut previous: Option<NaiveDate> = None;
        for date in &goal_dates {
            if self.goal_met(*date) {
                let consecutive = previous.is_some_and(|prev| shift_days(prev, 1) == *date);
                running = if consecutive { running + 1 } else { 1 };
                longest = longest.max(running);
            } else {
                running = 0;
            }
            previous = Some(*date);
        }

        let latest_met = goal_dates.iter().rev().find(|date| self.goal_met(**date));
        let Some(latest_met) = latest_met else {
            return (longest, 0);
        };
        if *latest_met < shift_days(today, -1) {
            return (longest, 0);
        }
        let mut current = 0;
        let mut cursor = *latest_met;
        while self.goal_met(cursor) {
            current += 1;
            let next = shift_days(cursor, -1);
            if next == cursor {
                break;
            }
            cursor = next;
        }
        (longest, current)
    }

    pub fn year_total_seconds(&self, today: NaiveDate) -> i64 {
        let stored: i64 = self
            .book
            .totals
            .iter()
            .filter(|(date, _)| date.year() == today.year())
            .map(|(_, seconds)| *seconds)
            .sum();
        let live = self
            .session
            .filter(|session| session.date.year() == today.year())
            .map(|session| session.seconds)
            .unwrap_or(0);
        stored + live
    }

    /// Total of the seven days ending on the latest `week_end_day`.
    pub fn week_total_seconds(&self, today: NaiveDate, week_end_day: u32) -> i64 {
        let (start, end) = week_range_ending(today, week_end_day);
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| self.total_for_day(date))
            .sum()
    }

    pub fn year_total_text(
        &self,
        today: NaiveDate,
        mode: YearTotalDisplay,
        week_end_day: u32,
    ) -> String {
        let total = self.year_total_seconds(today);
        match mode {
            YearTotalDisplay::Hours => format!("Year total: {}", format_hours_clock(total)),
            YearTotalDisplay::Days => {
                let days = total / 86_400;
                format!("Year total: {days}d {}", format_clock(total % 86_400))
            }
            YearTotalDisplay::Week => format!(
                "Week total: {}",
                format_hours_clock(self.week_total_seconds(today, week_end_day))
            ),
            YearTotalDisplay::AvgWeek => {
                let days_elapsed = i64::from(today.ordinal()).max(1);
                let average = (total as f64 * 7.0 / days_elapsed as f64).round() as i64;
                format!("Year avg/week: {}", format_clock(average))
            }
        }
    }
}

fn whole_seconds(time: NaiveTime) -> NaiveTime {
    time.with_nanosecond(0).unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(day: NaiveDate, h: u32, m: u32, s: u32) -> NaiveDateTime {
        day.and_hms_opt(h, m, s).unwrap()
    }

    fn tracker(goal: i64) -> (TempDir, Tracker) {
        let dir = tempdir().unwrap();
        let log = LogFile::new(dir.path().join("active.csv"));
        let book = log.load(goal).unwrap();
        let tracker = Tracker::from_parts("Activate Immersion", log, book, goal);
        (dir, tracker)
    }

    #[test]
    fn day_total_is_sum_of_recorded_seconds() -> Result<()> {
        let (_dir, mut tracker) = tracker(3_600);
        let day = date(2024, 5, 10);
        for second in 0..90 {
            tracker.record_progress(at(day, 9, 0, second % 60), 1)?;
        }
        assert_eq!(tracker.total_for_day(day), 90);
        tracker.finalize_session(at(day, 9, 1, 30))?;
        tracker.record_progress(at(day, 10, 0, 0), 1)?;
        tracker.record_progress(at(day, 10, 0, 1), 1)?;
        assert_eq!(tracker.total_for_day(day), 92);
        tracker.finalize_session(at(day, 10, 0, 2))?;

        let reloaded = tracker.log_file().load(0)?;
        assert_eq!(reloaded.total_for(day), 92);
        assert_eq!(reloaded.entries.len(), 2);
        assert_eq!(reloaded.entries[0].start_time.to_string(), "09:00:00");
        assert_eq!(reloaded.goals.get(&day), Some(&3_600));
        Ok(())
    }

    #[test]
    fn empty_session_is_not_logged() -> Result<()> {
        let (_dir, mut tracker) = tracker(0);
        let day = date(2024, 5, 10);
        tracker.begin_session(at(day, 8, 0, 0));
        assert_eq!(tracker.finalize_session(at(day, 8, 5, 0))?, None);
        assert!(tracker.log_file().load(0)?.entries.is_empty());
        Ok(())
    }

    #[test]
    fn midnight_splits_session() -> Result<()> {
        let (_dir, mut tracker) = tracker(60);
        let first = date(2024, 5, 10);
        let second = date(2024, 5, 11);
        assert!(!tracker.record_progress(at(first, 23, 59, 58), 1)?);
        assert!(!tracker.record_progress(at(first, 23, 59, 59), 1)?);
        assert!(tracker.record_progress(at(second, 0, 0, 0), 1)?);
        assert_eq!(tracker.total_for_day(first), 2);
        assert_eq!(tracker.total_for_day(second), 1);
        tracker.finalize_session(at(second, 0, 0, 1))?;

        let reloaded = tracker.log_file().load(0)?;
        assert_eq!(reloaded.total_for(first), 2);
        assert_eq!(reloaded.total_for(second), 1);
        Ok(())
    }

    #[test]
    fn add_time_and_undo() -> Result<()> {
        let (_dir, mut tracker) = tracker(3_600);
        let day = date(2024, 5, 10);
        let start = NaiveTime::from_hms_opt(7, 15, 42).unwrap();
        assert_eq!(tracker.add_time(day, start, 0)?, None);
        assert_eq!(tracker.undo_added_time()?, UndoOutcome::NothingToUndo);

        tracker.record_progress(at(day, 6, 0, 0), 1)?;
        tracker.finalize_session(at(day, 6, 0, 1))?;
        let added = tracker.add_time(day, start, 1_800)?.unwrap();
        assert_eq!(added.start_time.to_string(), "07:15:00");
        assert_eq!(added.end_time.to_string(), "07:45:00");
        assert_eq!(tracker.total_for_day(day), 1_801);

        let outcome = tracker.undo_added_time()?;
        assert_eq!(outcome, UndoOutcome::Undone(added));
        assert_eq!(tracker.total_for_day(day), 1);
        assert!(!tracker.can_undo());
        let reloaded = tracker.log_file().load(0)?;
        assert_eq!(reloaded.total_for(day), 1);
        assert_eq!(reloaded.entries.len(), 1);
        Ok(())
    }

    #[test]
    fn super_goal_is_recorded_for_today() -> Result<()> {
        let dir = tempdir()?;
        let mut settings = SettingsStore::open(dir.path().join("settings.ini"));
        let registry = ProfileRegistry::default();
        let mut tracker = Tracker::open(dir.path(), &registry, "Output", &mut settings)?;
        assert_eq!(tracker.super_goal_seconds(), 2 * 3600);

        let today = date(2024, 5, 10);
        tracker.set_super_goal(&mut settings, today, 1_800)?;
        tracker.record_progress(at(today, 9, 0, 0), 600)?;
        assert_eq!(tracker.super_goal_left(today), 1_200);
        assert_eq!(tracker.super_goal_progress(today), Some(600.0 / 1_800.0));

        let reopened = SettingsStore::open(dir.path().join("settings.ini"));
        assert_eq!(reopened.get("super_goal", "profiles/output/hours"), Some("0"));
        assert_eq!(reopened.get("super_goal", "profiles/output/minutes"), Some("30"));
        let book = LogFile::new(dir.path().join("output.csv")).load(0)?;
        assert_eq!(book.goals.get(&today), Some(&1_800));
        Ok(())
    }

    #[test]
    fn goal_lookup_falls_back_only_for_today() {
        let (_dir, tracker) = tracker(900);
        let today = date(2024, 5, 10);
        assert_eq!(tracker.goal_for_day(today, today), 900);
        assert_eq!(tracker.goal_for_day(date(2024, 5, 9), today), 0);
        assert_eq!(tracker.super_goal_progress(today), Some(0.0));
    }

    #[test]
    fn streaks_count_consecutive_met_days() {
        let mut book = LogBook::default();
        let goal = 600;
        let met = [1, 2, 3, 5, 6];
        for day in 1..=6 {
            book.goals.insert(date(2024, 5, day), goal);
            let seconds = if met.contains(&day) { goal } else { 10 };
            book.push(LogEntry {
                date: date(2024, 5, day),
                start_time: ClockTime::Unknown,
                end_time: ClockTime::Unknown,
                duration_seconds: seconds,
                goal_seconds: goal,
            });
        }
        let tracker = Tracker::from_parts("Output", LogFile::new("unused.csv"), book, goal);
        assert_eq!(tracker.streaks(date(2024, 5, 7)), (3, 2));
        assert_eq!(tracker.streaks(date(2024, 5, 6)), (3, 2));
        assert_eq!(tracker.streaks(date(2024, 5, 8)), (3, 0));
    }

    #[test]
    fn year_total_modes() -> Result<()> {
        let (_dir, mut tracker) = tracker(0);
        // 2024-01-10 is a Wednesday.
        let today = date(2024, 1, 10);
        tracker.add_time(date(2023, 12, 31), NaiveTime::MIN, 3_600)?;
        tracker.add_time(date(2024, 1, 1), NaiveTime::MIN, 90_061)?;
        tracker.add_time(today, NaiveTime::MIN, 3_600)?;

        assert_eq!(tracker.year_total_seconds(today), 93_661);
        assert_eq!(
            tracker.year_total_text(today, YearTotalDisplay::Hours, 7),
            "Year total: 26:01:01"
        );
        assert_eq!(
            tracker.year_total_text(today, YearTotalDisplay::Days, 7),
            "Year total: 1d 02:01:01"
        );
        // Week ending Sunday 2024-01-07 covers 2024-01-01 .. 2024-01-07.
        assert_eq!(
            tracker.year_total_text(today, YearTotalDisplay::Week, 7),
            "Week total: 25:01:01"
        );
        assert_eq!(
            tracker.year_total_text(today, YearTotalDisplay::AvgWeek, 7),
            "Year avg/week: 18:12:43"
        );
        Ok(())
    }
}

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_KEY_FORMAT).ok()
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn add_months(month_start: NaiveDate, offset_months: i32) -> Option<NaiveDate> {
    let total_months = i64::from(month_start.year()) * 12
        + i64::from(month_start.month0())
        + i64::from(offset_months);
    let year = i32::try_from(total_months.div_euclid(12)).ok()?;
    let month0 = total_months.rem_euclid(12) as u32;
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
}

pub fn days_in_month(month_start: NaiveDate) -> u32 {
    if let Some(next_month) = add_months(month_start, 1) {
        if let Some(last_day) = next_month.checked_sub_days(Days::new(1)) {
            return last_day.day();
        }
    }
    31
}

pub fn monday_for(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(date)
}

pub fn shift_days(date: NaiveDate, offset: i64) -> NaiveDate {
    let shifted = if offset >= 0 {
        date.checked_add_days(Days::new(offset as u64))
    } else {
        date.checked_sub_days(Days::new(offset.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

/// ISO weekday number, 1 = Monday .. 7 = Sunday.
pub fn iso_weekday(date: NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}

/// The day a week ends on when it starts on `start_day` (both ISO numbers).
pub fn expected_week_end(start_day: u32) -> u32 {
    if start_day <= 1 {
        7
    } else {
        start_day.min(7) - 1
    }
}

pub fn expected_week_start(end_day: u32) -> u32 {
    if end_day >= 7 {
        1
    } else {
        end_day.max(1) + 1
    }
}

/// The seven days ending on the most recent `week_end_day` at or before `date`.
pub fn week_range_ending(date: NaiveDate, week_end_day: u32) -> (NaiveDate, NaiveDate) {
    let end_day = week_end_day.clamp(1, 7);
    let delta = (iso_weekday(date) + 7 - end_day) % 7;
    let end = shift_days(date, -i64::from(delta));
    (shift_days(end, -6), end)
}

/// Seconds left until `end` today; zero outside the `[start, end)` window.
pub fn day_time_left(now: NaiveDateTime, start: NaiveTime, end: NaiveTime) -> i64 {
    if end <= start {
        return 0;
    }
    let time = now.time();
    if time < start || time >= end {
        return 0;
    }
    (end - time).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_arithmetic() {
        assert_eq!(add_months(date(2024, 12, 1), 1), Some(date(2025, 1, 1)));
        assert_eq!(add_months(date(2024, 1, 1), -1), Some(date(2023, 12, 1)));
        assert_eq!(days_in_month(date(2024, 2, 1)), 29);
        assert_eq!(days_in_month(date(2023, 2, 1)), 28);
        assert_eq!(month_start(date(2024, 5, 17)), date(2024, 5, 1));
    }

    #[test]
    fn week_range_ends_on_configured_day() {
        // 2024-05-15 is a Wednesday.
        let wed = date(2024, 5, 15);
        assert_eq!(week_range_ending(wed, 7), (date(2024, 5, 6), date(2024, 5, 12)));
        assert_eq!(week_range_ending(wed, 3), (date(2024, 5, 9), wed));
        assert_eq!(monday_for(wed), date(2024, 5, 13));
    }

    #[test]
    fn week_start_and_end_stay_paired() {
        assert_eq!(expected_week_end(1), 7);
        assert_eq!(expected_week_end(3), 2);
        assert_eq!(expected_week_start(7), 1);
        assert_eq!(expected_week_start(2), 3);
    }

    #[test]
    fn day_time_left_only_inside_window() {
        let start = NaiveTime::from_hms_opt(6, 30, 0).unwrap();
        let end = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        let at = |h, m| date(2024, 5, 15).and_hms_opt(h, m, 0).unwrap();
        assert_eq!(day_time_left(at(22, 0), start, end), 3600);
        assert_eq!(day_time_left(at(5, 0), start, end), 0);
        assert_eq!(day_time_left(at(23, 0), start, end), 0);
        assert_eq!(day_time_left(at(12, 0), end, start), 0);
    }

    #[test]
    fn date_keys_round_trip() {
        assert_eq!(date_key(date(2024, 3, 9)), "2024-03-09");
        assert_eq!(parse_date_key(" 2024-03-09 "), Some(date(2024, 3, 9)));
        assert_eq!(parse_date_key("2024-13-01"), None);
    }
}

//! Duration formatting shared by labels, tooltips and tables.

/// `HH:MM:SS`, hours are not wrapped at 24.
pub fn format_clock(seconds: i64) -> String {
    let secs = seconds.max(0);
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// `H:MM:SS` with an unpadded hour count, used for long totals.
pub fn format_hours_clock(seconds: i64) -> String {
    let secs = seconds.max(0);
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    format!("{h}:{m:02}:{s:02}")
}

pub fn format_hm(seconds: i64) -> String {
    let secs = seconds.max(0);
    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
}

pub fn format_hms(seconds: i64) -> String {
    let secs = seconds.max(0);
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

pub fn format_long(seconds: i64) -> String {
    let secs = seconds.max(0);
    format!(
        "{} hours {} min {} sec",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

/// Share of `goal_seconds`, rounded to a whole percent. `N/A` when there is no goal.
pub fn format_percent(part_seconds: i64, goal_seconds: i64) -> String {
    if goal_seconds <= 0 {
        return "N/A".to_owned();
    }
    let percent = part_seconds as f64 / goal_seconds as f64 * 100.0;
    format!("{percent:.0}%")
}

pub fn plural_days(count: u32) -> &'static str {
    if count == 1 {
        "day"
    } else {
        "days"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_formats_pad_and_do_not_wrap() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3_725), "01:02:05");
        assert_eq!(format_clock(100 * 3600), "100:00:00");
        assert_eq!(format_clock(-5), "00:00:00");
        assert_eq!(format_hours_clock(3_725), "1:02:05");
    }

    #[test]
    fn human_formats() {
        assert_eq!(format_hm(5_400), "1h 30m");
        assert_eq!(format_hms(5_401), "1h 30m 1s");
        assert_eq!(format_long(61), "0 hours 1 min 1 sec");
    }

    #[test]
    fn percent_of_goal() {
        assert_eq!(format_percent(1_800, 3_600), "50%");
        assert_eq!(format_percent(7_200, 3_600), "200%");
        assert_eq!(format_percent(100, 0), "N/A");
    }
}

//! Year heatmap geometry and cell coloring.
//!
//! The layout puts the twelve months side by side. Each month spans as many week
//! columns as it needs, rows run Monday to Sunday, and an optional spacer column
//! separates consecutive months.

use chrono::{Datelike, NaiveDate};

use crate::calendar::{days_in_month, shift_days};
use crate::color::Rgb;
use crate::format::{format_hms, format_percent};

pub const HEATMAP_CELL_SIZE_MIN: u32 = 2;
pub const HEATMAP_CELL_SIZE_MAX: u32 = 20;
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn clamp_cell_size(size: i64) -> u32 {
    size.clamp(
        i64::from(HEATMAP_CELL_SIZE_MIN),
        i64::from(HEATMAP_CELL_SIZE_MAX),
    ) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Intensity {
    Empty,
    Partial,
    Met,
}

impl Intensity {
    pub fn for_day(total_seconds: i64, goal_seconds: i64) -> Self {
        if goal_seconds > 0 && total_seconds >= goal_seconds {
            Intensity::Met
        } else if total_seconds > 0 {
            Intensity::Partial
        } else {
            Intensity::Empty
        }
    }

    pub fn alpha(self) -> u8 {
        match self {
            Intensity::Empty => 40,
            Intensity::Partial => 120,
            Intensity::Met => 220,
        }
    }
}

/// Even months are drawn a shade lighter so month boundaries stay visible.
pub fn base_color(date: NaiveDate, heatmap_color: Rgb) -> Rgb {
    if date.month() % 2 == 0 {
        heatmap_color.lighter(125)
    } else {
        heatmap_color
    }
}

pub fn tooltip(date: NaiveDate, total_seconds: i64, goal_seconds: i64) -> String {
    format!(
        "Date: {}\nTime: {}\nSuper goal: {}",
        date.format("%Y-%m-%d"),
        format_hms(total_seconds),
        format_percent(total_seconds, goal_seconds)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    /// Grid column counting spacer columns.
    pub column: u32,
    /// 0 = Monday .. 6 = Sunday.
    pub row: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSpan {
    pub month: u32,
    pub first_column: u32,
    pub weeks: u32,
}

impl MonthSpan {
    pub fn name(&self) -> &'static str {
        MONTH_NAMES[(self.month.clamp(1, 12) - 1) as usize]
    }
}

/// Column/row placement of every day of one calendar year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearLayout {
    pub year: i32,
    pub months: Vec<MonthSpan>,
    pub cells: Vec<HeatmapCell>,
    pub spacer_columns: Vec<u32>,
    pub total_columns: u32,
}

impl YearLayout {
    pub fn build(year: i32, month_padding: bool) -> Self {
        let mut months = Vec::with_capacity(12);
        let mut cells = Vec::with_capacity(366);
        let mut spacer_columns = Vec::new();
        let mut column = 0_u32;

        for month in 1..=12 {
            let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
                continue;
            };
            let days = days_in_month(first);
            let leading_blanks = first.weekday().num_days_from_monday();
            let weeks = (leading_blanks + days).div_ceil(7);
            months.push(MonthSpan {
                month,
                first_column: column,
                weeks,
            });
            for day_index in 0..days {
                let slot = leading_blanks + day_index;
                cells.push(HeatmapCell {
                    date: shift_days(first, i64::from(day_index)),
                    column: column + slot / 7,
                    row: slot % 7,
                });
            }
            column += weeks;
            if month_padding && month < 12 {
                spacer_columns.push(column);
                column += 1;
            }
        }

        Self {
            year,
            months,
            cells,
            spacer_columns,
            total_columns: column,
        }
    }

    pub fn week_columns(&self) -> u32 {
        self.total_columns - self.spacer_columns.len() as u32
    }

    /// Pixel size of the grid without month labels.
    pub fn pixel_size(&self, cell_size: u32, spacing: u32, month_padding: u32) -> (u32, u32) {
        let width = self.week_columns() * cell_size
            + self.spacer_columns.len() as u32 * month_padding
            + self.total_columns.saturating_sub(1) * spacing;
        let height = 7 * cell_size + 6 * spacing;
        (width, height)
    }

    /// Left edge of `column` in pixels.
    pub fn column_offset(&self, column: u32, cell_size: u32, spacing: u32, month_padding: u32) -> u32 {
        let spacers_before = self
            .spacer_columns
            .iter()
            .filter(|spacer| **spacer < column)
            .count() as u32;
        let cells_before = column - spacers_before;
        cells_before * cell_size + spacers_before * month_padding + column * spacing
    }

    pub fn cell_for(&self, date: NaiveDate) -> Option<&HeatmapCell> {
        if date.year() != self.year {
            return None;
        }
        self.cells.get(date.ordinal0() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cell_size_is_clamped() {
        assert_eq!(clamp_cell_size(0), 2);
        assert_eq!(clamp_cell_size(7), 7);
        assert_eq!(clamp_cell_size(200), 20);
    }

    #[test]
    fn intensity_is_monotonic_in_total() {
        let goal = 3_600;
        let mut previous = Intensity::Empty;
        for total in [0, 1, 1_800, 3_599, 3_600, 7_200] {
            let current = Intensity::for_day(total, goal);
            assert!(current >= previous);
            assert!(current.alpha() >= previous.alpha());
            previous = current;
        }
        assert_eq!(Intensity::for_day(3_600, 3_600).alpha(), 220);
        assert_eq!(Intensity::for_day(10, 0).alpha(), 120);
        assert_eq!(Intensity::for_day(0, 0).alpha(), 40);
    }

    #[test]
    fn layout_places_days_monday_first() {
        // 2024-01-01 is a Monday, 2024-02-01 a Thursday.
        let layout = YearLayout::build(2024, true);
        assert_eq!(layout.cells.len(), 366);
        assert_eq!(layout.months[0].weeks, 5);
        assert_eq!(layout.months[1].first_column, 6);
        let feb_first = layout.cell_for(date(2024, 2, 1)).unwrap();
        assert_eq!((feb_first.column, feb_first.row), (6, 3));
        let dec_last = layout.cell_for(date(2024, 12, 31)).unwrap();
        assert_eq!(dec_last.date, date(2024, 12, 31));
        assert_eq!(layout.spacer_columns.len(), 11);
        assert!(layout.cell_for(date(2023, 12, 31)).is_none());
    }

    #[test]
    fn layout_without_padding_is_contiguous() {
        let layout = YearLayout::build(2023, false);
        assert!(layout.spacer_columns.is_empty());
        let weeks: u32 = layout.months.iter().map(|month| month.weeks).sum();
        assert_eq!(layout.total_columns, weeks);
        assert_eq!(layout.pixel_size(4, 1, 0).1, 34);
        assert_eq!(layout.column_offset(2, 4, 1, 0), 10);
    }

    #[test]
    fn even_months_are_lighter() {
        let base = Rgb::new(0x40, 0x80, 0x20);
        assert_eq!(base_color(date(2024, 3, 1), base), base);
        assert_ne!(base_color(date(2024, 4, 1), base), base);
    }

    #[test]
    fn tooltip_text() {
        assert_eq!(
            tooltip(date(2024, 5, 1), 3_661, 7_322),
            "Date: 2024-05-01\nTime: 1h 1m 1s\nSuper goal: 50%"
        );
        assert!(tooltip(date(2024, 5, 1), 0, 0).ends_with("Super goal: N/A"));
    }
}

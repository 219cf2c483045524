use anyhow::{Context, Result};
use ini::Ini;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::Rgb;
use crate::gamepad::PadButton;
use crate::heatmap::clamp_cell_size;
use crate::profile::{color_key, super_goal_key};

const LEGACY_SUPER_GOAL_HOURS: i64 = 2;
const PROFILE_COLORS_SECTION: &str = "profile_colors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearTotalDisplay {
    #[default]
    Hours,
    Days,
    Week,
    AvgWeek,
}

impl YearTotalDisplay {
    pub const ALL: [YearTotalDisplay; 4] = [
        YearTotalDisplay::Hours,
        YearTotalDisplay::Days,
        YearTotalDisplay::Week,
        YearTotalDisplay::AvgWeek,
    ];

    pub fn key(self) -> &'static str {
        match self {
            YearTotalDisplay::Hours => "hours",
            YearTotalDisplay::Days => "days",
            YearTotalDisplay::Week => "week",
            YearTotalDisplay::AvgWeek => "avg_week",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL.into_iter().find(|mode| mode.key() == value)
    }

    pub fn next(self) -> Self {
        match self {
            YearTotalDisplay::Hours => YearTotalDisplay::Days,
            YearTotalDisplay::Days => YearTotalDisplay::Week,
            YearTotalDisplay::Week => YearTotalDisplay::AvgWeek,
            YearTotalDisplay::AvgWeek => YearTotalDisplay::Hours,
        }
    }

    /// Hover hint naming what a click switches to.
    pub fn hint(self) -> &'static str {
        match self {
            YearTotalDisplay::Hours => "Click to show days",
            YearTotalDisplay::Days => "Click to show week total",
            YearTotalDisplay::Week => "Click to show avg/week",
            YearTotalDisplay::AvgWeek => "Click to show total hours",
        }
    }
}

/// Main-window elements that can be hidden from the context menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiElement {
    Heatmap,
    DayTime,
    TotalToday,
    YearTotal,
    SuperGoalLeft,
    StatusLabel,
    StartButton,
    ClockButton,
    LongestStreak,
    CurrentStreak,
}

impl UiElement {
    pub const ALL: [UiElement; 10] = [
        UiElement::Heatmap,
        UiElement::DayTime,
        UiElement::TotalToday,
        UiElement::YearTotal,
        UiElement::SuperGoalLeft,
        UiElement::StatusLabel,
        UiElement::StartButton,
        UiElement::ClockButton,
        UiElement::LongestStreak,
        UiElement::CurrentStreak,
    ];

    pub fn key(self) -> &'static str {
        match self {
            UiElement::Heatmap => "show_heatmap",
            UiElement::DayTime => "show_day_time",
            UiElement::TotalToday => "show_total_today",
            UiElement::YearTotal => "show_year_total",
            UiElement::SuperGoalLeft => "show_super_goal_left",
            UiElement::StatusLabel => "show_status_label",
            UiElement::StartButton => "show_start_button",
            UiElement::ClockButton => "show_clock_button",
            UiElement::LongestStreak => "show_longest_streak",
            UiElement::CurrentStreak => "show_current_streak",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UiElement::Heatmap => "Heatmap",
            UiElement::DayTime => "Day time left",
            UiElement::TotalToday => "Total today",
            UiElement::YearTotal => "Year total",
            UiElement::SuperGoalLeft => "Super goal left",
            UiElement::StatusLabel => "Status text",
            UiElement::StartButton => "Start button",
            UiElement::ClockButton => "Clock button",
            UiElement::LongestStreak => "Longest streak",
            UiElement::CurrentStreak => "Current streak",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiVisibility {
    shown: [bool; UiElement::ALL.len()],
}

impl Default for UiVisibility {
    fn default() -> Self {
        Self {
            shown: [true; UiElement::ALL.len()],
        }
    }
}

impl UiVisibility {
    fn index(element: UiElement) -> usize {
        UiElement::ALL
            .iter()
            .position(|candidate| *candidate == element)
            .unwrap_or(0)
    }

    pub fn is_shown(&self, element: UiElement) -> bool {
        self.shown[Self::index(element)]
    }

    pub fn set(&mut self, element: UiElement, shown: bool) {
        self.shown[Self::index(element)] = shown;
    }

    pub fn all_shown(&self) -> bool {
        self.shown.iter().all(|shown| *shown)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiSettings {
    pub opacity: f32,
    pub bg_color: Rgb,
    pub text_color: Rgb,
    pub accent_color: Rgb,
    pub day_time_color: Rgb,
    pub heatmap_color: Rgb,
    pub heatmap_hover_bg_color: Rgb,
    pub heatmap_hover_text_color: Rgb,
    pub heatmap_hover_cell_color: Rgb,
    pub graph_line_color: Rgb,
    pub graph_dot_color: Rgb,
    pub graph_fill_color: Rgb,
    pub graph_grid_color: Rgb,
    pub total_today_color: Rgb,
    pub goal_left_color: Rgb,
    pub super_goal_bar_start: Rgb,
    pub super_goal_bar_end: Rgb,
    pub super_goal_bar_bg: Rgb,
    pub font_size: u32,
    pub label_size: u32,
    pub day_time_font_size: u32,
    pub total_today_font_size: u32,
    pub goal_left_font_size: u32,
    pub heatmap_cell_size: u32,
    pub heatmap_month_padding: u32,
    pub heatmap_month_label_size: u32,
    pub super_goal_bar_width: u32,
    pub super_goal_bar_height: u32,
    pub goal_pulse_seconds: f32,
    pub always_on_top: bool,
    pub day_start_hour: u32,
    pub day_start_minute: u32,
    pub day_end_hour: u32,
    pub day_end_minute: u32,
    pub year_total_display: YearTotalDisplay,
    pub week_start_day: u32,
    pub week_end_day: u32,
    pub visibility: UiVisibility,
    pub use_24h_time: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            opacity: 0.85,
            bg_color: Rgb::new(0x2b, 0x31, 0x3b),
            text_color: Rgb::new(0xeb, 0xb6, 0xe8),
            accent_color: Rgb::new(0x6d, 0xd3, 0xfb),
            day_time_color: Rgb::new(0xbd, 0xfd, 0xbb),
            heatmap_color: Rgb::new(0x8a, 0xfb, 0x71),
            heatmap_hover_bg_color: Rgb::new(0x1f, 0x29, 0x37),
            heatmap_hover_text_color: Rgb::new(0xf8, 0xfa, 0xfc),
            heatmap_hover_cell_color: Rgb::new(0x42, 0x9e, 0x7f),
            graph_line_color: Rgb::new(0x6d, 0xd3, 0xfb),
            graph_dot_color: Rgb::new(0xeb, 0xb6, 0xe8),
            graph_fill_color: Rgb::new(0x6d, 0xd3, 0xfb),
            graph_grid_color: Rgb::new(0x94, 0xa3, 0xb8),
            total_today_color: Rgb::new(0x94, 0xa3, 0xb8),
            goal_left_color: Rgb::new(0x6d, 0xd3, 0xfb),
            super_goal_bar_start: Rgb::new(0x6d, 0xd3, 0xfb),
            super_goal_bar_end: Rgb::new(0x8a, 0xfb, 0x71),
            super_goal_bar_bg: Rgb::new(0x1f, 0x29, 0x37),
            font_size: 36,
            label_size: 10,
            day_time_font_size: 13,
            total_today_font_size: 10,
            goal_left_font_size: 10,
            heatmap_cell_size: 4,
            heatmap_month_padding: 1,
            heatmap_month_label_size: 8,
            super_goal_bar_width: 120,
            super_goal_bar_height: 8,
            goal_pulse_seconds: 2.0,
            always_on_top: false,
            day_start_hour: 6,
            day_start_minute: 30,
            day_end_hour: 23,
            day_end_minute: 0,
            year_total_display: YearTotalDisplay::Hours,
            week_start_day: 1,
            week_end_day: 7,
            visibility: UiVisibility::default(),
            use_24h_time: true,
        }
    }
}

type ColorField = (&'static str, fn(&mut UiSettings) -> &mut Rgb);
type SizeField = (&'static str, &'static str, fn(&mut UiSettings) -> &mut u32);

const COLOR_FIELDS: [ColorField; 17] = [
    ("background", |ui| &mut ui.bg_color),
    ("text", |ui| &mut ui.text_color),
    ("accent", |ui| &mut ui.accent_color),
    ("day_time", |ui| &mut ui.day_time_color),
    ("heatmap", |ui| &mut ui.heatmap_color),
    ("heatmap_hover_bg", |ui| &mut ui.heatmap_hover_bg_color),
    ("heatmap_hover_text", |ui| &mut ui.heatmap_hover_text_color),
    ("heatmap_hover_cell", |ui| &mut ui.heatmap_hover_cell_color),
    ("graph_line", |ui| &mut ui.graph_line_color),
    ("graph_dot", |ui| &mut ui.graph_dot_color),
    ("graph_fill", |ui| &mut ui.graph_fill_color),
    ("graph_grid", |ui| &mut ui.graph_grid_color),
    ("total_today", |ui| &mut ui.total_today_color),
    ("goal_left", |ui| &mut ui.goal_left_color),
    ("super_goal_bar_start", |ui| &mut ui.super_goal_bar_start),
    ("super_goal_bar_end", |ui| &mut ui.super_goal_bar_end),
    ("super_goal_bar_bg", |ui| &mut ui.super_goal_bar_bg),
];

const SIZE_FIELDS: [SizeField; 14] = [
    ("fonts", "timer", |ui| &mut ui.font_size),
    ("fonts", "label", |ui| &mut ui.label_size),
    ("fonts", "day_time", |ui| &mut ui.day_time_font_size),
    ("fonts", "total_today", |ui| &mut ui.total_today_font_size),
    ("fonts", "goal_left", |ui| &mut ui.goal_left_font_size),
    ("heatmap", "cell_size", |ui| &mut ui.heatmap_cell_size),
    ("heatmap", "month_padding", |ui| &mut ui.heatmap_month_padding),
    ("heatmap", "month_label_size", |ui| &mut ui.heatmap_month_label_size),
    ("super_goal_bar", "width", |ui| &mut ui.super_goal_bar_width),
    ("super_goal_bar", "height", |ui| &mut ui.super_goal_bar_height),
    ("day_time", "start_hour", |ui| &mut ui.day_start_hour),
    ("day_time", "start_minute", |ui| &mut ui.day_start_minute),
    ("day_time", "end_hour", |ui| &mut ui.day_end_hour),
    ("day_time", "end_minute", |ui| &mut ui.day_end_minute),
];

impl UiSettings {
    /// Pulls every value back into its valid range.
    pub fn normalize(&mut self) {
        self.opacity = if self.opacity.is_finite() {
            self.opacity.clamp(0.0, 1.0)
        } else {
            0.85
        };
        for size in [
            &mut self.font_size,
            &mut self.label_size,
            &mut self.day_time_font_size,
            &mut self.total_today_font_size,
            &mut self.goal_left_font_size,
        ] {
            *size = (*size).max(1);
        }
        self.heatmap_cell_size = clamp_cell_size(i64::from(self.heatmap_cell_size));
        self.heatmap_month_label_size = self.heatmap_month_label_size.max(6);
        self.super_goal_bar_width = self.super_goal_bar_width.max(40);
        self.super_goal_bar_height = self.super_goal_bar_height.max(4);
        self.goal_pulse_seconds = if self.goal_pulse_seconds.is_finite() {
            self.goal_pulse_seconds.max(0.0)
        } else {
            2.0
        };
        self.day_start_hour = self.day_start_hour.min(23);
        self.day_end_hour = self.day_end_hour.min(23);
        self.day_start_minute = self.day_start_minute.min(59);
        self.day_end_minute = self.day_end_minute.min(59);
        self.week_start_day = self.week_start_day.clamp(1, 7);
        self.week_end_day = crate::calendar::expected_week_end(self.week_start_day);
    }

    pub fn day_start(&self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(self.day_start_hour, self.day_start_minute, 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }

    pub fn day_end(&self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(self.day_end_hour, self.day_end_minute, 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }
}

/// Keyboard shortcuts and controller buttons for the two toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeySettings {
    pub start: String,
    pub clock: String,
    pub start_button: Option<PadButton>,
    pub clock_button: Option<PadButton>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: u32,
    pub height: u32,
}

/// `settings.ini`, kept in memory between saves so keys this program does not
/// know about survive a rewrite.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    ini: Ini,
}

impl SettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ini = if path.exists() {
            match Ini::load_from_file(&path) {
                Ok(ini) => ini,
                Err(err) => {
                    tracing::warn!(path = %path.display(), "unreadable settings, using defaults: {err}");
                    Ini::new()
                }
            }
        } else {
            Ini::new()
        };
        Self { path, ini }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create settings directory: {}", parent.display())
            })?;
        }
        self.ini
            .write_to_file(&self.path)
            .with_context(|| format!("failed to write settings: {}", self.path.display()))?;
        Ok(())
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key).map(str::trim)
    }

    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    pub fn remove(&mut self, section: &str, key: &str) {
        self.ini.delete_from(Some(section), key);
    }

    fn get_i64(&self, section: &str, key: &str) -> Option<i64> {
        self.get(section, key)?.parse().ok()
    }

    fn get_u32(&self, section: &str, key: &str) -> Option<u32> {
        let value = self.get_i64(section, key)?;
        u32::try_from(value.max(0)).ok()
    }

    fn get_f32(&self, section: &str, key: &str) -> Option<f32> {
        self.get(section, key)?.parse().ok()
    }

    fn get_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get(section, key).map(parse_bool)
    }

    pub fn load_ui(&self) -> UiSettings {
        let mut ui = UiSettings::default();
        if let Some(opacity) = self.get_f32("blur", "opacity") {
            ui.opacity = opacity;
        }
        for (key, field) in COLOR_FIELDS {
            if let Some(color) = self.get("colors", key).and_then(Rgb::from_hex) {
                *field(&mut ui) = color;
            }
        }
        for (section, key, field) in SIZE_FIELDS {
            if let Some(value) = self.get_u32(section, key) {
                *field(&mut ui) = value;
            }
        }
        if let Some(seconds) = self.get_f32("goal_pulse", "seconds") {
            ui.goal_pulse_seconds = seconds;
        }
        if let Some(on_top) = self.get_bool("window", "always_on_top") {
            ui.always_on_top = on_top;
        }
        if let Some(start) = self.get_u32("totals", "week_start_day") {
            ui.week_start_day = start;
        }
        if let Some(mode) = self
            .get("totals", "year_display")
            .and_then(YearTotalDisplay::parse)
        {
            ui.year_total_display = mode;
        }
        for element in UiElement::ALL {
            if let Some(shown) = self.get_bool("ui", element.key()) {
                ui.visibility.set(element, shown);
            }
        }
        if let Some(use_24h) = self.get_bool("ui", "use_24h_time") {
            ui.use_24h_time = use_24h;
        }
        ui.normalize();
        ui
    }

    pub fn store_ui(&mut self, ui: &UiSettings) {
        let mut ui = ui.clone();
        ui.normalize();
        self.set("blur", "opacity", ui.opacity.to_string());
        for (key, field) in COLOR_FIELDS {
            let color = *field(&mut ui);
            self.set("colors", key, color.to_hex());
        }
        for (section, key, field) in SIZE_FIELDS {
            let value = *field(&mut ui);
            self.set(section, key, value.to_string());
        }
        self.set("goal_pulse", "seconds", ui.goal_pulse_seconds.to_string());
        self.set("window", "always_on_top", bool_text(ui.always_on_top));
        self.set("totals", "year_display", ui.year_total_display.key());
        self.set("totals", "week_start_day", ui.week_start_day.to_string());
        self.set("totals", "week_end_day", ui.week_end_day.to_string());
        for element in UiElement::ALL {
            self.set("ui", element.key(), bool_text(ui.visibility.is_shown(element)));
        }
        self.set("ui", "use_24h_time", bool_text(ui.use_24h_time));
    }

    pub fn load_hotkeys(&self) -> HotkeySettings {
        HotkeySettings {
            start: self.get("hotkeys", "start").unwrap_or_default().to_owned(),
            clock: self.get("hotkeys", "clock").unwrap_or_default().to_owned(),
            start_button: self.get("xinput", "start_button").and_then(PadButton::parse),
            clock_button: self.get("xinput", "clock_button").and_then(PadButton::parse),
        }
    }

    pub fn store_hotkeys(&mut self, hotkeys: &HotkeySettings) {
        self.set("hotkeys", "start", hotkeys.start.trim());
        self.set("hotkeys", "clock", hotkeys.clock.trim());
        let button_name = |button: Option<PadButton>| button.map(PadButton::name).unwrap_or("");
        self.set("xinput", "start_button", button_name(hotkeys.start_button));
        self.set("xinput", "clock_button", button_name(hotkeys.clock_button));
    }

    /// Saved window geometry; `None` until a size has been stored.
    pub fn load_window(&self) -> Option<WindowGeometry> {
        let width = self.get_u32("window", "width").filter(|value| *value > 0)?;
        let height = self.get_u32("window", "height").filter(|value| *value > 0)?;
        let coord = |key| {
            self.get_i64("window", key)
                .and_then(|value| i32::try_from(value).ok())
        };
        Some(WindowGeometry {
            x: coord("x"),
            y: coord("y"),
            width,
            height,
        })
    }

    pub fn store_window(&mut self, geometry: &WindowGeometry) {
        if let (Some(x), Some(y)) = (geometry.x, geometry.y) {
            self.set("window", "x", x.to_string());
            self.set("window", "y", y.to_string());
        }
        self.set("window", "width", geometry.width.to_string());
        self.set("window", "height", geometry.height.to_string());
    }

    pub fn active_profile(&self) -> Option<&str> {
        self.get("profiles", "active")
    }

    pub fn custom_profiles(&self) -> Vec<String> {
        self.get("profiles", "custom")
            .map(|raw| {
                raw.split('|')
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn store_profiles(&mut self, active: &str, custom: &[String]) {
        self.set("profiles", "active", active);
        self.set("profiles", "custom", custom.join("|"));
    }

    /// Explicit colors keyed by lowercased profile name.
    pub fn profile_colors(&self) -> BTreeMap<String, Rgb> {
        let Some(section) = self.ini.section(Some(PROFILE_COLORS_SECTION)) else {
            return BTreeMap::new();
        };
        section
            .iter()
            .filter_map(|(key, value)| Some((key.to_owned(), Rgb::from_hex(value)?)))
            .collect()
    }

    pub fn set_profile_color(&mut self, label: &str, color: Rgb) {
        self.set(PROFILE_COLORS_SECTION, &color_key(label), color.to_hex());
    }

    pub fn clear_profile_color(&mut self, label: &str) {
        self.remove(PROFILE_COLORS_SECTION, &color_key(label));
    }

    fn legacy_super_goal_seconds(&self) -> i64 {
        let hours = self
            .get_i64("super_goal", "hours")
            .unwrap_or(LEGACY_SUPER_GOAL_HOURS);
        let minutes = self.get_i64("super_goal", "minutes").unwrap_or(0);
        (hours * 3600 + minutes * 60).max(0)
    }

    /// The profile's daily super goal in seconds. A profile seen for the first time
    /// inherits the old global goal, which is then written under its own key.
    pub fn profile_super_goal(&mut self, label: &str) -> i64 {
        let (hours_key, minutes_key) = super_goal_keys(label);
        let hours = self.get("super_goal", &hours_key).map(str::to_owned);
        let minutes = self.get("super_goal", &minutes_key).map(str::to_owned);
        if hours.is_some() || minutes.is_some() {
            let parse = |value: Option<String>| {
                value.and_then(|text| text.parse::<i64>().ok()).unwrap_or(0)
            };
            return (parse(hours) * 3600 + parse(minutes) * 60).max(0);
        }
        let legacy = self.legacy_super_goal_seconds();
        self.set_profile_super_goal(label, legacy);
        legacy
    }

    pub fn set_profile_super_goal(&mut self, label: &str, seconds: i64) {
        let total = seconds.max(0);
        let (hours_key, minutes_key) = super_goal_keys(label);
        self.set("super_goal", &hours_key, (total / 3600).to_string());
        self.set("super_goal", &minutes_key, ((total % 3600) / 60).to_string());
    }

    pub fn clear_profile_super_goal(&mut self, label: &str) {
        let (hours_key, minutes_key) = super_goal_keys(label);
        self.remove("super_goal", &hours_key);
        self.remove("super_goal", &minutes_key);
    }

    /// Remembered profile choice of a secondary window (`logs`, `calendar`, `trends`).
    pub fn view_profile(&self, view: &str) -> Option<&str> {
        self.get(view, "selected_profile")
            .filter(|value| !value.is_empty())
    }

    pub fn set_view_profile(&mut self, view: &str, selection: &str) {
        self.set(view, "selected_profile", selection);
    }
}

fn super_goal_keys(label: &str) -> (String, String) {
    let key = super_goal_key(label);
    (
        format!("profiles/{key}/hours"),
        format!("profiles/{key}/minutes"),
    )
}

pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn bool_text(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::open(dir.path().join("settings.ini"));
        assert_eq!(store.load_ui(), UiSettings::default());
        assert_eq!(store.load_hotkeys(), HotkeySettings::default());
        assert_eq!(store.load_window(), None);
        assert!(store.custom_profiles().is_empty());
        Ok(())
    }

    #[test]
    fn settings_round_trip_through_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.ini");
        let mut ui = UiSettings {
            opacity: 0.855,
            heatmap_color: Rgb::new(0x12, 0x34, 0x56),
            heatmap_cell_size: 9,
            week_start_day: 3,
            week_end_day: 2,
            year_total_display: YearTotalDisplay::AvgWeek,
            use_24h_time: false,
            always_on_top: true,
            ..UiSettings::default()
        };
        ui.visibility.set(UiElement::Heatmap, false);
        let hotkeys = HotkeySettings {
            start: "Ctrl+Shift+S".to_owned(),
            clock: "F9".to_owned(),
            start_button: Some(PadButton::RightShoulder),
            clock_button: None,
        };
        let geometry = WindowGeometry {
            x: Some(-20),
            y: Some(40),
            width: 320,
            height: 480,
        };

        let mut store = SettingsStore::open(&path);
        store.store_ui(&ui);
        store.store_hotkeys(&hotkeys);
        store.store_window(&geometry);
        store.store_profiles("Kanji", &["Kanji".to_owned(), "Drawing".to_owned()]);
        store.set_profile_color("Kanji", Rgb::new(1, 2, 3));
        store.set_profile_super_goal("Anki/Migaku", 5_400);
        store.save()?;

        let mut reloaded = SettingsStore::open(&path);
        assert_eq!(reloaded.load_ui(), ui);
        assert_eq!(reloaded.load_hotkeys(), hotkeys);
        assert_eq!(reloaded.load_window(), Some(geometry));
        assert_eq!(reloaded.active_profile(), Some("Kanji"));
        assert_eq!(reloaded.custom_profiles(), ["Kanji", "Drawing"]);
        assert_eq!(
            reloaded.profile_colors().get("kanji"),
            Some(&Rgb::new(1, 2, 3))
        );
        assert_eq!(reloaded.profile_super_goal("Anki/Migaku"), 5_400);
        Ok(())
    }

    #[test]
    fn accepted_profile_names_round_trip() -> Result<()> {
        use crate::profile::ProfileRegistry;

        let dir = tempdir()?;
        let path = dir.path().join("settings.ini");
        let mut registry = ProfileRegistry::default();
        let first = registry.add("Reading & Fun (N5)!").map_err(anyhow::Error::new)?;
        let second = registry.add("Kana, 2nd pass").map_err(anyhow::Error::new)?;

        let mut store = SettingsStore::open(&path);
        store.store_profiles(&second, registry.custom());
        store.set_profile_color(&first, Rgb::new(4, 5, 6));
        store.set_profile_super_goal(&first, 5_400);
        store.set_profile_super_goal(&second, 600);
        store.save()?;

        let mut reloaded = SettingsStore::open(&path);
        assert_eq!(reloaded.custom_profiles(), [first.clone(), second.clone()]);
        assert_eq!(reloaded.active_profile(), Some(second.as_str()));
        assert_eq!(
            reloaded.profile_colors().get(&color_key(&first)),
            Some(&Rgb::new(4, 5, 6))
        );
        assert_eq!(reloaded.profile_super_goal(&first), 5_400);
        assert_eq!(reloaded.profile_super_goal(&second), 600);
        Ok(())
    }

    #[test]
    fn unknown_keys_survive_save() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.ini");
        fs::write(&path, "[extra]\nkeep=me\n[colors]\ntext=#010203\n")?;
        let mut store = SettingsStore::open(&path);
        let ui = store.load_ui();
        assert_eq!(ui.text_color, Rgb::new(1, 2, 3));
        store.store_ui(&ui);
        store.save()?;

        let reloaded = SettingsStore::open(&path);
        assert_eq!(reloaded.get("extra", "keep"), Some("me"));
        Ok(())
    }

    #[test]
    fn unknown_controller_buttons_are_unbound() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.ini");
        fs::write(&path, "[xinput]\nstart_button=DPad Left\nclock_button=Turbo\n")?;
        let hotkeys = SettingsStore::open(&path).load_hotkeys();
        assert_eq!(hotkeys.start_button, Some(PadButton::DPadLeft));
        assert_eq!(hotkeys.clock_button, None);
        Ok(())
    }

    #[test]
    fn invalid_values_are_clamped_or_ignored() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.ini");
        fs::write(
            &path,
            "[heatmap]\ncell_size=99\nmonth_label_size=2\n[totals]\nweek_start_day=4\nweek_end_day=1\nyear_display=weird\n[colors]\naccent=notacolor\n[ui]\nshow_heatmap=off\nshow_day_time=YES\n",
        )?;
        let ui = SettingsStore::open(&path).load_ui();
        assert_eq!(ui.heatmap_cell_size, 20);
        assert_eq!(ui.heatmap_month_label_size, 6);
        assert_eq!(ui.week_start_day, 4);
        assert_eq!(ui.week_end_day, 3);
        assert_eq!(ui.year_total_display, YearTotalDisplay::Hours);
        assert_eq!(ui.accent_color, UiSettings::default().accent_color);
        assert!(!ui.visibility.is_shown(UiElement::Heatmap));
        assert!(ui.visibility.is_shown(UiElement::DayTime));
        Ok(())
    }

    #[test]
    fn profile_super_goal_migrates_legacy_value() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings.ini");
        fs::write(&path, "[super_goal]\nhours=1\nminutes=15\n")?;
        let mut store = SettingsStore::open(&path);
        assert_eq!(store.profile_super_goal("Output"), 4_500);
        assert_eq!(store.get("super_goal", "profiles/output/hours"), Some("1"));

        store.set("super_goal", "hours", "3");
        assert_eq!(store.profile_super_goal("Output"), 4_500);

        let mut fresh = SettingsStore::open(dir.path().join("other.ini"));
        assert_eq!(fresh.profile_super_goal("Soroban"), 2 * 3600);
        fresh.clear_profile_super_goal("Soroban");
        assert_eq!(fresh.get("super_goal", "profiles/soroban/hours"), None);
        Ok(())
    }

    #[test]
    fn year_display_cycles_through_all_modes() {
        let mut mode = YearTotalDisplay::Hours;
        for expected in ["days", "week", "avg_week", "hours"] {
            mode = mode.next();
            assert_eq!(mode.key(), expected);
        }
        assert_eq!(YearTotalDisplay::parse(" AVG_WEEK "), Some(YearTotalDisplay::AvgWeek));
    }
}

//! Logs table, weekly calendar and trends graph windows.

use std::collections::BTreeSet;

use chrono::{Datelike, Local, NaiveDate, Timelike};
use countdown_core::calendar::{add_months, days_in_month, month_start, monday_for, shift_days};
use countdown_core::format::format_hm;
use countdown_core::log_store::LogBook;
use countdown_core::report::{
    calendar_blocks, format_block_duration, format_hour_label, label_indices, load_profile_logs,
    log_table, trend_series, trend_tooltip, week_day_totals, CalendarBlock, LogRange,
    ProfileColors, ProfileLog, TrendRange, TrendSeries, CALENDAR_SCALE_MINUTES_MAX,
    CALENDAR_SCALE_MINUTES_MIN,
};
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke};

use super::CountdownApp;
use crate::theme::{color32, with_alpha};

const LOGS_VIEW: &str = "logs";
const CALENDAR_VIEW: &str = "calendar";
const LOGS_ALL_PROFILES: &str = "__logs_all_profiles__";
const CALENDAR_ALL_PROFILES: &str = "__calendar_all_profiles__";
const ALL_PROFILES_LABEL: &str = "All profiles";

const LEFT_MARGIN: f32 = 68.0;
const HEADER_HEIGHT: f32 = 52.0;
const MIN_DAY_WIDTH: f32 = 120.0;
const DAY_PADDING: f32 = 4.0;
const BOTTOM_PADDING: f32 = 14.0;
const MIN_BLOCK_HEIGHT: f32 = 6.0;
const SCALE_OPTIONS: [u32; 5] = [5, 10, 15, 30, 60];
const DEFAULT_SCALE_MINUTES: u32 = 15;
const SCALE_HEIGHT_MAX: f32 = 100.0;
const SCALE_HEIGHT_MIN: f32 = 20.0;
const TODAY_BORDER: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);

const GRAPH_HEIGHT: f32 = 300.0;
const GRAPH_MARGIN_LEFT: f32 = 48.0;
const GRAPH_MARGIN_BOTTOM: f32 = 24.0;
const GRAPH_MARGIN_TOP: f32 = 10.0;
const GRAPH_GRID_LINES: i64 = 4;
const MAX_DOTTED_POINTS: usize = 90;

/// Which profile a view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ViewSelection {
    All,
    Profile(String),
}

impl ViewSelection {
    /// A stored choice that no longer names a profile falls back to the active one.
    fn restore(stored: Option<&str>, all_value: &str, labels: &[String], active: &str) -> Self {
        match stored {
            Some(value) if value == all_value => ViewSelection::All,
            Some(value) if labels.iter().any(|label| label == value) => {
                ViewSelection::Profile(value.to_owned())
            }
            _ => ViewSelection::Profile(active.to_owned()),
        }
    }

    fn stored_value<'a>(&'a self, all_value: &'a str) -> &'a str {
        match self {
            ViewSelection::All => all_value,
            ViewSelection::Profile(label) => label,
        }
    }

    fn text(&self) -> &str {
        self.stored_value(ALL_PROFILES_LABEL)
    }

    fn is_all(&self) -> bool {
        *self == ViewSelection::All
    }

    fn includes(&self, label: &str) -> bool {
        match self {
            ViewSelection::All => true,
            ViewSelection::Profile(selected) => selected == label,
        }
    }
}

struct LogsState {
    selection: ViewSelection,
    range: LogRange,
    selected: NaiveDate,
    picker_month: NaiveDate,
}

struct CalendarState {
    selection: ViewSelection,
    week_start: NaiveDate,
    scale_minutes: u32,
}

struct TrendsState {
    range: TrendRange,
    hidden: BTreeSet<String>,
    show_all_labels: bool,
}

/// Book size and totals of the active profile when the cache was filled.
type BookSignature = (usize, usize, i64, i64);

#[derive(Default)]
pub(super) struct Views {
    cache: Option<Vec<ProfileLog>>,
    active_signature: Option<BookSignature>,
    logs: Option<LogsState>,
    calendar: Option<CalendarState>,
    trends: Option<TrendsState>,
}

impl Views {
    /// Forces every profile log to be read again on the next frame.
    pub(super) fn invalidate(&mut self) {
        self.cache = None;
        self.active_signature = None;
    }

    fn any_open(&self) -> bool {
        self.logs.is_some() || self.calendar.is_some() || self.trends.is_some()
    }
}

fn book_signature(book: &LogBook) -> BookSignature {
    (
        book.entries.len(),
        book.goals.len(),
        book.totals.values().sum(),
        book.goals.values().sum(),
    )
}

fn snap_scale(minutes: u32) -> u32 {
    SCALE_OPTIONS
        .into_iter()
        .min_by_key(|option| option.abs_diff(minutes))
        .unwrap_or(DEFAULT_SCALE_MINUTES)
}

/// Vertical pixels per minute of the calendar at a grid step of `scale_minutes`.
/// One grid step is 100 px tall at 5 minutes, shrinking to 20 px at 120.
fn pixels_per_minute(scale_minutes: u32) -> f32 {
    let min = CALENDAR_SCALE_MINUTES_MIN as f32;
    let max = CALENDAR_SCALE_MINUTES_MAX as f32;
    let minutes = (scale_minutes as f32).clamp(min, max);
    let ratio = (minutes - min) / (max - min);
    let unit = SCALE_HEIGHT_MAX + (SCALE_HEIGHT_MIN - SCALE_HEIGHT_MAX) * ratio;
    unit / scale_minutes.max(1) as f32
}

fn scale_text(minutes: u32) -> String {
    if minutes >= 60 && minutes % 60 == 0 {
        let hours = minutes / 60;
        if hours == 1 {
            "1 hour".to_owned()
        } else {
            format!("{hours} hours")
        }
    } else {
        format!("{minutes} min")
    }
}

fn week_label(start: NaiveDate) -> String {
    let end = shift_days(start, 6);
    if start.year() == end.year() {
        format!("{} - {}", start.format("%b %-d"), end.format("%b %-d, %Y"))
    } else {
        format!("{} - {}", start.format("%b %-d, %Y"), end.format("%b %-d, %Y"))
    }
}

/// Rounds the graph's top value up to whole hours, at least one.
fn graph_ceiling(max_seconds: i64) -> i64 {
    let hours = (max_seconds.max(0) + 3599) / 3600;
    hours.max(1) * 3600
}

impl CountdownApp {
    pub(super) fn open_logs(&mut self) {
        let today = Self::today();
        let selection = ViewSelection::restore(
            self.settings.view_profile(LOGS_VIEW),
            LOGS_ALL_PROFILES,
            &self.registry.labels(),
            self.tracker.label(),
        );
        self.views.logs = Some(LogsState {
            selection,
            range: LogRange::Day,
            selected: today,
            picker_month: month_start(today),
        });
    }

    pub(super) fn open_calendar_view(&mut self) {
        let selection = ViewSelection::restore(
            self.settings.view_profile(CALENDAR_VIEW),
            CALENDAR_ALL_PROFILES,
            &self.registry.labels(),
            self.tracker.label(),
        );
        let scale_minutes = self
            .settings
            .get(CALENDAR_VIEW, "scale_minutes")
            .and_then(|value| value.trim().parse::<u32>().ok())
            .map(snap_scale)
            .unwrap_or(DEFAULT_SCALE_MINUTES);
        self.views.calendar = Some(CalendarState {
            selection,
            week_start: monday_for(Self::today()),
            scale_minutes,
        });
    }

    pub(super) fn open_trends(&mut self) {
        self.views.trends = Some(TrendsState {
            range: TrendRange::default(),
            hidden: BTreeSet::new(),
            show_all_labels: false,
        });
    }

    pub(super) fn draw_views(&mut self, ctx: &egui::Context) {
        if !self.views.any_open() {
            return;
        }
        self.refresh_profile_logs();
        self.draw_logs_window(ctx);
        self.draw_calendar_window(ctx);
        self.draw_trends_window(ctx);
    }

    fn refresh_profile_logs(&mut self) {
        let signature = book_signature(self.tracker.book());
        match self.views.cache.as_mut() {
            None => {
                self.views.cache = Some(load_profile_logs(
                    &self.config.data_dir,
                    &self.registry,
                    &mut self.settings,
                    &self.tracker,
                ));
                tracing::debug!("loaded profile logs for data views");
            }
            Some(logs) if self.views.active_signature != Some(signature) => {
                if let Some(active) = logs
                    .iter_mut()
                    .find(|log| log.label == self.tracker.label())
                {
                    active.book = self.tracker.book().clone();
                    active.fallback_goal_seconds = self.tracker.super_goal_seconds();
                }
            }
            Some(_) => {}
        }
        self.views.active_signature = Some(signature);
    }

    fn profile_colors(&self) -> ProfileColors {
        ProfileColors::new(
            self.settings.profile_colors(),
            self.tracker.label(),
            &self.ui_settings,
        )
    }

    fn remember_view_profile(&mut self, view: &str, all_value: &str, selection: &ViewSelection) {
        self.settings
            .set_view_profile(view, selection.stored_value(all_value));
        self.persist_settings();
    }

    // Logs

    fn draw_logs_window(&mut self, ctx: &egui::Context) {
        if self.views.logs.is_none() {
            return;
        }
        let mut open = true;
        let mut changed_selection = None;
        self.show_centered_window(
            ctx,
            "logs_window",
            "Logs",
            &mut open,
            egui::vec2(620.0, 460.0),
            |app, ui| {
                let labels = app.registry.labels();
                let colors = app.profile_colors();
                let Some(state) = app.views.logs.as_mut() else {
                    return;
                };
                ui.horizontal(|ui| {
                    ui.label("Profile");
                    if let Some(selection) =
                        profile_combo(ui, "logs_profile", &labels, &state.selection)
                    {
                        state.selection = selection.clone();
                        changed_selection = Some(selection);
                    }
                    ui.add_space(8.0);
                    ui.label("Range");
                    egui::ComboBox::from_id_salt("logs_range")
                        .selected_text(state.range.label())
                        .width(120.0)
                        .show_ui(ui, |ui| {
                            for range in [LogRange::Day, LogRange::Week] {
                                ui.selectable_value(&mut state.range, range, range.label());
                            }
                        });
                    ui.add_space(8.0);
                    date_picker(ui, state);
                    if ui.button("Today").clicked() {
                        let today = Self::today();
                        state.selected = today;
                        state.picker_month = month_start(today);
                    }
                });
                ui.separator();

                let Some(logs) = app.views.cache.as_deref() else {
                    return;
                };
                let shown: Vec<ProfileLog> = logs
                    .iter()
                    .filter(|log| state.selection.includes(&log.label))
                    .cloned()
                    .collect();
                let all = state.selection.is_all();
                let table = log_table(&shown, all, state.selected, state.range, Some(&colors));

                ui.horizontal(|ui| {
                    ui.label(&table.goal_text);
                    if let Some(week_total) = &table.week_total {
                        ui.add_space(12.0);
                        ui.label(week_total);
                    }
                });
                ui.add_space(4.0);

                if table.rows.is_empty() {
                    ui.weak("No sessions logged for this range.");
                    return;
                }
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        egui::Grid::new("logs_table")
                            .striped(true)
                            .spacing([16.0, 4.0])
                            .show(ui, |ui| {
                                for header in table.headers(all) {
                                    ui.strong(*header);
                                }
                                ui.end_row();
                                for (row, color) in table.rows.iter().zip(&table.row_colors) {
                                    ui.label(&row.date);
                                    if let Some(profile) = &row.profile {
                                        let text = egui::RichText::new(profile);
                                        match color {
                                            Some(color) => ui.label(text.color(color32(*color))),
                                            None => ui.label(text),
                                        };
                                    }
                                    ui.label(&row.started);
                                    ui.label(&row.paused);
                                    ui.label(&row.duration);
                                    ui.label(&row.percent);
                                    ui.end_row();
                                }
                            });
                    });
            },
        );
        if let Some(selection) = changed_selection {
            self.remember_view_profile(LOGS_VIEW, LOGS_ALL_PROFILES, &selection);
        }
        if !open {
            self.views.logs = None;
        }
    }

    // Calendar

    fn draw_calendar_window(&mut self, ctx: &egui::Context) {
        if self.views.calendar.is_none() {
            return;
        }
        let mut open = true;
        let mut changed_selection = None;
        let mut changed_scale = None;
        self.show_centered_window(
            ctx,
            "calendar_window",
            "Calendar View",
            &mut open,
            egui::vec2(980.0, 640.0),
            |app, ui| {
                let labels = app.registry.labels();
                let colors = app.profile_colors();
                let use_24h = app.ui_settings.use_24h_time;
                let Some(state) = app.views.calendar.as_mut() else {
                    return;
                };
                ui.horizontal(|ui| {
                    ui.label("Profile");
                    if let Some(selection) =
                        profile_combo(ui, "calendar_profile", &labels, &state.selection)
                    {
                        state.selection = selection.clone();
                        changed_selection = Some(selection);
                    }
                    ui.add_space(8.0);
                    if ui.button("<").clicked() {
                        state.week_start = shift_days(state.week_start, -7);
                    }
                    if ui.button("This week").clicked() {
                        state.week_start = monday_for(Self::today());
                    }
                    if ui.button(">").clicked() {
                        state.week_start = shift_days(state.week_start, 7);
                    }
                    ui.label(week_label(state.week_start));
                });
                ui.horizontal(|ui| {
                    ui.label("Scale");
                    let mut index = SCALE_OPTIONS
                        .iter()
                        .position(|option| *option == state.scale_minutes)
                        .unwrap_or(2);
                    let slider = egui::Slider::new(&mut index, 0..=SCALE_OPTIONS.len() - 1)
                        .show_value(false);
                    if ui.add(slider).changed() {
                        state.scale_minutes = SCALE_OPTIONS[index];
                        changed_scale = Some(state.scale_minutes);
                    }
                    ui.label(scale_text(state.scale_minutes));
                });
                ui.separator();

                let Some(logs) = app.views.cache.as_deref() else {
                    return;
                };
                let picked: Vec<&ProfileLog> = logs
                    .iter()
                    .filter(|log| state.selection.includes(&log.label))
                    .collect();
                let totals = week_day_totals(
                    picked.iter().copied().flat_map(|log| log.book.entries.iter()),
                    state.week_start,
                );
                let blocks = calendar_blocks(
                    picked.iter().copied().flat_map(|log| {
                        let color = colors.line(&log.label);
                        log.book
                            .entries
                            .iter()
                            .map(move |entry| (entry, log.label.as_str(), color))
                    }),
                    state.week_start,
                    use_24h,
                );
                draw_week_grid(ui, state, &totals, &blocks, use_24h);
            },
        );
        if let Some(selection) = changed_selection {
            self.remember_view_profile(CALENDAR_VIEW, CALENDAR_ALL_PROFILES, &selection);
        }
        if let Some(minutes) = changed_scale {
            self.settings
                .set(CALENDAR_VIEW, "scale_minutes", minutes.to_string());
            self.persist_settings();
        }
        if !open {
            self.views.calendar = None;
        }
    }

    // Trends

    fn draw_trends_window(&mut self, ctx: &egui::Context) {
        if self.views.trends.is_none() {
            return;
        }
        let mut open = true;
        self.show_centered_window(
            ctx,
            "trends_window",
            "Trends Graph",
            &mut open,
            egui::vec2(760.0, 440.0),
            |app, ui| {
                let colors = app.profile_colors();
                let grid_color = color32(app.ui_settings.graph_grid_color);
                let Some(state) = app.views.trends.as_mut() else {
                    return;
                };
                let Some(logs) = app.views.cache.as_deref() else {
                    return;
                };
                ui.horizontal(|ui| {
                    ui.label("Range");
                    egui::ComboBox::from_id_salt("trends_range")
                        .selected_text(state.range.label())
                        .width(120.0)
                        .show_ui(ui, |ui| {
                            for range in TrendRange::ALL {
                                ui.selectable_value(&mut state.range, range, range.label());
                            }
                        });
                    ui.checkbox(&mut state.show_all_labels, "All date labels");
                });
                ui.horizontal_wrapped(|ui| {
                    for log in logs {
                        let mut visible = !state.hidden.contains(&log.label);
                        let text = egui::RichText::new(&log.label)
                            .color(color32(colors.line(&log.label)));
                        if ui.checkbox(&mut visible, text).changed() {
                            if visible {
                                state.hidden.remove(&log.label);
                            } else {
                                state.hidden.insert(log.label.clone());
                            }
                        }
                    }
                });
                ui.separator();

                let dates = state.range.dates(Self::today());
                let series = trend_series(logs, state.range, &dates, &colors);
                let visible: Vec<&TrendSeries> = series
                    .iter()
                    .filter(|entry| !state.hidden.contains(&entry.label))
                    .collect();
                draw_trend_graph(ui, state, &dates, &visible, grid_color);
            },
        );
        if !open {
            self.views.trends = None;
        }
    }
}

/// Profile picker with an "All profiles" entry. Returns the new choice.
fn profile_combo(
    ui: &mut egui::Ui,
    id: &str,
    labels: &[String],
    current: &ViewSelection,
) -> Option<ViewSelection> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.text())
        .width(170.0)
        .show_ui(ui, |ui| {
            if ui
                .selectable_label(current.is_all(), ALL_PROFILES_LABEL)
                .clicked()
            {
                picked = Some(ViewSelection::All);
            }
            for label in labels {
                let checked = current.includes(label) && !current.is_all();
                if ui.selectable_label(checked, label.as_str()).clicked() {
                    picked = Some(ViewSelection::Profile(label.clone()));
                }
            }
        });
    picked.filter(|selection| selection != current)
}

fn date_picker(ui: &mut egui::Ui, state: &mut LogsState) {
    let button = ui.button(state.selected.format("%Y-%m-%d").to_string());
    let popup_id = ui.make_persistent_id("logs_date_picker");
    if button.clicked() {
        state.picker_month = month_start(state.selected);
        ui.memory_mut(|memory| memory.toggle_popup(popup_id));
    }
    egui::popup::popup_below_widget(
        ui,
        popup_id,
        &button,
        egui::PopupCloseBehavior::CloseOnClickOutside,
        |ui| {
            if let Some(date) = draw_month_picker(ui, state) {
                state.selected = date;
                ui.memory_mut(|memory| memory.close_popup());
            }
        },
    );
}

fn draw_month_picker(ui: &mut egui::Ui, state: &mut LogsState) -> Option<NaiveDate> {
    ui.set_min_width(250.0);
    ui.horizontal(|ui| {
        if ui.button("<").clicked() {
            if let Some(month) = add_months(state.picker_month, -1) {
                state.picker_month = month;
            }
        }
        ui.add_space(6.0);
        ui.label(state.picker_month.format("%Y-%m").to_string());
        ui.add_space(6.0);
        if ui.button(">").clicked() {
            if let Some(month) = add_months(state.picker_month, 1) {
                state.picker_month = month;
            }
        }
    });
    ui.add_space(4.0);

    ui.horizontal(|ui| {
        for name in ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"] {
            ui.add_sized(
                [32.0, 18.0],
                egui::Label::new(egui::RichText::new(name).small()),
            );
        }
    });

    let month = state.picker_month;
    let first_weekday = month.weekday().num_days_from_monday() as usize;
    let total_days = days_in_month(month);
    let today = Local::now().date_naive();
    let mut day: u32 = 1;
    let mut picked = None;

    for row in 0..6 {
        ui.horizontal(|ui| {
            for col in 0..7 {
                let cell = row * 7 + col;
                if cell < first_weekday || day > total_days {
                    ui.add_sized([32.0, 24.0], egui::Label::new(""));
                    continue;
                }
                let Some(date) = NaiveDate::from_ymd_opt(month.year(), month.month(), day) else {
                    day += 1;
                    continue;
                };

                let mut button = egui::Button::new(day.to_string())
                    .min_size(egui::vec2(32.0, 24.0))
                    .frame(false);
                if date == state.selected {
                    let selection = ui.visuals().selection;
                    button = egui::Button::new(
                        egui::RichText::new(day.to_string()).color(selection.stroke.color),
                    )
                    .min_size(egui::vec2(32.0, 24.0))
                    .fill(selection.bg_fill)
                    .stroke(Stroke::NONE);
                } else if date == today {
                    button = button
                        .frame(true)
                        .fill(Color32::TRANSPARENT)
                        .stroke(Stroke::new(1.0, Color32::from_rgb(80, 130, 210)));
                }
                if ui.add(button).clicked() {
                    picked = Some(date);
                }
                day += 1;
            }
        });
        if day > total_days {
            break;
        }
    }
    picked
}

fn draw_week_grid(
    ui: &mut egui::Ui,
    state: &CalendarState,
    totals: &[i64; 7],
    blocks: &[CalendarBlock],
    use_24h: bool,
) {
    let px_per_min = pixels_per_minute(state.scale_minutes);
    let day_height = 24.0 * 60.0 * px_per_min;
    let text_color = ui.visuals().text_color();
    let line_color = ui.visuals().widgets.noninteractive.bg_stroke.color;
    let today = Local::now().date_naive();

    egui::ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let day_width = ((ui.available_width() - LEFT_MARGIN) / 7.0).max(MIN_DAY_WIDTH);
            let size = egui::vec2(
                LEFT_MARGIN + day_width * 7.0,
                HEADER_HEIGHT + day_height + BOTTOM_PADDING,
            );
            let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
            let painter = ui.painter_at(rect);
            let grid_top = rect.top() + HEADER_HEIGHT;
            let column_left = |index: usize| rect.left() + LEFT_MARGIN + day_width * index as f32;

            for (index, total) in totals.iter().enumerate() {
                let date = shift_days(state.week_start, index as i64);
                let left = column_left(index);
                let center = left + day_width * 0.5;
                painter.text(
                    Pos2::new(center, rect.top() + 16.0),
                    Align2::CENTER_CENTER,
                    date.format("%a %b %-d").to_string(),
                    FontId::proportional(13.0),
                    text_color,
                );
                painter.text(
                    Pos2::new(center, rect.top() + 34.0),
                    Align2::CENTER_CENTER,
                    format_hm(*total),
                    FontId::proportional(11.0),
                    text_color.gamma_multiply(0.7),
                );
                painter.line_segment(
                    [
                        Pos2::new(left, rect.top()),
                        Pos2::new(left, grid_top + day_height),
                    ],
                    Stroke::new(1.0, line_color),
                );
                if date == today {
                    let column = Rect::from_min_max(
                        Pos2::new(left, rect.top()),
                        Pos2::new(left + day_width, grid_top + day_height),
                    );
                    painter.rect_stroke(column.shrink(1.0), 4.0, Stroke::new(2.0, TODAY_BORDER));
                }
            }

            for hour in 0..=24u32 {
                let y = grid_top + (hour * 60) as f32 * px_per_min;
                painter.line_segment(
                    [
                        Pos2::new(rect.left() + LEFT_MARGIN, y),
                        Pos2::new(rect.right(), y),
                    ],
                    Stroke::new(1.0, line_color),
                );
                if hour < 24 {
                    painter.text(
                        Pos2::new(rect.left() + LEFT_MARGIN - 8.0, y),
                        Align2::RIGHT_CENTER,
                        format_hour_label(hour, use_24h),
                        FontId::proportional(11.0),
                        text_color.gamma_multiply(0.7),
                    );
                }
            }

            let minor_step = state.scale_minutes;
            if minor_step < 60 && minor_step as f32 * px_per_min >= 8.0 {
                let minor = line_color.gamma_multiply(0.4);
                for minute in (0..24 * 60).step_by(minor_step as usize) {
                    if minute % 60 == 0 {
                        continue;
                    }
                    let y = grid_top + minute as f32 * px_per_min;
                    painter.line_segment(
                        [
                            Pos2::new(rect.left() + LEFT_MARGIN, y),
                            Pos2::new(rect.right(), y),
                        ],
                        Stroke::new(1.0, minor),
                    );
                }
            }

            let now = Local::now().naive_local();
            if let Some(index) = (0..7).find(|day| shift_days(state.week_start, *day) == today) {
                let minutes = now.time().num_seconds_from_midnight() as f32 / 60.0;
                let y = grid_top + minutes * px_per_min;
                let left = column_left(index as usize);
                painter.line_segment(
                    [Pos2::new(left, y), Pos2::new(left + day_width, y)],
                    Stroke::new(2.0, TODAY_BORDER),
                );
            }

            let hover = response.hover_pos();
            let mut hovered: Option<&CalendarBlock> = None;
            for block in blocks {
                let left = column_left(block.day_index as usize) + DAY_PADDING;
                let top = grid_top + block.start_seconds as f32 / 60.0 * px_per_min;
                let height = ((block.end_seconds - block.start_seconds) as f32 / 60.0
                    * px_per_min)
                    .max(MIN_BLOCK_HEIGHT);
                let block_rect = Rect::from_min_size(
                    Pos2::new(left, top),
                    egui::vec2(day_width - DAY_PADDING * 2.0, height),
                );
                painter.rect_filled(block_rect, 4.0, with_alpha(block.color, 200));
                if height >= 18.0 {
                    painter.text(
                        block_rect.left_top() + egui::vec2(6.0, 4.0),
                        Align2::LEFT_TOP,
                        format!(
                            "{}  {}",
                            block.label,
                            format_block_duration(block.end_seconds - block.start_seconds)
                        ),
                        FontId::proportional(11.0),
                        color32(block.color.contrast_text()),
                    );
                }
                if hover.is_some_and(|pos| block_rect.contains(pos)) {
                    hovered = Some(block);
                }
            }

            if let Some(block) = hovered {
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    ui.layer_id(),
                    ui.id().with("calendar_block_tooltip"),
                    |ui| {
                        ui.strong(&block.profile);
                        ui.label(&block.label);
                        ui.label(format_block_duration(block.end_seconds - block.start_seconds));
                    },
                );
            }
        });
}

fn draw_trend_graph(
    ui: &mut egui::Ui,
    state: &TrendsState,
    dates: &[NaiveDate],
    series: &[&TrendSeries],
    grid_color: Color32,
) {
    let count = dates.len();
    let width = ui.available_width().max(200.0);
    let (rect, response) = ui.allocate_exact_size(egui::vec2(width, GRAPH_HEIGHT), Sense::hover());
    let painter = ui.painter_at(rect);
    let text_color = ui.visuals().text_color();
    let plot = Rect::from_min_max(
        Pos2::new(rect.left() + GRAPH_MARGIN_LEFT, rect.top() + GRAPH_MARGIN_TOP),
        Pos2::new(rect.right() - 8.0, rect.bottom() - GRAPH_MARGIN_BOTTOM),
    );
    if count == 0 {
        return;
    }

    let max_value = series
        .iter()
        .flat_map(|entry| entry.values.iter().copied())
        .max()
        .unwrap_or(0);
    let ceiling = graph_ceiling(max_value);
    let x_for = |index: usize| {
        if count <= 1 {
            plot.center().x
        } else {
            plot.left() + plot.width() * index as f32 / (count - 1) as f32
        }
    };
    let y_for = |seconds: i64| plot.bottom() - plot.height() * seconds as f32 / ceiling as f32;

    for step in 0..=GRAPH_GRID_LINES {
        let seconds = ceiling * step / GRAPH_GRID_LINES;
        let y = y_for(seconds);
        painter.line_segment(
            [Pos2::new(plot.left(), y), Pos2::new(plot.right(), y)],
            Stroke::new(1.0, grid_color.gamma_multiply(0.35)),
        );
        painter.text(
            Pos2::new(plot.left() - 6.0, y),
            Align2::RIGHT_CENTER,
            format_hm(seconds),
            FontId::proportional(10.0),
            text_color.gamma_multiply(0.7),
        );
    }
    for index in label_indices(count, state.show_all_labels) {
        let x = x_for(index);
        painter.text(
            Pos2::new(x, plot.bottom() + 6.0),
            Align2::CENTER_TOP,
            state.range.axis_label(dates[index]),
            FontId::proportional(10.0),
            text_color.gamma_multiply(0.7),
        );
    }

    for entry in series {
        let points: Vec<Pos2> = entry
            .values
            .iter()
            .enumerate()
            .map(|(index, seconds)| Pos2::new(x_for(index), y_for(*seconds)))
            .collect();
        painter.add(area_mesh(&points, plot.bottom(), with_alpha(entry.fill, 40)));
        painter.add(Shape::line(points.clone(), Stroke::new(2.0, color32(entry.line))));
        if count <= MAX_DOTTED_POINTS {
            for point in &points {
                painter.circle_filled(*point, 3.0, color32(entry.dot));
            }
        }
    }

    let Some(pos) = response.hover_pos() else {
        return;
    };
    if !plot.expand(4.0).contains(pos) {
        return;
    }
    let index = nearest_index(pos.x, plot, count);
    let x = x_for(index);
    painter.line_segment(
        [Pos2::new(x, plot.top()), Pos2::new(x, plot.bottom())],
        Stroke::new(1.0, grid_color),
    );
    let text = trend_tooltip(state.range, dates[index], index, series);
    egui::show_tooltip_at_pointer(
        ui.ctx(),
        ui.layer_id(),
        ui.id().with("trend_tooltip"),
        |ui| {
            ui.label(text);
        },
    );
}

fn nearest_index(x: f32, plot: Rect, count: usize) -> usize {
    if count <= 1 || plot.width() <= 0.0 {
        return 0;
    }
    let ratio = ((x - plot.left()) / plot.width()).clamp(0.0, 1.0);
    ((ratio * (count - 1) as f32).round() as usize).min(count - 1)
}

/// Filled area between a polyline and the baseline.
fn area_mesh(points: &[Pos2], baseline: f32, color: Color32) -> Shape {
    let mut mesh = egui::Mesh::default();
    for pair in points.windows(2) {
        let base = mesh.vertices.len() as u32;
        mesh.colored_vertex(pair[0], color);
        mesh.colored_vertex(Pos2::new(pair[0].x, baseline), color);
        mesh.colored_vertex(pair[1], color);
        mesh.colored_vertex(Pos2::new(pair[1].x, baseline), color);
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base + 2, base + 1, base + 3);
    }
    Shape::mesh(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_selection_falls_back_to_active_profile() {
        let labels = vec!["Output".to_owned(), "Kanji".to_owned()];
        assert_eq!(
            ViewSelection::restore(Some(LOGS_ALL_PROFILES), LOGS_ALL_PROFILES, &labels, "Output"),
            ViewSelection::All
        );
        assert_eq!(
            ViewSelection::restore(Some("Kanji"), LOGS_ALL_PROFILES, &labels, "Output"),
            ViewSelection::Profile("Kanji".to_owned())
        );
        assert_eq!(
            ViewSelection::restore(Some("Gone"), LOGS_ALL_PROFILES, &labels, "Output"),
            ViewSelection::Profile("Output".to_owned())
        );
        assert_eq!(
            ViewSelection::All.stored_value(CALENDAR_ALL_PROFILES),
            CALENDAR_ALL_PROFILES
        );
    }

    #[test]
    fn calendar_scale_shrinks_with_coarser_steps() {
        assert!((pixels_per_minute(5) - 20.0).abs() < 1e-4);
        assert!((pixels_per_minute(120) - 20.0 / 120.0).abs() < 1e-4);
        let mut previous = f32::MAX;
        for option in SCALE_OPTIONS {
            let current = pixels_per_minute(option);
            assert!(current < previous);
            previous = current;
        }
    }

    #[test]
    fn unknown_scales_snap_to_nearest_option() {
        assert_eq!(snap_scale(15), 15);
        assert_eq!(snap_scale(14), 15);
        assert_eq!(snap_scale(45), 30);
        assert_eq!(snap_scale(500), 60);
        assert_eq!(scale_text(60), "1 hour");
        assert_eq!(scale_text(30), "30 min");
    }

    #[test]
    fn week_label_spans_years_when_needed() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(week_label(start), "Mar 4 - Mar 10, 2024");
        let start = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(week_label(start), "Dec 30, 2024 - Jan 5, 2025");
    }

    #[test]
    fn graph_ceiling_rounds_up_to_hours() {
        assert_eq!(graph_ceiling(0), 3600);
        assert_eq!(graph_ceiling(3600), 3600);
        assert_eq!(graph_ceiling(3601), 7200);
    }

    #[test]
    fn hover_picks_nearest_point() {
        let plot = Rect::from_min_size(Pos2::new(0.0, 0.0), egui::vec2(100.0, 50.0));
        assert_eq!(nearest_index(0.0, plot, 5), 0);
        assert_eq!(nearest_index(49.0, plot, 5), 2);
        assert_eq!(nearest_index(500.0, plot, 5), 4);
        assert_eq!(nearest_index(30.0, plot, 1), 0);
    }
}

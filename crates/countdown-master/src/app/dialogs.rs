//! Windows opened from the context menu: goal and time entry, settings,
//! hotkeys and profile management.

use std::collections::BTreeMap;

use chrono::{NaiveTime, Timelike};
use countdown_core::calendar::{expected_week_end, expected_week_start};
use countdown_core::color::Rgb;
use countdown_core::gamepad::PadButton;
use countdown_core::report::{format_clock_time, ProfileColors};
use countdown_core::settings::{HotkeySettings, UiSettings, YearTotalDisplay};
use eframe::egui::{self, DragValue};

use super::{CountdownApp, ProfileAction};
use crate::hotkeys::{captured_shortcut, parse_shortcut};
use crate::theme::{color32, draw_section_header, rgb_from};

const MAX_GOAL_HOURS: u32 = 99;
const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

type ColorRow = (&'static str, fn(&mut UiSettings) -> &mut Rgb);
type SizeRow = (&'static str, fn(&mut UiSettings) -> &mut u32);

const COLOR_ROWS: [ColorRow; 17] = [
    ("Background", |ui| &mut ui.bg_color),
    ("Text", |ui| &mut ui.text_color),
    ("Accent", |ui| &mut ui.accent_color),
    ("Day time", |ui| &mut ui.day_time_color),
    ("Total today", |ui| &mut ui.total_today_color),
    ("Goal left", |ui| &mut ui.goal_left_color),
    ("Heatmap", |ui| &mut ui.heatmap_color),
    ("Heatmap hover background", |ui| &mut ui.heatmap_hover_bg_color),
    ("Heatmap hover text", |ui| &mut ui.heatmap_hover_text_color),
    ("Heatmap hover cell", |ui| &mut ui.heatmap_hover_cell_color),
    ("Graph line", |ui| &mut ui.graph_line_color),
    ("Graph dot", |ui| &mut ui.graph_dot_color),
    ("Graph fill", |ui| &mut ui.graph_fill_color),
    ("Graph grid", |ui| &mut ui.graph_grid_color),
    ("Super goal bar start", |ui| &mut ui.super_goal_bar_start),
    ("Super goal bar end", |ui| &mut ui.super_goal_bar_end),
    ("Super goal bar background", |ui| &mut ui.super_goal_bar_bg),
];

const FONT_ROWS: [SizeRow; 5] = [
    ("Timer", |ui| &mut ui.font_size),
    ("Labels", |ui| &mut ui.label_size),
    ("Day time", |ui| &mut ui.day_time_font_size),
    ("Total today", |ui| &mut ui.total_today_font_size),
    ("Goal left", |ui| &mut ui.goal_left_font_size),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormResult {
    Pending,
    Accepted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DurationForm {
    hours: u32,
    minutes: u32,
    seconds: u32,
}

impl DurationForm {
    fn from_seconds(total: i64) -> Self {
        let max = i64::from(MAX_GOAL_HOURS) * 3600 + 59 * 60 + 59;
        let total = total.clamp(0, max) as u32;
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    fn total_seconds(self) -> i64 {
        i64::from(self.hours) * 3600 + i64::from(self.minutes) * 60 + i64::from(self.seconds)
    }
}

struct GoalForm {
    duration: DurationForm,
    super_goal_left: i64,
}

struct AddTimeForm {
    hours: u32,
    minutes: u32,
    start_hour: u32,
    start_minute: u32,
    use_24h: bool,
}

impl AddTimeForm {
    fn start(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour.min(23), self.start_minute.min(59), 0)
            .unwrap_or(NaiveTime::MIN)
    }

    fn duration_seconds(&self) -> i64 {
        i64::from(self.hours) * 3600 + i64::from(self.minutes) * 60
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HotkeyTarget {
    Start,
    Clock,
}

struct HotkeyForm {
    start: String,
    clock: String,
    start_button: Option<PadButton>,
    clock_button: Option<PadButton>,
    recording: Option<HotkeyTarget>,
    error: Option<String>,
}

struct ProfileEditorForm {
    selected: String,
    colors: BTreeMap<String, Rgb>,
    initial: BTreeMap<String, Rgb>,
}

#[derive(Default)]
pub(super) struct Dialogs {
    goal: Option<GoalForm>,
    super_goal: Option<DurationForm>,
    add_time: Option<AddTimeForm>,
    settings: Option<UiSettings>,
    hotkeys: Option<HotkeyForm>,
    profile_editor: Option<ProfileEditorForm>,
    add_profile: Option<String>,
    delete_profile: Option<String>,
}

impl Dialogs {
    pub(super) fn open_goal(&mut self, remaining_seconds: i64, super_goal_left: i64) {
        self.goal = Some(GoalForm {
            duration: DurationForm::from_seconds(remaining_seconds),
            super_goal_left: super_goal_left.max(0),
        });
    }

    pub(super) fn open_super_goal(&mut self, seconds: i64) {
        self.super_goal = Some(DurationForm {
            seconds: 0,
            ..DurationForm::from_seconds(seconds)
        });
    }

    pub(super) fn open_add_time(&mut self, now: NaiveTime, settings: &UiSettings) {
        self.add_time = Some(AddTimeForm {
            hours: 0,
            minutes: 0,
            start_hour: now.hour(),
            start_minute: now.minute(),
            use_24h: settings.use_24h_time,
        });
    }

    pub(super) fn open_settings(&mut self, settings: &UiSettings) {
        self.settings = Some(settings.clone());
    }

    pub(super) fn open_hotkeys(&mut self, hotkeys: &HotkeySettings) {
        self.hotkeys = Some(HotkeyForm {
            start: hotkeys.start.clone(),
            clock: hotkeys.clock.clone(),
            start_button: hotkeys.start_button,
            clock_button: hotkeys.clock_button,
            recording: None,
            error: None,
        });
    }

    pub(super) fn open_add_profile(&mut self) {
        self.add_profile = Some(String::new());
    }

    pub(super) fn open_delete_profile(&mut self, first: &str) {
        self.delete_profile = Some(first.to_owned());
    }

    pub(super) fn is_recording_hotkey(&self) -> bool {
        self.hotkeys
            .as_ref()
            .is_some_and(|form| form.recording.is_some())
    }
}

impl CountdownApp {
    pub(super) fn open_profile_editor(&mut self) {
        let labels = self.registry.labels();
        let colors = ProfileColors::new(
            self.settings.profile_colors(),
            self.tracker.label(),
            &self.ui_settings,
        );
        let resolved: BTreeMap<String, Rgb> = labels
            .iter()
            .map(|label| (label.clone(), colors.line(label)))
            .collect();
        self.dialogs.profile_editor = Some(ProfileEditorForm {
            selected: self.tracker.label().to_owned(),
            initial: resolved.clone(),
            colors: resolved,
        });
    }

    pub(super) fn draw_dialogs(&mut self, ctx: &egui::Context) {
        self.draw_goal_dialog(ctx);
        self.draw_super_goal_dialog(ctx);
        self.draw_add_time_dialog(ctx);
        self.draw_settings_dialog(ctx);
        self.draw_hotkey_dialog(ctx);
        self.draw_profile_editor(ctx);
        self.draw_add_profile_dialog(ctx);
        self.draw_delete_profile_dialog(ctx);
    }

    fn draw_goal_dialog(&mut self, ctx: &egui::Context) {
        if self.dialogs.goal.is_none() {
            return;
        }
        let mut open = true;
        let mut result = FormResult::Pending;
        self.show_centered_window(
            ctx,
            "goal_dialog",
            "Set Current Goal",
            &mut open,
            egui::vec2(280.0, 150.0),
            |app, ui| {
                let Some(form) = app.dialogs.goal.as_mut() else {
                    return;
                };
                if duration_fields(ui, "goal_fields", &mut form.duration) {
                    form.duration.seconds = 0;
                }
                if form.duration.seconds > 0 {
                    ui.weak(format!("plus {} s", form.duration.seconds));
                }
                ui.add_space(4.0);
                let left = form.super_goal_left;
                let add = ui
                    .add_enabled(left > 0, egui::Button::new("Add Super Goal Left"))
                    .on_disabled_hover_text("No super goal time left to add.");
                if add.clicked() {
                    form.duration =
                        DurationForm::from_seconds(form.duration.total_seconds() + left);
                }
                result = form_buttons(ui, "OK", true);
            },
        );
        match result {
            FormResult::Accepted => {
                if let Some(form) = self.dialogs.goal.take() {
                    self.set_goal_time(form.duration.total_seconds());
                }
            }
            FormResult::Cancelled => self.dialogs.goal = None,
            FormResult::Pending if !open => self.dialogs.goal = None,
            FormResult::Pending => {}
        }
    }

    fn draw_super_goal_dialog(&mut self, ctx: &egui::Context) {
        if self.dialogs.super_goal.is_none() {
            return;
        }
        let mut open = true;
        let mut result = FormResult::Pending;
        self.show_centered_window(
            ctx,
            "super_goal_dialog",
            "Set Daily Super Goal",
            &mut open,
            egui::vec2(260.0, 120.0),
            |app, ui| {
                let Some(form) = app.dialogs.super_goal.as_mut() else {
                    return;
                };
                egui::Grid::new("super_goal_fields")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Hours");
                        ui.add(DragValue::new(&mut form.hours).range(0..=MAX_GOAL_HOURS));
                        ui.end_row();
                        ui.label("Minutes");
                        ui.add(DragValue::new(&mut form.minutes).range(0..=59));
                        ui.end_row();
                    });
                result = form_buttons(ui, "OK", true);
            },
        );
        match result {
            FormResult::Accepted => {
                if let Some(form) = self.dialogs.super_goal.take() {
                    self.set_super_goal(form.total_seconds());
                }
            }
            FormResult::Cancelled => self.dialogs.super_goal = None,
            FormResult::Pending if !open => self.dialogs.super_goal = None,
            FormResult::Pending => {}
        }
    }

    fn draw_add_time_dialog(&mut self, ctx: &egui::Context) {
        if self.dialogs.add_time.is_none() {
            return;
        }
        let mut open = true;
        let mut result = FormResult::Pending;
        self.show_centered_window(
            ctx,
            "add_time_dialog",
            "Add Time",
            &mut open,
            egui::vec2(280.0, 160.0),
            |app, ui| {
                let Some(form) = app.dialogs.add_time.as_mut() else {
                    return;
                };
                egui::Grid::new("add_time_fields")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Hours");
                        ui.add(DragValue::new(&mut form.hours).range(0..=23));
                        ui.end_row();
                        ui.label("Minutes");
                        ui.add(DragValue::new(&mut form.minutes).range(0..=59));
                        ui.end_row();
                        ui.label("Start time");
                        ui.horizontal(|ui| {
                            ui.add(DragValue::new(&mut form.start_hour).range(0..=23));
                            ui.label(":");
                            ui.add(DragValue::new(&mut form.start_minute).range(0..=59));
                            ui.weak(format_clock_time(form.start(), form.use_24h));
                        });
                        ui.end_row();
                    });
                result = form_buttons(ui, "OK", true);
            },
        );
        match result {
            FormResult::Accepted => {
                if let Some(form) = self.dialogs.add_time.take() {
                    self.add_time(form.start(), form.duration_seconds());
                }
            }
            FormResult::Cancelled => self.dialogs.add_time = None,
            FormResult::Pending if !open => self.dialogs.add_time = None,
            FormResult::Pending => {}
        }
    }

    fn draw_settings_dialog(&mut self, ctx: &egui::Context) {
        if self.dialogs.settings.is_none() {
            return;
        }
        let mut open = true;
        let mut result = FormResult::Pending;
        self.show_centered_window(
            ctx,
            "settings_dialog",
            "Settings",
            &mut open,
            egui::vec2(420.0, 520.0),
            |app, ui| {
                let Some(draft) = app.dialogs.settings.as_mut() else {
                    return;
                };
                egui::ScrollArea::vertical()
                    .max_height(460.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| settings_fields(ui, draft));
                result = form_buttons(ui, "Save", true);
            },
        );
        match result {
            FormResult::Accepted => {
                if let Some(draft) = self.dialogs.settings.take() {
                    self.apply_ui_settings(ctx, draft);
                }
            }
            FormResult::Cancelled => self.dialogs.settings = None,
            FormResult::Pending if !open => self.dialogs.settings = None,
            FormResult::Pending => {}
        }
    }

    fn draw_hotkey_dialog(&mut self, ctx: &egui::Context) {
        if self.dialogs.hotkeys.is_none() {
            return;
        }
        if let Some(form) = self.dialogs.hotkeys.as_mut() {
            if let Some(target) = form.recording {
                if ctx.input(|input| input.key_pressed(egui::Key::Escape)) {
                    form.recording = None;
                } else if let Some(text) = captured_shortcut(ctx) {
                    match target {
                        HotkeyTarget::Start => form.start = text,
                        HotkeyTarget::Clock => form.clock = text,
                    }
                    form.recording = None;
                    form.error = None;
                }
            }
        }

        let mut open = true;
        let mut result = FormResult::Pending;
        self.show_centered_window(
            ctx,
            "hotkey_dialog",
            "Hotkey Settings",
            &mut open,
            egui::vec2(360.0, 260.0),
            |app, ui| {
                let gamepad_available = app.gamepad.is_available();
                let Some(form) = app.dialogs.hotkeys.as_mut() else {
                    return;
                };
                draw_section_header(ui, "Keyboard");
                egui::Grid::new("hotkey_fields")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        hotkey_row(ui, "Start toggle", HotkeyTarget::Start, form);
                        hotkey_row(ui, "Clock toggle", HotkeyTarget::Clock, form);
                    });
                ui.weak("Hotkeys work while this window has focus.");
                draw_section_header(ui, "Gamepad");
                ui.add_enabled_ui(gamepad_available, |ui| {
                    egui::Grid::new("gamepad_fields")
                        .num_columns(2)
                        .spacing([12.0, 6.0])
                        .show(ui, |ui| {
                            ui.label("Start toggle");
                            pad_button_combo(ui, "gamepad_start", &mut form.start_button);
                            ui.end_row();
                            ui.label("Clock toggle");
                            pad_button_combo(ui, "gamepad_clock", &mut form.clock_button);
                            ui.end_row();
                        });
                })
                .response
                .on_disabled_hover_text("No gamepad support on this system.");
                if let Some(error) = &form.error {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                }
                result = form_buttons(ui, "Save", form.recording.is_none());
            },
        );
        match result {
            FormResult::Accepted => {
                let checked = self
                    .dialogs
                    .hotkeys
                    .as_ref()
                    .map(validate_hotkeys);
                match checked {
                    Some(Ok(hotkeys)) => {
                        self.dialogs.hotkeys = None;
                        self.apply_hotkey_settings(hotkeys);
                    }
                    Some(Err(error)) => {
                        if let Some(form) = self.dialogs.hotkeys.as_mut() {
                            form.error = Some(error);
                        }
                    }
                    None => {}
                }
            }
            FormResult::Cancelled => self.dialogs.hotkeys = None,
            FormResult::Pending if !open => self.dialogs.hotkeys = None,
            FormResult::Pending => {}
        }
    }

    fn draw_profile_editor(&mut self, ctx: &egui::Context) {
        if self.dialogs.profile_editor.is_none() {
            return;
        }
        let mut open = true;
        let mut result = FormResult::Pending;
        let mut action = None;
        self.show_centered_window(
            ctx,
            "profile_editor",
            "Profile Editor",
            &mut open,
            egui::vec2(360.0, 170.0),
            |app, ui| {
                let has_custom = !app.registry.custom().is_empty();
                let Some(form) = app.dialogs.profile_editor.as_mut() else {
                    return;
                };
                egui::Grid::new("profile_editor_fields")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Profile");
                        egui::ComboBox::from_id_salt("profile_editor_profile")
                            .selected_text(form.selected.as_str())
                            .width(200.0)
                            .show_ui(ui, |ui| {
                                let labels: Vec<String> = form.colors.keys().cloned().collect();
                                for label in labels {
                                    let checked = label == form.selected;
                                    if ui.selectable_label(checked, label.as_str()).clicked() {
                                        form.selected = label;
                                    }
                                }
                            });
                        ui.end_row();

                        ui.label("Color");
                        if let Some(color) = form.colors.get_mut(&form.selected) {
                            let mut picked = color32(*color);
                            if ui.color_edit_button_srgba(&mut picked).changed() {
                                *color = rgb_from(picked);
                            }
                            ui.weak(color.to_hex());
                        }
                        ui.end_row();
                    });
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    if ui.button("Add profile").clicked() {
                        action = Some(ProfileAction::Add);
                    }
                    if ui
                        .add_enabled(has_custom, egui::Button::new("Delete profile"))
                        .clicked()
                    {
                        action = Some(ProfileAction::Delete);
                    }
                });
                result = form_buttons(ui, "Save", true);
            },
        );
        if let Some(action) = action {
            self.handle_profile_action(action);
        }
        match result {
            FormResult::Accepted => {
                if let Some(form) = self.dialogs.profile_editor.take() {
                    self.save_profile_colors(&form);
                }
            }
            FormResult::Cancelled => self.dialogs.profile_editor = None,
            FormResult::Pending if !open => self.dialogs.profile_editor = None,
            FormResult::Pending => {}
        }
    }

    /// A color matching the profile's fallback is stored as "no explicit color".
    fn save_profile_colors(&mut self, form: &ProfileEditorForm) {
        let fallback =
            ProfileColors::new(BTreeMap::new(), self.tracker.label(), &self.ui_settings);
        let mut changed = 0;
        for (label, color) in &form.colors {
            if form.initial.get(label) == Some(color) {
                continue;
            }
            if *color == fallback.line(label) {
                self.settings.clear_profile_color(label);
            } else {
                self.settings.set_profile_color(label, *color);
            }
            changed += 1;
        }
        if changed > 0 {
            tracing::debug!(changed, "profile colors updated");
            self.persist_settings();
            self.views.invalidate();
            self.status = "Profile colors saved".to_owned();
        }
    }

    fn draw_add_profile_dialog(&mut self, ctx: &egui::Context) {
        if self.dialogs.add_profile.is_none() {
            return;
        }
        let mut open = true;
        let mut result = FormResult::Pending;
        self.show_centered_window(
            ctx,
            "add_profile_dialog",
            "Add Profile",
            &mut open,
            egui::vec2(300.0, 120.0),
            |app, ui| {
                let Some(name) = app.dialogs.add_profile.as_mut() else {
                    return;
                };
                ui.horizontal(|ui| {
                    ui.label("Profile name");
                    ui.text_edit_singleline(name);
                });
                let checked = app.registry.validate_new(name);
                if let Err(err) = &checked {
                    if !name.trim().is_empty() {
                        ui.colored_label(ui.visuals().error_fg_color, err.to_string());
                    }
                }
                result = form_buttons(ui, "Add", checked.is_ok());
            },
        );
        match result {
            FormResult::Accepted => {
                if let Some(name) = self.dialogs.add_profile.take() {
                    self.add_profile(&name);
                }
            }
            FormResult::Cancelled => self.dialogs.add_profile = None,
            FormResult::Pending if !open => self.dialogs.add_profile = None,
            FormResult::Pending => {}
        }
    }

    fn draw_delete_profile_dialog(&mut self, ctx: &egui::Context) {
        if self.dialogs.delete_profile.is_none() {
            return;
        }
        let mut open = true;
        let mut result = FormResult::Pending;
        self.show_centered_window(
            ctx,
            "delete_profile_dialog",
            "Delete Profile",
            &mut open,
            egui::vec2(300.0, 130.0),
            |app, ui| {
                let custom = app.registry.custom().to_vec();
                let Some(selected) = app.dialogs.delete_profile.as_mut() else {
                    return;
                };
                ui.horizontal(|ui| {
                    ui.label("Profile");
                    egui::ComboBox::from_id_salt("delete_profile_choice")
                        .selected_text(selected.as_str())
                        .width(180.0)
                        .show_ui(ui, |ui| {
                            for label in custom {
                                let checked = label == *selected;
                                if ui.selectable_label(checked, label.as_str()).clicked() {
                                    *selected = label;
                                }
                            }
                        });
                });
                ui.weak("The profile's log file is deleted as well.");
                result = form_buttons(ui, "Delete", true);
            },
        );
        match result {
            FormResult::Accepted => {
                if let Some(label) = self.dialogs.delete_profile.take() {
                    self.delete_profile(&label);
                }
            }
            FormResult::Cancelled => self.dialogs.delete_profile = None,
            FormResult::Pending if !open => self.dialogs.delete_profile = None,
            FormResult::Pending => {}
        }
    }
}

/// Hours, minutes and (read-only) seconds of a duration. Returns true when the
/// user edited hours or minutes.
fn duration_fields(ui: &mut egui::Ui, id: &str, form: &mut DurationForm) -> bool {
    let mut changed = false;
    egui::Grid::new(id)
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Hours");
            changed |= ui
                .add(DragValue::new(&mut form.hours).range(0..=MAX_GOAL_HOURS))
                .changed();
            ui.end_row();
            ui.label("Minutes");
            changed |= ui
                .add(DragValue::new(&mut form.minutes).range(0..=59))
                .changed();
            ui.end_row();
        });
    changed
}

fn form_buttons(ui: &mut egui::Ui, accept: &str, accept_enabled: bool) -> FormResult {
    let mut result = FormResult::Pending;
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui
            .add_enabled(accept_enabled, egui::Button::new(accept))
            .clicked()
        {
            result = FormResult::Accepted;
        }
        if ui.button("Cancel").clicked() {
            result = FormResult::Cancelled;
        }
    });
    result
}

fn hotkey_row(ui: &mut egui::Ui, label: &str, target: HotkeyTarget, form: &mut HotkeyForm) {
    ui.label(label);
    ui.horizontal(|ui| {
        let recording = form.recording == Some(target);
        let value = match target {
            HotkeyTarget::Start => &mut form.start,
            HotkeyTarget::Clock => &mut form.clock,
        };
        let shown = if recording {
            "Press a key...".to_owned()
        } else if value.is_empty() {
            "None".to_owned()
        } else {
            value.clone()
        };
        ui.add_sized([140.0, 20.0], egui::Label::new(shown));
        let record_text = if recording { "Cancel" } else { "Record" };
        if ui.button(record_text).clicked() {
            form.recording = if recording { None } else { Some(target) };
        }
        if ui.button("Clear").clicked() {
            value.clear();
            form.error = None;
        }
    });
    ui.end_row();
}

fn pad_button_combo(ui: &mut egui::Ui, id: &str, value: &mut Option<PadButton>) {
    egui::ComboBox::from_id_salt(id)
        .selected_text(value.map(PadButton::name).unwrap_or("None"))
        .width(140.0)
        .show_ui(ui, |ui| {
            ui.selectable_value(value, None, "None");
            for button in PadButton::ALL {
                ui.selectable_value(value, Some(button), button.name());
            }
        });
}

fn validate_hotkeys(form: &HotkeyForm) -> Result<HotkeySettings, String> {
    let start = form.start.trim();
    let clock = form.clock.trim();
    let mut parsed = Vec::new();
    for text in [start, clock] {
        if text.is_empty() {
            continue;
        }
        match parse_shortcut(text) {
            Some(shortcut) => parsed.push(shortcut),
            None => return Err(format!("Unrecognized hotkey: {text}")),
        }
    }
    if parsed.len() == 2 && parsed[0] == parsed[1] {
        return Err("Start and clock hotkeys must differ".to_owned());
    }
    Ok(HotkeySettings {
        start: start.to_owned(),
        clock: clock.to_owned(),
        start_button: form.start_button,
        clock_button: form.clock_button,
    })
}

fn year_display_name(mode: YearTotalDisplay) -> &'static str {
    match mode {
        YearTotalDisplay::Hours => "Total hours",
        YearTotalDisplay::Days => "Total days",
        YearTotalDisplay::Week => "Week total",
        YearTotalDisplay::AvgWeek => "Average per week",
    }
}

fn weekday_name(day: u32) -> &'static str {
    WEEKDAY_NAMES[(day.clamp(1, 7) - 1) as usize]
}

fn weekday_combo(ui: &mut egui::Ui, id: &str, day: &mut u32) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt(id)
        .selected_text(weekday_name(*day))
        .width(140.0)
        .show_ui(ui, |ui| {
            for candidate in 1..=7 {
                if ui
                    .selectable_value(day, candidate, weekday_name(candidate))
                    .changed()
                {
                    changed = true;
                }
            }
        });
    changed
}

fn settings_fields(ui: &mut egui::Ui, draft: &mut UiSettings) {
    draw_section_header(ui, "Window");
    egui::Grid::new("settings_window")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Opacity");
            ui.add(egui::Slider::new(&mut draft.opacity, 0.3..=1.0).step_by(0.05));
            ui.end_row();
            ui.label("Always on top");
            ui.checkbox(&mut draft.always_on_top, "");
            ui.end_row();
            ui.label("24-hour time");
            ui.checkbox(&mut draft.use_24h_time, "");
            ui.end_row();
            ui.label("Goal pulse (seconds)");
            ui.add(
                DragValue::new(&mut draft.goal_pulse_seconds)
                    .range(0.0..=10.0)
                    .speed(0.1),
            );
            ui.end_row();
        });

    draw_section_header(ui, "Colors");
    egui::Grid::new("settings_colors")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            for (label, field) in COLOR_ROWS {
                ui.label(label);
                let color = field(draft);
                let mut picked = color32(*color);
                if ui.color_edit_button_srgba(&mut picked).changed() {
                    *color = rgb_from(picked);
                }
                ui.end_row();
            }
        });

    draw_section_header(ui, "Fonts");
    egui::Grid::new("settings_fonts")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            for (label, field) in FONT_ROWS {
                ui.label(label);
                ui.add(DragValue::new(field(draft)).range(6..=96));
                ui.end_row();
            }
        });

    draw_section_header(ui, "Heatmap");
    egui::Grid::new("settings_heatmap")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Cell size");
            ui.add(DragValue::new(&mut draft.heatmap_cell_size).range(2..=20));
            ui.end_row();
            ui.label("Month padding");
            ui.add(DragValue::new(&mut draft.heatmap_month_padding).range(0..=10));
            ui.end_row();
            ui.label("Month label size");
            ui.add(DragValue::new(&mut draft.heatmap_month_label_size).range(6..=24));
            ui.end_row();
            ui.label("Super goal bar width");
            ui.add(DragValue::new(&mut draft.super_goal_bar_width).range(40..=600));
            ui.end_row();
            ui.label("Super goal bar height");
            ui.add(DragValue::new(&mut draft.super_goal_bar_height).range(4..=40));
            ui.end_row();
        });

    draw_section_header(ui, "Day and week");
    egui::Grid::new("settings_day")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Day starts");
            ui.horizontal(|ui| {
                ui.add(DragValue::new(&mut draft.day_start_hour).range(0..=23));
                ui.label(":");
                ui.add(DragValue::new(&mut draft.day_start_minute).range(0..=59));
            });
            ui.end_row();
            ui.label("Day ends");
            ui.horizontal(|ui| {
                ui.add(DragValue::new(&mut draft.day_end_hour).range(0..=23));
                ui.label(":");
                ui.add(DragValue::new(&mut draft.day_end_minute).range(0..=59));
            });
            ui.end_row();
            ui.label("Week starts");
            if weekday_combo(ui, "settings_week_start", &mut draft.week_start_day) {
                draft.week_end_day = expected_week_end(draft.week_start_day);
            }
            ui.end_row();
            ui.label("Week ends");
            if weekday_combo(ui, "settings_week_end", &mut draft.week_end_day) {
                draft.week_start_day = expected_week_start(draft.week_end_day);
            }
            ui.end_row();
            ui.label("Year total shows");
            egui::ComboBox::from_id_salt("settings_year_display")
                .selected_text(year_display_name(draft.year_total_display))
                .width(140.0)
                .show_ui(ui, |ui| {
                    for mode in YearTotalDisplay::ALL {
                        ui.selectable_value(
                            &mut draft.year_total_display,
                            mode,
                            year_display_name(mode),
                        );
                    }
                });
            ui.end_row();
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_form_splits_and_clamps() {
        let form = DurationForm::from_seconds(3 * 3600 + 25 * 60 + 7);
        assert_eq!(
            form,
            DurationForm {
                hours: 3,
                minutes: 25,
                seconds: 7
            }
        );
        assert_eq!(form.total_seconds(), 3 * 3600 + 25 * 60 + 7);
        assert_eq!(DurationForm::from_seconds(-5), DurationForm::default());
        assert_eq!(DurationForm::from_seconds(i64::MAX).hours, MAX_GOAL_HOURS);
    }

    #[test]
    fn add_time_start_drops_seconds() {
        let form = AddTimeForm {
            hours: 1,
            minutes: 30,
            start_hour: 9,
            start_minute: 5,
            use_24h: true,
        };
        assert_eq!(form.start(), NaiveTime::from_hms_opt(9, 5, 0).unwrap());
        assert_eq!(form.duration_seconds(), 5400);
    }

    fn hotkey_form(start: &str, clock: &str) -> HotkeyForm {
        HotkeyForm {
            start: start.to_owned(),
            clock: clock.to_owned(),
            start_button: None,
            clock_button: Some(PadButton::Y),
            recording: None,
            error: None,
        }
    }

    #[test]
    fn hotkeys_must_parse_and_differ() {
        assert_eq!(
            validate_hotkeys(&hotkey_form(" Ctrl+S ", "")),
            Ok(HotkeySettings {
                start: "Ctrl+S".to_owned(),
                clock: String::new(),
                start_button: None,
                clock_button: Some(PadButton::Y),
            })
        );
        assert_eq!(
            validate_hotkeys(&hotkey_form("Ctrl+Nope", "F5")),
            Err("Unrecognized hotkey: Ctrl+Nope".to_owned())
        );
        assert_eq!(
            validate_hotkeys(&hotkey_form("ctrl+s", "Ctrl+S")),
            Err("Start and clock hotkeys must differ".to_owned())
        );
    }

    #[test]
    fn weekday_names_follow_iso_numbering() {
        assert_eq!(weekday_name(1), "Monday");
        assert_eq!(weekday_name(7), "Sunday");
        assert_eq!(weekday_name(0), "Monday");
    }
}

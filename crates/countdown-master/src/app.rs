use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use countdown_core::calendar::day_time_left;
use countdown_core::config::AppConfig;
use countdown_core::format::{format_clock, plural_days};
use countdown_core::gamepad::{pressed, PressTracker};
use countdown_core::heatmap::clamp_cell_size;
use countdown_core::log_store::{LogBook, LogFile};
use countdown_core::profile::{ProfileError, ProfileRegistry, DEFAULT_PROFILE_NAME};
use countdown_core::settings::{
    HotkeySettings, SettingsStore, UiElement, UiSettings, UiVisibility, WindowGeometry,
};
use countdown_core::timer::{Countdown, TimerMode, ToggleOutcome};
use countdown_core::tracker::Tracker;
use eframe::egui::{self, Align2, KeyboardShortcut, Pos2, Rect, Sense, Stroke};

use crate::gamepad::GamepadReader;
use crate::heatmap_view::HeatmapView;
use crate::hotkeys::parse_shortcut;
use crate::theme::{self, color32, lerp_color, with_alpha, GLOW_COLOR};

mod dialogs;
mod views;

use self::dialogs::Dialogs;
use self::views::Views;

const TICK_INTERVAL: Duration = Duration::from_secs(1);
/// Gaps longer than this are taken as a system sleep and not credited.
const SUSPEND_GAP: Duration = Duration::from_secs(60 * 60);
const DISPLAY_REFRESH_INTERVAL: Duration = Duration::from_millis(500);
const GAMEPAD_POLL_INTERVAL: Duration = Duration::from_millis(50);
const IDLE_STATUS: &str = "Right click to set goal time";
const PANEL_MARGIN: f32 = 18.0;
const BUTTON_SIZE: egui::Vec2 = egui::vec2(110.0, 34.0);
const GLOW_LAYERS: [(f32, u8); 3] = [(8.0, 50), (5.0, 90), (2.0, 180)];
const GLOW_ROUNDING: f32 = 18.0;

enum ProfileAction {
    Switch(String),
    Add,
    Delete,
}

pub struct CountdownApp {
    config: AppConfig,
    settings: SettingsStore,
    ui_settings: UiSettings,
    hotkeys: HotkeySettings,
    start_shortcut: Option<KeyboardShortcut>,
    clock_shortcut: Option<KeyboardShortcut>,
    gamepad: GamepadReader,
    pad_presses: PressTracker,
    registry: ProfileRegistry,
    tracker: Tracker,
    countdown: Countdown,
    heatmap: HeatmapView,
    status: String,
    ticks: TickSchedule,
    pulse_started: Option<Instant>,
    window: Option<WindowGeometry>,
    dialogs: Dialogs,
    views: Views,
}

impl CountdownApp {
    pub fn new(ctx: &egui::Context, config: AppConfig) -> Self {
        let mut settings = SettingsStore::open(config.settings_path());
        let ui_settings = settings.load_ui();
        let hotkeys = settings.load_hotkeys();
        let registry = ProfileRegistry::new(settings.custom_profiles());
        let active = registry.resolve_active(settings.active_profile());
        let (tracker, load_error) = open_tracker(&config, &registry, &active, &mut settings);
        let today = Local::now().date_naive();
        theme::apply_visuals(ctx, &ui_settings);

        let mut app = Self {
            heatmap: HeatmapView::new(today, &ui_settings),
            window: settings.load_window(),
            status: load_error.unwrap_or_else(|| IDLE_STATUS.to_owned()),
            config,
            settings,
            ui_settings,
            hotkeys,
            start_shortcut: None,
            clock_shortcut: None,
            gamepad: GamepadReader::new(),
            pad_presses: PressTracker::default(),
            registry,
            tracker,
            countdown: Countdown::new(),
            ticks: TickSchedule::default(),
            pulse_started: None,
            dialogs: Dialogs::default(),
            views: Views::default(),
        };
        app.apply_hotkeys();
        app
    }

    fn show_centered_window<F>(
        &mut self,
        ctx: &egui::Context,
        id: &'static str,
        title: &str,
        open: &mut bool,
        default_size: egui::Vec2,
        mut draw_content: F,
    ) where
        F: FnMut(&mut Self, &mut egui::Ui),
    {
        let screen_rect = ctx.screen_rect();
        let default_pos = Pos2::new(
            screen_rect.center().x - default_size.x * 0.5,
            screen_rect.center().y - default_size.y * 0.5,
        );
        egui::Window::new(title)
            .id(egui::Id::new(id))
            .open(open)
            .collapsible(false)
            .resizable(false)
            .default_size(default_size)
            .default_pos(default_pos)
            .show(ctx, |ui| {
                draw_content(self, ui);
            });
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn report_error(&mut self, message: &str, err: anyhow::Error) {
        tracing::error!("{message}: {err:#}");
        self.status = message.to_owned();
    }

    fn persist_settings(&mut self) {
        if let Err(err) = self.settings.save() {
            tracing::warn!("failed to save settings: {err:#}");
        }
    }

    fn store_ui_settings(&mut self) {
        self.settings.store_ui(&self.ui_settings);
        self.persist_settings();
    }

    fn apply_hotkeys(&mut self) {
        let parse = |text: &str, name: &str| {
            let shortcut = parse_shortcut(text);
            if shortcut.is_none() && !text.trim().is_empty() {
                tracing::warn!(hotkey = name, value = text, "ignoring unrecognized hotkey");
            }
            shortcut
        };
        self.start_shortcut = parse(&self.hotkeys.start, "start");
        self.clock_shortcut = parse(&self.hotkeys.clock, "clock");
    }

    // Timer

    fn toggle_countdown(&mut self) {
        let outcome = self.countdown.toggle_countdown();
        self.apply_toggle(outcome);
    }

    fn toggle_clock(&mut self) {
        let outcome = self.countdown.toggle_clock();
        self.apply_toggle(outcome);
    }

    fn apply_toggle(&mut self, outcome: ToggleOutcome) {
        let now = Self::now();
        if outcome.ends_session() {
            self.finish_session(now);
        }
        if outcome.starts_session() {
            self.tracker.begin_session(now);
            self.ticks.start(Instant::now());
        }
        if !self.countdown.mode().is_running() {
            self.ticks.stop();
        }
        tracing::debug!(?outcome, "timer toggled");
        self.status = outcome.status_text().to_owned();
    }

    fn finish_session(&mut self, now: NaiveDateTime) {
        if let Err(err) = self.tracker.finalize_session(now) {
            self.report_error("Failed to write session log", err);
        }
    }

    fn drive_timer(&mut self, ctx: &egui::Context) {
        if !self.countdown.mode().is_running() {
            self.ticks.stop();
            return;
        }
        let now = Instant::now();
        let due = self.ticks.take_due(now);
        if due > 0 {
            self.advance_timer(ctx, due);
        }
        if !self.countdown.mode().is_running() {
            self.ticks.stop();
            return;
        }
        ctx.request_repaint_after(self.ticks.until_next(now));
    }

    /// Credits `seconds` elapsed ticks in one step.
    fn advance_timer(&mut self, ctx: &egui::Context, seconds: i64) {
        let outcome = self.countdown.advance(seconds);
        let now = Self::now();
        if outcome.progressed > 0 {
            match self.tracker.record_progress(now, outcome.progressed) {
                Ok(true) => self.countdown.clear_clock_offset(),
                Ok(false) => {}
                Err(err) => self.report_error("Failed to write session log", err),
            }
        }
        if outcome.time_up {
            self.finish_session(now);
            self.status = "Time's up!".to_owned();
            self.start_goal_pulse(ctx);
        }
    }

    fn start_goal_pulse(&mut self, ctx: &egui::Context) {
        if self.ui_settings.goal_pulse_seconds > 0.0 {
            self.pulse_started = Some(Instant::now());
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::RequestUserAttention(
            egui::UserAttentionType::Informational,
        ));
    }

    fn reset_timer(&mut self) {
        let previous = self.countdown.reset();
        if previous.is_running() {
            self.finish_session(Self::now());
        }
        self.ticks.stop();
        self.status = "Timer reset".to_owned();
    }

    fn reset_clock(&mut self) {
        let total = self.tracker.total_for_day(Self::today());
        self.countdown.reset_clock(total);
        self.status = "Clock reset".to_owned();
    }

    fn set_goal_time(&mut self, seconds: i64) {
        self.countdown.set_goal(seconds);
        self.status = "Goal time set".to_owned();
    }

    fn add_time(&mut self, start: NaiveTime, seconds: i64) {
        match self.tracker.add_time(Self::today(), start, seconds) {
            Ok(Some(_)) => self.status = "Added time to today".to_owned(),
            Ok(None) => self.status = "Add time needs hours or minutes".to_owned(),
            Err(err) => self.report_error("Failed to add time", err),
        }
    }

    fn undo_added_time(&mut self) {
        match self.tracker.undo_added_time() {
            Ok(outcome) => self.status = outcome.status_text().to_owned(),
            Err(err) => self.report_error("Failed to undo added time", err),
        }
    }

    fn set_super_goal(&mut self, seconds: i64) {
        match self
            .tracker
            .set_super_goal(&mut self.settings, Self::today(), seconds)
        {
            Ok(()) => self.status = "Daily super goal set".to_owned(),
            Err(err) => self.report_error("Failed to save daily super goal", err),
        }
    }

    // Profiles

    fn profile_change_refusal(&self) -> Option<&'static str> {
        match self.countdown.mode() {
            TimerMode::Clocking => Some("Turn off the clock to change profile"),
            TimerMode::CountingDown => Some("Pause the timer to change profile"),
            TimerMode::Idle => None,
        }
    }

    fn handle_profile_action(&mut self, action: ProfileAction) {
        if let Some(message) = self.profile_change_refusal() {
            self.status = message.to_owned();
            return;
        }
        match action {
            ProfileAction::Switch(label) => {
                if label != self.tracker.label() {
                    self.switch_profile(&label);
                }
            }
            ProfileAction::Add => self.dialogs.open_add_profile(),
            ProfileAction::Delete => match self.registry.custom().first() {
                Some(first) => self.dialogs.open_delete_profile(first),
                None => self.status = ProfileError::NotCustom.to_string(),
            },
        }
    }

    fn switch_profile(&mut self, label: &str) {
        self.finish_session(Self::now());
        self.countdown.clear_clock_offset();
        let (tracker, load_error) =
            open_tracker(&self.config, &self.registry, label, &mut self.settings);
        self.tracker = tracker;
        self.settings
            .store_profiles(self.tracker.label(), self.registry.custom());
        self.persist_settings();
        self.views.invalidate();
        tracing::info!(profile = label, "switched profile");
        self.status = load_error.unwrap_or_else(|| format!("Profile: {label}"));
    }

    fn add_profile(&mut self, raw: &str) {
        if let Some(message) = self.profile_change_refusal() {
            self.status = message.to_owned();
            return;
        }
        match self.registry.add(raw) {
            Ok(label) => {
                self.settings
                    .set_profile_super_goal(&label, self.tracker.super_goal_seconds());
                self.switch_profile(&label);
            }
            Err(err) => self.status = err.to_string(),
        }
    }

    fn delete_profile(&mut self, label: &str) {
        if let Some(message) = self.profile_change_refusal() {
            self.status = message.to_owned();
            return;
        }
        if let Err(err) = self.registry.remove(label) {
            self.status = err.to_string();
            return;
        }
        let log = LogFile::new(self.registry.file_path(&self.config.data_dir, label));
        if let Err(err) = log.remove() {
            tracing::warn!(profile = label, "failed to delete profile log: {err:#}");
        }
        self.settings.clear_profile_color(label);
        self.settings.clear_profile_super_goal(label);
        tracing::info!(profile = label, "deleted profile");
        if label == self.tracker.label() {
            self.switch_profile(DEFAULT_PROFILE_NAME);
        } else {
            self.settings
                .store_profiles(self.tracker.label(), self.registry.custom());
            self.persist_settings();
            self.views.invalidate();
            self.status = format!("Deleted profile: {label}");
        }
    }

    // Display settings

    fn set_element_visible(&mut self, element: UiElement, shown: bool) {
        self.ui_settings.visibility.set(element, shown);
        self.store_ui_settings();
    }

    fn reset_visibility(&mut self) {
        self.ui_settings.visibility = UiVisibility::default();
        self.store_ui_settings();
    }

    fn set_always_on_top(&mut self, ctx: &egui::Context, on_top: bool) {
        self.ui_settings.always_on_top = on_top;
        ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(window_level(on_top)));
        self.store_ui_settings();
    }

    fn cycle_year_total(&mut self) {
        self.ui_settings.year_total_display = self.ui_settings.year_total_display.next();
        self.store_ui_settings();
    }

    fn resize_heatmap(&mut self, step: i64) {
        let current = self.ui_settings.heatmap_cell_size;
        let next = clamp_cell_size(i64::from(current) + step);
        if next != current {
            self.ui_settings.heatmap_cell_size = next;
            self.store_ui_settings();
        }
    }

    fn apply_ui_settings(&mut self, ctx: &egui::Context, mut updated: UiSettings) {
        updated.normalize();
        if updated.always_on_top != self.ui_settings.always_on_top {
            ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(window_level(
                updated.always_on_top,
            )));
        }
        theme::apply_visuals(ctx, &updated);
        self.ui_settings = updated;
        self.heatmap.ensure_current(Self::today(), &self.ui_settings);
        self.store_ui_settings();
        self.views.invalidate();
        self.status = "Settings saved".to_owned();
    }

    fn apply_hotkey_settings(&mut self, hotkeys: HotkeySettings) {
        self.hotkeys = hotkeys;
        self.apply_hotkeys();
        self.pad_presses.reset();
        self.settings.store_hotkeys(&self.hotkeys);
        self.persist_settings();
        self.status = "Hotkeys saved".to_owned();
    }

    fn handle_hotkeys(&mut self, ctx: &egui::Context) {
        if self.dialogs.is_recording_hotkey() || ctx.wants_keyboard_input() {
            return;
        }
        let pressed = |shortcut: Option<KeyboardShortcut>| {
            shortcut.is_some_and(|shortcut| ctx.input_mut(|input| input.consume_shortcut(&shortcut)))
        };
        if pressed(self.start_shortcut) {
            self.toggle_countdown();
        }
        if pressed(self.clock_shortcut) {
            self.toggle_clock();
        }
    }

    fn handle_gamepad(&mut self, ctx: &egui::Context) {
        let bound = self.hotkeys.start_button.is_some() || self.hotkeys.clock_button.is_some();
        if !bound || !self.gamepad.is_available() {
            self.pad_presses.reset();
            return;
        }
        let new_presses = self.pad_presses.update(self.gamepad.read_buttons());
        if pressed(new_presses, self.hotkeys.start_button) {
            self.toggle_countdown();
        }
        if pressed(new_presses, self.hotkeys.clock_button) {
            self.toggle_clock();
        }
        ctx.request_repaint_after(GAMEPAD_POLL_INTERVAL);
    }

    fn remember_window_geometry(&mut self, ctx: &egui::Context) {
        let geometry = ctx.input(|input| {
            let viewport = input.viewport();
            let inner = viewport.inner_rect?;
            let outer = viewport.outer_rect;
            Some(WindowGeometry {
                x: outer.map(|rect| rect.min.x.round() as i32),
                y: outer.map(|rect| rect.min.y.round() as i32),
                width: inner.width().round().max(1.0) as u32,
                height: inner.height().round().max(1.0) as u32,
            })
        });
        if geometry.is_some() {
            self.window = geometry;
        }
    }

    fn shutdown(&mut self) {
        self.finish_session(Self::now());
        if let Some(geometry) = self.window {
            self.settings.store_window(&geometry);
        }
        self.settings
            .store_profiles(self.tracker.label(), self.registry.custom());
        self.settings.store_ui(&self.ui_settings);
        self.persist_settings();
        tracing::info!("shutting down");
    }

    // Main window

    fn draw_main(&mut self, ui: &mut egui::Ui, today: NaiveDate) {
        let now = Self::now();
        let settings = self.ui_settings.clone();
        let shown = |element| settings.visibility.is_shown(element);
        let total_today = self.tracker.total_for_day(today);
        let label_size = settings.label_size as f32;

        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Profile").size(label_size));
            self.draw_profile_picker(ui);
        });
        ui.add_space(6.0);

        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new(format_clock(self.countdown.display_seconds(total_today)))
                    .size(settings.font_size as f32)
                    .strong(),
            );
            if shown(UiElement::DayTime) {
                let left = day_time_left(now, settings.day_start(), settings.day_end());
                ui.label(
                    egui::RichText::new(format!("Day time left: {}", format_clock(left)))
                        .size(settings.day_time_font_size as f32)
                        .color(color32(settings.day_time_color)),
                );
            }
            if shown(UiElement::TotalToday) {
                ui.label(
                    egui::RichText::new(format!("Total today: {}", format_clock(total_today)))
                        .size(settings.total_today_font_size as f32)
                        .color(color32(settings.total_today_color)),
                );
            }
        });

        if shown(UiElement::SuperGoalLeft) || shown(UiElement::YearTotal) {
            ui.horizontal(|ui| {
                if shown(UiElement::SuperGoalLeft) {
                    let text = match self.tracker.super_goal_progress(today) {
                        Some(_) => format!(
                            "Super goal left: {}",
                            format_clock(self.tracker.super_goal_left(today))
                        ),
                        None => "Super goal left: please set goal".to_owned(),
                    };
                    ui.label(
                        egui::RichText::new(text)
                            .size(settings.goal_left_font_size as f32)
                            .color(color32(settings.goal_left_color)),
                    );
                    let progress = self.tracker.super_goal_progress(today).unwrap_or(0.0);
                    draw_super_goal_bar(ui, &settings, progress as f32);
                }
                if shown(UiElement::YearTotal) {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let text = self.tracker.year_total_text(
                            today,
                            settings.year_total_display,
                            settings.week_end_day,
                        );
                        let response = ui
                            .add(
                                egui::Label::new(egui::RichText::new(text).size(label_size))
                                    .sense(Sense::click()),
                            )
                            .on_hover_text(settings.year_total_display.hint());
                        if response.clicked() {
                            self.cycle_year_total();
                        }
                    });
                }
            });
        }

        if shown(UiElement::Heatmap) {
            ui.add_space(4.0);
            ui.vertical_centered(|ui| {
                let response = self.heatmap.show(ui, &self.tracker, &settings, today);
                if response.size_step != 0 {
                    self.resize_heatmap(response.size_step);
                }
            });
        }

        let (longest, current) = self.tracker.streaks(today);
        let mut streaks = Vec::new();
        if shown(UiElement::LongestStreak) {
            streaks.push(format!("Longest streak: {longest} {}", plural_days(longest)));
        }
        if shown(UiElement::CurrentStreak) {
            streaks.push(format!("Current streak: {current} {}", plural_days(current)));
        }
        ui.vertical_centered(|ui| {
            if !streaks.is_empty() {
                ui.label(egui::RichText::new(streaks.join("     ")).size(label_size));
            }
            if shown(UiElement::StatusLabel) {
                ui.label(egui::RichText::new(&self.status).size(label_size));
            }
        });

        self.draw_timer_buttons(ui, &settings);
    }

    fn draw_profile_picker(&mut self, ui: &mut egui::Ui) {
        let current = self.tracker.label().to_owned();
        let mut action = None;
        egui::ComboBox::from_id_salt("profile")
            .selected_text(current.as_str())
            .width(180.0)
            .show_ui(ui, |ui| {
                for label in self.registry.labels() {
                    if ui.selectable_label(label == current, label.as_str()).clicked() {
                        action = Some(ProfileAction::Switch(label));
                    }
                }
                ui.separator();
                if ui.selectable_label(false, "Add profile").clicked() {
                    action = Some(ProfileAction::Add);
                }
                if ui.selectable_label(false, "Delete profile").clicked() {
                    action = Some(ProfileAction::Delete);
                }
            });
        if let Some(action) = action {
            self.handle_profile_action(action);
        }
    }

    fn draw_timer_buttons(&mut self, ui: &mut egui::Ui, settings: &UiSettings) {
        let show_start = settings.visibility.is_shown(UiElement::StartButton);
        let show_clock = settings.visibility.is_shown(UiElement::ClockButton);
        let count = usize::from(show_start) + usize::from(show_clock);
        if count == 0 {
            return;
        }
        let mode = self.countdown.mode();
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            let spacing = ui.spacing().item_spacing.x;
            let row_width = BUTTON_SIZE.x * count as f32 + spacing * (count as f32 - 1.0);
            ui.add_space(((ui.available_width() - row_width) * 0.5).max(0.0));
            if show_start {
                let counting = mode == TimerMode::CountingDown;
                let text = if counting { "Pause" } else { "Start" };
                if timer_button(ui, settings, text, counting).clicked() {
                    self.toggle_countdown();
                }
            }
            if show_clock {
                let clocking = mode == TimerMode::Clocking;
                let text = if clocking { "Clock Off" } else { "Clock On" };
                if timer_button(ui, settings, text, clocking).clicked() {
                    self.toggle_clock();
                }
            }
        });
    }

    fn draw_context_menu(&mut self, ui: &mut egui::Ui) {
        ui.menu_button("Show/Hide UI", |ui| {
            for element in UiElement::ALL {
                let mut shown = self.ui_settings.visibility.is_shown(element);
                if ui.checkbox(&mut shown, element.label()).changed() {
                    self.set_element_visible(element, shown);
                }
            }
            ui.separator();
            let all_shown = self.ui_settings.visibility.all_shown();
            if ui
                .add_enabled(!all_shown, egui::Button::new("Reset UI Visibility"))
                .clicked()
            {
                self.reset_visibility();
                ui.close_menu();
            }
        });
        ui.menu_button("Time", |ui| {
            if ui.button("Set Current Goal").clicked() {
                let left = self.tracker.super_goal_left(Self::today());
                self.dialogs
                    .open_goal(self.countdown.remaining_seconds(), left);
                ui.close_menu();
            }
            if ui.button("Add to time").clicked() {
                self.dialogs.open_add_time(Self::now().time(), &self.ui_settings);
                ui.close_menu();
            }
            if ui
                .add_enabled(self.tracker.can_undo(), egui::Button::new("Undo added time"))
                .clicked()
            {
                self.undo_added_time();
                ui.close_menu();
            }
            if ui.button("Set Daily Super Goal").clicked() {
                self.dialogs.open_super_goal(self.tracker.super_goal_seconds());
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Clock reset").clicked() {
                self.reset_clock();
                ui.close_menu();
            }
            if ui.button("Reset Timer").clicked() {
                self.reset_timer();
                ui.close_menu();
            }
        });
        ui.menu_button("Data", |ui| {
            if ui.button("Calendar View").clicked() {
                self.open_calendar_view();
                ui.close_menu();
            }
            if ui.button("Logs").clicked() {
                self.open_logs();
                ui.close_menu();
            }
            if ui.button("Trends Graph").clicked() {
                self.open_trends();
                ui.close_menu();
            }
        });
        let mut on_top = self.ui_settings.always_on_top;
        if ui.checkbox(&mut on_top, "Always On Top").changed() {
            self.set_always_on_top(ui.ctx(), on_top);
            ui.close_menu();
        }
        if ui.button("Profile Editor").clicked() {
            self.open_profile_editor();
            ui.close_menu();
        }
        ui.menu_button("Settings", |ui| {
            if ui.button("Settings").clicked() {
                self.dialogs.open_settings(&self.ui_settings);
                ui.close_menu();
            }
            if ui.button("Hotkey Settings").clicked() {
                self.dialogs.open_hotkeys(&self.hotkeys);
                ui.close_menu();
            }
        });
        ui.separator();
        if ui.button("Quit").clicked() {
            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
            ui.close_menu();
        }
    }

    fn draw_goal_pulse(&mut self, ctx: &egui::Context) {
        let Some(started) = self.pulse_started else {
            return;
        };
        let duration = self.ui_settings.goal_pulse_seconds;
        let t = if duration > 0.0 {
            started.elapsed().as_secs_f32() / duration
        } else {
            1.0
        };
        if t >= 1.0 {
            self.pulse_started = None;
            return;
        }
        let intensity = pulse_intensity(t);
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("goal_pulse"),
        ));
        let rect = ctx.screen_rect();
        for (width, alpha) in GLOW_LAYERS {
            let color = with_alpha(GLOW_COLOR, (f32::from(alpha) * intensity).round() as u8);
            let inset = width * 0.5 + 1.0;
            painter.rect_stroke(rect.shrink(inset), GLOW_ROUNDING, Stroke::new(width, color));
        }
        ctx.request_repaint();
    }
}

impl eframe::App for CountdownApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let today = Self::today();
        self.drive_timer(ctx);
        self.handle_hotkeys(ctx);
        self.handle_gamepad(ctx);
        self.heatmap.ensure_current(today, &self.ui_settings);
        self.remember_window_geometry(ctx);
        ctx.request_repaint_after(DISPLAY_REFRESH_INTERVAL);

        let panel_frame = egui::Frame::central_panel(&ctx.style())
            .fill(theme::background(&self.ui_settings))
            .inner_margin(PANEL_MARGIN);
        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let background = ui.interact(
                    ui.max_rect(),
                    ui.id().with("main_context_area"),
                    Sense::click(),
                );
                self.draw_main(ui, today);
                background.context_menu(|ui| self.draw_context_menu(ui));
            });

        self.draw_goal_pulse(ctx);
        self.draw_dialogs(ctx);
        self.draw_views(ctx);

        if ctx.input(|input| input.viewport().close_requested()) {
            self.shutdown();
        }
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        egui::Rgba::TRANSPARENT.to_array()
    }
}

fn open_tracker(
    config: &AppConfig,
    registry: &ProfileRegistry,
    label: &str,
    settings: &mut SettingsStore,
) -> (Tracker, Option<String>) {
    match Tracker::open(&config.data_dir, registry, label, settings) {
        Ok(tracker) => (tracker, None),
        Err(err) => {
            tracing::error!(profile = label, "failed to open profile log: {err:#}");
            let goal = settings.profile_super_goal(label);
            let log = LogFile::new(registry.file_path(&config.data_dir, label));
            (
                Tracker::from_parts(label, log, LogBook::default(), goal),
                Some(format!("Could not read log for {label}")),
            )
        }
    }
}

fn window_level(on_top: bool) -> egui::WindowLevel {
    if on_top {
        egui::WindowLevel::AlwaysOnTop
    } else {
        egui::WindowLevel::Normal
    }
}

/// Glow strength at `t` in `[0, 1]` of the pulse.
fn pulse_intensity(t: f32) -> f32 {
    (std::f32::consts::PI * t.clamp(0.0, 1.0)).sin().max(0.0)
}

fn timer_button(
    ui: &mut egui::Ui,
    settings: &UiSettings,
    text: &str,
    active: bool,
) -> egui::Response {
    let label_size = (settings.label_size as f32).max(12.0);
    let mut button = egui::Button::new(egui::RichText::new(text).size(label_size).strong())
        .min_size(BUTTON_SIZE)
        .stroke(Stroke::new(1.0, color32(settings.accent_color)));
    if active {
        let fill = settings.accent_color;
        button = egui::Button::new(
            egui::RichText::new(text)
                .size(label_size)
                .strong()
                .color(color32(fill.contrast_text())),
        )
        .min_size(BUTTON_SIZE)
        .fill(color32(fill));
    }
    ui.add(button)
}

fn draw_super_goal_bar(ui: &mut egui::Ui, settings: &UiSettings, progress: f32) {
    let size = egui::vec2(
        settings.super_goal_bar_width as f32,
        settings.super_goal_bar_height as f32,
    );
    let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
    let radius = (rect.height() * 0.5).min(6.0);
    let painter = ui.painter();
    painter.rect_filled(rect, radius, color32(settings.super_goal_bar_bg));

    let progress = progress.clamp(0.0, 1.0);
    if progress <= 0.0 {
        return;
    }
    let fill = Rect::from_min_size(rect.min, egui::vec2(rect.width() * progress, rect.height()));
    let start = color32(settings.super_goal_bar_start);
    let end = lerp_color(
        settings.super_goal_bar_start,
        settings.super_goal_bar_end,
        progress,
    );
    let mut mesh = egui::Mesh::default();
    mesh.colored_vertex(fill.left_top(), start);
    mesh.colored_vertex(fill.left_bottom(), start);
    mesh.colored_vertex(fill.right_top(), end);
    mesh.colored_vertex(fill.right_bottom(), end);
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(2, 1, 3);
    painter.add(egui::Shape::mesh(mesh));
    if progress >= 1.0 {
        painter.text(
            rect.right_center() + egui::vec2(4.0, 0.0),
            Align2::LEFT_CENTER,
            "✔",
            egui::FontId::proportional(rect.height().max(10.0)),
            end,
        );
    }
}

/// One-second deadlines for the running timer. Frames may arrive late or not at
/// all while the window is hidden, so each frame takes every tick that came due.
#[derive(Debug, Default)]
struct TickSchedule {
    next: Option<Instant>,
}

impl TickSchedule {
    fn start(&mut self, now: Instant) {
        self.next = Some(now + TICK_INTERVAL);
    }

    fn stop(&mut self) {
        self.next = None;
    }

    /// Number of ticks due at `now`; the next deadline moves past all of them.
    fn take_due(&mut self, now: Instant) -> i64 {
        let deadline = *self.next.get_or_insert(now + TICK_INTERVAL);
        if now < deadline {
            return 0;
        }
        let late = now.duration_since(deadline);
        if late > SUSPEND_GAP {
            tracing::warn!(late_secs = late.as_secs(), "timer gap too long, not crediting it");
            self.next = Some(now + TICK_INTERVAL);
            return 1;
        }
        let missed = late.as_nanos() / TICK_INTERVAL.as_nanos();
        let due = u32::try_from(missed).unwrap_or(u32::MAX).saturating_add(1);
        self.next = Some(deadline + TICK_INTERVAL * due);
        i64::from(due)
    }

    fn until_next(&self, now: Instant) -> Duration {
        self.next
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or(TICK_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stalled_frames_credit_every_missed_second() {
        let now = Instant::now();
        let mut ticks = TickSchedule::default();
        ticks.start(now);
        assert_eq!(ticks.take_due(now), 0);
        assert_eq!(ticks.until_next(now), TICK_INTERVAL);

        let stalled = now + TICK_INTERVAL + Duration::from_secs(30);
        assert_eq!(ticks.take_due(stalled), 31);
        assert_eq!(ticks.take_due(stalled), 0);
        assert_eq!(ticks.until_next(stalled), TICK_INTERVAL);

        let mut countdown = Countdown::new();
        countdown.toggle_clock();
        assert_eq!(countdown.advance(31).progressed, 31);
    }

    #[test]
    fn partial_seconds_carry_to_the_next_frame() {
        let now = Instant::now();
        let mut ticks = TickSchedule::default();
        ticks.start(now);
        let frame = now + Duration::from_millis(2_400);
        assert_eq!(ticks.take_due(frame), 2);
        assert_eq!(ticks.until_next(frame), Duration::from_millis(600));
    }

    #[test]
    fn sleep_sized_gaps_are_not_credited() {
        let now = Instant::now();
        let mut ticks = TickSchedule::default();
        ticks.start(now);
        let woke = now + SUSPEND_GAP + Duration::from_secs(5);
        assert_eq!(ticks.take_due(woke), 1);
        assert_eq!(ticks.until_next(woke), TICK_INTERVAL);
    }

    #[test]
    fn pulse_rises_and_falls() {
        assert!(pulse_intensity(0.0).abs() < 1e-6);
        assert!((pulse_intensity(0.5) - 1.0).abs() < 1e-6);
        assert!(pulse_intensity(1.0).abs() < 1e-5);
        assert!(pulse_intensity(0.25) < pulse_intensity(0.5));
        assert_eq!(pulse_intensity(2.0), pulse_intensity(1.0));
    }

    #[test]
    fn window_level_matches_flag() {
        assert_eq!(window_level(true), egui::WindowLevel::AlwaysOnTop);
        assert_eq!(window_level(false), egui::WindowLevel::Normal);
    }
}

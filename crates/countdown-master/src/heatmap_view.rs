//! Painter rendering of the year heatmap.

use chrono::{Datelike, NaiveDate};
use countdown_core::heatmap::{self, HeatmapCell, Intensity, YearLayout};
use countdown_core::settings::UiSettings;
use countdown_core::tracker::Tracker;
use eframe::egui::{self, Align2, FontId, Pos2, Rect, Sense};

use crate::theme::{color32, with_alpha};

const CELL_SPACING: u32 = 2;
const LABEL_GAP: f32 = 2.0;
const CELL_ROUNDING: f32 = 2.0;

pub struct HeatmapView {
    layout: YearLayout,
    padded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeatmapResponse {
    /// Cell size change requested with the mouse wheel: +1, -1 or 0.
    pub size_step: i64,
}

impl HeatmapView {
    pub fn new(today: NaiveDate, settings: &UiSettings) -> Self {
        let padded = settings.heatmap_month_padding > 0;
        Self {
            layout: YearLayout::build(today.year(), padded),
            padded,
        }
    }

    /// Rebuilds the grid when the calendar year turns or month padding is toggled.
    pub fn ensure_current(&mut self, today: NaiveDate, settings: &UiSettings) {
        let padded = settings.heatmap_month_padding > 0;
        if self.layout.year != today.year() || self.padded != padded {
            tracing::debug!(year = today.year(), padded, "rebuilding heatmap layout");
            *self = Self::new(today, settings);
        }
    }

    pub fn show(
        &self,
        ui: &mut egui::Ui,
        tracker: &Tracker,
        settings: &UiSettings,
        today: NaiveDate,
    ) -> HeatmapResponse {
        let cell = settings.heatmap_cell_size;
        let padding = settings.heatmap_month_padding;
        let (grid_width, grid_height) = self.layout.pixel_size(cell, CELL_SPACING, padding);
        let label_font = FontId::proportional(settings.heatmap_month_label_size as f32);
        let label_height = ui.fonts(|fonts| fonts.row_height(&label_font));

        let size = egui::vec2(
            grid_width as f32,
            label_height + LABEL_GAP + grid_height as f32,
        );
        let (rect, response) = ui.allocate_exact_size(size, Sense::hover());
        let painter = ui.painter_at(rect.expand(1.0));
        let grid_top = rect.top() + label_height + LABEL_GAP;

        let label_color = color32(settings.day_time_color);
        for month in &self.layout.months {
            let left = self.column_left(rect, month.first_column, settings);
            let right = self.column_left(rect, month.first_column + month.weeks, settings)
                - CELL_SPACING as f32;
            painter.text(
                Pos2::new((left + right) * 0.5, rect.top() + label_height * 0.5),
                Align2::CENTER_CENTER,
                month.name(),
                label_font.clone(),
                label_color,
            );
        }

        let hover_pos = response.hover_pos();
        let mut hovered: Option<&HeatmapCell> = None;
        for day in &self.layout.cells {
            let cell_rect = self.cell_rect(rect, grid_top, day, settings);
            let is_hovered = hover_pos.is_some_and(|pos| cell_rect.contains(pos));
            let fill = if is_hovered {
                hovered = Some(day);
                color32(settings.heatmap_hover_cell_color)
            } else {
                let total = tracker.total_for_day(day.date);
                let goal = tracker.goal_for_day(day.date, today);
                with_alpha(
                    heatmap::base_color(day.date, settings.heatmap_color),
                    Intensity::for_day(total, goal).alpha(),
                )
            };
            painter.rect_filled(cell_rect, CELL_ROUNDING, fill);
        }

        if let Some(day) = hovered {
            let text = heatmap::tooltip(
                day.date,
                tracker.total_for_day(day.date),
                tracker.goal_for_day(day.date, today),
            );
            let bg = color32(settings.heatmap_hover_bg_color);
            let fg = color32(settings.heatmap_hover_text_color);
            egui::show_tooltip_at_pointer(
                ui.ctx(),
                ui.layer_id(),
                ui.id().with("heatmap_hover_tooltip"),
                |ui| {
                    egui::Frame::none()
                        .fill(bg)
                        .rounding(4.0)
                        .inner_margin(6.0)
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(text).color(fg));
                        });
                },
            );
        }

        let mut result = HeatmapResponse::default();
        if response.hovered() {
            let scroll_y = ui.input(|i| i.raw_scroll_delta.y);
            if scroll_y > 0.0 {
                result.size_step = 1;
            } else if scroll_y < 0.0 {
                result.size_step = -1;
            }
        }
        result
    }

    fn column_left(&self, rect: Rect, column: u32, settings: &UiSettings) -> f32 {
        rect.left()
            + self.layout.column_offset(
                column,
                settings.heatmap_cell_size,
                CELL_SPACING,
                settings.heatmap_month_padding,
            ) as f32
    }

    fn cell_rect(&self, rect: Rect, grid_top: f32, day: &HeatmapCell, settings: &UiSettings) -> Rect {
        let size = settings.heatmap_cell_size as f32;
        let left = self.column_left(rect, day.column, settings);
        let top = grid_top + (day.row as f32) * (size + CELL_SPACING as f32);
        Rect::from_min_size(Pos2::new(left, top), egui::vec2(size, size))
    }
}

use countdown_core::color::Rgb;
use countdown_core::settings::UiSettings;
use eframe::egui::{self, Color32, Pos2, Sense, Stroke};

pub const GLOW_COLOR: Rgb = Rgb::new(0xff, 0x3b, 0x30);

pub fn color32(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.r, rgb.g, rgb.b)
}

pub fn with_alpha(rgb: Rgb, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(rgb.r, rgb.g, rgb.b, alpha)
}

pub fn rgb_from(color: Color32) -> Rgb {
    let [r, g, b, _] = color.to_srgba_unmultiplied();
    Rgb::new(r, g, b)
}

pub fn lerp_color(from: Rgb, to: Rgb, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let channel = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
    Color32::from_rgb(
        channel(from.r, to.r),
        channel(from.g, to.g),
        channel(from.b, to.b),
    )
}

/// Window background with the configured opacity applied.
pub fn background(settings: &UiSettings) -> Color32 {
    with_alpha(
        settings.bg_color,
        (settings.opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

pub fn configure_interaction_style(ctx: &egui::Context) {
    ctx.all_styles_mut(|style| {
        style.interaction.tooltip_delay = 0.0;
    });
}

pub fn apply_visuals(ctx: &egui::Context, settings: &UiSettings) {
    let text = color32(settings.text_color);
    let accent = color32(settings.accent_color);
    let window_fill = color32(settings.bg_color);
    ctx.all_styles_mut(|style| {
        let visuals = &mut style.visuals;
        visuals.override_text_color = Some(text);
        visuals.hyperlink_color = accent;
        visuals.selection.bg_fill = accent.gamma_multiply(0.6);
        visuals.selection.stroke = Stroke::new(1.0, text);
        visuals.window_fill = window_fill;
        visuals.panel_fill = background(settings);
        visuals.extreme_bg_color = color32(settings.bg_color.lighter(80));
    });
}

pub fn draw_section_header(ui: &mut egui::Ui, title: &str) {
    ui.horizontal(|ui| {
        ui.strong(title);
        ui.add_space(8.0);

        let line_width = ui.available_width().max(0.0);
        if line_width <= 0.0 {
            return;
        }
        let line_height = ui.text_style_height(&egui::TextStyle::Body).max(14.0);
        let (line_rect, _) =
            ui.allocate_exact_size(egui::vec2(line_width, line_height), Sense::hover());
        let y = line_rect.center().y + 1.0;
        ui.painter().line_segment(
            [Pos2::new(line_rect.left(), y), Pos2::new(line_rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgb(76, 76, 76)),
        );
    });
}

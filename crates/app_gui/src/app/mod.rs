//! The single screen: heading, image well, upload button, prediction
//! text. Picked images are classified on a worker thread and the label
//! comes back over a channel drained at the top of each frame.

mod screen;
mod worker;

use classifier_core::ClassifierConfig;
use crossbeam_channel::{Receiver, Sender, unbounded};
use eframe::{App, Frame, egui};
use rfd::FileDialog;
use screen::ScreenState;

const IMAGE_WELL: f32 = 300.0;

pub struct UiApp {
    screen: ScreenState,
    texture: Option<egui::TextureHandle>,
    classifier_cfg: ClassifierConfig,
    label_tx: Sender<String>,
    label_rx: Receiver<String>,
}

impl Default for UiApp {
    fn default() -> Self {
        let (label_tx, label_rx) = unbounded();
        Self {
            screen: ScreenState::default(),
            texture: None,
            classifier_cfg: ClassifierConfig::default(),
            label_tx,
            label_rx,
        }
    }
}

impl UiApp {
    fn pick_image(&mut self, ctx: &egui::Context) {
        let picked = FileDialog::new()
            .add_filter("Images", &["jpg", "jpeg", "png"])
            .pick_file();
        let Some(path) = picked else {
            // Cancelled: flow halts, prior state untouched.
            self.screen.picker_cancelled();
            return;
        };
        match image::open(&path) {
            Ok(img) => {
                self.texture = Some(load_display_texture(ctx, &img));
                self.screen.image_picked();
                let tx = self.label_tx.clone();
                let repaint = ctx.clone();
                let _ = worker::spawn_classification(self.classifier_cfg.clone(), img, tx, move || {
                    repaint.request_repaint()
                });
            }
            Err(e) => {
                tracing::warn!("failed to decode picked image {}: {e}", path.display());
            }
        }
    }

    fn render_image_well(&self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let desired = egui::Vec2::splat(IMAGE_WELL);
        let (resp, painter) = ui.allocate_painter(desired, egui::Sense::hover());
        let r = resp.rect;
        match &self.texture {
            Some(tex) => {
                let fade = ctx.animate_value_with_time(egui::Id::new("image-fade"), 1.0, 0.3);
                let tint = egui::Color32::WHITE.gamma_multiply(fade);
                let uv =
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                let target = fit_rect(r, tex.size_vec2());
                painter.image(tex.id(), target, uv, tint);
                painter.rect_stroke(
                    target,
                    8.0,
                    egui::Stroke::new(2.0, egui::Color32::from_white_alpha(150)),
                    egui::StrokeKind::Inside,
                );
            }
            None => {
                // Seed the fade so the first picked image animates in.
                ctx.animate_value_with_time(egui::Id::new("image-fade"), 0.0, 0.0);
                painter.rect_filled(r, 8.0, egui::Color32::from_gray(60));
                painter.rect_stroke(
                    r,
                    8.0,
                    egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
                    egui::StrokeKind::Inside,
                );
                paint_photo_glyph(&painter, r);
            }
        }
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // Last delivery wins when several workers race.
        for label in self.label_rx.try_iter() {
            self.screen.label_arrived(label);
        }

        let scale = ctx.animate_value_with_time(
            egui::Id::new("upload-scale"),
            if self.screen.uploaded { 1.1 } else { 1.0 },
            0.3,
        );

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.label(
                    egui::RichText::new("Animal Classifier")
                        .size(28.0 * scale)
                        .strong(),
                );
                ui.add_space(20.0);

                self.render_image_well(ui, ctx);

                ui.add_space(20.0);
                let button = egui::Button::new(
                    egui::RichText::new("Upload Image").size(16.0 * scale).strong(),
                )
                .min_size(egui::vec2(250.0, 40.0));
                if ui.add(button).clicked() {
                    self.pick_image(ctx);
                }

                ui.add_space(20.0);
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.label(
                        egui::RichText::new(&self.screen.prediction).size(18.0 * scale),
                    );
                });
            });
        });
    }
}

fn load_display_texture(ctx: &egui::Context, img: &image::DynamicImage) -> egui::TextureHandle {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let size = [w as usize, h as usize];
    let pixels = rgba.into_raw();
    let color = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
    ctx.load_texture("picked-image", color, egui::TextureOptions::LINEAR)
}

/// Largest rect with `tex_size`'s aspect ratio that fits inside `well`,
/// centered, so the picked image is scaled to fit.
fn fit_rect(well: egui::Rect, tex_size: egui::Vec2) -> egui::Rect {
    if tex_size.x <= 0.0 || tex_size.y <= 0.0 {
        return well;
    }
    let scale = (well.width() / tex_size.x).min(well.height() / tex_size.y);
    let size = tex_size * scale;
    egui::Rect::from_center_size(well.center(), size)
}

fn paint_photo_glyph(painter: &egui::Painter, r: egui::Rect) {
    let light = egui::Color32::from_white_alpha(170);
    let frame = egui::Rect::from_center_size(r.center(), egui::vec2(110.0, 86.0));
    painter.rect_stroke(
        frame,
        6.0,
        egui::Stroke::new(2.0, light),
        egui::StrokeKind::Inside,
    );
    painter.circle_filled(frame.left_top() + egui::vec2(28.0, 24.0), 9.0, light);
    painter.add(egui::Shape::convex_polygon(
        vec![
            frame.left_bottom() + egui::vec2(10.0, -8.0),
            frame.center_bottom() + egui::vec2(0.0, -40.0),
            frame.right_bottom() + egui::vec2(-10.0, -8.0),
        ],
        light,
        egui::Stroke::NONE,
    ));
}

use std::time::Instant;

use eframe::{App, Frame, NativeOptions, egui, run_native};
use egui::{Color32, Pos2, Rect, Sense, Stroke, epaint};
use glam::Vec3;
use log::{error, info};
use volcano_core::preview::{HeightPalette, draw_path, render_heightmap};
use volcano_core::{
    DescentPath, DisplacementParameters, Mesh, SessionConfig, SessionState, StrokeOutcome,
    TerrainSession,
};

// world units across the shorter side of the canvas
const VIEW_SPAN: f32 = 4.0;
// screen pixels between recorded stroke points
const MIN_STEP_PX: f32 = 3.0;

const LAVA: Color32 = Color32::from_rgb(255, 96, 0);

// Screen <-> world mapping for the top-down canvas, +Y up
#[derive(Clone, Copy)]
struct CanvasView {
    rect: Rect,
    scale: f32,
}

impl CanvasView {
    fn new(rect: Rect) -> Self {
        Self {
            rect,
            scale: rect.width().min(rect.height()) / VIEW_SPAN,
        }
    }

    fn to_world(self, p: Pos2) -> (f32, f32) {
        let d = p - self.rect.center();
        (d.x / self.scale, -d.y / self.scale)
    }

    fn to_screen(self, x: f32, y: f32) -> Pos2 {
        self.rect.center() + egui::vec2(x * self.scale, -y * self.scale)
    }
}

// Flat-coloured copy of the session mesh, rebuilt only when the mesh changes
struct ShadedMesh {
    xy: Vec<(f32, f32)>,
    colors: Vec<Color32>,
    indices: Vec<u32>,
}

impl ShadedMesh {
    fn build(mesh: &Mesh, palette: &HeightPalette) -> Self {
        let bounds = mesh.bounds();
        let (z_min, z_range) = (bounds.min.z, bounds.size().z);
        let colors = mesh
            .positions
            .iter()
            .map(|p| {
                let [r, g, b] = palette.rgb_for_height(p.z, z_min, z_range);
                Color32::from_rgb(r, g, b)
            })
            .collect();
        Self {
            xy: mesh.positions.iter().map(|p| (p.x, p.y)).collect(),
            colors,
            indices: mesh.faces().flatten().collect(),
        }
    }

    fn to_shape(&self, view: CanvasView) -> epaint::Shape {
        let vertices = self
            .xy
            .iter()
            .zip(&self.colors)
            .map(|(&(x, y), &color)| epaint::Vertex {
                pos: view.to_screen(x, y),
                uv: epaint::WHITE_UV,
                color,
            })
            .collect();
        epaint::Shape::mesh(epaint::Mesh {
            vertices,
            indices: self.indices.clone(),
            texture_id: egui::TextureId::default(),
        })
    }
}

struct VolcanoApp {
    session: TerrainSession,
    params: DisplacementParameters,
    palette: HeightPalette,
    shaded: Option<ShadedMesh>,
    flows: Vec<DescentPath>,
    last_point: Option<Pos2>,
    status_message: String,
}

impl VolcanoApp {
    fn new(config: SessionConfig) -> Self {
        let session = TerrainSession::new(config);
        Self {
            params: *session.parameters(),
            session,
            palette: HeightPalette::new(),
            shaded: None,
            flows: Vec::new(),
            last_point: None,
            status_message: "Draw the base outline".into(),
        }
    }

    fn report<T>(&mut self, result: volcano_core::Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.status_message = e.to_string();
                None
            }
        }
    }

    fn refresh_mesh(&mut self) {
        match self.session.mesh_mut() {
            Some(mesh) => {
                if mesh.take_changed() {
                    self.shaded = Some(ShadedMesh::build(mesh, &self.palette));
                }
            }
            None => self.shaded = None,
        }
        self.flows.extend(self.session.take_lava_flows());
    }

    fn handle_canvas(&mut self, response: &egui::Response, view: CanvasView) {
        let state = self.session.state();
        let Some(pos) = response.interact_pointer_pos() else {
            return;
        };
        let (x, y) = view.to_world(pos);

        if state == SessionState::Finalized {
            if response.clicked() {
                let top = self
                    .session
                    .mesh()
                    .map_or(0.0, |m| m.bounds().max.z)
                    + 1.0;
                let start = Instant::now();
                let traced = self.session.surface_click(Vec3::new(x, y, top), Vec3::NEG_Z);
                if let Some(traced) = self.report(traced) {
                    self.status_message = match traced {
                        Some(path) => format!(
                            "Lava ran {} faces in {:.2} ms",
                            path.len(),
                            start.elapsed().as_secs_f32() * 1000.0
                        ),
                        None => "Click missed the terrain".into(),
                    };
                }
            }
            return;
        }

        if response.drag_started() {
            let begun = self.session.stroke_begin();
            self.report(begun);
            self.last_point = None;
        }
        let far_enough = self
            .last_point
            .is_none_or(|last| last.distance(pos) >= MIN_STEP_PX);
        if response.dragged() && far_enough {
            let added = self.session.stroke_point(x, y);
            if self.report(added).is_some() {
                self.last_point = Some(pos);
            }
        }
        if response.drag_stopped() {
            self.last_point = None;
            let start = Instant::now();
            let ended = self.session.stroke_end();
            if let Some(outcome) = self.report(ended) {
                self.status_message = match outcome {
                    StrokeOutcome::BaseGenerated { faces } => format!(
                        "Base mesh: {faces} faces in {:.2} ms",
                        start.elapsed().as_secs_f32() * 1000.0
                    ),
                    StrokeOutcome::SiteAdded(site) => {
                        format!("Contour at uv {:.2} r {:.2}", site.center, site.radius)
                    }
                    StrokeOutcome::SiteDropped => "Contour missed the terrain".into(),
                };
            }
        }
    }

    fn save_png(&mut self) {
        let Some(mesh) = self.session.mesh() else {
            self.status_message = "Nothing to save".into();
            return;
        };
        let mut img = render_heightmap(mesh, 512);
        for path in &self.flows {
            draw_path(&mut img, mesh, path);
        }
        let filename = format!("volcano_{}.png", self.session.sites().len());
        self.status_message = match img.save(&filename) {
            Ok(()) => format!("Saved {filename}"),
            Err(e) => {
                error!("saving {filename}: {e}");
                format!("Save failed: {e}")
            }
        };
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Volcano Sketch");
        ui.separator();
        ui.label(format!("State: {:?}", self.session.state()));
        ui.label(format!("Contours: {}", self.session.sites().len()));
        ui.separator();

        let before = self.params;
        ui.label("Height");
        ui.add(egui::Slider::new(&mut self.params.height_scale, 0.01..=3.0));
        ui.label("Details");
        ui.add(egui::Slider::new(&mut self.params.detail_scale, 0.0..=10.0));
        ui.label("Crater size");
        ui.add(egui::Slider::new(&mut self.params.crater_size, 0.0..=3.0));
        ui.label("Crater depth");
        ui.add(egui::Slider::new(&mut self.params.crater_depth, 0.0..=3.0));
        ui.label("Detail octaves");
        ui.add(egui::Slider::new(&mut self.params.octaves, 1..=8));
        if self.params != before {
            self.session.set_parameters(self.params);
        }

        ui.separator();
        let can_finalize = matches!(
            self.session.state(),
            SessionState::BaseReady | SessionState::GeneratingInfluence
        );
        if ui.add_enabled(can_finalize, egui::Button::new("Finalize")).clicked() {
            let done = self.session.finalize();
            if self.report(done).is_some() {
                self.status_message = "Click the terrain to pour lava".into();
            }
        }
        let can_clear = matches!(
            self.session.state(),
            SessionState::GeneratingInfluence | SessionState::Finalized
        );
        if ui.add_enabled(can_clear, egui::Button::new("Clear contours")).clicked() {
            let cleared = self.session.reset_influence();
            if self.report(cleared).is_some() {
                self.flows.clear();
                self.status_message = "Contours cleared".into();
            }
        }
        if ui.button("Reset").clicked() {
            self.session.reset();
            self.flows.clear();
            self.status_message = "Draw the base outline".into();
        }
        if ui.button("Save PNG…").clicked() {
            self.save_png();
        }

        ui.separator();
        ui.label(&self.status_message);
    }

    fn paint(&self, painter: &egui::Painter, view: CanvasView) {
        if let Some(shaded) = &self.shaded {
            painter.add(shaded.to_shape(view));
        }

        let pen = Stroke::new(1.5, Color32::LIGHT_BLUE);
        for ring in self.session.outline().rings() {
            let pts: Vec<Pos2> = ring.iter().map(|p| view.to_screen(p.x, p.y)).collect();
            if pts.len() > 1 {
                painter.add(epaint::Shape::closed_line(pts, pen));
            }
        }

        if let Some(stroke) = self.session.active_stroke() {
            let pts = stroke.points().iter().map(|p| view.to_screen(p.x, p.y)).collect();
            painter.add(epaint::Shape::line(pts, Stroke::new(2.0, Color32::YELLOW)));
        }

        for path in &self.flows {
            let pts: Vec<Pos2> = path.points.iter().map(|p| view.to_screen(p.x, p.y)).collect();
            if let [only] = pts.as_slice() {
                painter.circle_filled(*only, 3.0, LAVA);
            } else {
                painter.add(epaint::Shape::line(pts, Stroke::new(3.0, LAVA)));
            }
        }
    }
}

impl App for VolcanoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        egui::SidePanel::left("controls").show(ctx, |ui| self.controls(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
            let view = CanvasView::new(response.rect);
            self.handle_canvas(&response, view);
            self.refresh_mesh();
            painter.rect_filled(response.rect, 0.0, Color32::from_gray(168));
            self.paint(&painter, view);
        });
    }
}

fn load_config() -> SessionConfig {
    let Ok(path) = std::env::var("VOLCANO_CONFIG") else {
        return SessionConfig::default();
    };
    let loaded = std::fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|json| SessionConfig::from_json_str(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(config) => {
            info!("loaded config from {path}");
            config
        }
        Err(e) => {
            error!("ignoring config {path}: {e}");
            SessionConfig::default()
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init();
    let config = load_config();

    let opts = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 650.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    run_native(
        "Volcano Sketch",
        opts,
        Box::new(|_cc| Ok(Box::new(VolcanoApp::new(config)))),
    )
}

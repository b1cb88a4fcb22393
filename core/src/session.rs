use glam::{Vec2, Vec3};
use log::{info, warn};
use rand::random;

use crate::config::{DisplacementParameters, NoiseKind, SessionConfig};
use crate::descent::{DescentPath, DescentWalker, FaceAdjacency};
use crate::displace::TerrainDisplacer;
use crate::error::{Result, TerrainError};
use crate::geometry::Ray;
use crate::influence::{InfluenceSite, InfluenceSiteResolver, Stroke};
use crate::mesh::Mesh;
use crate::outline::Outline;
use crate::sampler::PolygonSampler;
use crate::triangulate::Triangulator;
use crate::uv::BoxUvProjector;
use crate::{NoiseSource, Perlin2D, Simplex2D};

/// Where the sketch is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Drawing the base outline.
    Drawing,
    /// Flat base mesh generated, no contour yet.
    BaseReady,
    /// At least one contour stroke started.
    GeneratingInfluence,
    /// Heights applied, lava can be traced.
    Finalized,
}

/// Result of finishing a stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeOutcome {
    /// The outline was turned into a base mesh of this many faces.
    BaseGenerated { faces: usize },
    SiteAdded(InfluenceSite),
    /// The contour did not land on the terrain and was dropped.
    SiteDropped,
}

/// Owns everything one sketch produces: outline, mesh, influence sites,
/// parameters and traced lava flows.
pub struct TerrainSession {
    config: SessionConfig,
    state: SessionState,
    sampler: PolygonSampler,
    noise: Box<dyn NoiseSource>,
    outline: Outline,
    pen_down: bool,
    stroke: Option<Stroke>,
    base: Option<Mesh>,
    mesh: Option<Mesh>,
    adjacency: Option<FaceAdjacency>,
    sites: Vec<InfluenceSite>,
    params: DisplacementParameters,
    lava_flows: Vec<DescentPath>,
}

impl TerrainSession {
    pub fn new(config: SessionConfig) -> Self {
        let seed = config.noise_seed.unwrap_or_else(random);
        let noise: Box<dyn NoiseSource> = match config.noise {
            NoiseKind::Perlin => Box::new(Perlin2D::new(seed)),
            NoiseKind::Simplex => Box::new(Simplex2D::new(seed)),
        };
        Self::with_noise(config, noise)
    }

    /// Session with a caller supplied noise source.
    pub fn with_noise(config: SessionConfig, noise: Box<dyn NoiseSource>) -> Self {
        Self {
            sampler: PolygonSampler::new(config.sampler),
            params: config.displacement.clamped(),
            config,
            state: SessionState::Drawing,
            noise,
            outline: Outline::new(),
            pen_down: false,
            stroke: None,
            base: None,
            mesh: None,
            adjacency: None,
            sites: Vec::new(),
            lava_flows: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    /// Mutable access for the renderer to clear the change flag.
    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        self.mesh.as_mut()
    }

    pub fn sites(&self) -> &[InfluenceSite] {
        &self.sites
    }

    /// Contour currently being drawn.
    pub fn active_stroke(&self) -> Option<&Stroke> {
        self.stroke.as_ref()
    }

    pub fn parameters(&self) -> &DisplacementParameters {
        &self.params
    }

    pub fn lava_flows(&self) -> &[DescentPath] {
        &self.lava_flows
    }

    /// Hand traced flows to the renderer and forget them.
    pub fn take_lava_flows(&mut self) -> Vec<DescentPath> {
        std::mem::take(&mut self.lava_flows)
    }

    fn invalid(&self, action: &'static str) -> TerrainError {
        warn!("rejected {action} in state {:?}", self.state);
        TerrainError::InvalidTransition {
            from: self.state,
            action,
        }
    }

    pub fn stroke_begin(&mut self) -> Result<()> {
        match self.state {
            SessionState::Drawing => {
                self.pen_down = true;
                Ok(())
            }
            SessionState::BaseReady | SessionState::GeneratingInfluence => {
                self.stroke = Some(Stroke::new());
                self.transition(SessionState::GeneratingInfluence);
                Ok(())
            }
            SessionState::Finalized => Err(self.invalid("begin a stroke")),
        }
    }

    /// Add a point in the working plane to the current stroke.
    pub fn stroke_point(&mut self, x: f32, y: f32) -> Result<()> {
        match self.state {
            SessionState::Drawing => {
                let p = Vec2::new(x, y);
                if std::mem::take(&mut self.pen_down) {
                    self.outline.move_to(p);
                } else {
                    self.outline.line_to(p);
                }
                Ok(())
            }
            SessionState::GeneratingInfluence => match self.stroke.as_mut() {
                Some(stroke) => {
                    stroke.push(Vec3::new(x, y, 0.0));
                    Ok(())
                }
                None => Err(self.invalid("add a point without an open stroke")),
            },
            _ => Err(self.invalid("add a stroke point")),
        }
    }

    /// Close the current stroke.
    ///
    /// In `Drawing` this builds the base mesh from the outline; a degenerate
    /// outline is reported and the session stays in `Drawing`. Otherwise the
    /// contour becomes an influence site, or is dropped when it misses the
    /// terrain.
    pub fn stroke_end(&mut self) -> Result<StrokeOutcome> {
        match self.state {
            SessionState::Drawing => {
                self.pen_down = false;
                let faces = self.generate_base()?;
                Ok(StrokeOutcome::BaseGenerated { faces })
            }
            SessionState::GeneratingInfluence => {
                let Some(stroke) = self.stroke.take() else {
                    return Err(self.invalid("end a stroke that was never begun"));
                };
                let Some(mesh) = self.mesh.as_ref() else {
                    return Err(self.invalid("resolve a contour without terrain"));
                };
                match InfluenceSiteResolver::resolve(&stroke, mesh) {
                    Ok(site) => {
                        info!(
                            "influence site at {} with radius {:.3}",
                            site.center, site.radius
                        );
                        self.sites.push(site);
                        Ok(StrokeOutcome::SiteAdded(site))
                    }
                    Err(e @ (TerrainError::ProjectionMiss | TerrainError::EmptyStroke)) => {
                        warn!("contour dropped: {e}");
                        Ok(StrokeOutcome::SiteDropped)
                    }
                    Err(e) => Err(e),
                }
            }
            _ => Err(self.invalid("end a stroke")),
        }
    }

    fn generate_base(&mut self) -> Result<usize> {
        if self.outline.is_degenerate() {
            let area = self.outline.area();
            warn!("outline is degenerate (area {area}), nothing generated");
            return Err(TerrainError::DegenerateOutline { area });
        }
        let points = self.sampler.sample(&self.outline)?;
        let mut mesh = Mesh::from(Triangulator::triangulate(&points)?);
        BoxUvProjector::project(&mut mesh);
        mesh.compute_vertex_normals();

        let faces = mesh.face_count();
        self.adjacency = Some(FaceAdjacency::build(&mesh));
        self.base = Some(mesh.clone());
        self.mesh = Some(mesh);
        self.transition(SessionState::BaseReady);
        Ok(faces)
    }

    /// Apply the heights and unlock lava tracing.
    pub fn finalize(&mut self) -> Result<()> {
        match self.state {
            SessionState::BaseReady | SessionState::GeneratingInfluence => {
                self.stroke = None;
                self.displace();
                self.transition(SessionState::Finalized);
                Ok(())
            }
            _ => Err(self.invalid("finalize")),
        }
    }

    /// Replace the displacement parameters and re-displace the terrain, if any,
    /// with the sites collected so far.
    pub fn set_parameters(&mut self, params: DisplacementParameters) {
        self.params = params.clamped();
        self.displace();
    }

    fn displace(&mut self) {
        if let Some(mesh) = self.mesh.as_mut() {
            TerrainDisplacer::new(self.noise.as_ref()).apply(mesh, &self.sites, &self.params);
        }
    }

    /// Trace a lava flow from the face under a click ray.
    ///
    /// `None` when the ray misses the terrain.
    pub fn surface_click(&mut self, origin: Vec3, direction: Vec3) -> Result<Option<DescentPath>> {
        if self.state != SessionState::Finalized {
            return Err(self.invalid("trace lava"));
        }
        let (Some(mesh), Some(adjacency)) = (self.mesh.as_ref(), self.adjacency.as_ref()) else {
            return Err(self.invalid("trace lava without terrain"));
        };
        let Some(hit) = mesh.raycast(&Ray::new(origin, direction)) else {
            return Ok(None);
        };
        let path = DescentWalker::new(mesh, adjacency).walk(hit.face)?;
        info!(
            "lava from face {} ran {} faces ({:?})",
            hit.face,
            path.len(),
            path.termination
        );
        self.lava_flows.push(path.clone());
        Ok(Some(path))
    }

    /// Back to the flat base mesh with no sites.
    pub fn reset_influence(&mut self) -> Result<()> {
        match self.state {
            SessionState::GeneratingInfluence | SessionState::Finalized => {
                let mut mesh = self.base.clone();
                if let Some(m) = mesh.as_mut() {
                    m.mark_changed();
                }
                self.mesh = mesh;
                self.sites.clear();
                self.stroke = None;
                self.lava_flows.clear();
                self.transition(SessionState::BaseReady);
                Ok(())
            }
            _ => Err(self.invalid("reset influence")),
        }
    }

    /// Forget everything and start a new outline.
    pub fn reset(&mut self) {
        self.outline = Outline::new();
        self.pen_down = false;
        self.stroke = None;
        self.base = None;
        self.mesh = None;
        self.adjacency = None;
        self.sites.clear();
        self.lava_flows.clear();
        self.transition(SessionState::Drawing);
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            info!("session {:?} -> {:?}", self.state, to);
            self.state = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplerConfig;

    fn session() -> TerrainSession {
        TerrainSession::new(SessionConfig {
            sampler: SamplerConfig {
                target_count: 300,
                seed: Some(3),
                ..Default::default()
            },
            noise_seed: Some(3),
            ..Default::default()
        })
    }

    fn draw_square(s: &mut TerrainSession) {
        s.stroke_begin().unwrap();
        for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            s.stroke_point(x, y).unwrap();
        }
    }

    fn draw_circle(s: &mut TerrainSession, cx: f32, cy: f32, r: f32) {
        s.stroke_begin().unwrap();
        for i in 0..24 {
            let a = i as f32 / 24.0 * std::f32::consts::TAU;
            s.stroke_point(cx + r * a.cos(), cy + r * a.sin()).unwrap();
        }
    }

    #[test]
    fn full_sketch_flow() {
        let mut s = session();
        draw_square(&mut s);
        let outcome = s.stroke_end().unwrap();
        assert!(matches!(outcome, StrokeOutcome::BaseGenerated { faces } if faces > 0));
        assert_eq!(s.state(), SessionState::BaseReady);
        assert_eq!(s.mesh().unwrap().vertex_count(), 300);

        draw_circle(&mut s, 0.0, 0.0, 0.5);
        assert_eq!(s.state(), SessionState::GeneratingInfluence);
        assert!(matches!(s.stroke_end().unwrap(), StrokeOutcome::SiteAdded(_)));
        assert_eq!(s.sites().len(), 1);

        s.finalize().unwrap();
        assert_eq!(s.state(), SessionState::Finalized);

        let path = s
            .surface_click(Vec3::new(0.3, 0.2, 10.0), Vec3::NEG_Z)
            .unwrap()
            .unwrap();
        assert!(!path.is_empty());
        assert_eq!(s.lava_flows().len(), 1);
        assert_eq!(s.take_lava_flows().len(), 1);
        assert!(s.lava_flows().is_empty());
    }

    #[test]
    fn degenerate_outline_keeps_drawing() {
        let mut s = session();
        s.stroke_begin().unwrap();
        s.stroke_point(0.0, 0.0).unwrap();
        s.stroke_point(1.0, 0.0).unwrap();
        assert!(matches!(
            s.stroke_end(),
            Err(TerrainError::DegenerateOutline { .. })
        ));
        assert_eq!(s.state(), SessionState::Drawing);
        assert!(s.mesh().is_none());
    }

    #[test]
    fn contour_off_terrain_is_dropped() {
        let mut s = session();
        draw_square(&mut s);
        s.stroke_end().unwrap();
        draw_circle(&mut s, 10.0, 10.0, 0.5);
        assert_eq!(s.stroke_end().unwrap(), StrokeOutcome::SiteDropped);
        assert!(s.sites().is_empty());
    }

    #[test]
    fn illegal_transitions_change_nothing() {
        let mut s = session();
        assert!(matches!(
            s.finalize(),
            Err(TerrainError::InvalidTransition {
                from: SessionState::Drawing,
                ..
            })
        ));
        assert!(s.surface_click(Vec3::Z, Vec3::NEG_Z).is_err());
        assert!(s.reset_influence().is_err());

        draw_square(&mut s);
        s.stroke_end().unwrap();
        s.finalize().unwrap();
        assert!(s.stroke_begin().is_err());
        assert!(s.stroke_point(0.0, 0.0).is_err());
        assert_eq!(s.state(), SessionState::Finalized);
    }

    #[test]
    fn parameter_change_redisplaces_from_scratch() {
        let mut s = session();
        draw_square(&mut s);
        s.stroke_end().unwrap();
        draw_circle(&mut s, 0.0, 0.0, 0.8);
        s.stroke_end().unwrap();
        s.finalize().unwrap();
        let before: Vec<f32> = s.mesh().unwrap().positions.iter().map(|p| p.z).collect();

        let mut params = *s.parameters();
        params.height_scale = 2.5;
        s.set_parameters(params);
        params.height_scale = 1.0;
        s.set_parameters(params);
        let after: Vec<f32> = s.mesh().unwrap().positions.iter().map(|p| p.z).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn parameter_change_applies_while_drawing_contours() {
        let mut s = session();
        let mut params = *s.parameters();
        params.height_scale = 2.5;
        s.set_parameters(params);
        assert!(s.mesh().is_none());

        draw_square(&mut s);
        s.stroke_end().unwrap();
        draw_circle(&mut s, 0.0, 0.0, 0.8);
        s.stroke_end().unwrap();
        assert_eq!(s.state(), SessionState::GeneratingInfluence);
        s.mesh_mut().unwrap().take_changed();

        s.set_parameters(params);
        let mesh = s.mesh().unwrap();
        assert!(mesh.is_changed());
        assert!(mesh.positions.iter().any(|p| p.z.abs() > 0.0));
        assert_eq!(s.state(), SessionState::GeneratingInfluence);

        // later contours still land on the raised terrain
        draw_circle(&mut s, 0.3, 0.3, 0.2);
        assert!(matches!(s.stroke_end().unwrap(), StrokeOutcome::SiteAdded(_)));
    }

    #[test]
    fn reset_influence_restores_flat_base() {
        let mut s = session();
        draw_square(&mut s);
        s.stroke_end().unwrap();
        draw_circle(&mut s, 0.0, 0.0, 0.8);
        s.stroke_end().unwrap();
        s.finalize().unwrap();
        s.reset_influence().unwrap();
        assert_eq!(s.state(), SessionState::BaseReady);
        assert!(s.sites().is_empty());
        assert!(s.mesh().unwrap().positions.iter().all(|p| p.z == 0.0));

        s.reset();
        assert_eq!(s.state(), SessionState::Drawing);
        assert!(s.mesh().is_none());
        assert!(s.outline().is_empty());
    }
}

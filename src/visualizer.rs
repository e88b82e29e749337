//! The visualizer facade.
//!
//! One [`StuffingVisualizer`] owns everything needed to show one plan: the
//! render surface, the scene, the camera, the step animation and the
//! pointer picker. Its lifecycle is explicit:
//!
//! ```text
//! Uninitialized --attach--> Attached --load--> Loaded --dispose--> Disposed
//!       \--------------load-------------------/^
//! ```
//!
//! Attaching and loading may happen in either order. Every call after
//! [`StuffingVisualizer::dispose`] is a no-op; fallible calls report
//! [`VisualizerError::Disposed`].

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::animation::{PlaybackState, StepAnimationController};
use crate::camera::{CameraController, CaptureError};
use crate::config::{ReportConfig, ViewerConfig};
use crate::model::{StuffingPlan, StuffingPlanData, ValidationError};
use crate::observer::Subscription;
use crate::picking::{HoverEvent, PointerPicker};
use crate::renderer::{RenderError, Renderer, SoftwareRenderer};
use crate::report::{
    self, ReportDocument, ReportError, ReportOptions, ReportSettings, Screenshot,
};
use crate::scene::{Scene, SceneDescription};

#[derive(Debug, Error)]
pub enum VisualizerError {
    #[error("no plan loaded")]
    NotLoaded,
    #[error("visualizer has been disposed")]
    Disposed,
    #[error("invalid plan: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Uninitialized,
    Attached,
    Loaded,
    Disposed,
}

/// Host element the visualizer draws into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostElement {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl HostElement {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }
}

struct Surface {
    host_id: String,
    renderer: Box<dyn Renderer>,
}

/// Derived state of the loaded plan; rebuilt wholesale on every load.
struct RenderState {
    plan: StuffingPlan,
    scene: Scene,
}

pub struct StuffingVisualizer {
    config: ViewerConfig,
    report_config: ReportConfig,
    camera: CameraController,
    animation: StepAnimationController,
    picker: PointerPicker,
    surface: Option<Surface>,
    state: Option<RenderState>,
    loading_mode: bool,
    disposed: bool,
}

impl StuffingVisualizer {
    pub fn new(config: ViewerConfig, report_config: ReportConfig) -> Self {
        let aspect = config.capture_width as f64 / config.capture_height.max(1) as f64;
        Self {
            camera: CameraController::new(aspect),
            animation: StepAnimationController::new(config.step_duration),
            picker: PointerPicker::new(config.click_threshold_px),
            config,
            report_config,
            surface: None,
            state: None,
            loading_mode: false,
            disposed: false,
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.disposed {
            Lifecycle::Disposed
        } else if self.state.is_some() {
            Lifecycle::Loaded
        } else if self.surface.is_some() {
            Lifecycle::Attached
        } else {
            Lifecycle::Uninitialized
        }
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Attaches a software surface sized to the host.
    ///
    /// Re-attaching to the same host is a no-op; attaching to a different
    /// host detaches from the old one first.
    pub fn attach(&mut self, host: HostElement) -> Result<(), VisualizerError> {
        if self.disposed {
            return Ok(());
        }
        if self.is_attached_to(&host.id) {
            return Ok(());
        }
        let renderer = SoftwareRenderer::new(host.width.max(1), host.height.max(1))?;
        self.attach_renderer(host.id, Box::new(renderer));
        Ok(())
    }

    /// Attaches an arbitrary surface implementation.
    pub fn attach_renderer(&mut self, host_id: impl Into<String>, mut renderer: Box<dyn Renderer>) {
        if self.disposed {
            return;
        }
        let host_id = host_id.into();
        if self.is_attached_to(&host_id) {
            return;
        }
        self.detach();

        renderer.set_background(self.config.background);
        let (width, height) = renderer.size();
        self.camera.update_aspect(width as f64 / height.max(1) as f64);
        log::debug!("🔗 Attached to '{}' ({}x{})", host_id, width, height);
        self.surface = Some(Surface { host_id, renderer });
    }

    fn is_attached_to(&self, host_id: &str) -> bool {
        self.surface
            .as_ref()
            .is_some_and(|surface| surface.host_id == host_id)
    }

    /// Releases the current surface, if any.
    pub fn detach(&mut self) {
        if let Some(mut surface) = self.surface.take() {
            surface.renderer.dispose();
            log::debug!("🔌 Detached from '{}'", surface.host_id);
        }
    }

    /// Validates and loads a plan payload.
    pub fn load_data(&mut self, data: &StuffingPlanData) -> Result<(), VisualizerError> {
        if self.disposed {
            return Ok(());
        }
        let plan = StuffingPlan::from_data(data)?;
        self.load_plan(plan);
        Ok(())
    }

    /// Replaces the loaded plan.
    ///
    /// The previous scene is released before the new one is built. After
    /// loading, the cursor sits on the last step so everything is visible.
    pub fn load_plan(&mut self, plan: StuffingPlan) {
        if self.disposed {
            return;
        }
        if let Some(mut previous) = self.state.take() {
            previous.scene.clear();
        }

        let scene = Scene::build(&plan);
        let max_step = plan.max_step();
        self.camera.fit_to_container(plan.container.dims);
        self.picker.select(None);
        log::info!(
            "📥 Plan loaded: {} placements, {} steps",
            plan.placements.len(),
            max_step
        );
        self.state = Some(RenderState { plan, scene });

        self.animation.pause();
        self.animation.set_max_step(max_step);
        self.animation.set_current_step(max_step);
        self.sync_step(true);
    }

    pub fn plan(&self) -> Option<&StuffingPlan> {
        self.state.as_ref().map(|state| &state.plan)
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.state.as_ref().map(|state| &state.scene)
    }

    /// Resizes the surface and the camera frustum. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.disposed || width == 0 || height == 0 {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            if let Err(err) = surface.renderer.set_size(width, height) {
                log::warn!("⚠️ Resize to {}x{} failed: {}", width, height, err);
                return;
            }
        }
        self.camera.update_aspect(width as f64 / height as f64);
    }

    pub fn get_current_step(&self) -> u32 {
        self.animation.current_step()
    }

    pub fn get_max_step(&self) -> u32 {
        self.animation.max_step()
    }

    pub fn is_playing(&self) -> bool {
        self.animation.is_playing()
    }

    pub fn set_step(&mut self, step: u32) {
        let changed = self.animation.set_current_step(step);
        self.sync_step(changed);
    }

    pub fn play(&mut self) {
        self.play_at(Instant::now());
    }

    pub fn play_at(&mut self, now: Instant) {
        let before = self.animation.current_step();
        self.animation.play_at(now);
        self.sync_step(before != self.animation.current_step());
    }

    pub fn pause(&mut self) {
        self.animation.pause();
    }

    pub fn toggle(&mut self) {
        let before = self.animation.current_step();
        self.animation.toggle();
        self.sync_step(before != self.animation.current_step());
    }

    pub fn reset(&mut self) {
        let before = self.animation.current_step();
        self.animation.reset();
        self.sync_step(before != self.animation.current_step());
    }

    /// Timer callback; advances playback when a step duration elapsed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        let changed = self.animation.tick_at(now);
        self.sync_step(changed);
        changed
    }

    /// Number of item groups visible at the current step.
    pub fn visible_item_count(&self) -> usize {
        self.scene().map_or(0, Scene::visible_group_count)
    }

    fn sync_step(&mut self, changed: bool) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let step = self.animation.current_step();
        state.scene.apply_visibility(step);
        if changed && self.loading_mode {
            if let Some(bounds) = state.scene.step_bounds(step) {
                self.camera.focus_on_box(&bounds);
            }
        }
    }

    /// In loading mode every step change refocuses the camera on the items
    /// of the current step; otherwise the camera frames the container.
    pub fn set_loading_mode(&mut self, enabled: bool) {
        if self.disposed || self.loading_mode == enabled {
            return;
        }
        self.loading_mode = enabled;
        let Some(state) = self.state.as_ref() else {
            return;
        };
        if enabled {
            if let Some(bounds) = state.scene.step_bounds(self.animation.current_step()) {
                self.camera.focus_on_box(&bounds);
            }
        } else {
            self.camera.fit_to_container(state.plan.container.dims);
        }
    }

    pub fn loading_mode(&self) -> bool {
        self.loading_mode
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn on_step_change(&self, callback: impl Fn(&u32) + Send + Sync + 'static) -> Subscription {
        self.animation.on_step_change(callback)
    }

    pub fn on_play_state_change(
        &self,
        callback: impl Fn(&PlaybackState) + Send + Sync + 'static,
    ) -> Subscription {
        self.animation.on_play_state_change(callback)
    }

    pub fn on_item_hover(
        &self,
        callback: impl Fn(&HoverEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.picker.on_hover(callback)
    }

    fn viewport(&self) -> (u32, u32) {
        self.surface
            .as_ref()
            .map(|surface| surface.renderer.size())
            .unwrap_or((self.config.capture_width, self.config.capture_height))
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if !self.disposed {
            self.picker.pointer_down(x, y);
        }
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> Option<HoverEvent> {
        if self.disposed {
            return None;
        }
        let viewport = self.viewport();
        let state = self.state.as_ref()?;
        self.picker
            .pointer_move(&state.scene, self.camera.camera(), viewport, x, y)
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) {
        if self.disposed {
            return;
        }
        let viewport = self.viewport();
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if self
            .picker
            .pointer_up(&state.scene, self.camera.camera(), viewport, x, y)
        {
            state.scene.apply_selection(self.picker.selected());
        }
    }

    /// Selects an item by identity, or clears the selection with `None`.
    pub fn select_item(&mut self, item_id: Option<&str>) {
        if self.disposed {
            return;
        }
        if self.picker.select(item_id.map(str::to_owned)) {
            if let Some(state) = self.state.as_mut() {
                state.scene.apply_selection(self.picker.selected());
            }
        }
    }

    pub fn selected_item(&self) -> Option<&str> {
        self.picker.selected()
    }

    /// Draws one frame onto the attached surface.
    pub fn render_frame(&mut self) -> Result<(), VisualizerError> {
        if self.disposed {
            return Ok(());
        }
        let Some(surface) = self.surface.as_mut() else {
            return Ok(());
        };
        let empty = Scene::default();
        let scene = self.state.as_ref().map_or(&empty, |state| &state.scene);
        surface.renderer.render(scene, self.camera.camera())?;
        Ok(())
    }

    /// PNG of the current view at the current surface size.
    pub fn capture_snapshot(&mut self) -> Result<Vec<u8>, VisualizerError> {
        if self.disposed {
            return Err(VisualizerError::Disposed);
        }
        if self.surface.is_none() {
            return Err(CaptureError::NoSurface.into());
        }
        self.render_frame()?;
        match self.surface.as_ref() {
            Some(surface) => Ok(surface.renderer.read_png()?),
            None => Err(CaptureError::NoSurface.into()),
        }
    }

    /// PNG of the fitted isometric view at the configured capture size.
    ///
    /// Uses the attached surface when present and a temporary one
    /// otherwise. Camera and surface are restored afterwards, also on
    /// failure.
    pub fn capture_step_snapshot(&mut self) -> Result<Screenshot, VisualizerError> {
        if self.disposed {
            return Err(VisualizerError::Disposed);
        }
        let state = self.state.as_ref().ok_or(VisualizerError::NotLoaded)?;
        let (width, height) = (self.config.capture_width, self.config.capture_height);

        let mut scratch: Option<Box<dyn Renderer>> = None;
        let renderer: &mut dyn Renderer = match self.surface.as_mut() {
            Some(surface) => &mut *surface.renderer,
            None => {
                let mut offscreen = SoftwareRenderer::new(width, height)?;
                offscreen.set_background(self.config.background);
                &mut **scratch.insert(Box::new(offscreen))
            }
        };

        self.camera
            .setup_for_capture(renderer, width, height, state.plan.container.dims)?;
        let png = renderer
            .render(&state.scene, self.camera.camera())
            .and_then(|_| renderer.read_png());
        self.camera.restore(renderer);

        Ok(Screenshot {
            png: png?,
            aspect_ratio: width as f64 / height as f64,
        })
    }

    /// Lays out the report for the loaded plan.
    ///
    /// A failing screenshot capture is logged and the document is produced
    /// without the image.
    pub async fn build_report(
        &mut self,
        options: &ReportOptions,
    ) -> Result<ReportDocument, VisualizerError> {
        let settings = self.report_settings(options)?;
        let screenshot = self.report_screenshot(&settings);
        // let the host draw the restored view before continuing
        tokio::task::yield_now().await;
        self.layout(&settings, screenshot)
    }

    /// Blocking variant of [`StuffingVisualizer::build_report`] for callers
    /// without a host to yield to.
    pub fn layout_report(
        &mut self,
        options: &ReportOptions,
    ) -> Result<ReportDocument, VisualizerError> {
        let settings = self.report_settings(options)?;
        let screenshot = self.report_screenshot(&settings);
        self.layout(&settings, screenshot)
    }

    /// Generates the PDF report.
    pub async fn generate_report(
        &mut self,
        options: &ReportOptions,
    ) -> Result<Vec<u8>, VisualizerError> {
        let document = self.build_report(options).await?;
        encode_report(&document)
    }

    /// Generates the PDF report on the calling thread.
    pub fn render_report(&mut self, options: &ReportOptions) -> Result<Vec<u8>, VisualizerError> {
        let document = self.layout_report(options)?;
        encode_report(&document)
    }

    fn report_settings(&self, options: &ReportOptions) -> Result<ReportSettings, VisualizerError> {
        if self.disposed {
            return Err(VisualizerError::Disposed);
        }
        if self.state.is_none() {
            return Err(VisualizerError::NotLoaded);
        }
        Ok(ReportSettings::resolve(&self.report_config, options))
    }

    fn report_screenshot(&mut self, settings: &ReportSettings) -> Option<Screenshot> {
        if !settings.include_screenshot {
            return None;
        }
        match self.capture_step_snapshot() {
            Ok(shot) => Some(shot),
            Err(err) => {
                log::warn!("⚠️ Report screenshot unavailable: {}", err);
                None
            }
        }
    }

    fn layout(
        &self,
        settings: &ReportSettings,
        screenshot: Option<Screenshot>,
    ) -> Result<ReportDocument, VisualizerError> {
        let plan = self.plan().ok_or(VisualizerError::NotLoaded)?;
        Ok(report::build_document(plan, settings, screenshot.as_ref()))
    }

    pub fn scene_description(&self) -> Option<SceneDescription> {
        self.scene().map(Scene::describe)
    }

    /// Releases the surface, the scene and every subscription.
    ///
    /// Idempotent; every later call is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.animation.dispose();
        self.picker.clear();
        if let Some(mut state) = self.state.take() {
            state.scene.clear();
        }
        self.detach();
        self.disposed = true;
        log::debug!("🧹 Visualizer disposed");
    }
}

impl Default for StuffingVisualizer {
    fn default() -> Self {
        Self::new(ViewerConfig::default(), ReportConfig::default())
    }
}

impl Drop for StuffingVisualizer {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn encode_report(document: &ReportDocument) -> Result<Vec<u8>, VisualizerError> {
    let bytes = report::pdf::render_pdf(document)?;
    log::info!(
        "📄 Report generated: {} pages, {} bytes",
        document.pages.len(),
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrthoCamera;
    use crate::model::Rgb;
    use crate::model::fixtures::{mixed_plan, two_cube_plan, two_cube_plan_data};
    use crate::picking::DIMMED_OPACITY;
    use crate::report::{DrawOp, PageKind};
    use std::sync::{Arc, Mutex};

    fn small_viewer() -> StuffingVisualizer {
        let config = ViewerConfig::builder().capture_size(160, 90).build();
        StuffingVisualizer::new(config, ReportConfig::default())
    }

    /// Surface whose frame buffer can never be read back.
    struct UnreadableRenderer {
        size: (u32, u32),
    }

    impl Renderer for UnreadableRenderer {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn set_size(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
            self.size = (width, height);
            Ok(())
        }

        fn set_background(&mut self, _color: Rgb) {}

        fn render(&mut self, _scene: &Scene, _camera: &OrthoCamera) -> Result<(), RenderError> {
            Ok(())
        }

        fn read_png(&self) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Unreadable("lost context".into()))
        }

        fn dispose(&mut self) {}
    }

    #[tokio::test]
    async fn two_cube_plan_end_to_end() {
        let mut viewer = small_viewer();
        viewer.load_data(&two_cube_plan_data()).unwrap();
        assert_eq!(viewer.get_max_step(), 2);
        assert_eq!(viewer.get_current_step(), 2);

        viewer.set_step(1);
        assert_eq!(viewer.visible_item_count(), 1);
        viewer.set_step(2);
        assert_eq!(viewer.visible_item_count(), 2);

        let document = viewer.build_report(&ReportOptions::default()).await.unwrap();
        assert_eq!(document.pages.len(), 3);
        assert_eq!(document.pages[0].kind, PageKind::Summary);

        let pdf = viewer.generate_report(&ReportOptions::default()).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn lifecycle_follows_attach_load_dispose() {
        let mut viewer = small_viewer();
        assert_eq!(viewer.lifecycle(), Lifecycle::Uninitialized);
        viewer.attach(HostElement::new("viewport", 64, 48)).unwrap();
        assert_eq!(viewer.lifecycle(), Lifecycle::Attached);
        viewer.load_plan(two_cube_plan());
        assert_eq!(viewer.lifecycle(), Lifecycle::Loaded);
        viewer.dispose();
        assert_eq!(viewer.lifecycle(), Lifecycle::Disposed);
        assert!(viewer.scene().is_none());
        assert!(!viewer.is_attached());
    }

    #[test]
    fn load_before_attach_is_allowed() {
        let mut viewer = small_viewer();
        viewer.load_plan(two_cube_plan());
        assert_eq!(viewer.lifecycle(), Lifecycle::Loaded);
        viewer.attach(HostElement::new("viewport", 64, 48)).unwrap();
        viewer.render_frame().unwrap();
        assert!(viewer.capture_snapshot().unwrap().starts_with(b"\x89PNG"));
    }

    #[test]
    fn snapshot_without_surface_is_rejected() {
        let mut viewer = small_viewer();
        viewer.load_plan(two_cube_plan());
        assert!(matches!(
            viewer.capture_snapshot(),
            Err(VisualizerError::Capture(CaptureError::NoSurface))
        ));
    }

    #[test]
    fn attach_is_idempotent_per_host() {
        let mut viewer = small_viewer();
        viewer.attach(HostElement::new("a", 64, 48)).unwrap();
        viewer.resize(100, 50);
        viewer.attach(HostElement::new("a", 10, 10)).unwrap();
        assert_eq!(viewer.viewport(), (100, 50));

        viewer.attach(HostElement::new("b", 32, 32)).unwrap();
        assert_eq!(viewer.viewport(), (32, 32));
    }

    #[test]
    fn calls_after_dispose_are_no_ops() {
        let mut viewer = small_viewer();
        viewer.load_plan(two_cube_plan());
        viewer.dispose();
        viewer.dispose();

        viewer.set_step(1);
        viewer.play();
        viewer.tick();
        viewer.pointer_down(1.0, 1.0);
        viewer.pointer_up(1.0, 1.0);
        viewer.select_item(Some("cube"));
        viewer.load_plan(mixed_plan());
        viewer.attach(HostElement::new("late", 8, 8)).unwrap();
        viewer.render_frame().unwrap();

        assert_eq!(viewer.lifecycle(), Lifecycle::Disposed);
        assert!(!viewer.is_playing());
        assert!(matches!(
            viewer.capture_snapshot(),
            Err(VisualizerError::Disposed)
        ));
    }

    #[tokio::test]
    async fn report_requires_a_loaded_plan() {
        let mut viewer = small_viewer();
        assert!(matches!(
            viewer.generate_report(&ReportOptions::default()).await,
            Err(VisualizerError::NotLoaded)
        ));
    }

    #[tokio::test]
    async fn capture_failure_still_yields_a_report() {
        let mut viewer = small_viewer();
        viewer.attach_renderer("broken", Box::new(UnreadableRenderer { size: (64, 48) }));
        viewer.load_plan(two_cube_plan());

        let document = viewer.build_report(&ReportOptions::default()).await.unwrap();
        assert_eq!(document.pages.len(), 3);
        assert!(!document.pages[0]
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Image { .. })));
        // the surface was restored after the failed capture
        assert_eq!(viewer.viewport(), (64, 48));
        assert!(!viewer.camera().is_capturing());
    }

    #[tokio::test]
    async fn headless_report_embeds_a_screenshot() {
        let mut viewer = small_viewer();
        viewer.load_plan(two_cube_plan());
        let document = viewer.build_report(&ReportOptions::default()).await.unwrap();
        assert!(document.pages[0]
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Image { .. })));

        let options = ReportOptions {
            include_screenshot: Some(false),
            ..ReportOptions::default()
        };
        let document = viewer.build_report(&options).await.unwrap();
        assert!(!document.pages[0]
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Image { .. })));
    }

    #[test]
    fn blocking_report_matches_the_async_layout() {
        let mut viewer = small_viewer();
        assert!(matches!(
            viewer.render_report(&ReportOptions::default()),
            Err(VisualizerError::NotLoaded)
        ));

        viewer.load_plan(two_cube_plan());
        let document = viewer.layout_report(&ReportOptions::default()).unwrap();
        assert_eq!(document.pages.len(), 3);
        assert!(document.pages[0]
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::Image { .. })));

        let bytes = viewer.render_report(&ReportOptions::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn reload_rebuilds_the_scene() {
        let mut viewer = small_viewer();
        viewer.load_plan(mixed_plan());
        assert_eq!(viewer.scene().unwrap().groups().len(), 3);
        viewer.select_item(Some("pallet"));

        viewer.load_plan(two_cube_plan());
        assert_eq!(viewer.scene().unwrap().groups().len(), 2);
        assert_eq!(viewer.get_max_step(), 2);
        assert_eq!(viewer.selected_item(), None);
    }

    #[test]
    fn step_notifications_reach_subscribers() {
        let mut viewer = small_viewer();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut sub = viewer.on_step_change(move |step| sink.lock().unwrap().push(*step));

        viewer.load_plan(two_cube_plan());
        viewer.set_step(1);
        viewer.set_step(1);
        sub.unsubscribe();
        viewer.set_step(0);

        assert_eq!(*seen.lock().unwrap(), vec![2, 1]);
    }

    #[test]
    fn playing_from_the_end_restarts_and_hides_items() {
        let mut viewer = small_viewer();
        viewer.load_plan(two_cube_plan());
        viewer.play();
        assert!(viewer.is_playing());
        assert_eq!(viewer.get_current_step(), 0);
        assert_eq!(viewer.visible_item_count(), 0);
        viewer.reset();
        assert!(!viewer.is_playing());
    }

    #[test]
    fn selection_dims_other_items() {
        let mut viewer = small_viewer();
        viewer.load_plan(mixed_plan());
        viewer.select_item(Some("crate"));
        let scene = viewer.scene().unwrap();
        for group in scene.groups() {
            let opacity = scene.primitive(group.solid).unwrap().material.opacity;
            if group.tag.item_id == "crate" {
                assert_eq!(opacity, 1.0);
            } else {
                assert_eq!(opacity, DIMMED_OPACITY);
            }
        }
        viewer.select_item(None);
        let scene = viewer.scene().unwrap();
        assert!(scene.primitives().iter().all(|p| p.material.opacity == 1.0));
    }

    #[test]
    fn loading_mode_follows_the_current_step() {
        let mut viewer = small_viewer();
        viewer.load_plan(mixed_plan());
        viewer.set_loading_mode(true);
        viewer.set_step(2);
        let expected = viewer.scene().unwrap().step_bounds(2).unwrap().center();
        assert!((viewer.camera().camera().target - expected).length() < 1e-9);

        viewer.set_loading_mode(false);
        assert!(viewer.camera().camera().target.length() < 1e-9);
    }

    #[test]
    fn resize_ignores_zero_sizes() {
        let mut viewer = small_viewer();
        viewer.attach(HostElement::new("v", 64, 48)).unwrap();
        viewer.resize(0, 10);
        assert_eq!(viewer.viewport(), (64, 48));
        viewer.resize(200, 100);
        assert_eq!(viewer.viewport(), (200, 100));
        assert!((viewer.camera().camera().aspect() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn scene_description_is_available_after_load() {
        let mut viewer = small_viewer();
        assert!(viewer.scene_description().is_none());
        viewer.load_plan(two_cube_plan());
        let description = viewer.scene_description().unwrap();
        assert_eq!(description.max_step, 2);
    }
}

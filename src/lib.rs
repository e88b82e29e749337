//! Container stuffing-plan visualization and report engine.
//!
//! Loads a computed stuffing plan, builds a 3D scene of the container and
//! its items, animates the loading sequence step by step, supports pointer
//! picking and renders a multi-page PDF loading report.

pub mod animation;
pub mod api;
pub mod camera;
pub mod config;
pub mod model;
pub mod observer;
pub mod picking;
pub mod renderer;
pub mod report;
pub mod rotation;
pub mod scene;
pub mod transform;
pub mod types;
pub mod visualizer;

pub use config::{AppConfig, ReportConfig, ViewerConfig};
pub use model::{StuffingPlan, StuffingPlanData};
pub use visualizer::{HostElement, Lifecycle, StuffingVisualizer, VisualizerError};

use log::LevelFilter;
use serde::Deserialize;

use crate::error::InitError;
use crate::operation::Operation;

/// Page-supplied settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, Deserialize)]
pub struct CompositorConfig {
    /// Id of the `<canvas>` the composite is drawn into.
    #[serde(default = "default_canvas_id")]
    pub canvas_id: String,
    /// Id of the `<video>` element fed by the webcam.
    #[serde(default = "default_video_id")]
    pub video_id: String,
    #[serde(default)]
    pub camera: CameraConfig,
    /// Operation pending before the first key press.
    #[serde(default = "default_initial_operation")]
    pub initial_operation: Operation,
    /// Only the first N frames are logged.
    #[serde(default = "default_log_first_frames")]
    pub log_first_frames: u64,
    #[serde(default = "default_log_level")]
    pub log_level: LevelFilter,
    #[serde(default)]
    pub shaders: ShaderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_ideal_width")]
    pub ideal_width: u32,
    #[serde(default = "default_ideal_height")]
    pub ideal_height: u32,
    /// `user` (front) or `environment` (rear).
    #[serde(default = "default_facing_mode")]
    pub facing_mode: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderOrigin {
    /// Sources compiled into the wasm binary.
    #[default]
    Embedded,
    /// Sources fetched relative to the page.
    Fetch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShaderConfig {
    #[serde(default)]
    pub source: ShaderOrigin,
    #[serde(default = "default_vertex_path")]
    pub vertex: String,
    #[serde(default = "default_boolean_path")]
    pub boolean: String,
    #[serde(default = "default_display_path")]
    pub display: String,
}

fn default_canvas_id() -> String {
    "segmentation-canvas".to_string()
}

fn default_video_id() -> String {
    "video".to_string()
}

fn default_initial_operation() -> Operation {
    Operation::Not
}

fn default_log_first_frames() -> u64 {
    2
}

fn default_log_level() -> LevelFilter {
    LevelFilter::Info
}

fn default_ideal_width() -> u32 {
    1280
}

fn default_ideal_height() -> u32 {
    720
}

fn default_facing_mode() -> String {
    "user".to_string()
}

fn default_vertex_path() -> String {
    "shaders/basic.vert.glsl".to_string()
}

fn default_boolean_path() -> String {
    "shaders/boolean.frag.glsl".to_string()
}

fn default_display_path() -> String {
    "shaders/display.frag.glsl".to_string()
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            canvas_id: default_canvas_id(),
            video_id: default_video_id(),
            camera: CameraConfig::default(),
            initial_operation: default_initial_operation(),
            log_first_frames: default_log_first_frames(),
            log_level: default_log_level(),
            shaders: ShaderConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_width: default_ideal_width(),
            ideal_height: default_ideal_height(),
            facing_mode: default_facing_mode(),
        }
    }
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            source: ShaderOrigin::default(),
            vertex: default_vertex_path(),
            boolean: default_boolean_path(),
            display: default_display_path(),
        }
    }
}

impl CompositorConfig {
    pub fn from_json(json: &str) -> Result<Self, InitError> {
        Ok(serde_json::from_str(json)?)
    }
}

//! Error types for the compositor.

use thiserror::Error;

use crate::gpu::ShaderStage;

/// Failures raised while creating or driving GPU objects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GpuError {
    /// The context refused to allocate an object (usually a lost context).
    #[error("failed to create {0}")]
    Create(&'static str),

    /// A framebuffer failed its completeness check.
    #[error("framebuffer is not complete: status 0x{status:04X}")]
    FramebufferIncomplete { status: u32 },

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link: {log}")]
    ProgramLink { log: String },

    /// `texImage2D` rejected a source or allocation.
    #[error("texture upload failed: {0}")]
    Upload(String),
}

/// Fatal startup errors. Shown to the user, never retried.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("{0} is not supported in your browser")]
    MissingCapability(&'static str),

    #[error("failed to load shader {path}: {reason}")]
    ShaderLoad { path: String, reason: String },

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("camera setup failed: {0}")]
    Camera(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A page element is missing or a DOM call failed.
    #[error("page setup failed: {0}")]
    Dom(String),
}

/// Failures reported by the pose/segmentation model adapter.
#[derive(Debug, Error)]
pub enum MaskSourceError {
    #[error("pose estimate failed: {0}")]
    Estimate(String),

    #[error("segmentation mask could not be converted: {0}")]
    Mask(String),
}

/// Errors that stop the frame loop.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    MaskSource(#[from] MaskSourceError),

    #[error("frame scheduling failed: {0}")]
    Schedule(String),
}

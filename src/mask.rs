//! Boundary to the pose/segmentation model.

use crate::error::MaskSourceError;

/// One person found in a frame, with the segmentation mask already converted into
/// something [`crate::gpu::Gl::tex_image_from`] accepts.
#[derive(Debug, Clone)]
pub struct Detection<I> {
    pub score: Option<f32>,
    pub mask: I,
}

/// What the model reported for one frame. Only the first person's mask is ever
/// uploaded, so only that one is converted; the others are just counted.
#[derive(Debug, Clone)]
pub struct MaskEstimate<I> {
    pub people: usize,
    pub first: Option<Detection<I>>,
}

impl<I> MaskEstimate<I> {
    /// Nobody visible. A normal outcome, not an error.
    pub fn nobody() -> Self {
        Self {
            people: 0,
            first: None,
        }
    }

    /// `people` detections, of which `first` is the one carrying a mask.
    pub fn found(people: usize, first: Detection<I>) -> Self {
        Self {
            people: people.max(1),
            first: Some(first),
        }
    }
}

impl<I> Default for MaskEstimate<I> {
    fn default() -> Self {
        Self::nobody()
    }
}

/// Produces segmentation masks for video frames.
#[allow(async_fn_in_trait)]
pub trait MaskSource<I> {
    async fn estimate(&mut self, frame: &I) -> Result<MaskEstimate<I>, MaskSourceError>;
}

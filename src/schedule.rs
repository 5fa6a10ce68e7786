//! The frame loop that drives [`FramePipeline::tick`].

use std::cell::Cell;
use std::rc::Rc;

use log::info;

use crate::error::PipelineError;
use crate::gpu::Gl;
use crate::mask::MaskSource;
use crate::pipeline::FramePipeline;

/// Waits for the host's next frame callback.
#[allow(async_fn_in_trait)]
pub trait FrameScheduler {
    async fn next_frame(&mut self) -> Result<(), PipelineError>;
}

/// Shared stop flag. The loop checks it between ticks; a tick in flight always
/// finishes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

/// Ticks the pipeline once per scheduled frame until `stop` is raised or a tick
/// fails. Returns the number of completed ticks.
///
/// There is no timeout around the mask estimate: if it never resolves, the loop
/// never advances.
pub async fn run<G, M, S>(
    pipeline: &mut FramePipeline<G>,
    video: &G::Image,
    masks: &mut M,
    scheduler: &mut S,
    stop: &StopHandle,
) -> Result<u64, PipelineError>
where
    G: Gl,
    M: MaskSource<G::Image>,
    S: FrameScheduler,
{
    let mut ticks = 0;
    loop {
        scheduler.next_frame().await?;
        if stop.is_stopped() {
            info!("frame loop stopped after {ticks} ticks");
            return Ok(ticks);
        }
        pipeline.tick(video, masks).await?;
        ticks += 1;
    }
}

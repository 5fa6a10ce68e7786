//! Webcam compositor that accumulates segmentation masks with boolean operations
//! in a ping-pong framebuffer feedback loop and draws the result over the live
//! video with WebGL2.

pub mod config;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod mask;
pub mod operation;
pub mod pipeline;
pub mod program;
pub mod schedule;
pub mod shader;
pub mod texture;

pub use config::CompositorConfig;
pub use error::{GpuError, InitError, MaskSourceError, PipelineError};
pub use gpu::Gl;
pub use mask::{Detection, MaskEstimate, MaskSource};
pub use operation::{OpCode, Operation, OperationSelector};
pub use pipeline::{FramePipeline, TickReport};
pub use schedule::{FrameScheduler, StopHandle};
pub use shader::ShaderSources;

// Only compile wasm-specific code when targeting wasm32.
#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use std::cell::RefCell;

    use log::{error, info};
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlVideoElement, Window};

    use crate::config::{CompositorConfig, ShaderOrigin};
    use crate::error::InitError;
    use crate::operation::OperationSelector;
    use crate::pipeline::FramePipeline;
    use crate::schedule::{self, StopHandle};
    use crate::shader::{EmbeddedShaders, ShaderSources};

    mod camera;
    mod console;
    mod fetch;
    mod frames;
    mod input;
    pub mod pose;
    pub mod render;

    use frames::AnimationFrames;
    use pose::{BlazePoseMasks, PoseDetector};
    use render::{WebGl, WebImage};

    thread_local! {
        static RUNNING: RefCell<Option<StopHandle>> = RefCell::new(None);
    }

    pub(crate) fn describe(value: &JsValue) -> String {
        value.as_string().unwrap_or_else(|| format!("{value:?}"))
    }

    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();
        console::init(log::LevelFilter::Info);
    }

    /// Starts the compositor on the page.
    ///
    /// `detector` is a pose-detection detector created with segmentation enabled;
    /// `config` is an optional JSON [`CompositorConfig`]. Initialization errors are
    /// shown on the page and returned; the frame loop itself runs detached.
    #[wasm_bindgen]
    pub async fn start(detector: PoseDetector, config: Option<String>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let session = match Session::open(&window, &document, detector, config).await {
            Ok(session) => session,
            Err(err) => {
                error!("Initialization error: {err}");
                show_error(&document, &format!("Failed to initialize: {err}"));
                return Err(JsValue::from_str(&err.to_string()));
            }
        };

        let stop = StopHandle::new();
        if let Some(previous) = RUNNING.with(|slot| slot.borrow_mut().replace(stop.clone())) {
            previous.stop();
        }
        wasm_bindgen_futures::spawn_local(session.run(stop));
        Ok(())
    }

    /// Stops the running frame loop after its current tick.
    #[wasm_bindgen]
    pub fn stop() {
        if let Some(handle) = RUNNING.with(|slot| slot.borrow_mut().take()) {
            handle.stop();
        }
    }

    struct Session {
        document: Document,
        pipeline: FramePipeline<WebGl>,
        video: WebImage,
        masks: BlazePoseMasks,
        frames: AnimationFrames,
    }

    impl Session {
        async fn open(
            window: &Window,
            document: &Document,
            detector: PoseDetector,
            config: Option<String>,
        ) -> Result<Self, InitError> {
            let config = match config {
                Some(json) => CompositorConfig::from_json(&json)?,
                None => CompositorConfig::default(),
            };
            console::init(config.log_level);

            let canvas: HtmlCanvasElement = element(document, &config.canvas_id)?;
            let video: HtmlVideoElement = element(document, &config.video_id)?;
            let gl = WebGl::from_canvas(&canvas)?;

            let sources = match config.shaders.source {
                ShaderOrigin::Embedded => {
                    ShaderSources::load(&EmbeddedShaders, &config.shaders).await?
                }
                ShaderOrigin::Fetch => {
                    ShaderSources::load(&fetch::FetchShaders::new(window.clone()), &config.shaders)
                        .await?
                }
            };

            let selector = OperationSelector::new(config.initial_operation);
            input::listen_for_keys(document, selector.clone())?;

            let pipeline = FramePipeline::new(gl, &sources, selector, &config)?;

            camera::attach_webcam(window, &video, &config.camera).await?;
            info!("[Init] Camera ready");

            Ok(Self {
                document: document.clone(),
                pipeline,
                video: WebImage::Video(video),
                masks: BlazePoseMasks::new(detector),
                frames: AnimationFrames::new(window.clone()),
            })
        }

        async fn run(mut self, stop: StopHandle) {
            let result = schedule::run(
                &mut self.pipeline,
                &self.video,
                &mut self.masks,
                &mut self.frames,
                &stop,
            )
            .await;
            if let Err(err) = result {
                error!("frame loop failed: {err}");
                show_error(&self.document, &format!("Compositor stopped: {err}"));
            }
        }
    }

    fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, InitError> {
        document
            .get_element_by_id(id)
            .ok_or_else(|| InitError::Dom(format!("#{id} not found")))?
            .dyn_into()
            .map_err(|_| InitError::Dom(format!("#{id} is not the expected element type")))
    }

    /// Replaces the page with an error message.
    fn show_error(document: &Document, message: &str) {
        let Some(body) = document.body() else {
            return;
        };
        body.set_inner_html("");
        if let Ok(div) = document.create_element("div") {
            div.set_class_name("error");
            div.set_text_content(Some(message));
            let _ = body.append_child(&div);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::render::{WebGl, WebImage};

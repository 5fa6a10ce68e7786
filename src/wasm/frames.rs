use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Window;

use super::describe;
use crate::error::PipelineError;
use crate::schedule::FrameScheduler;

/// Resolves once per `requestAnimationFrame` callback.
pub struct AnimationFrames {
    window: Window,
    // The callback is created once and re-registered every frame; the sender
    // slot is what wakes the waiting tick.
    waiting: Rc<RefCell<Option<oneshot::Sender<()>>>>,
    callback: Closure<dyn FnMut(f64)>,
}

impl AnimationFrames {
    pub fn new(window: Window) -> Self {
        let waiting: Rc<RefCell<Option<oneshot::Sender<()>>>> = Rc::new(RefCell::new(None));
        let slot = waiting.clone();
        let callback = Closure::wrap(Box::new(move |_timestamp: f64| {
            if let Some(sender) = slot.borrow_mut().take() {
                let _ = sender.send(());
            }
        }) as Box<dyn FnMut(f64)>);
        Self {
            window,
            waiting,
            callback,
        }
    }
}

impl FrameScheduler for AnimationFrames {
    async fn next_frame(&mut self) -> Result<(), PipelineError> {
        let (sender, receiver) = oneshot::channel();
        *self.waiting.borrow_mut() = Some(sender);
        self.window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
            .map_err(|err| PipelineError::Schedule(describe(&err)))?;
        receiver
            .await
            .map_err(|_| PipelineError::Schedule("animation frame callback was dropped".into()))
    }
}

use futures::channel::oneshot;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, Window};

use super::describe;
use crate::config::CameraConfig;
use crate::error::InitError;

fn camera_error(err: JsValue) -> InitError {
    InitError::Camera(describe(&err))
}

/// Opens the webcam, attaches it to `video` and waits until the stream has
/// metadata and is playing.
pub async fn attach_webcam(
    window: &Window,
    video: &HtmlVideoElement,
    config: &CameraConfig,
) -> Result<(), InitError> {
    let devices = window.navigator().media_devices().map_err(camera_error)?;

    let wanted = serde_json::json!({
        "width": { "ideal": config.ideal_width },
        "height": { "ideal": config.ideal_height },
        "facingMode": config.facing_mode,
    });
    let constraints = MediaStreamConstraints::new();
    constraints.set_video(&js_sys::JSON::parse(&wanted.to_string()).map_err(camera_error)?);

    let request = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(camera_error)?;
    let stream: MediaStream = JsFuture::from(request)
        .await
        .map_err(camera_error)?
        .dyn_into()
        .map_err(camera_error)?;

    let (loaded, metadata) = oneshot::channel();
    let on_metadata = Closure::once(move || {
        let _ = loaded.send(());
    });
    video
        .add_event_listener_with_callback("loadedmetadata", on_metadata.as_ref().unchecked_ref())
        .map_err(camera_error)?;

    video.set_muted(true);
    video.set_src_object(Some(&stream));
    metadata
        .await
        .map_err(|_| InitError::Camera("video metadata never arrived".into()))?;
    video
        .remove_event_listener_with_callback("loadedmetadata", on_metadata.as_ref().unchecked_ref())
        .map_err(camera_error)?;
    drop(on_metadata);

    JsFuture::from(video.play().map_err(camera_error)?)
        .await
        .map_err(camera_error)?;
    Ok(())
}

//! Adapter over a `@tensorflow-models/pose-detection` detector.
//!
//! The detector must be created on the JS side with `enableSegmentation: true`;
//! model setup is not this crate's concern.

use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

use super::describe;
use super::render::WebImage;
use crate::error::MaskSourceError;
use crate::mask::{Detection, MaskEstimate, MaskSource};

#[wasm_bindgen]
extern "C" {
    pub type PoseDetector;

    #[wasm_bindgen(method, catch, js_name = estimatePoses)]
    fn estimate_poses(this: &PoseDetector, image: &HtmlVideoElement) -> Result<Promise, JsValue>;
}

pub struct BlazePoseMasks {
    detector: PoseDetector,
}

impl BlazePoseMasks {
    pub fn new(detector: PoseDetector) -> Self {
        Self { detector }
    }
}

impl MaskSource<WebImage> for BlazePoseMasks {
    async fn estimate(
        &mut self,
        frame: &WebImage,
    ) -> Result<MaskEstimate<WebImage>, MaskSourceError> {
        let WebImage::Video(video) = frame else {
            return Err(MaskSourceError::Estimate(
                "the pose detector only reads video elements".into(),
            ));
        };

        let estimate_failed = |err: JsValue| MaskSourceError::Estimate(describe(&err));
        let promise = self.detector.estimate_poses(video).map_err(estimate_failed)?;
        let poses: Array = JsFuture::from(promise)
            .await
            .map_err(estimate_failed)?
            .dyn_into()
            .map_err(|_| {
                MaskSourceError::Estimate("estimatePoses did not return an array".into())
            })?;

        let people = poses.length() as usize;
        if people == 0 {
            return Ok(MaskEstimate::nobody());
        }

        // Only the first pose's mask is uploaded; the rest are never converted.
        let pose = poses.get(0);
        let mask = JsFuture::from(mask_image(&pose)?)
            .await
            .map_err(|err| MaskSourceError::Mask(describe(&err)))?;
        let mask = WebImage::from_js(mask)
            .map_err(|_| MaskSourceError::Mask("mask is not an uploadable image".into()))?;
        let score = property(&pose, "score").ok().and_then(|s| s.as_f64());

        Ok(MaskEstimate::found(
            people,
            Detection {
                score: score.map(|s| s as f32),
                mask,
            },
        ))
    }
}

/// Calls `pose.segmentation.mask.toCanvasImageSource()`.
fn mask_image(pose: &JsValue) -> Result<Promise, MaskSourceError> {
    let missing = |what: &str| {
        MaskSourceError::Mask(format!(
            "pose has no {what}; create the detector with enableSegmentation"
        ))
    };
    let segmentation = property(pose, "segmentation")?;
    if segmentation.is_undefined() || segmentation.is_null() {
        return Err(missing("segmentation"));
    }
    let mask = property(&segmentation, "mask")?;
    let convert: Function = property(&mask, "toCanvasImageSource")?
        .dyn_into()
        .map_err(|_| missing("mask.toCanvasImageSource"))?;
    convert
        .call0(&mask)
        .map_err(|err| MaskSourceError::Mask(describe(&err)))?
        .dyn_into()
        .map_err(|_| {
            MaskSourceError::Mask("toCanvasImageSource did not return a promise".into())
        })
}

fn property(target: &JsValue, name: &str) -> Result<JsValue, MaskSourceError> {
    Reflect::get(target, &JsValue::from_str(name))
        .map_err(|err| MaskSourceError::Mask(describe(&err)))
}

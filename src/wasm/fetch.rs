use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Response, Window};

use super::describe;
use crate::error::InitError;
use crate::shader::ShaderLoader;

/// Loads shader sources over HTTP, relative to the page.
pub struct FetchShaders {
    window: Window,
}

impl FetchShaders {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl ShaderLoader for FetchShaders {
    async fn load(&self, path: &str) -> Result<String, InitError> {
        let failed = |reason: String| InitError::ShaderLoad {
            path: path.to_owned(),
            reason,
        };

        let response: Response = JsFuture::from(self.window.fetch_with_str(path))
            .await
            .map_err(|err| failed(describe(&err)))?
            .dyn_into()
            .map_err(|err| failed(describe(&err)))?;
        if !response.ok() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let body = response.text().map_err(|err| failed(describe(&err)))?;
        JsFuture::from(body)
            .await
            .map_err(|err| failed(describe(&err)))?
            .as_string()
            .ok_or_else(|| failed("response body is not text".into()))
    }
}

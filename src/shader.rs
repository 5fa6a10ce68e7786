//! GLSL sources and the loaders that resolve them.

use std::path::Path;

use crate::config::ShaderConfig;
use crate::error::InitError;

pub const BASIC_VERT: &str = include_str!("shaders/basic.vert.glsl");
pub const BOOLEAN_FRAG: &str = include_str!("shaders/boolean.frag.glsl");
pub const DISPLAY_FRAG: &str = include_str!("shaders/display.frag.glsl");

/// The three sources the pipeline links into programs.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub boolean: String,
    pub display: String,
}

impl ShaderSources {
    /// Sources compiled into the binary.
    pub fn embedded() -> Self {
        Self {
            vertex: BASIC_VERT.to_owned(),
            boolean: BOOLEAN_FRAG.to_owned(),
            display: DISPLAY_FRAG.to_owned(),
        }
    }

    /// Loads all three sources concurrently; the first failure aborts the rest.
    pub async fn load<L: ShaderLoader>(
        loader: &L,
        paths: &ShaderConfig,
    ) -> Result<Self, InitError> {
        let (vertex, boolean, display) = futures::try_join!(
            loader.load(&paths.vertex),
            loader.load(&paths.boolean),
            loader.load(&paths.display),
        )?;
        Ok(Self {
            vertex,
            boolean,
            display,
        })
    }
}

/// Resolves a shader path to GLSL text.
#[allow(async_fn_in_trait)]
pub trait ShaderLoader {
    async fn load(&self, path: &str) -> Result<String, InitError>;
}

/// Serves the sources compiled into the binary, keyed by file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedShaders;

impl ShaderLoader for EmbeddedShaders {
    async fn load(&self, path: &str) -> Result<String, InitError> {
        let name = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path);
        let source = match name {
            "basic.vert.glsl" => BASIC_VERT,
            "boolean.frag.glsl" => BOOLEAN_FRAG,
            "display.frag.glsl" => DISPLAY_FRAG,
            _ => {
                return Err(InitError::ShaderLoad {
                    path: path.to_owned(),
                    reason: "no embedded shader with this name".to_owned(),
                })
            }
        };
        Ok(source.to_owned())
    }
}

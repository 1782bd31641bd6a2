use std::fmt;

use crate::backend::ShaderStage;

/// GPU objects the core creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuObject {
    Shader(ShaderStage),
    Program,
    Texture,
}

impl fmt::Display for GpuObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuObject::Shader(stage) => write!(f, "{stage} shader"),
            GpuObject::Program => f.write_str("program"),
            GpuObject::Texture => f.write_str("texture"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create {0}")]
    ObjectCreationFailed(GpuObject),
    #[error("{stage} shader failed to compile: {log}")]
    CompileFailed { stage: ShaderStage, log: String },
    #[error("program failed to link: {log}")]
    LinkFailed { log: String },
    #[error("program is missing {kind} `{name}`")]
    MissingBinding { kind: &'static str, name: &'static str },
    #[error("viewer has been destroyed")]
    Destroyed,
}

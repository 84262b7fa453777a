//! Compilation errors

use thiserror::Error;
use zext_model::ClassError;

use crate::config::ConfigError;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Class(#[from] ClassError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot compile {class}::{method}(): {message}")]
    Body {
        class: String,
        method: String,
        message: String,
    },

    #[error("Class {name} is not declared")]
    UnknownClass { name: String },
}

impl CompileError {
    /// The class model error behind this failure, if any
    pub fn as_class_error(&self) -> Option<&ClassError> {
        match self {
            CompileError::Class(err) => Some(err),
            _ => None,
        }
    }
}

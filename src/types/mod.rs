use thiserror::Error;

mod domain_types;
mod ids;

pub use domain_types::*;
pub use ids::*;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid Notion ID format: {0}")]
    InvalidId(String),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid API token format: {reason}")]
    InvalidToken { reason: String },

    #[error("Invalid property path: {path} - {reason}")]
    InvalidPropertyPath { path: String, reason: String },
}

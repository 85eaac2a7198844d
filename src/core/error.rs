use thiserror::Error;

/// Domain failures the session layer matches on. Transport and parse
/// failures travel as plain `anyhow` errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StudioError {
    #[error("no active carousel")]
    NoActiveCarousel,

    #[error("slide {0} not found")]
    SlideNotFound(u32),

    #[error("slide numbers must be unique and dense from 1, found {found:?}")]
    InvalidNumbering { found: Vec<u32> },

    #[error("a main theme is required to generate ideas")]
    EmptyTheme,

    #[error("topic and target audience are required")]
    MissingBrief,

    #[error("carousel {0} is not in the library")]
    NotInLibrary(String),

    #[error("no image data found in response")]
    NoImageData,
}

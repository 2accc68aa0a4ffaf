pub mod face;
pub mod loader;
pub mod metrics;

pub use face::Typeface;
pub use loader::{FontCache, FontKey, load_system_default_font};
pub use metrics::{FontMetrics, ScaledFontMetrics};

/// Errors that can occur while working with fonts.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("font I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid font data")]
    InvalidFont,
    #[error("no suitable system font found")]
    NoSystemFont,
}

/// Convenient result alias for font-related operations.
pub type Result<T> = std::result::Result<T, FontError>;

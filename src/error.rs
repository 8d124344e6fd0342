use thiserror::Error;
use vellum_kernel::KernelError;
use vellum_layout::LayoutError;
use vellum_style::StyleParseError;

/// Everything that can go wrong between building a document and writing it.
#[derive(Error, Debug)]
pub enum VellumError {
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("PDF error: {0}")]
    Kernel(#[from] KernelError),

    #[error("Invalid style value: {0}")]
    Style(#[from] StyleParseError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

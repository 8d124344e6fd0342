use lopdf::ObjectId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Object {0:?} has been flushed and cannot be modified.")]
    FlushedObject(ObjectId),

    #[error(
        "Graphics state is always deleted after event dispatching. If you want to preserve it in renderer info, call preserve_graphics_state after receiving renderer info."
    )]
    GraphicsStateReleased,

    #[error("font.has.no.suitable.cmap")]
    NoSuitableCmap,

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("{0} cannot be embedded due to licensing restrictions.")]
    EmbeddingNotAllowed(String),

    #[error("Tag from the existing tag structure is flushed. Cannot add copied page tags.")]
    TagStructureFlushed,

    #[error("Cannot copy flushed tag.")]
    CannotCopyFlushedTag,

    #[error("Font program error: {0}")]
    FontProgram(String),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for KernelError {
    fn from(s: &str) -> Self {
        KernelError::Other(s.to_string())
    }
}

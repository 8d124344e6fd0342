//! Reading content streams back: graphics-state tracking, marked-content
//! tags, and per-string text geometry.

mod graphics_state;
mod listener;
mod processor;
mod text_render_info;

pub use graphics_state::{decode_text_string, CanvasTag, GraphicsState};
pub use listener::{extract_page_text, EventListener, ParserEvent, SimpleTextExtractionListener};
pub use processor::PdfCanvasProcessor;
pub use text_render_info::TextRenderInfo;

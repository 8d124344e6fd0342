pub mod pagination;

pub use pagination::{draw_pages, paginate, LaidOutPage, PageGeometry};

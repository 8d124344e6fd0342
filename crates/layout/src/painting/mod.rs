pub mod border;
pub mod box_painter;

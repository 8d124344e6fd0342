pub mod background;
pub mod border;
pub mod dimension;
pub mod parsers;
pub mod position;
pub mod transform;
pub mod unit;

pub use background::Background;
pub use border::{Border, BorderStyle, Side};
pub use dimension::{Margins, PageSize};
pub use parsers::StyleParseError;
pub use position::{BaseDirection, BoxSizing, FloatProperty, HorizontalAlignment, Position};
pub use transform::{SingleTransform, Transform};
pub use unit::UnitValue;

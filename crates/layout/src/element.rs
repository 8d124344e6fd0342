//! The logical content model renderers are created from.
use crate::defaults;
use crate::property::{Action, BackgroundImage, Property, PropertyMap, PropertyValue};
use lopdf::{dictionary, Stream};
use std::cell::RefCell;
use std::rc::Rc;
use vellum_kernel::SharedFont;
use vellum_style::{
    Background, BaseDirection, Border, BoxSizing, FloatProperty, HorizontalAlignment, Position,
    Side, Transform, UnitValue,
};
use vellum_types::Color;

/// Model elements are shared by every renderer fragment created from them.
pub type ElementRef = Rc<RefCell<Element>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Div,
    Paragraph,
    Text,
    Image,
    Table,
    Cell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageColorSpace {
    Gray,
    Rgb,
}

impl ImageColorSpace {
    pub fn components(self) -> usize {
        match self {
            ImageColorSpace::Gray => 1,
            ImageColorSpace::Rgb => 3,
        }
    }

    fn pdf_name(self) -> &'static str {
        match self {
            ImageColorSpace::Gray => "DeviceGray",
            ImageColorSpace::Rgb => "DeviceRGB",
        }
    }
}

/// Raw 8-bit samples. One pixel maps to one point unless the element sets
/// its own width or height.
#[derive(Debug, Clone)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub color_space: ImageColorSpace,
    pub samples: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, color_space: ImageColorSpace, samples: Vec<u8>) -> Self {
        Self { width, height, color_space, samples }
    }

    /// A single-colour image, mostly useful as a placeholder.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let to_byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (color_space, pixel) = match color {
            Color::Gray { value } => (ImageColorSpace::Gray, vec![to_byte(value)]),
            Color::Rgb { r, g, b } => (ImageColorSpace::Rgb, vec![to_byte(r), to_byte(g), to_byte(b)]),
            Color::Cmyk { c, m, y, k } => (
                ImageColorSpace::Rgb,
                vec![
                    to_byte((1.0 - c) * (1.0 - k)),
                    to_byte((1.0 - m) * (1.0 - k)),
                    to_byte((1.0 - y) * (1.0 - k)),
                ],
            ),
        };
        let samples = pixel.repeat((width * height) as usize);
        Self { width, height, color_space, samples }
    }

    pub fn width_pt(&self) -> f32 {
        self.width as f32
    }

    pub fn height_pt(&self) -> f32 {
        self.height as f32
    }

    /// The image XObject stream.
    pub fn to_stream(&self) -> Stream {
        let expected = self.width as usize * self.height as usize * self.color_space.components();
        if self.samples.len() != expected {
            log::warn!(
                "Image has {} samples, expected {} for {}x{}",
                self.samples.len(),
                expected,
                self.width,
                self.height
            );
        }
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => self.color_space.pdf_name(),
            "BitsPerComponent" => 8,
        };
        Stream::new(dict, self.samples.clone())
    }
}

#[derive(Debug, Clone)]
pub enum ElementContent {
    None,
    Text(String),
    Image(Rc<ImageData>),
    Table { columns: usize },
}

/// A reusable bag of properties. Elements consult their styles after their
/// own properties; when several styles set the same key the last one added
/// wins.
#[derive(Debug, Clone, Default)]
pub struct Style {
    properties: PropertyMap,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(&self, property: Property) -> Option<&PropertyValue> {
        self.properties.get(&property)
    }

    pub fn has_property(&self, property: Property) -> bool {
        self.properties.contains_key(&property)
    }
}

#[derive(Debug, Clone)]
pub struct Element {
    kind: ElementKind,
    content: ElementContent,
    properties: PropertyMap,
    styles: Vec<Rc<Style>>,
    children: Vec<ElementRef>,
}

impl Element {
    fn new(kind: ElementKind, content: ElementContent) -> Self {
        Self {
            kind,
            content,
            properties: PropertyMap::new(),
            styles: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn div() -> Self {
        Self::new(ElementKind::Div, ElementContent::None)
    }

    pub fn paragraph() -> Self {
        Self::new(ElementKind::Paragraph, ElementContent::None)
    }

    /// A paragraph holding a single text run.
    pub fn paragraph_with(text: &str) -> Self {
        Self::paragraph().add(Self::text(text))
    }

    pub fn text(text: &str) -> Self {
        Self::new(ElementKind::Text, ElementContent::Text(text.to_string()))
    }

    pub fn image(data: Rc<ImageData>) -> Self {
        Self::new(ElementKind::Image, ElementContent::Image(data))
    }

    /// A table filled row by row with `columns` cells per row.
    pub fn table(columns: usize) -> Self {
        Self::new(ElementKind::Table, ElementContent::Table { columns: columns.max(1) })
    }

    pub fn cell() -> Self {
        Self::new(ElementKind::Cell, ElementContent::None)
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn content(&self) -> &ElementContent {
        &self.content
    }

    pub fn children(&self) -> &[ElementRef] {
        &self.children
    }

    pub fn add(mut self, child: Element) -> Self {
        self.children.push(child.into_ref());
        self
    }

    pub fn add_child(&mut self, child: ElementRef) {
        self.children.push(child);
    }

    pub fn add_style(mut self, style: Style) -> Self {
        self.styles.push(Rc::new(style));
        self
    }

    pub fn into_ref(self) -> ElementRef {
        Rc::new(RefCell::new(self))
    }

    // --- Properties ---

    pub fn own_property(&self, property: Property) -> Option<&PropertyValue> {
        self.properties.get(&property)
    }

    pub fn has_own_property(&self, property: Property) -> bool {
        self.properties.contains_key(&property)
    }

    /// Own value first, then the applied styles.
    pub fn property(&self, property: Property) -> Option<PropertyValue> {
        if let Some(value) = self.properties.get(&property) {
            return Some(value.clone());
        }
        self.styles
            .iter()
            .rev()
            .find_map(|style| style.property(property))
            .cloned()
    }

    pub fn has_property(&self, property: Property) -> bool {
        self.has_own_property(property) || self.styles.iter().any(|s| s.has_property(property))
    }

    pub fn delete_own_property(&mut self, property: Property) -> Option<PropertyValue> {
        self.properties.remove(&property)
    }

    pub fn default_property(&self, property: Property) -> Option<PropertyValue> {
        defaults::element_default(self.kind, property)
    }
}

/// Builder-style setters shared by elements and styles.
pub trait ElementPropertyContainer: Sized {
    fn set_property(&mut self, property: Property, value: PropertyValue);

    fn with_property(mut self, property: Property, value: PropertyValue) -> Self {
        self.set_property(property, value);
        self
    }

    // --- Box model ---

    fn set_margin(self, margin: f32) -> Self {
        self.set_margins(margin, margin, margin, margin)
    }

    fn set_margins(mut self, top: f32, right: f32, bottom: f32, left: f32) -> Self {
        for (property, value) in Property::MARGINS.into_iter().zip([top, right, bottom, left]) {
            self.set_property(property, PropertyValue::Float(value));
        }
        self
    }

    fn set_padding(self, padding: f32) -> Self {
        self.set_paddings(padding, padding, padding, padding)
    }

    fn set_paddings(mut self, top: f32, right: f32, bottom: f32, left: f32) -> Self {
        for (property, value) in Property::PADDINGS.into_iter().zip([top, right, bottom, left]) {
            self.set_property(property, PropertyValue::Float(value));
        }
        self
    }

    fn set_border(self, border: Border) -> Self {
        self.with_property(Property::Border, PropertyValue::Border(Some(border)))
    }

    /// `None` removes the border on that side even when a shorthand border is set.
    fn set_border_side(self, side: Side, border: Option<Border>) -> Self {
        self.with_property(Property::BORDERS[side.index()], PropertyValue::Border(border))
    }

    fn set_border_radius(self, radius: UnitValue) -> Self {
        self.with_property(Property::BorderRadius, PropertyValue::Unit(radius))
    }

    fn set_width(self, width: UnitValue) -> Self {
        self.with_property(Property::Width, PropertyValue::Unit(width))
    }

    fn set_min_width(self, width: UnitValue) -> Self {
        self.with_property(Property::MinWidth, PropertyValue::Unit(width))
    }

    fn set_max_width(self, width: UnitValue) -> Self {
        self.with_property(Property::MaxWidth, PropertyValue::Unit(width))
    }

    fn set_height(self, height: f32) -> Self {
        self.with_property(Property::Height, PropertyValue::Float(height))
    }

    fn set_min_height(self, height: f32) -> Self {
        self.with_property(Property::MinHeight, PropertyValue::Float(height))
    }

    fn set_max_height(self, height: f32) -> Self {
        self.with_property(Property::MaxHeight, PropertyValue::Float(height))
    }

    fn set_box_sizing(self, box_sizing: BoxSizing) -> Self {
        self.with_property(Property::BoxSizing, PropertyValue::BoxSizing(box_sizing))
    }

    // --- Background ---

    fn set_background_color(self, color: Color) -> Self {
        self.set_background(Background::new(color))
    }

    fn set_background(self, background: Background) -> Self {
        self.with_property(Property::Background, PropertyValue::Background(background))
    }

    fn set_background_image(self, image: BackgroundImage) -> Self {
        self.with_property(Property::BackgroundImage, PropertyValue::BackgroundImage(image))
    }

    // --- Positioning ---

    fn set_position(self, position: Position) -> Self {
        self.with_property(Property::Position, PropertyValue::Position(position))
    }

    fn set_top(self, top: f32) -> Self {
        self.with_property(Property::Top, PropertyValue::Float(top))
    }

    fn set_right(self, right: f32) -> Self {
        self.with_property(Property::Right, PropertyValue::Float(right))
    }

    fn set_bottom(self, bottom: f32) -> Self {
        self.with_property(Property::Bottom, PropertyValue::Float(bottom))
    }

    fn set_left(self, left: f32) -> Self {
        self.with_property(Property::Left, PropertyValue::Float(left))
    }

    /// Shifts the painted box without affecting the flow around it.
    fn set_relative_position(self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.set_position(Position::Relative)
            .set_left(left)
            .set_top(top)
            .set_right(right)
            .set_bottom(bottom)
    }

    /// Pins the element to page coordinates on the given page.
    fn set_fixed_position(self, page_number: i32, left: f32, bottom: f32, width: UnitValue) -> Self {
        self.set_position(Position::Fixed)
            .with_property(Property::PageNumber, PropertyValue::Integer(page_number))
            .set_left(left)
            .set_bottom(bottom)
            .set_width(width)
    }

    fn set_float(self, float: FloatProperty) -> Self {
        self.with_property(Property::Float, PropertyValue::FloatMode(float))
    }

    fn set_horizontal_alignment(self, alignment: HorizontalAlignment) -> Self {
        self.with_property(Property::HorizontalAlignment, PropertyValue::HorizontalAlignment(alignment))
    }

    fn set_base_direction(self, direction: BaseDirection) -> Self {
        self.with_property(Property::BaseDirection, PropertyValue::BaseDirection(direction))
    }

    // --- Painting ---

    fn set_rotation_angle(self, radians: f32) -> Self {
        self.with_property(Property::RotationAngle, PropertyValue::Float(radians))
    }

    fn set_transform(self, transform: Transform) -> Self {
        self.with_property(Property::Transform, PropertyValue::Transform(transform))
    }

    fn set_opacity(self, opacity: f32) -> Self {
        self.with_property(Property::Opacity, PropertyValue::Float(opacity))
    }

    fn set_outline(self, outline: Border, offset: f32) -> Self {
        self.with_property(Property::Outline, PropertyValue::Border(Some(outline)))
            .with_property(Property::OutlineOffset, PropertyValue::Float(offset))
    }

    fn set_keep_together(self, keep_together: bool) -> Self {
        self.with_property(Property::KeepTogether, PropertyValue::Bool(keep_together))
    }

    // --- Text ---

    fn set_font(self, font: SharedFont) -> Self {
        self.with_property(Property::Font, PropertyValue::Font(font))
    }

    fn set_font_size(self, size: f32) -> Self {
        self.with_property(Property::FontSize, PropertyValue::Float(size))
    }

    fn set_font_color(self, color: Color) -> Self {
        self.with_property(Property::FontColor, PropertyValue::Color(color))
    }

    /// Line height as a multiple of the font size.
    fn set_leading(self, multiplier: f32) -> Self {
        self.with_property(Property::Leading, PropertyValue::Float(multiplier))
    }

    // --- Links ---

    fn set_destination(self, name: &str) -> Self {
        self.with_property(Property::Destination, PropertyValue::Text(name.to_string()))
    }

    fn set_action(self, action: Action) -> Self {
        self.with_property(Property::Action, PropertyValue::Action(action))
    }
}

impl ElementPropertyContainer for Element {
    fn set_property(&mut self, property: Property, value: PropertyValue) {
        self.properties.insert(property, value);
    }
}

impl ElementPropertyContainer for Style {
    fn set_property(&mut self, property: Property, value: PropertyValue) {
        self.properties.insert(property, value);
    }
}

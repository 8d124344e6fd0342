//! Property keys and the values they carry.
use crate::element::ImageData;
use std::collections::HashMap;
use std::rc::Rc;
use vellum_kernel::SharedFont;
use vellum_style::{
    Background, BaseDirection, Border, BoxSizing, FloatProperty, HorizontalAlignment, Position,
    Transform, UnitValue,
};
use vellum_types::Color;

/// Every property a renderer or element can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Action,
    Background,
    BackgroundImage,
    BaseDirection,
    Border,
    BorderTop,
    BorderRight,
    BorderBottom,
    BorderLeft,
    BorderRadius,
    Bottom,
    BoxSizing,
    Destination,
    Float,
    Font,
    FontColor,
    FontSize,
    Height,
    HorizontalAlignment,
    KeepTogether,
    Leading,
    Left,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    MaxHeight,
    MaxWidth,
    MinHeight,
    MinWidth,
    Opacity,
    Outline,
    OutlineOffset,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    PageNumber,
    Position,
    Right,
    RotationAngle,
    Top,
    Transform,
    Width,
}

impl Property {
    pub const MARGINS: [Property; 4] = [
        Property::MarginTop,
        Property::MarginRight,
        Property::MarginBottom,
        Property::MarginLeft,
    ];

    pub const PADDINGS: [Property; 4] = [
        Property::PaddingTop,
        Property::PaddingRight,
        Property::PaddingBottom,
        Property::PaddingLeft,
    ];

    pub const BORDERS: [Property; 4] = [
        Property::BorderTop,
        Property::BorderRight,
        Property::BorderBottom,
        Property::BorderLeft,
    ];

    /// Whether a renderer falls back to its parent's value when neither it
    /// nor its model element set this property.
    pub fn is_inherited(self) -> bool {
        matches!(
            self,
            Property::BaseDirection
                | Property::Font
                | Property::FontColor
                | Property::FontSize
                | Property::Leading
        )
    }
}

/// Target of a link annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Uri(String),
    /// Jump to a named destination.
    GoTo(String),
}

#[derive(Debug, Clone)]
pub struct BackgroundImage {
    pub image: Rc<ImageData>,
    pub repeat_x: bool,
    pub repeat_y: bool,
}

impl BackgroundImage {
    pub fn new(image: Rc<ImageData>) -> Self {
        Self { image, repeat_x: true, repeat_y: true }
    }

    pub fn no_repeat(image: Rc<ImageData>) -> Self {
        Self { image, repeat_x: false, repeat_y: false }
    }
}

#[derive(Debug, Clone)]
pub enum PropertyValue {
    Float(f32),
    Integer(i32),
    Bool(bool),
    Unit(UnitValue),
    Color(Color),
    /// `None` is an explicit "no border", which still shadows the shorthand.
    Border(Option<Border>),
    Background(Background),
    BackgroundImage(BackgroundImage),
    Position(Position),
    BoxSizing(BoxSizing),
    BaseDirection(BaseDirection),
    FloatMode(FloatProperty),
    HorizontalAlignment(HorizontalAlignment),
    Transform(Transform),
    Font(SharedFont),
    Text(String),
    Action(Action),
}

impl PropertyValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Float(v) => Some(*v),
            PropertyValue::Integer(v) => Some(*v as f32),
            PropertyValue::Unit(UnitValue::Point(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i32> {
        match self {
            PropertyValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<UnitValue> {
        match self {
            PropertyValue::Unit(v) => Some(*v),
            PropertyValue::Float(v) => Some(UnitValue::Point(*v)),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_border(&self) -> Option<Border> {
        match self {
            PropertyValue::Border(b) => b.clone(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

pub type PropertyMap = HashMap<Property, PropertyValue>;

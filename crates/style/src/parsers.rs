//! Low-level nom parser functions for CSS-like style values.
//!
//! These are the building blocks used when a `Style` is populated from
//! `name: value` declarations: lengths, unit values, colours, borders and
//! the positioning keywords.

use crate::border::{Border, BorderStyle};
use crate::dimension::Margins;
use crate::position::{BoxSizing, FloatProperty, Position};
use crate::unit::UnitValue;
use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while_m_n};
use nom::character::complete::{char, multispace0, multispace1};
use nom::combinator::{map, map_res, opt, value};
use nom::multi::separated_list1;
use nom::number::complete::float;
use nom::sequence::{delimited, preceded};
use nom::{IResult, Parser};
use thiserror::Error;
use vellum_types::Color;

/// Errors that can occur during style parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleParseError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value for '{property}': {value}")]
    InvalidValue { property: String, value: String },
}

type Error<'a> = nom::error::Error<&'a str>;

// --- Helper Parsers ---

fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = Error<'a>>
where
    F: Parser<&'a str, Output = O, Error = Error<'a>>,
{
    delimited(multispace0, inner, multispace0)
}

fn number(input: &str) -> IResult<&str, f32> {
    float(input)
}

// --- Unit & Length Parsers ---

fn parse_unit(input: &str) -> IResult<&str, f32> {
    alt((
        value(1.0, tag_no_case("pt")),
        value(1.0, tag_no_case("px")), // Treat px as pt
        value(72.0, tag_no_case("in")),
        value(28.35, tag_no_case("cm")),
        value(2.835, tag_no_case("mm")),
    ))
    .parse(input)
}

/// Parses a length value with optional unit (e.g., "12pt", "1in", "10mm").
pub fn parse_length(input: &str) -> IResult<&str, f32> {
    let (input, value) = number(input)?;
    let (input, unit_multiplier) = opt(parse_unit).parse(input)?;
    Ok((input, value * unit_multiplier.unwrap_or(1.0)))
}

/// Parses a point or percent value (e.g., "12pt", "50%").
pub fn parse_unit_value(input: &str) -> IResult<&str, UnitValue> {
    alt((
        map((number, char('%')), |(v, _)| UnitValue::Percent(v)),
        map(parse_length, UnitValue::Point),
    ))
    .parse(input)
}

/// Parses CSS shorthand margins (1, 2, 3 or 4 values).
pub fn parse_shorthand_margins(input: &str) -> Result<Margins, StyleParseError> {
    let parts = match separated_list1(multispace1, parse_length).parse(input.trim()) {
        Ok(("", parts)) => parts,
        _ => {
            return Err(StyleParseError::Parse(format!(
                "Failed to parse margins value: '{}'",
                input
            )));
        }
    };
    match parts.as_slice() {
        [all] => Ok(Margins::all(*all)),
        [v, h] => Ok(Margins::new(*v, *h, *v, *h)),
        [t, h, b] => Ok(Margins::new(*t, *h, *b, *h)),
        [t, r, b, l] => Ok(Margins::new(*t, *r, *b, *l)),
        _ => Err(StyleParseError::Parse(format!(
            "Invalid number of values for margin/padding shorthand: got {}, expected 1 to 4.",
            parts.len()
        ))),
    }
}

// --- Color & Border Parsers ---

fn hex_color(input: &str) -> IResult<&str, Color> {
    map_res(
        preceded(char('#'), take_while_m_n(3, 6, |c: char| c.is_ascii_hexdigit())),
        |hex: &str| Color::parse_hex(&format!("#{}", hex)),
    )
    .parse(input)
}

fn named_color(input: &str) -> IResult<&str, Color> {
    alt((
        value(Color::BLACK, tag_no_case("black")),
        value(Color::WHITE, tag_no_case("white")),
        value(Color::rgb(255, 0, 0), tag_no_case("red")),
        value(Color::rgb(0, 128, 0), tag_no_case("green")),
        value(Color::rgb(0, 0, 255), tag_no_case("blue")),
        value(Color::gray(0.5), tag_no_case("gray")),
    ))
    .parse(input)
}

/// Parses a hex color ("#FF0000", "#F00") or a basic colour keyword.
pub fn parse_color(input: &str) -> IResult<&str, Color> {
    alt((hex_color, named_color)).parse(input)
}

/// Parses a border style keyword.
pub fn parse_border_style(input: &str) -> IResult<&str, BorderStyle> {
    alt((
        value(BorderStyle::Solid, tag_no_case("solid")),
        value(BorderStyle::Dashed, tag_no_case("dashed")),
        value(BorderStyle::Dotted, tag_no_case("dotted")),
        value(BorderStyle::Double, tag_no_case("double")),
    ))
    .parse(input)
}

/// Parses a CSS border shorthand (e.g., "2pt solid #00ff00"). Style and
/// colour are optional and default to solid black.
pub fn parse_border(input: &str) -> IResult<&str, Border> {
    map(
        (ws(parse_length), opt(ws(parse_border_style)), opt(ws(parse_color))),
        |(width, style, color)| {
            Border::new(width, style.unwrap_or_default(), color.unwrap_or_default())
        },
    )
    .parse(input)
}

/// Helper to run a nom parser and convert its result to a `Result<T, StyleParseError>`.
pub fn run_parser<'a, T, F>(mut parser: F, input: &'a str) -> Result<T, StyleParseError>
where
    F: Parser<&'a str, Output = T, Error = Error<'a>>,
{
    match parser.parse(input.trim()) {
        Ok(("", result)) => Ok(result),
        Ok((rem, _)) => Err(StyleParseError::Parse(format!(
            "Parser did not consume all input. Remainder: '{}'",
            rem
        ))),
        Err(e) => Err(StyleParseError::Parse(e.to_string())),
    }
}

// --- Keyword Parsers ---

pub fn parse_position(s: &str) -> Result<Position, StyleParseError> {
    match s.trim().to_lowercase().as_str() {
        "static" => Ok(Position::Static),
        "relative" => Ok(Position::Relative),
        "absolute" => Ok(Position::Absolute),
        "fixed" => Ok(Position::Fixed),
        _ => Err(StyleParseError::InvalidValue {
            property: "position".to_string(),
            value: s.to_string(),
        }),
    }
}

pub fn parse_box_sizing(s: &str) -> Result<BoxSizing, StyleParseError> {
    match s.trim().to_lowercase().as_str() {
        "content-box" => Ok(BoxSizing::ContentBox),
        "border-box" => Ok(BoxSizing::BorderBox),
        _ => Err(StyleParseError::InvalidValue {
            property: "box-sizing".to_string(),
            value: s.to_string(),
        }),
    }
}

pub fn parse_float(s: &str) -> Result<FloatProperty, StyleParseError> {
    match s.trim().to_lowercase().as_str() {
        "none" => Ok(FloatProperty::None),
        "left" => Ok(FloatProperty::Left),
        "right" => Ok(FloatProperty::Right),
        _ => Err(StyleParseError::InvalidValue {
            property: "float".to_string(),
            value: s.to_string(),
        }),
    }
}

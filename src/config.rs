use crate::error::VellumError;
use serde::{Deserialize, Serialize};
use vellum_layout::LayoutConfig;
use vellum_style::{Margins, PageSize};
use vellum_types::Rectangle;

/// Page setup and engine settings for a [`crate::Document`].
///
/// Every field has a default, so a JSON object only needs the keys it
/// changes:
///
/// ```
/// let config = vellum::DocumentConfig::from_json(r#"{ "page_size": "Letter", "margins": "36pt" }"#).unwrap();
/// assert_eq!(config.margins.left, 36.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Defaults to A4.
    pub page_size: PageSize,

    /// Space between the page edge and the content area.
    ///
    /// Defaults to 36pt on every side.
    pub margins: Margins,

    /// Written to the file header. Defaults to `"1.7"`.
    pub pdf_version: String,

    /// Creates a structure tree root so the output is a tagged PDF.
    pub tagged: bool,

    /// Written to the document information dictionary when set.
    pub title: Option<String>,

    pub layout: LayoutConfig,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margins: Margins::all(36.0),
            pdf_version: "1.7".to_string(),
            tagged: false,
            title: None,
            layout: LayoutConfig::default(),
        }
    }
}

impl DocumentConfig {
    pub fn from_json(json: &str) -> Result<Self, VellumError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The full page, origin at the bottom-left corner.
    pub fn page_rect(&self) -> Rectangle {
        let (width, height) = self.page_size.dimensions_pt();
        Rectangle::new(0.0, 0.0, width, height)
    }

    /// The page minus its margins.
    pub fn content_rect(&self) -> Rectangle {
        let mut content = self.page_rect();
        content.apply_sides(self.margins.as_array(), false);
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_an_a4_page() {
        let config = DocumentConfig::default();
        assert_eq!(config.page_rect(), Rectangle::new(0.0, 0.0, 595.0, 842.0));
        assert_eq!(config.content_rect(), Rectangle::new(36.0, 36.0, 523.0, 770.0));
    }

    #[test]
    fn json_overrides_only_what_it_names() {
        let config = DocumentConfig::from_json(
            r#"{
                "page_size": { "width": 300, "height": 400 },
                "margins": { "top": 10, "bottom": 20 },
                "layout": { "max_pages": 5 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.page_rect(), Rectangle::new(0.0, 0.0, 300.0, 400.0));
        assert_eq!(config.content_rect(), Rectangle::new(0.0, 20.0, 300.0, 370.0));
        assert_eq!(config.layout.max_pages, 5);
        assert_eq!(config.layout.bezier_curvature, 0.4477);
        assert_eq!(config.pdf_version, "1.7");
    }

    #[test]
    fn unknown_page_size_is_rejected() {
        assert!(matches!(
            DocumentConfig::from_json(r#"{ "page_size": "B5" }"#),
            Err(VellumError::Config(_))
        ));
    }
}

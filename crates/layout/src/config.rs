use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Control point factor for the cubic curves approximating rounded
    /// border corners.
    ///
    /// Defaults to `0.4477`.
    pub bezier_curvature: f32,

    /// Tolerance used when comparing layout dimensions.
    ///
    /// Defaults to `1e-4`.
    pub epsilon: f32,

    /// Height used as "unbounded" when laying out positioned renderers, so
    /// that their result does not depend on where the parent sits on the page.
    ///
    /// Defaults to `1e6`.
    pub infinity: f32,

    /// The maximum number of pages pagination will produce before it gives
    /// up on the remaining content.
    ///
    /// Defaults to `10000`.
    pub max_pages: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            bezier_curvature: 0.4477,
            epsilon: 1e-4,
            infinity: 1e6,
            max_pages: 10000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: LayoutConfig = serde_json::from_str(r#"{ "max_pages": 3 }"#).unwrap();
        assert_eq!(config.max_pages, 3);
        assert_eq!(config.bezier_curvature, 0.4477);
        assert_eq!(config.infinity, 1e6);
    }
}

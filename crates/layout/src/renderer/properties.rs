//! Property resolution: own value, then the model element (own and style
//! values), then the parent for inheritable keys, then the renderer's and
//! finally the element's default table.
use super::{RendererId, RendererTree};
use crate::defaults;
use crate::property::{Property, PropertyValue};
use vellum_kernel::SharedFont;
use vellum_style::{Border, Transform, UnitValue};

impl RendererTree {
    pub fn get_property(&self, id: RendererId, property: Property) -> Option<PropertyValue> {
        let node = &self.nodes[id];
        if let Some(value) = node.properties.get(&property) {
            return Some(value.clone());
        }
        if let Some(model) = &node.model {
            if let Some(value) = model.borrow().property(property) {
                return Some(value);
            }
        }
        if property.is_inherited() {
            if let Some(value) = node.parent.and_then(|parent| self.get_property(parent, property)) {
                return Some(value);
            }
        }
        if let Some(value) = defaults::renderer_default(node.kind, property) {
            return Some(value);
        }
        node.model
            .as_ref()
            .and_then(|model| model.borrow().default_property(property))
    }

    pub fn get_own_property(&self, id: RendererId, property: Property) -> Option<&PropertyValue> {
        self.nodes[id].properties.get(&property)
    }

    /// True exactly when [`Self::get_property`] resolves to a value.
    pub fn has_property(&self, id: RendererId, property: Property) -> bool {
        self.get_property(id, property).is_some()
    }

    pub fn has_own_property(&self, id: RendererId, property: Property) -> bool {
        self.nodes[id].properties.contains_key(&property)
    }

    /// Set on this renderer or directly on its model element (styles and
    /// defaults do not count).
    pub fn has_own_or_model_property(&self, id: RendererId, property: Property) -> bool {
        let node = &self.nodes[id];
        node.properties.contains_key(&property)
            || node
                .model
                .as_ref()
                .is_some_and(|model| model.borrow().has_own_property(property))
    }

    pub fn set_property(&mut self, id: RendererId, property: Property, value: PropertyValue) {
        self.nodes[id].properties.insert(property, value);
    }

    pub fn delete_own_property(&mut self, id: RendererId, property: Property) {
        self.nodes[id].properties.remove(&property);
    }

    /// Removes the renderer's own value, or the model element's own value
    /// when the renderer has none.
    pub fn delete_property(&mut self, id: RendererId, property: Property) {
        let node = &mut self.nodes[id];
        if node.properties.remove(&property).is_none() {
            if let Some(model) = &node.model {
                model.borrow_mut().delete_own_property(property);
            }
        }
    }

    // --- Typed access ---

    pub fn property_as_float(&self, id: RendererId, property: Property) -> Option<f32> {
        self.get_property(id, property).and_then(|v| v.as_float())
    }

    pub fn property_as_float_or(&self, id: RendererId, property: Property, default: f32) -> f32 {
        self.property_as_float(id, property).unwrap_or(default)
    }

    pub fn property_as_bool(&self, id: RendererId, property: Property) -> Option<bool> {
        self.get_property(id, property).and_then(|v| v.as_bool())
    }

    pub fn property_as_unit(&self, id: RendererId, property: Property) -> Option<UnitValue> {
        self.get_property(id, property).and_then(|v| v.as_unit())
    }

    pub fn property_as_border(&self, id: RendererId, property: Property) -> Option<Border> {
        self.get_property(id, property).and_then(|v| v.as_border())
    }

    pub fn property_as_transform(&self, id: RendererId) -> Option<Transform> {
        match self.get_property(id, Property::Transform) {
            Some(PropertyValue::Transform(transform)) => Some(transform),
            _ => None,
        }
    }

    /// The resolved font; the default table guarantees one for any renderer
    /// with a model element or a root ancestor.
    pub fn property_as_font(&self, id: RendererId) -> SharedFont {
        match self.get_property(id, Property::Font) {
            Some(PropertyValue::Font(font)) => font,
            _ => defaults::default_font(),
        }
    }
}

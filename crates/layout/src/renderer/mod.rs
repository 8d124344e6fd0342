//! The renderer tree.
//!
//! Renderers live in an arena owned by [`RendererTree`] and refer to each
//! other by [`RendererId`]. Parent links are plain indices, so moving a
//! positioned renderer to another container is a matter of updating two
//! lists. Behaviour is split by concern across the sibling modules, each
//! adding an `impl RendererTree` block.
mod bbox;
mod box_model;
mod draw;
mod positioning;
mod properties;

pub use draw::DrawContext;

use crate::config::LayoutConfig;
use crate::element::{ElementContent, ElementKind, ElementRef, ImageData};
use crate::property::PropertyMap;
use crate::LayoutError;
use lopdf::ObjectId;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use vellum_types::Rectangle;

pub type RendererId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
    Root,
    Block,
    Paragraph,
    Text,
    Image,
    Table,
    Cell,
}

impl RendererKind {
    pub fn for_element(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Div => RendererKind::Block,
            ElementKind::Paragraph => RendererKind::Paragraph,
            ElementKind::Text => RendererKind::Text,
            ElementKind::Image => RendererKind::Image,
            ElementKind::Table => RendererKind::Table,
            ElementKind::Cell => RendererKind::Cell,
        }
    }

    /// Kinds laid out as a stack of blocks. These honour rotation.
    pub fn is_block(self) -> bool {
        matches!(self, RendererKind::Block | RendererKind::Paragraph | RendererKind::Cell)
    }

    /// Kinds whose transform property is applied when drawing.
    pub fn is_transformable(self) -> bool {
        self.is_block() || matches!(self, RendererKind::Image | RendererKind::Table)
    }
}

/// A rectangle on a page: the space offered to a renderer, or the space it
/// claimed once laid out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutArea {
    pub page_number: usize,
    pub bbox: Rectangle,
}

impl LayoutArea {
    pub fn new(page_number: usize, bbox: Rectangle) -> Self {
        Self { page_number, bbox }
    }
}

#[derive(Debug, Clone)]
pub enum RendererContent {
    None,
    Text(String),
    Image(Rc<ImageData>),
    Table { columns: usize },
}

impl From<&ElementContent> for RendererContent {
    fn from(content: &ElementContent) -> Self {
        match content {
            ElementContent::None => RendererContent::None,
            ElementContent::Text(text) => RendererContent::Text(text.clone()),
            ElementContent::Image(image) => RendererContent::Image(image.clone()),
            ElementContent::Table { columns } => RendererContent::Table { columns: *columns },
        }
    }
}

#[derive(Debug, Clone)]
pub struct RendererNode {
    pub(crate) kind: RendererKind,
    pub(crate) parent: Option<RendererId>,
    pub(crate) children: Vec<RendererId>,
    pub(crate) positioned: Vec<RendererId>,
    /// Text fragments placed by paragraph layout, in reading order.
    pub(crate) lines: Vec<RendererId>,
    pub(crate) properties: PropertyMap,
    pub(crate) model: Option<ElementRef>,
    pub(crate) content: RendererContent,
    pub(crate) occupied_area: Option<LayoutArea>,
    pub(crate) flushed: bool,
    pub(crate) is_last_for_model: bool,
    /// Baseline of a placed text fragment.
    pub(crate) y_line: Option<f32>,
}

impl RendererNode {
    fn new(kind: RendererKind, model: Option<ElementRef>) -> Self {
        let content = match &model {
            Some(element) => RendererContent::from(element.borrow().content()),
            None => RendererContent::None,
        };
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            positioned: Vec::new(),
            lines: Vec::new(),
            properties: PropertyMap::new(),
            model,
            content,
            occupied_area: None,
            flushed: false,
            is_last_for_model: true,
            y_line: None,
        }
    }

    pub fn kind(&self) -> RendererKind {
        self.kind
    }

    pub fn parent(&self) -> Option<RendererId> {
        self.parent
    }

    pub fn children(&self) -> &[RendererId] {
        &self.children
    }

    pub fn positioned_children(&self) -> &[RendererId] {
        &self.positioned
    }

    pub fn lines(&self) -> &[RendererId] {
        &self.lines
    }

    pub fn model(&self) -> Option<&ElementRef> {
        self.model.as_ref()
    }

    pub fn content(&self) -> &RendererContent {
        &self.content
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            RendererContent::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn occupied_area(&self) -> Option<&LayoutArea> {
        self.occupied_area.as_ref()
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Whether this is the final fragment of its model element.
    pub fn is_last_renderer_for_model_element(&self) -> bool {
        self.is_last_for_model
    }
}

#[derive(Debug)]
pub struct RendererTree {
    nodes: Vec<RendererNode>,
    config: LayoutConfig,
    /// Whether nothing has been placed yet on the root's current page.
    pub(crate) root_area_empty: bool,
    image_xobjects: HashMap<usize, ObjectId>,
    /// For absolute renderers owned by the root: the index of the root child
    /// they were added with, or after.
    flow_anchors: HashMap<RendererId, usize>,
    /// Named destinations already written. A name set through a style
    /// survives deletion, so every fragment would otherwise register it.
    pub(crate) registered_destinations: HashSet<String>,
}

impl Default for RendererTree {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl RendererTree {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            nodes: Vec::new(),
            config,
            root_area_empty: true,
            image_xobjects: HashMap::new(),
            flow_anchors: HashMap::new(),
            registered_destinations: HashSet::new(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Panics on an id that did not come from this tree.
    pub fn node(&self, id: RendererId) -> &RendererNode {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: RendererId) -> &mut RendererNode {
        &mut self.nodes[id]
    }

    // --- Construction ---

    pub fn create_root(&mut self) -> RendererId {
        self.push_node(RendererNode::new(RendererKind::Root, None))
    }

    pub fn create_renderer(&mut self, kind: RendererKind, model: Option<ElementRef>) -> RendererId {
        self.push_node(RendererNode::new(kind, model))
    }

    fn push_node(&mut self, node: RendererNode) -> RendererId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Creates renderers for `element` and its descendants. Each renderer is
    /// attached to its parent before its own children are created, so
    /// positioned descendants see the complete ancestor chain. A text run
    /// outside a paragraph gets an anonymous paragraph around it.
    pub fn create_renderer_subtree(&mut self, element: &ElementRef, parent: Option<RendererId>) -> RendererId {
        let kind = RendererKind::for_element(element.borrow().kind());
        let parent = match parent {
            Some(p) if kind == RendererKind::Text && self.nodes[p].kind != RendererKind::Paragraph => {
                let wrapper = self.create_renderer(RendererKind::Paragraph, None);
                self.add_child(p, wrapper);
                Some(wrapper)
            }
            other => other,
        };

        let id = self.create_renderer(kind, Some(element.clone()));
        if let Some(parent) = parent {
            self.add_child(parent, id);
        }
        let children = element.borrow().children().to_vec();
        if kind != RendererKind::Image {
            for child in &children {
                self.create_renderer_subtree(child, Some(id));
            }
        }
        id
    }

    /// A detached copy of `id` sharing its model element, own properties
    /// and content, without children or layout results.
    pub(crate) fn copy_renderer(&mut self, id: RendererId) -> RendererId {
        let source = &self.nodes[id];
        let mut copy = RendererNode::new(source.kind, source.model.clone());
        copy.parent = source.parent;
        copy.properties = source.properties.clone();
        copy.content = source.content.clone();
        copy.is_last_for_model = source.is_last_for_model;
        self.push_node(copy)
    }

    pub(crate) fn set_children(&mut self, id: RendererId, children: Vec<RendererId>) {
        for child in &children {
            self.nodes[*child].parent = Some(id);
        }
        self.nodes[id].children = children;
    }

    // --- Traversal ---

    pub fn parent(&self, id: RendererId) -> Option<RendererId> {
        self.nodes[id].parent
    }

    /// The topmost ancestor of `id`, or `id` itself when it has no parent.
    pub fn root_of(&self, id: RendererId) -> RendererId {
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            current = parent;
        }
        current
    }

    /// Children in drawing order: placed text fragments for paragraphs, the
    /// child list for everything else.
    pub fn laid_out_children(&self, id: RendererId) -> &[RendererId] {
        let node = &self.nodes[id];
        match node.kind {
            RendererKind::Paragraph => &node.lines,
            _ => &node.children,
        }
    }

    /// Shifts a laid-out renderer together with everything placed inside it.
    pub fn move_renderer(&mut self, id: RendererId, dx: f32, dy: f32) -> Result<(), LayoutError> {
        let node = &mut self.nodes[id];
        let area = node.occupied_area.as_mut().ok_or(LayoutError::MissingOccupiedArea(id))?;
        area.bbox.move_right(dx).move_up(dy);
        if let Some(y) = node.y_line.as_mut() {
            *y += dy;
        }
        let mut nested = self.laid_out_children(id).to_vec();
        nested.extend_from_slice(&self.nodes[id].positioned);
        for child in nested {
            self.move_renderer(child, dx, dy)?;
        }
        Ok(())
    }

    /// Baseline of the first line inside `id`, following only first children.
    pub fn first_y_line(&self, id: RendererId) -> Option<f32> {
        let node = &self.nodes[id];
        match node.kind {
            RendererKind::Text => node.y_line,
            RendererKind::Image => None,
            _ => self
                .laid_out_children(id)
                .first()
                .and_then(|child| self.first_y_line(*child)),
        }
    }

    /// Baseline of the last line inside `id`. Children without text are
    /// skipped.
    pub fn last_y_line(&self, id: RendererId) -> Option<f32> {
        let node = &self.nodes[id];
        match node.kind {
            RendererKind::Text => node.y_line,
            RendererKind::Image => None,
            _ => self
                .laid_out_children(id)
                .iter()
                .rev()
                .find_map(|child| self.last_y_line(*child)),
        }
    }

    /// Position in the root's normal flow of an absolute renderer the root
    /// owns.
    pub fn flow_anchor(&self, id: RendererId) -> Option<usize> {
        self.flow_anchors.get(&id).copied()
    }

    pub(crate) fn set_flow_anchor(&mut self, id: RendererId, index: usize) {
        self.flow_anchors.insert(id, index);
    }

    pub(crate) fn cached_image_xobject(&self, image: &Rc<ImageData>) -> Option<ObjectId> {
        self.image_xobjects.get(&(Rc::as_ptr(image) as usize)).copied()
    }

    pub(crate) fn cache_image_xobject(&mut self, image: &Rc<ImageData>, id: ObjectId) {
        self.image_xobjects.insert(Rc::as_ptr(image) as usize, id);
    }
}

//! The drawing pass: turns laid-out renderers into content-stream operators
//! on a page canvas.
use super::{LayoutArea, RendererContent, RendererId, RendererKind, RendererTree};
use crate::element::ImageData;
use crate::painting::border::{draw_border_side, draw_rounded_border_side, SideGeometry};
use crate::painting::box_painter::{
    clip_border_band, clip_rounded_box, fill_background, tile_background_image, RoundedCorners,
};
use crate::property::{Action, Property, PropertyValue};
use crate::LayoutError;
use log::{error, warn};
use lopdf::{dictionary, Dictionary, Object, ObjectId};
use std::rc::Rc;
use vellum_kernel::{PdfCanvas, PdfDocument};
use vellum_style::{Border, FloatProperty, Side};
use vellum_types::{Color, Rectangle};

/// Everything a renderer needs to draw itself onto one page.
pub struct DrawContext<'a> {
    pub document: &'a mut PdfDocument,
    pub canvas: &'a mut PdfCanvas,
    pub page_id: ObjectId,
    /// Floating and transformed boxes deferred until the page's normal
    /// content is drawn. `None` when drawing without a root, in which case
    /// each parent draws its own deferred children last.
    pub waiting: Option<Vec<RendererId>>,
}

impl<'a> DrawContext<'a> {
    pub fn new(document: &'a mut PdfDocument, canvas: &'a mut PdfCanvas, page_id: ObjectId) -> Self {
        Self { document, canvas, page_id, waiting: None }
    }

    /// A context that collects deferred boxes for [`RendererTree::draw_waiting`].
    pub fn with_root_waiting_list(mut self) -> Self {
        self.waiting = Some(Vec::new());
        self
    }
}

impl RendererTree {
    /// Draws `id` and everything inside it. A renderer draws once; a second
    /// call fails with [`LayoutError::RendererFlushed`].
    pub fn draw(&mut self, id: RendererId, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        if self.nodes[id].flushed {
            return Err(LayoutError::RendererFlushed(id));
        }
        self.occupied_area_bbox(id)?;

        self.apply_destinations_and_annotation(id, ctx)?;

        let relative = self.is_relative(id);
        if relative {
            self.apply_relative_positioning_translation(id, false)?;
        }
        let opacity = self.begin_element_opacity_applying(id, ctx);
        let transformations = self.begin_transformation_if_applied(id, ctx)?;

        self.draw_background(id, ctx)?;
        self.draw_border(id, ctx)?;
        self.draw_content(id, ctx)?;
        self.draw_children(id, ctx)?;
        self.draw_positioned_children(id, ctx)?;

        for _ in 0..transformations {
            ctx.canvas.restore_state();
        }
        if opacity {
            ctx.canvas.restore_state();
        }
        if relative {
            self.apply_relative_positioning_translation(id, true)?;
        }

        self.nodes[id].flushed = true;
        Ok(())
    }

    /// Draws the boxes deferred while drawing the page, including any that
    /// get deferred along the way.
    pub fn draw_waiting(&mut self, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        loop {
            let pending = match ctx.waiting.as_mut() {
                Some(list) if !list.is_empty() => std::mem::take(list),
                _ => return Ok(()),
            };
            for id in pending {
                self.draw(id, ctx)?;
            }
        }
    }

    // --- Links and destinations ---

    fn apply_destinations_and_annotation(&mut self, id: RendererId, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        if let Some(PropertyValue::Text(name)) = self.get_property(id, Property::Destination) {
            let bbox = self.occupied_area_bbox(id)?;
            if self.registered_destinations.insert(name.clone()) {
                ctx.document.add_named_destination(&name, ctx.page_id, bbox.x, bbox.top());
            }
            self.delete_property(id, Property::Destination);
        }

        if let Some(PropertyValue::Action(action)) = self.get_property(id, Property::Action) {
            let border_width = self
                .property_as_border(id, Property::Border)
                .map_or(0.0, |border| border.width);
            let rect = self.calculate_absolute_pdf_bbox(id)?;
            let annotation = link_annotation(&action, rect, border_width);
            ctx.document.add_annotation(ctx.page_id, annotation)?;
        }
        Ok(())
    }

    // --- Graphics state ---

    fn begin_element_opacity_applying(&self, id: RendererId, ctx: &mut DrawContext<'_>) -> bool {
        match self.property_as_float(id, Property::Opacity) {
            Some(opacity) if opacity < 1.0 => {
                let gstate = ctx.document.ext_gstate_for_opacity(opacity);
                ctx.canvas.save_state().set_ext_gstate(gstate);
                true
            }
            _ => false,
        }
    }

    /// Pushes rotation and transform matrices, returning how many graphics
    /// states the caller must restore.
    fn begin_transformation_if_applied(&self, id: RendererId, ctx: &mut DrawContext<'_>) -> Result<usize, LayoutError> {
        let kind = self.nodes[id].kind;
        let mut saved = 0;
        if kind.is_block() {
            if let Some(rotation) = self.create_rotation_transform_inside_occupied_area(id)? {
                ctx.canvas.save_state().concat_matrix(rotation.to_array());
                saved += 1;
            }
        }
        if kind.is_transformable() {
            if let Some(transform) = self.create_transformation_inside_occupied_area(id)? {
                ctx.canvas.save_state().concat_matrix(transform.to_array());
                saved += 1;
            }
        }
        Ok(saved)
    }

    fn transparency_state(ctx: &mut DrawContext<'_>, opacity: f32) -> Option<ObjectId> {
        (opacity < 1.0).then(|| ctx.document.ext_gstate_for_opacity(opacity))
    }

    /// The border radius in points. Percentages are not supported.
    fn border_radius(&self, id: RendererId) -> f32 {
        match self.property_as_unit(id, Property::BorderRadius) {
            Some(radius) if radius.is_percent_value() => {
                error!("Property border-radius in percents is not supported");
                0.0
            }
            Some(radius) => radius.value(),
            None => 0.0,
        }
    }

    // --- Background ---

    pub fn draw_background(&mut self, id: RendererId, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        let background = match self.get_property(id, Property::Background) {
            Some(PropertyValue::Background(background)) => Some(background),
            _ => None,
        };
        let background_image = match self.get_property(id, Property::BackgroundImage) {
            Some(PropertyValue::BackgroundImage(image)) => Some(image),
            _ => None,
        };
        if background.is_none() && background_image.is_none() {
            return Ok(());
        }

        let mut area = self.occupied_area_bbox(id)?;
        self.apply_margins(id, &mut area, false);
        if area.width <= 0.0 || area.height <= 0.0 {
            warn!("Rectangle has negative or zero sizes. It will not be displayed: background");
            return Ok(());
        }

        let radius = self.border_radius(id);
        let curvature = self.config.bezier_curvature;
        let mut clipped = false;

        if let Some(background) = &background {
            if radius != 0.0 {
                clip_rounded_box(ctx.canvas, &RoundedCorners::new(&area, radius), curvature);
                clipped = true;
            }
            let gstate = Self::transparency_state(ctx, background.opacity);
            fill_background(ctx.canvas, &area, background, gstate);
        }

        if let Some(background_image) = &background_image {
            if !clipped && radius != 0.0 {
                clip_rounded_box(ctx.canvas, &RoundedCorners::new(&area, radius), curvature);
                clipped = true;
            }
            let image = &background_image.image;
            let tile = (image.width_pt(), image.height_pt());
            if tile.0 <= 0.0 || tile.1 <= 0.0 {
                warn!("Rectangle has negative or zero sizes. It will not be displayed: background-image");
            } else {
                let mut inner = area;
                self.apply_border_box(id, &mut inner, false);
                let xobject = self.image_xobject(image, ctx);
                tile_background_image(
                    ctx.canvas,
                    xobject,
                    tile,
                    (inner.x, inner.top()),
                    &area,
                    background_image.repeat_x,
                    background_image.repeat_y,
                );
            }
        }

        if clipped {
            ctx.canvas.restore_state();
        }
        Ok(())
    }

    fn image_xobject(&mut self, image: &Rc<ImageData>, ctx: &mut DrawContext<'_>) -> ObjectId {
        if let Some(id) = self.cached_image_xobject(image) {
            return id;
        }
        let id = ctx.document.add_object(image.to_stream());
        self.cache_image_xobject(image, id);
        id
    }

    // --- Border ---

    pub fn draw_border(&mut self, id: RendererId, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        let borders = self.borders(id);
        if borders.iter().all(Option::is_none) {
            return Ok(());
        }
        let [top_width, right_width, bottom_width, left_width] = self.border_widths(id);

        let bbox = self.border_area_bbox(id)?;
        if bbox.width < 0.0 || bbox.height < 0.0 {
            error!("Rectangle has negative size. It will not be displayed: border");
            return Ok(());
        }
        let (x1, y1) = (bbox.x, bbox.y);
        let (x2, y2) = (bbox.right(), bbox.top());

        let radius = self.border_radius(id);
        let curvature = self.config.bezier_curvature;
        if radius != 0.0 {
            let mut outer = self.occupied_area_bbox(id)?;
            self.apply_margins(id, &mut outer, false);
            let corners = RoundedCorners::new(&outer, radius);
            clip_rounded_box(ctx.canvas, &corners, curvature);
            clip_border_band(ctx.canvas, &corners, [top_width, right_width, bottom_width, left_width], curvature);
        }

        let sides = [
            SideGeometry { x1, y1: y2, x2, y2, side: Side::Top, before: left_width, after: right_width },
            SideGeometry { x1: x2, y1: y2, x2, y2: y1, side: Side::Right, before: top_width, after: bottom_width },
            SideGeometry { x1: x2, y1, x2: x1, y2: y1, side: Side::Bottom, before: right_width, after: left_width },
            SideGeometry { x1, y1, x2: x1, y2, side: Side::Left, before: bottom_width, after: top_width },
        ];
        for (border, geometry) in borders.iter().zip(sides.iter()) {
            let Some(border) = border else { continue };
            let gstate = Self::transparency_state(ctx, border.opacity);
            if radius == 0.0 {
                draw_border_side(ctx.canvas, border, geometry, gstate);
            } else {
                draw_rounded_border_side(ctx.canvas, border, geometry, gstate);
            }
        }

        if radius != 0.0 {
            ctx.canvas.restore_state();
        }
        Ok(())
    }

    // --- Own content ---

    fn draw_content(&mut self, id: RendererId, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        match (self.nodes[id].kind, self.nodes[id].content.clone()) {
            (RendererKind::Text, RendererContent::Text(text)) => self.draw_text(id, &text, ctx),
            (RendererKind::Image, RendererContent::Image(image)) => self.draw_image(id, &image, ctx),
            _ => Ok(()),
        }
    }

    fn draw_text(&self, id: RendererId, text: &str, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        let Some(baseline) = self.nodes[id].y_line else {
            return Ok(());
        };
        if text.is_empty() {
            return Ok(());
        }
        let bbox = self.occupied_area_bbox(id)?;
        let font = self.property_as_font(id);
        let size = self.property_as_float_or(id, Property::FontSize, crate::defaults::DEFAULT_FONT_SIZE);
        let color = self
            .get_property(id, Property::FontColor)
            .and_then(|v| v.as_color())
            .unwrap_or(Color::BLACK);
        let bytes = font.convert_to_bytes(text);
        let handle = ctx.document.register_font(font);

        ctx.canvas
            .save_state()
            .set_fill_color(&color)
            .begin_text()
            .set_font_and_size(&handle, size)
            .move_text(bbox.x, baseline)
            .show_text(bytes)
            .end_text()
            .restore_state();
        Ok(())
    }

    fn draw_image(&mut self, id: RendererId, image: &Rc<ImageData>, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        let area = self.inner_area_bbox(id)?;
        if area.width <= 0.0 || area.height <= 0.0 {
            warn!("Rectangle has negative or zero sizes. It will not be displayed: image");
            return Ok(());
        }
        let xobject = self.image_xobject(image, ctx);
        ctx.canvas.add_xobject(xobject, &area);
        Ok(())
    }

    // --- Children ---

    fn is_floating(&self, id: RendererId) -> bool {
        let floating = matches!(
            self.get_property(id, Property::Float),
            Some(PropertyValue::FloatMode(FloatProperty::Left | FloatProperty::Right))
        );
        floating && !self.is_absolute(id) && !self.is_fixed(id)
    }

    pub fn draw_children(&mut self, id: RendererId, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        let children = self.laid_out_children(id).to_vec();
        self.draw_renderers(&children, ctx)
    }

    /// Draws `renderers` in order, deferring floating and transformed ones
    /// (and the outline boxes of outlined ones) until after the rest. With a
    /// root waiting list the deferred boxes wait for
    /// [`RendererTree::draw_waiting`]; without one they are drawn last here.
    pub fn draw_renderers(&mut self, renderers: &[RendererId], ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        let mut local_waiting = Vec::new();
        for child in renderers.iter().copied() {
            let transform = self.property_as_transform(child);
            let floating = self.is_floating(child);

            let mut deferred = Vec::new();
            self.process_waiting_drawing(child, &mut deferred)?;
            match ctx.waiting.as_mut() {
                Some(root_waiting) => {
                    for waiting in deferred {
                        if !root_waiting.contains(&waiting) {
                            root_waiting.push(waiting);
                        }
                    }
                }
                None => local_waiting.extend(deferred),
            }

            if !floating && transform.is_none() {
                self.draw(child, ctx)?;
            }
        }
        for waiting in local_waiting {
            self.draw(waiting, ctx)?;
        }
        Ok(())
    }

    fn process_waiting_drawing(&mut self, child: RendererId, waiting: &mut Vec<RendererId>) -> Result<(), LayoutError> {
        let transform = self.property_as_transform(child);
        if self.is_floating(child) || transform.is_some() {
            waiting.push(child);
        }
        let Some(outline) = self.property_as_border(child, Property::Outline) else {
            return Ok(());
        };

        let relative = self.is_relative(child);
        if relative {
            self.apply_relative_positioning_translation(child, false)?;
        }
        let offset = outline.width + self.property_as_float_or(child, Property::OutlineOffset, 0.0);
        let page_number = self.nodes[child].occupied_area.map_or(1, |area| area.page_number);
        let mut bbox = self.occupied_area_bbox(child)?;
        self.apply_margins(child, &mut bbox, false);
        bbox.move_left(offset).move_down(offset);
        let (width, height) = (bbox.width + 2.0 * offset, bbox.height + 2.0 * offset);
        bbox.set_width(width).set_height(height);

        if width >= outline.width * 2.0 && height >= outline.width * 2.0 {
            let outline_box = self.create_outline_renderer(outline, transform, LayoutArea::new(page_number, bbox));
            waiting.push(outline_box);
        }
        if relative {
            self.apply_relative_positioning_translation(child, true)?;
        }
        Ok(())
    }

    fn create_outline_renderer(
        &mut self,
        outline: Border,
        transform: Option<vellum_style::Transform>,
        area: LayoutArea,
    ) -> RendererId {
        let id = self.create_renderer(RendererKind::Block, None);
        self.set_property(id, Property::Border, PropertyValue::Border(Some(outline)));
        if let Some(transform) = transform {
            self.set_property(id, Property::Transform, PropertyValue::Transform(transform));
        }
        self.nodes[id].occupied_area = Some(area);
        id
    }

    pub fn draw_positioned_children(&mut self, id: RendererId, ctx: &mut DrawContext<'_>) -> Result<(), LayoutError> {
        let positioned = self.nodes[id].positioned.clone();
        for child in positioned {
            if self.nodes[child].occupied_area.is_some() && !self.nodes[child].flushed {
                self.draw(child, ctx)?;
            }
        }
        Ok(())
    }
}

fn link_annotation(action: &Action, rect: Rectangle, border_width: f32) -> Dictionary {
    let action: Dictionary = match action {
        Action::Uri(uri) => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(uri.as_str()),
        },
        Action::GoTo(name) => dictionary! {
            "S" => "GoTo",
            "D" => Object::string_literal(name.as_str()),
        },
    };
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![rect.left().into(), rect.bottom().into(), rect.right().into(), rect.top().into()],
        "Border" => vec![Object::Integer(0), Object::Integer(0), border_width.into()],
        "F" => Object::Integer(4),
        "A" => action,
    }
}

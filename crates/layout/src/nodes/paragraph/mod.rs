//! Paragraph layout: text runs are broken into words, wrapped greedily into
//! line boxes and stacked like block children. Non-text children of a
//! paragraph interrupt the current line and are laid out as blocks.
use crate::interface::{LayoutContext, LayoutResult, LayoutStatus};
use crate::property::Property;
use crate::renderer::{LayoutArea, RendererContent, RendererId, RendererKind, RendererTree};
use crate::defaults::{DEFAULT_FONT_SIZE, DEFAULT_LEADING};
use crate::LayoutError;
use vellum_types::Rectangle;

/// One word of a text run, measured in its run's font.
#[derive(Debug, Clone)]
struct Token {
    source: RendererId,
    word: String,
    /// Whitespace separated this word from the previous one.
    space_before: bool,
    width: f32,
    space_width: f32,
    font_size: f32,
    ascent: f32,
    descent: f32,
}

#[derive(Debug, Clone, Default)]
struct LineBox {
    tokens: Vec<Token>,
    width: f32,
}

impl LineBox {
    fn advance(&self, token: &Token) -> f32 {
        if self.tokens.is_empty() || !token.space_before {
            token.width
        } else {
            token.space_width + token.width
        }
    }

    fn push(&mut self, token: Token) {
        self.width += self.advance(&token);
        self.tokens.push(token);
    }

    fn height(&self, leading: f32) -> f32 {
        self.tokens.iter().map(|t| t.font_size).fold(0.0, f32::max) * leading
    }

    fn ascent(&self) -> f32 {
        self.tokens.iter().map(|t| t.ascent).fold(0.0, f32::max)
    }

    fn descent(&self) -> f32 {
        self.tokens.iter().map(|t| t.descent).fold(0.0, f32::min)
    }
}

#[derive(Debug, Clone)]
enum ParagraphItem {
    Line(LineBox),
    Block(RendererId),
}

impl RendererTree {
    pub(crate) fn layout_paragraph(
        &mut self,
        id: RendererId,
        ctx: &LayoutContext,
    ) -> Result<LayoutResult, LayoutError> {
        let frame = self.begin_container_layout(id, ctx);
        if self.box_edges_do_not_fit(id, &frame) {
            return Ok(LayoutResult::nothing(id, id));
        }
        let content = frame.content_box;
        let leading = self.property_as_float_or(id, Property::Leading, DEFAULT_LEADING);
        let items = self.paragraph_items(id, content.width);
        let epsilon = self.config().epsilon;

        let mut cursor = content.top();
        let mut placed = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match item {
                ParagraphItem::Line(line) => {
                    let height = line.height(leading);
                    if cursor - height < content.bottom() - epsilon {
                        if frame.height_clipped {
                            return self.finish_clipped(id, &frame, ctx, placed);
                        }
                        if placed.is_empty() {
                            return Ok(LayoutResult::nothing(id, id));
                        }
                        let rest = self.paragraph_rest(&items[index..], None);
                        return self.finish_partial(id, &frame, ctx, placed, rest, Some(id));
                    }
                    let mut fragments = self.place_line(line, content.x, cursor, height, frame.page);
                    placed.append(&mut fragments);
                    cursor -= height;
                    self.extend_occupied_area(id, &Rectangle::new(content.x, cursor, line.width, height));
                }
                ParagraphItem::Block(child) => {
                    let area = Rectangle::new(content.x, content.bottom(), content.width, cursor - content.bottom());
                    let result = self.layout(*child, &LayoutContext::new(LayoutArea::new(frame.page, area)))?;
                    match result.status {
                        LayoutStatus::Full => {
                            let fragment = result.split.unwrap_or(*child);
                            placed.push(fragment);
                            if let Some(occupied) = result.occupied_area {
                                if !self.is_absolute(*child) {
                                    self.extend_occupied_area(id, &occupied.bbox);
                                    cursor = occupied.bbox.y;
                                    self.align_child_horizontally(fragment, area);
                                }
                            }
                        }
                        LayoutStatus::Partial => {
                            if let Some(occupied) = result.occupied_area {
                                self.extend_occupied_area(id, &occupied.bbox);
                            }
                            placed.extend(result.split);
                            if frame.height_clipped {
                                return self.finish_clipped(id, &frame, ctx, placed);
                            }
                            let rest = self.paragraph_rest(&items[index + 1..], result.overflow);
                            return self.finish_partial(id, &frame, ctx, placed, rest, result.cause);
                        }
                        LayoutStatus::Nothing => {
                            if frame.height_clipped {
                                return self.finish_clipped(id, &frame, ctx, placed);
                            }
                            let cause = result.cause.unwrap_or(*child);
                            if placed.is_empty() {
                                return Ok(LayoutResult::nothing(id, cause));
                            }
                            let first = result.overflow.unwrap_or(*child);
                            let rest = self.paragraph_rest(&items[index + 1..], Some(first));
                            return self.finish_partial(id, &frame, ctx, placed, rest, Some(cause));
                        }
                    }
                }
            }
        }

        self.finish_full(id, &frame, ctx, placed)
    }

    /// Breaks the children of `id` into line boxes no wider than
    /// `max_width`. A single word wider than that gets a line of its own.
    fn paragraph_items(&self, id: RendererId, max_width: f32) -> Vec<ParagraphItem> {
        let epsilon = self.config().epsilon;
        let mut items = Vec::new();
        let mut line = LineBox::default();
        let mut pending_space = false;

        for child in self.node(id).children().to_vec() {
            if self.node(child).kind() != RendererKind::Text {
                if !line.tokens.is_empty() {
                    items.push(ParagraphItem::Line(std::mem::take(&mut line)));
                }
                items.push(ParagraphItem::Block(child));
                pending_space = false;
                continue;
            }
            for token in self.tokenize(child, &mut pending_space) {
                if !line.tokens.is_empty() && line.width + line.advance(&token) > max_width + epsilon {
                    items.push(ParagraphItem::Line(std::mem::take(&mut line)));
                }
                line.push(token);
            }
        }
        if !line.tokens.is_empty() {
            items.push(ParagraphItem::Line(line));
        }
        items
    }

    /// Splits a text run into measured words. `pending_space` carries
    /// trailing whitespace over to the next run.
    fn tokenize(&self, text_id: RendererId, pending_space: &mut bool) -> Vec<Token> {
        let Some(text) = self.node(text_id).text() else {
            return Vec::new();
        };
        let mut words = Vec::new();
        let mut word = String::new();
        let mut gap = *pending_space;
        for ch in text.chars() {
            if ch.is_whitespace() {
                if !word.is_empty() {
                    words.push((std::mem::take(&mut word), gap));
                }
                gap = true;
            } else {
                word.push(ch);
            }
        }
        if !word.is_empty() {
            words.push((word, gap));
            gap = false;
        }
        *pending_space = gap;

        let font = self.property_as_font(text_id);
        let font_size = self.property_as_float_or(text_id, Property::FontSize, DEFAULT_FONT_SIZE);
        let space_width = font.width_point(" ", font_size);
        let ascent = font.ascent() * font_size / 1000.0;
        let descent = font.descent() * font_size / 1000.0;
        words
            .into_iter()
            .map(|(word, space_before)| Token {
                source: text_id,
                width: font.width_point(&word, font_size),
                word,
                space_before,
                space_width,
                font_size,
                ascent,
                descent,
            })
            .collect()
    }

    /// Creates a text fragment per run of consecutive words from the same
    /// source, sharing the line's baseline.
    fn place_line(&mut self, line: &LineBox, x: f32, top: f32, height: f32, page: usize) -> Vec<RendererId> {
        let ascent = line.ascent();
        let baseline = top - (height - (ascent - line.descent())) / 2.0 - ascent;
        let bottom = top - height;

        let mut runs: Vec<(RendererId, String, f32, f32)> = Vec::new();
        let mut offset = 0.0;
        for (index, token) in line.tokens.iter().enumerate() {
            let gap = if index > 0 && token.space_before { token.space_width } else { 0.0 };
            let same_source = runs.last().is_some_and(|run| run.0 == token.source);
            match runs.last_mut() {
                Some((_, text, _, width)) if same_source => {
                    if token.space_before {
                        text.push(' ');
                    }
                    text.push_str(&token.word);
                    *width += gap + token.width;
                }
                _ => {}
            }
            if !same_source {
                runs.push((token.source, token.word.clone(), x + offset + gap, token.width));
            }
            offset += gap + token.width;
        }

        runs.into_iter()
            .map(|(source, text, left, width)| {
                let fragment = self.copy_renderer(source);
                let node = self.node_mut(fragment);
                node.content = RendererContent::Text(text);
                node.occupied_area = Some(LayoutArea::new(page, Rectangle::new(left, bottom, width, height)));
                node.y_line = Some(baseline);
                fragment
            })
            .collect()
    }

    /// Turns the items that did not fit back into children for the overflow
    /// paragraph. Words from one source are rejoined into a single text run.
    fn paragraph_rest(&mut self, items: &[ParagraphItem], first: Option<RendererId>) -> Vec<RendererId> {
        let mut rest: Vec<RendererId> = first.into_iter().collect();
        let mut open: Option<(RendererId, RendererId)> = None;
        for item in items {
            match item {
                ParagraphItem::Block(child) => {
                    rest.push(*child);
                    open = None;
                }
                ParagraphItem::Line(line) => {
                    for token in &line.tokens {
                        let separator = if token.space_before && !rest.is_empty() { " " } else { "" };
                        match open {
                            Some((source, run)) if source == token.source => {
                                if let RendererContent::Text(text) = &mut self.node_mut(run).content {
                                    text.push_str(separator);
                                    text.push_str(&token.word);
                                }
                            }
                            _ => {
                                let run = self.copy_renderer(token.source);
                                self.node_mut(run).content = RendererContent::Text(format!("{separator}{}", token.word));
                                rest.push(run);
                                open = Some((token.source, run));
                            }
                        }
                    }
                }
            }
        }
        rest
    }

    pub(crate) fn text_min_max_width(&self, id: RendererId) -> (f32, f32) {
        let Some(text) = self.node(id).text() else {
            return (0.0, 0.0);
        };
        let font = self.property_as_font(id);
        let font_size = self.property_as_float_or(id, Property::FontSize, DEFAULT_FONT_SIZE);
        let min = text
            .split_whitespace()
            .map(|word| font.width_point(word, font_size))
            .fold(0.0, f32::max);
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        (min, font.width_point(&collapsed, font_size))
    }

    /// Text runs sit side by side on one line at most; other children stack.
    pub(crate) fn paragraph_min_max_width(&self, id: RendererId) -> (f32, f32) {
        let (mut min, mut max, mut run) = (0.0f32, 0.0f32, 0.0f32);
        for child in self.node(id).children() {
            if self.node(*child).kind() == RendererKind::Text {
                let (child_min, child_max) = self.text_min_max_width(*child);
                min = min.max(child_min);
                run += child_max;
            } else {
                let widths = self.min_max_width(*child);
                min = min.max(widths.min_width);
                max = max.max(widths.max_width).max(run);
                run = 0.0;
            }
        }
        (min, max.max(run))
    }
}

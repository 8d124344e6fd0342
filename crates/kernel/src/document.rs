//! The document wrapper: page tree, flush-once bookkeeping and the shared
//! resources (fonts, ExtGStates, destinations) pages point to.

use crate::copier::ObjectCopier;
use crate::font::SharedFont;
use crate::{tagging, KernelError};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Write;
use std::rc::Rc;
use vellum_types::Rectangle;

/// A font registered with a document, addressed by a document-wide
/// resource name.
#[derive(Debug, Clone)]
pub struct FontHandle {
    pub resource_name: String,
    pub id: ObjectId,
}

/// A PDF document under construction or loaded for modification.
///
/// Objects may be flushed once; after that, [`PdfDocument::object_mut`]
/// refuses to hand them out.
pub struct PdfDocument {
    inner: Document,
    catalog_id: ObjectId,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    flushed: HashSet<ObjectId>,
    ext_gstates: HashMap<u32, ObjectId>,
    fonts: Vec<(SharedFont, FontHandle)>,
    named_dests: BTreeMap<String, Object>,
    tagged: bool,
    next_struct_parent: i64,
    finished: bool,
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("pages", &self.page_ids.len())
            .field("objects", &self.inner.objects.len())
            .field("flushed", &self.flushed.len())
            .field("tagged", &self.tagged)
            .finish()
    }
}

impl PdfDocument {
    /// Creates an empty document with a catalog and an empty page tree.
    pub fn new(version: &str) -> Self {
        let mut inner = Document::with_version(version);
        let pages_id = inner.new_object_id();
        inner.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);
        Self {
            inner,
            catalog_id,
            pages_id,
            page_ids: Vec::new(),
            flushed: HashSet::new(),
            ext_gstates: HashMap::new(),
            fonts: Vec::new(),
            named_dests: BTreeMap::new(),
            tagged: false,
            next_struct_parent: 0,
            finished: false,
        }
    }

    /// Wraps an already parsed document.
    pub fn from_lopdf(inner: Document) -> Result<Self, KernelError> {
        let catalog_id = inner.trailer.get(b"Root")?.as_reference()?;
        let pages_id = inner.get_dictionary(catalog_id)?.get(b"Pages")?.as_reference()?;
        let page_ids: Vec<ObjectId> = inner.get_pages().into_values().collect();
        let tagged = inner.get_dictionary(catalog_id)?.has(b"StructTreeRoot");
        let mut doc = Self {
            inner,
            catalog_id,
            pages_id,
            page_ids,
            flushed: HashSet::new(),
            ext_gstates: HashMap::new(),
            fonts: Vec::new(),
            named_dests: BTreeMap::new(),
            tagged,
            next_struct_parent: 0,
            finished: false,
        };
        doc.next_struct_parent = doc.max_struct_parent() + 1;
        Ok(doc)
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self, KernelError> {
        Self::from_lopdf(Document::load_mem(bytes)?)
    }

    pub fn lopdf(&self) -> &Document {
        &self.inner
    }

    pub fn catalog_id(&self) -> ObjectId {
        self.catalog_id
    }

    // --- Objects ---

    pub fn add_object<T: Into<Object>>(&mut self, object: T) -> ObjectId {
        self.inner.add_object(object)
    }

    pub fn new_object_id(&mut self) -> ObjectId {
        self.inner.new_object_id()
    }

    pub fn object(&self, id: ObjectId) -> Result<&Object, KernelError> {
        Ok(self.inner.get_object(id)?)
    }

    pub fn dictionary(&self, id: ObjectId) -> Result<&Dictionary, KernelError> {
        Ok(self.inner.get_dictionary(id)?)
    }

    /// Mutable access for structural changes. Fails for flushed objects.
    pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object, KernelError> {
        if self.flushed.contains(&id) {
            return Err(KernelError::FlushedObject(id));
        }
        Ok(self.inner.get_object_mut(id)?)
    }

    pub fn dictionary_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary, KernelError> {
        Ok(self.object_mut(id)?.as_dict_mut()?)
    }

    /// Replaces the object stored under `id`.
    pub fn set_object<T: Into<Object>>(&mut self, id: ObjectId, object: T) -> Result<(), KernelError> {
        if self.flushed.contains(&id) {
            return Err(KernelError::FlushedObject(id));
        }
        self.inner.objects.insert(id, object.into());
        Ok(())
    }

    /// Drops an object that is no longer referenced.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<Object> {
        if self.flushed.contains(&id) {
            log::warn!("Refusing to remove flushed object {:?}", id);
            return None;
        }
        self.inner.objects.remove(&id)
    }

    /// Marks an object as written. Returns false if it already was.
    pub fn flush(&mut self, id: ObjectId) -> bool {
        let newly = self.flushed.insert(id);
        if !newly {
            log::debug!("Object {:?} was already flushed", id);
        }
        newly
    }

    pub fn is_flushed(&self, id: ObjectId) -> bool {
        self.flushed.contains(&id)
    }

    // --- Pages ---

    /// Appends a page with the given media box size and an empty resource
    /// dictionary.
    pub fn add_page(&mut self, width: f32, height: f32) -> Result<ObjectId, KernelError> {
        let page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => Dictionary::new(),
        });
        self.page_ids.push(page_id);
        self.sync_page_tree()?;
        Ok(page_id)
    }

    fn sync_page_tree(&mut self) -> Result<(), KernelError> {
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let count = self.page_ids.len() as i64;
        let pages = self.dictionary_mut(self.pages_id)?;
        pages.set("Kids", kids);
        pages.set("Count", count);
        let pages_id = self.pages_id;
        for page_id in self.page_ids.clone() {
            if self.flushed.contains(&page_id) {
                continue;
            }
            let page = self.dictionary_mut(page_id)?;
            if page.get(b"Parent").and_then(Object::as_reference).ok() != Some(pages_id) {
                page.set("Parent", pages_id);
            }
        }
        Ok(())
    }

    /// Copies pages (1-based numbers) of this document into `dest`, in
    /// front of page `insert_before` or at the end. When `dest` is tagged
    /// the structure of the copied pages comes along. Returns the new page
    /// ids in order.
    pub fn copy_pages_to(
        &self,
        dest: &mut PdfDocument,
        page_numbers: &[usize],
        insert_before: Option<usize>,
    ) -> Result<Vec<ObjectId>, KernelError> {
        let source_pages = page_numbers
            .iter()
            .map(|n| {
                self.page_id(*n)
                    .ok_or_else(|| KernelError::Other(format!("Page {} does not exist", n)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let insert_before = insert_before.filter(|n| (1..=dest.page_count()).contains(n));
        let insert_index = match insert_before {
            Some(n) if dest.tagged => Some(tagging::split_structure_tree(dest, n)?),
            _ => None,
        };
        let dest_root = if dest.tagged { dest.struct_tree_root() } else { None };

        let page_map = {
            let mut copier = ObjectCopier::new(&self.inner, &mut dest.inner);
            // Pages drag in their parent; point it at the destination tree.
            copier.map(self.pages_id, dest.pages_id);
            let mut page_map = Vec::with_capacity(source_pages.len());
            for page_id in &source_pages {
                let copied = copier.copy_object_ignoring(*page_id, &[b"Parent", b"StructParents"])?;
                page_map.push((*page_id, copied));
            }
            if let Some(root) = dest_root {
                tagging::copy_structure(
                    &mut copier,
                    self,
                    root,
                    &page_map,
                    insert_index,
                    &mut dest.next_struct_parent,
                )?;
            }
            page_map
        };

        let new_pages: Vec<ObjectId> = page_map.iter().map(|(_, copied)| *copied).collect();
        let position = insert_before.map_or(dest.page_ids.len(), |n| n - 1);
        dest.page_ids.splice(position..position, new_pages.iter().copied());
        dest.sync_page_tree()?;
        log::debug!("Copied {} pages into position {}", new_pages.len(), position + 1);
        Ok(new_pages)
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    /// The page with the given 1-based number.
    pub fn page_id(&self, page_number: usize) -> Option<ObjectId> {
        page_number.checked_sub(1).and_then(|i| self.page_ids.get(i)).copied()
    }

    /// 1-based number of a page.
    pub fn page_number(&self, page_id: ObjectId) -> Option<usize> {
        self.page_ids.iter().position(|id| *id == page_id).map(|i| i + 1)
    }

    pub fn page_size(&self, page_id: ObjectId) -> Result<Rectangle, KernelError> {
        let media_box = self.dictionary(page_id)?.get(b"MediaBox")?.as_array()?;
        let values: Vec<f32> = media_box.iter().filter_map(|o| o.as_float().ok()).collect();
        match values.as_slice() {
            [llx, lly, urx, ury] => Ok(Rectangle::new(*llx, *lly, urx - llx, ury - lly)),
            _ => Err(KernelError::Other(format!("Malformed MediaBox on page {:?}", page_id))),
        }
    }

    // --- Shared resources ---

    /// An ExtGState setting both stroke and fill alpha, shared between all
    /// uses of the same opacity.
    pub fn ext_gstate_for_opacity(&mut self, opacity: f32) -> ObjectId {
        let key = opacity.to_bits();
        if let Some(id) = self.ext_gstates.get(&key) {
            return *id;
        }
        let id = self.inner.add_object(dictionary! {
            "Type" => "ExtGState",
            "CA" => opacity,
            "ca" => opacity,
        });
        self.ext_gstates.insert(key, id);
        id
    }

    /// Registers a font; the font dictionary is written by [`Self::finish`].
    /// Registering the same font twice returns the existing handle.
    pub fn register_font(&mut self, font: SharedFont) -> FontHandle {
        if let Some((_, handle)) = self.fonts.iter().find(|(f, _)| Rc::ptr_eq(f, &font)) {
            return handle.clone();
        }
        let handle = FontHandle {
            resource_name: format!("F{}", self.fonts.len() + 1),
            id: self.inner.new_object_id(),
        };
        self.fonts.push((font, handle.clone()));
        handle
    }

    /// The registered font behind a document-wide resource name.
    pub fn font_by_resource_name(&self, name: &str) -> Option<SharedFont> {
        self.fonts
            .iter()
            .find(|(_, h)| h.resource_name == name)
            .map(|(f, _)| f.clone())
    }

    pub fn font_by_id(&self, id: ObjectId) -> Option<SharedFont> {
        self.fonts.iter().find(|(_, h)| h.id == id).map(|(f, _)| f.clone())
    }

    /// Adds a named destination pointing at `top` on a page.
    pub fn add_named_destination(&mut self, name: &str, page_id: ObjectId, left: f32, top: f32) {
        let dest = vec![
            Object::Reference(page_id),
            "XYZ".into(),
            left.into(),
            top.into(),
            Object::Integer(0),
        ];
        self.named_dests.insert(name.to_string(), Object::Array(dest));
    }

    pub fn named_destinations(&self) -> &BTreeMap<String, Object> {
        &self.named_dests
    }

    /// Appends an annotation to the page's `/Annots` array.
    pub fn add_annotation(&mut self, page_id: ObjectId, mut annotation: Dictionary) -> Result<ObjectId, KernelError> {
        annotation.set("P", page_id);
        if self.tagged {
            let index = self.next_struct_parent_index();
            annotation.set("StructParent", index);
        }
        let annot_id = self.inner.add_object(annotation);
        let page = self.dictionary_mut(page_id)?;
        let mut annots = match page.get(b"Annots") {
            Ok(Object::Array(existing)) => existing.clone(),
            _ => Vec::new(),
        };
        annots.push(Object::Reference(annot_id));
        page.set("Annots", annots);
        Ok(annot_id)
    }

    // --- Tagging ---

    pub fn is_tagged(&self) -> bool {
        self.tagged
    }

    /// Marks the document as tagged and creates the structure tree root.
    pub fn set_tagged(&mut self) -> Result<ObjectId, KernelError> {
        self.tagged = true;
        if let Some(root) = self.struct_tree_root() {
            return Ok(root);
        }
        let root = self.inner.add_object(dictionary! {
            "Type" => "StructTreeRoot",
            "K" => Vec::<Object>::new(),
        });
        let catalog = self.dictionary_mut(self.catalog_id)?;
        catalog.set("StructTreeRoot", root);
        catalog.set("MarkInfo", dictionary! { "Marked" => true });
        Ok(root)
    }

    pub fn struct_tree_root(&self) -> Option<ObjectId> {
        self.inner
            .get_dictionary(self.catalog_id)
            .ok()?
            .get(b"StructTreeRoot")
            .ok()?
            .as_reference()
            .ok()
    }

    /// The next free `/StructParent(s)` index.
    pub fn next_struct_parent_index(&mut self) -> i64 {
        let index = self.next_struct_parent;
        self.next_struct_parent += 1;
        index
    }

    fn max_struct_parent(&self) -> i64 {
        self.inner
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .filter_map(|d| {
                d.get(b"StructParent")
                    .or_else(|_| d.get(b"StructParents"))
                    .and_then(Object::as_i64)
                    .ok()
            })
            .max()
            .unwrap_or(-1)
    }

    // --- Output ---

    /// Writes registered fonts and named destinations. Runs once; later
    /// calls do nothing.
    pub fn finish(&mut self) -> Result<(), KernelError> {
        if self.finished {
            return Ok(());
        }
        for (font, handle) in &self.fonts {
            font.flush(&mut self.inner, handle.id)?;
            self.flushed.insert(handle.id);
        }
        if !self.named_dests.is_empty() {
            let mut dests = Dictionary::new();
            for (name, dest) in &self.named_dests {
                dests.set(name.as_bytes().to_vec(), dest.clone());
            }
            let dests_id = self.inner.add_object(dests);
            self.dictionary_mut(self.catalog_id)?.set("Dests", dests_id);
        }
        self.finished = true;
        log::debug!(
            "Finished document with {} pages and {} fonts",
            self.page_ids.len(),
            self.fonts.len()
        );
        Ok(())
    }

    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<(), KernelError> {
        self.finish()?;
        self.inner.save_to(writer).map_err(|e| KernelError::Other(e.to_string()))
    }

    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>, KernelError> {
        let mut buffer = Vec::new();
        self.save_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Sets a document-information entry such as `Title` or `Producer`.
    pub fn set_info(&mut self, key: &str, value: &str) {
        let info_id = match self.inner.trailer.get(b"Info").and_then(Object::as_reference) {
            Ok(id) => id,
            Err(_) => {
                let id = self.inner.add_object(Dictionary::new());
                self.inner.trailer.set("Info", id);
                id
            }
        };
        if let Ok(info) = self.inner.get_dictionary_mut(info_id) {
            info.set(key, Object::String(value.as_bytes().to_vec(), StringFormat::Literal));
        }
    }
}

//! Structure-tree copying for page insertion and cross-document page copies.

use super::{
    add_all_parents, broken_tree, clone_without, kids, mcr_of, page_marked_content_references,
    parent_of, push_kid, struct_elem_id, struct_tree_root, IGNORE_KEYS_FOR_CLONE, IGNORE_KEYS_FOR_COPY,
};
use crate::copier::ObjectCopier;
use crate::document::PdfDocument;
use crate::KernelError;
use lopdf::{Dictionary, Object, ObjectId};
use std::collections::{HashMap, HashSet};

/// The clone chain currently receiving second-part kids.
struct LastClonedAncestor {
    ancestor: ObjectId,
    clone: ObjectId,
}

/// Struct elements and pages belonging to the first part of a split.
struct FirstPart {
    elems: HashSet<ObjectId>,
    pages: HashSet<ObjectId>,
}

impl FirstPart {
    fn contains_leaf(&self, doc: &PdfDocument, parent: ObjectId, kid: &Object) -> bool {
        mcr_of(doc.lopdf(), parent, kid)
            .and_then(|mcr| mcr.page)
            .is_some_and(|page| self.pages.contains(&page))
    }
}

/// Prepares the structure tree of `doc` for pages inserted before page
/// `insert_before_page`.
///
/// Struct elements whose content lies on both sides of the insertion point
/// are split: content before it stays on the original element, content
/// after it moves to a clone of the element (and of its ancestors up to the
/// top). Cloned tops are placed right after the last top-level element of
/// the first part. Returns the `/K` index of the root where structure for
/// the inserted pages belongs.
pub fn split_structure_tree(doc: &mut PdfDocument, insert_before_page: usize) -> Result<usize, KernelError> {
    let Some(root) = doc.struct_tree_root() else {
        return Ok(0);
    };

    let mut first = FirstPart { elems: HashSet::new(), pages: HashSet::new() };
    for page_number in 1..insert_before_page {
        let Some(page) = doc.page_id(page_number) else {
            break;
        };
        first.pages.insert(page);
        for mcr in page_marked_content_references(doc.lopdf(), page) {
            first.elems.insert(mcr.parent);
            let top = add_all_parents(doc.lopdf(), mcr.parent, &mut first.elems, |id| doc.is_flushed(id));
            if doc.is_flushed(top) {
                return Err(KernelError::TagStructureFlushed);
            }
        }
    }

    let tops = kids(doc.lopdf(), root);
    let mut cloned_tops = Vec::new();
    let mut last_top_before = None;
    for (i, top) in tops.iter().enumerate() {
        let Some(top_id) = struct_elem_id(doc.lopdf(), top) else {
            continue;
        };
        if !first.elems.contains(&top_id) {
            continue;
        }
        last_top_before = Some(i);

        let mut top_clone = clone_without(doc.dictionary(top_id)?, &IGNORE_KEYS_FOR_CLONE);
        top_clone.set("P", root);
        let top_clone = doc.add_object(top_clone);
        let mut last_cloned = LastClonedAncestor { ancestor: top_id, clone: top_clone };
        separate_kids(doc, top_id, &first, &mut last_cloned)?;

        if doc.dictionary(top_clone)?.has(b"K") {
            cloned_tops.push(top_clone);
        } else {
            doc.remove_object(top_clone);
        }
    }

    let insert_index = last_top_before.map_or(0, |i| i + 1);
    let root_dict = doc.dictionary_mut(root)?;
    for (i, clone) in cloned_tops.iter().enumerate() {
        push_kid(root_dict, Object::Reference(*clone), Some(insert_index + i));
    }
    log::debug!(
        "Split structure tree before page {}: {} cloned tops",
        insert_before_page,
        cloned_tops.len()
    );
    Ok(insert_index)
}

fn separate_kids(
    doc: &mut PdfDocument,
    elem: ObjectId,
    first: &FirstPart,
    last_cloned: &mut LastClonedAncestor,
) -> Result<(), KernelError> {
    let k = doc.dictionary(elem)?.get(b"K").ok().cloned();
    match k {
        Some(Object::Array(elem_kids)) => {
            let mut kept = Vec::with_capacity(elem_kids.len());
            for kid in elem_kids {
                match struct_elem_id(doc.lopdf(), &kid) {
                    Some(kid_id) if first.elems.contains(&kid_id) => {
                        separate_kids(doc, kid_id, first, last_cloned)?;
                        kept.push(kid);
                    }
                    Some(kid_id) => {
                        if doc.is_flushed(kid_id) {
                            return Err(KernelError::TagStructureFlushed);
                        }
                        // Elements without kids stay where they are.
                        if doc.dictionary(kid_id)?.has(b"K") {
                            clone_parents(doc, elem, last_cloned)?;
                            add_kid(doc, last_cloned.clone, kid)?;
                        } else {
                            kept.push(kid);
                        }
                    }
                    None => {
                        if first.contains_leaf(doc, elem, &kid) {
                            kept.push(kid);
                        } else {
                            clone_parents(doc, elem, last_cloned)?;
                            add_kid(doc, last_cloned.clone, kid)?;
                        }
                    }
                }
            }
            doc.dictionary_mut(elem)?.set("K", Object::Array(kept));
        }
        // A single kid never holds content from both parts; only a struct
        // element kid can lead further down.
        Some(single) => {
            if let Some(kid_id) = struct_elem_id(doc.lopdf(), &single) {
                separate_kids(doc, kid_id, first, last_cloned)?;
            }
        }
        None => {}
    }

    if last_cloned.ancestor == elem {
        last_cloned.ancestor = parent_of(doc.lopdf(), elem).ok_or_else(|| broken_tree(elem))?;
        last_cloned.clone = parent_of(doc.lopdf(), last_cloned.clone).ok_or_else(|| broken_tree(elem))?;
    }
    Ok(())
}

/// Clones the ancestors of `elem` below the last cloned ancestor, hooking
/// the new chain under the last clone.
fn clone_parents(
    doc: &mut PdfDocument,
    elem: ObjectId,
    last_cloned: &mut LastClonedAncestor,
) -> Result<(), KernelError> {
    if last_cloned.ancestor == elem {
        return Ok(());
    }
    let elem_clone = doc.add_object(clone_without(doc.dictionary(elem)?, &IGNORE_KEYS_FOR_CLONE));
    let mut current_clone = elem_clone;
    let mut current = elem;
    loop {
        let parent = parent_of(doc.lopdf(), current).ok_or_else(|| broken_tree(current))?;
        if parent == last_cloned.ancestor {
            break;
        }
        let mut parent_clone = clone_without(doc.dictionary(parent)?, &IGNORE_KEYS_FOR_CLONE);
        parent_clone.set("K", Object::Reference(current_clone));
        let parent_clone = doc.add_object(parent_clone);
        doc.dictionary_mut(current_clone)?.set("P", parent_clone);
        current_clone = parent_clone;
        current = parent;
    }
    add_kid(doc, last_cloned.clone, Object::Reference(current_clone))?;
    last_cloned.clone = elem_clone;
    last_cloned.ancestor = elem;
    Ok(())
}

fn add_kid(doc: &mut PdfDocument, parent: ObjectId, kid: Object) -> Result<(), KernelError> {
    if let Some(kid_id) = struct_elem_id(doc.lopdf(), &kid) {
        doc.dictionary_mut(kid_id)?.set("P", parent);
    }
    push_kid(doc.dictionary_mut(parent)?, kid, None);
    Ok(())
}

/// Copies the structure of the pages in `page_map` from `source` into the
/// destination behind `copier`.
///
/// Only struct elements with content on a copied page are copied, each
/// once. `/Pg` entries are remapped to the copied pages. Link `OBJR`s whose
/// annotation did not come along with a copied page are dropped. The
/// copied tops are inserted into `dest_root` at `insert_index`, or appended.
pub fn copy_structure(
    copier: &mut ObjectCopier<'_>,
    source: &PdfDocument,
    dest_root: ObjectId,
    page_map: &[(ObjectId, ObjectId)],
    insert_index: Option<usize>,
    next_struct_parent: &mut i64,
) -> Result<(), KernelError> {
    let Some(source_root) = struct_tree_root(source.lopdf()) else {
        return Ok(());
    };

    let pages: HashMap<ObjectId, ObjectId> = page_map.iter().copied().collect();
    let mut elems = HashSet::new();
    let mut tops = HashSet::new();
    for (source_page, _) in page_map {
        for mcr in page_marked_content_references(source.lopdf(), *source_page) {
            let top = add_all_parents(source.lopdf(), mcr.parent, &mut elems, |id| source.is_flushed(id));
            if source.is_flushed(top) {
                return Err(KernelError::CannotCopyFlushedTag);
            }
            tops.insert(top);
        }
    }

    let mut context = CopyContext { copier, source, pages, elems, next_struct_parent };
    let mut index = insert_index;
    for top in kids(source.lopdf(), source_root) {
        let Some(top_id) = struct_elem_id(source.lopdf(), &top) else {
            continue;
        };
        if !tops.contains(&top_id) {
            continue;
        }
        let copied = context.copy_elem(top_id)?;
        let target = context.copier.target();
        target.get_dictionary_mut(copied)?.set("P", dest_root);
        push_kid(target.get_dictionary_mut(dest_root)?, Object::Reference(copied), index);
        if let Some(i) = index.as_mut() {
            *i += 1;
        }
    }
    Ok(())
}

struct CopyContext<'c, 'a> {
    copier: &'c mut ObjectCopier<'a>,
    source: &'c PdfDocument,
    pages: HashMap<ObjectId, ObjectId>,
    elems: HashSet<ObjectId>,
    next_struct_parent: &'c mut i64,
}

impl CopyContext<'_, '_> {
    fn copy_elem(&mut self, source_id: ObjectId) -> Result<ObjectId, KernelError> {
        let copied = self.copier.copy_object_ignoring(source_id, &IGNORE_KEYS_FOR_COPY)?;
        let source_dict = self.source.dictionary(source_id)?.clone();

        let page = source_dict.get(b"Pg").and_then(Object::as_reference).ok();
        if let Some(mapped) = page.and_then(|p| self.pages.get(&p)) {
            self.copier.target().get_dictionary_mut(copied)?.set("Pg", *mapped);
        }

        match source_dict.get(b"K") {
            Ok(Object::Array(source_kids)) => {
                let mut new_kids = Vec::with_capacity(source_kids.len());
                for kid in source_kids {
                    if let Some(copied_kid) = self.copy_kid(kid, source_id, copied)? {
                        new_kids.push(copied_kid);
                    }
                }
                self.copier.target().get_dictionary_mut(copied)?.set("K", Object::Array(new_kids));
            }
            Ok(kid) => {
                if let Some(copied_kid) = self.copy_kid(kid, source_id, copied)? {
                    self.copier.target().get_dictionary_mut(copied)?.set("K", copied_kid);
                }
            }
            Err(_) => {}
        }
        Ok(copied)
    }

    fn copy_kid(
        &mut self,
        kid: &Object,
        source_parent: ObjectId,
        copied_parent: ObjectId,
    ) -> Result<Option<Object>, KernelError> {
        if let Object::Integer(_) = kid {
            return Ok(Some(kid.clone()));
        }
        if let Some(kid_id) = struct_elem_id(self.source.lopdf(), kid) {
            if !self.elems.contains(&kid_id) {
                return Ok(None);
            }
            let copied_kid = self.copy_elem(kid_id)?;
            self.copier.target().get_dictionary_mut(copied_kid)?.set("P", copied_parent);
            return Ok(Some(Object::Reference(copied_kid)));
        }

        let Some(mcr) = mcr_of(self.source.lopdf(), source_parent, kid) else {
            return Ok(None);
        };
        let on_copied_page = mcr.page.is_some_and(|p| self.pages.contains_key(&p));
        if !on_copied_page {
            return Ok(None);
        }
        let source_dict = match kid {
            Object::Dictionary(dict) => dict.clone(),
            Object::Reference(id) => self.source.dictionary(*id)?.clone(),
            _ => return Ok(None),
        };
        let copied = self.copy_leaf(&source_dict, mcr.page, mcr.object)?;
        Ok(copied.map(|dict| match kid {
            Object::Reference(_) => Object::Reference(self.copier.target().add_object(dict)),
            _ => Object::Dictionary(dict),
        }))
    }

    /// Copies an MCR or OBJR dictionary. `None` when an OBJR points at a link
    /// annotation that was not copied with its page.
    fn copy_leaf(
        &mut self,
        source_dict: &Dictionary,
        page: Option<ObjectId>,
        object: Option<ObjectId>,
    ) -> Result<Option<Dictionary>, KernelError> {
        let stripped = clone_without(source_dict, &IGNORE_KEYS_FOR_COPY);
        let mut copied = match self.copier.remap_references(Object::Dictionary(stripped))? {
            Object::Dictionary(dict) => dict,
            _ => return Ok(None),
        };
        if source_dict.has(b"Pg") {
            if let Some(mapped) = page.and_then(|p| self.pages.get(&p)) {
                copied.set("Pg", *mapped);
            }
        }
        if let Some(annotation) = object {
            // An annotation copied along with its page already has a /P.
            let copied_annotation = match self.copier.mapped(annotation) {
                Some(id) => id,
                None => self.copier.copy_object_ignoring(annotation, &[b"P"])?,
            };
            let index = *self.next_struct_parent;
            let target = self.copier.target();
            let annotation_dict = target.get_dictionary_mut(copied_annotation)?;
            let is_link = annotation_dict.get(b"Subtype").and_then(Object::as_name).is_ok_and(|s| s == b"Link");
            if is_link && !annotation_dict.has(b"P") {
                return Ok(None);
            }
            annotation_dict.set("StructParent", index);
            *self.next_struct_parent += 1;
            copied.set("Obj", copied_annotation);
        }
        Ok(Some(copied))
    }
}

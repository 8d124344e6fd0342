//! Structure (tag) tree access: walking struct elements and enumerating the
//! marked-content references that tie them to pages.

mod copier;

pub use copier::{copy_structure, split_structure_tree};

use crate::KernelError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

pub(crate) const IGNORE_KEYS_FOR_COPY: [&[u8]; 4] = [b"K", b"P", b"Pg", b"Obj"];
pub(crate) const IGNORE_KEYS_FOR_CLONE: [&[u8]; 2] = [b"K", b"P"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McrKind {
    /// A bare MCID integer in `/K`.
    Number,
    /// A `/Type /MCR` dictionary.
    Dictionary,
    /// A `/Type /OBJR` object reference.
    ObjectReference,
}

/// A marked-content reference: a leaf of the structure tree pointing at
/// content on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedContentReference {
    /// The struct element holding this reference.
    pub parent: ObjectId,
    pub kind: McrKind,
    pub mcid: Option<i64>,
    /// Own `/Pg`, falling back to the parent's.
    pub page: Option<ObjectId>,
    /// Target of an `OBJR`.
    pub object: Option<ObjectId>,
}

pub fn struct_tree_root(doc: &Document) -> Option<ObjectId> {
    let catalog = doc.catalog().ok()?;
    catalog.get(b"StructTreeRoot").ok()?.as_reference().ok()
}

/// True for struct element dictionaries, as opposed to MCR/OBJR leaves.
pub fn is_struct_elem(dict: &Dictionary) -> bool {
    match dict.get(b"Type").and_then(Object::as_name) {
        Ok(b"StructElem") => true,
        Ok(b"MCR") | Ok(b"OBJR") | Ok(b"StructTreeRoot") => false,
        _ => dict.has(b"S"),
    }
}

/// The struct element a kid refers to, if it is one.
pub fn struct_elem_id(doc: &Document, kid: &Object) -> Option<ObjectId> {
    let id = kid.as_reference().ok()?;
    let dict = doc.get_dictionary(id).ok()?;
    is_struct_elem(dict).then_some(id)
}

/// `/K` of a node as a list, whether stored as a single kid or an array.
pub fn kids(doc: &Document, node: ObjectId) -> Vec<Object> {
    let Ok(dict) = doc.get_dictionary(node) else {
        return Vec::new();
    };
    match dict.get(b"K") {
        Ok(Object::Array(arr)) => arr.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(other) => vec![other.clone()],
        Err(_) => Vec::new(),
    }
}

pub fn parent_of(doc: &Document, elem: ObjectId) -> Option<ObjectId> {
    doc.get_dictionary(elem).ok()?.get(b"P").ok()?.as_reference().ok()
}

fn page_of(dict: &Dictionary) -> Option<ObjectId> {
    dict.get(b"Pg").ok()?.as_reference().ok()
}

/// Interprets a kid of `parent` as a marked-content reference.
pub fn mcr_of(doc: &Document, parent: ObjectId, kid: &Object) -> Option<MarkedContentReference> {
    let parent_page = doc.get_dictionary(parent).ok().and_then(page_of);
    let dict = match kid {
        Object::Integer(mcid) => {
            return Some(MarkedContentReference {
                parent,
                kind: McrKind::Number,
                mcid: Some(*mcid),
                page: parent_page,
                object: None,
            });
        }
        Object::Dictionary(dict) => dict,
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        _ => return None,
    };
    let kind = match dict.get(b"Type").and_then(Object::as_name) {
        Ok(b"MCR") => McrKind::Dictionary,
        Ok(b"OBJR") => McrKind::ObjectReference,
        _ => return None,
    };
    Some(MarkedContentReference {
        parent,
        kind,
        mcid: dict.get(b"MCID").and_then(Object::as_i64).ok(),
        page: page_of(dict).or(parent_page),
        object: dict.get(b"Obj").and_then(Object::as_reference).ok(),
    })
}

/// Every marked-content reference in the tree, in document order.
pub fn marked_content_references(doc: &Document) -> Vec<MarkedContentReference> {
    let mut result = Vec::new();
    let Some(root) = struct_tree_root(doc) else {
        return result;
    };
    let mut visited = HashSet::new();
    visited.insert(root);
    for kid in kids(doc, root) {
        if let Some(elem) = struct_elem_id(doc, &kid) {
            collect_mcrs(doc, elem, &mut visited, &mut result);
        }
    }
    result
}

fn collect_mcrs(
    doc: &Document,
    elem: ObjectId,
    visited: &mut HashSet<ObjectId>,
    result: &mut Vec<MarkedContentReference>,
) {
    if !visited.insert(elem) {
        return;
    }
    for kid in kids(doc, elem) {
        if let Some(child) = struct_elem_id(doc, &kid) {
            collect_mcrs(doc, child, visited, result);
        } else if let Some(mcr) = mcr_of(doc, elem, &kid) {
            result.push(mcr);
        }
    }
}

/// The marked-content references that point at `page`.
pub fn page_marked_content_references(doc: &Document, page: ObjectId) -> Vec<MarkedContentReference> {
    marked_content_references(doc)
        .into_iter()
        .filter(|mcr| mcr.page == Some(page))
        .collect()
}

/// Adds `elem` and its ancestors below the root to `set`. Returns the
/// topmost element reached; the walk stops early at a flushed element.
pub(crate) fn add_all_parents(
    doc: &Document,
    elem: ObjectId,
    set: &mut HashSet<ObjectId>,
    is_flushed: impl Fn(ObjectId) -> bool,
) -> ObjectId {
    let mut current = elem;
    set.insert(current);
    let mut seen = HashSet::new();
    loop {
        if is_flushed(current) || !seen.insert(current) {
            break;
        }
        let Some(parent) = parent_of(doc, current) else {
            break;
        };
        let is_root = doc
            .get_dictionary(parent)
            .and_then(|d| d.get(b"Type"))
            .and_then(Object::as_name)
            .is_ok_and(|n| n == b"StructTreeRoot");
        if is_root {
            break;
        }
        current = parent;
        set.insert(current);
    }
    current
}

/// Appends `kid` to a node's `/K`, turning a single kid into an array.
pub(crate) fn push_kid(node: &mut Dictionary, kid: Object, index: Option<usize>) {
    let mut list = match node.get(b"K") {
        Ok(Object::Array(arr)) => arr.clone(),
        Ok(single) => vec![single.clone()],
        Err(_) => Vec::new(),
    };
    match index {
        Some(i) if i <= list.len() => list.insert(i, kid),
        _ => list.push(kid),
    }
    node.set("K", Object::Array(list));
}

/// Copy of a dictionary without the given keys.
pub(crate) fn clone_without(dict: &Dictionary, ignore_keys: &[&[u8]]) -> Dictionary {
    let mut clone = dict.clone();
    for key in ignore_keys {
        clone.remove(key);
    }
    clone
}

pub(crate) fn broken_tree(elem: ObjectId) -> KernelError {
    KernelError::Other(format!("Struct element {:?} is not connected to the structure tree root", elem))
}

#[cfg(test)]
mod tests;

//! Cross-document object copying.

use crate::KernelError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashMap;

/// Deep-copies objects from one document into another.
///
/// Every source object is copied at most once; the mapping from source to
/// target ids is kept so that shared and cyclic references resolve to the
/// same copy.
pub struct ObjectCopier<'a> {
    source_doc: &'a Document,
    target_doc: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    pub fn new(source_doc: &'a Document, target_doc: &'a mut Document) -> Self {
        Self { source_doc, target_doc, id_map: HashMap::new() }
    }

    /// Deep copies an object and everything it references.
    pub fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, KernelError> {
        self.copy_object_ignoring(source_id, &[])
    }

    /// Like [`Self::copy_object`], but the top-level dictionary (or stream
    /// dictionary) drops the entries named in `ignore_keys`. Nested objects
    /// are copied in full.
    pub fn copy_object_ignoring(
        &mut self,
        source_id: ObjectId,
        ignore_keys: &[&[u8]],
    ) -> Result<ObjectId, KernelError> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // Reserve the id before recursing so cycles (Page -> Parent -> Kids)
        // terminate on the map lookup above.
        let new_id = self.target_doc.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = strip_keys(self.source_doc.get_object(source_id)?.clone(), ignore_keys);
        let new_obj = self.remap_references(obj)?;

        match self.target_doc.objects.get_mut(&new_id) {
            Some(target_obj) => *target_obj = new_obj,
            None => return Err(lopdf::Error::ObjectNotFound(new_id).into()),
        }
        Ok(new_id)
    }

    /// Records that `source_id` is represented by `target_id` without
    /// copying it. References to it are rewritten to the given target.
    pub fn map(&mut self, source_id: ObjectId, target_id: ObjectId) {
        self.id_map.insert(source_id, target_id);
    }

    pub fn mapped(&self, source_id: ObjectId) -> Option<ObjectId> {
        self.id_map.get(&source_id).copied()
    }

    pub fn source(&self) -> &Document {
        self.source_doc
    }

    pub fn target(&mut self) -> &mut Document {
        self.target_doc
    }

    /// Rewrites every reference inside `obj`, copying referenced objects.
    pub fn remap_references(&mut self, obj: Object) -> Result<Object, KernelError> {
        match obj {
            Object::Reference(id) => {
                let new_id = self.copy_object(id)?;
                Ok(Object::Reference(new_id))
            }
            Object::Array(arr) => {
                let new_arr = arr
                    .into_iter()
                    .map(|o| self.remap_references(o))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Object::Array(new_arr))
            }
            Object::Dictionary(mut dict) => {
                for (_, value) in dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Stream(stream))
            }
            _ => Ok(obj),
        }
    }
}

fn strip_keys(obj: Object, ignore_keys: &[&[u8]]) -> Object {
    if ignore_keys.is_empty() {
        return obj;
    }
    let strip = |dict: &mut Dictionary| {
        for key in ignore_keys {
            dict.remove(key);
        }
    };
    match obj {
        Object::Dictionary(mut dict) => {
            strip(&mut dict);
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            strip(&mut stream.dict);
            Object::Stream(stream)
        }
        other => other,
    }
}

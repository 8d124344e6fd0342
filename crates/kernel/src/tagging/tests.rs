use super::*;
use crate::document::PdfDocument;
use lopdf::dictionary;

fn tagged_doc(pages: usize) -> (PdfDocument, ObjectId, Vec<ObjectId>) {
    let mut doc = PdfDocument::new("1.7");
    let page_ids = (0..pages).map(|_| doc.add_page(200.0, 200.0).unwrap()).collect();
    let root = doc.set_tagged().unwrap();
    (doc, root, page_ids)
}

fn add_elem(doc: &mut PdfDocument, role: &str, parent: ObjectId, page: Option<ObjectId>) -> ObjectId {
    let mut dict = dictionary! {
        "Type" => "StructElem",
        "S" => Object::Name(role.as_bytes().to_vec()),
        "P" => parent,
    };
    if let Some(page) = page {
        dict.set("Pg", page);
    }
    let id = doc.add_object(dict);
    push_kid(doc.dictionary_mut(parent).unwrap(), Object::Reference(id), None);
    id
}

fn add_leaf(doc: &mut PdfDocument, elem: ObjectId, leaf: Object) {
    push_kid(doc.dictionary_mut(elem).unwrap(), leaf, None);
}

fn mcr(page: ObjectId, mcid: i64) -> Object {
    Object::Dictionary(dictionary! { "Type" => "MCR", "Pg" => page, "MCID" => mcid })
}

fn role(doc: &PdfDocument, elem: ObjectId) -> Vec<u8> {
    doc.dictionary(elem).unwrap().get(b"S").unwrap().as_name().unwrap().to_vec()
}

fn kid_ids(doc: &PdfDocument, node: ObjectId) -> Vec<ObjectId> {
    kids(doc.lopdf(), node)
        .iter()
        .filter_map(|k| struct_elem_id(doc.lopdf(), k))
        .collect()
}

#[test]
fn enumerates_marked_content_per_page() {
    let (mut doc, root, pages) = tagged_doc(2);
    let document = add_elem(&mut doc, "Document", root, None);
    let p = add_elem(&mut doc, "P", document, Some(pages[0]));
    add_leaf(&mut doc, p, Object::Integer(0));
    add_leaf(&mut doc, p, mcr(pages[1], 0));

    let all = marked_content_references(doc.lopdf());
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].kind, McrKind::Number);
    assert_eq!(all[0].page, Some(pages[0]));
    assert_eq!(all[1].kind, McrKind::Dictionary);

    let second = page_marked_content_references(doc.lopdf(), pages[1]);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].parent, p);
    assert_eq!(second[0].mcid, Some(0));
}

#[test]
fn split_moves_second_part_kids_to_one_cloned_chain() {
    let (mut doc, root, pages) = tagged_doc(2);
    let document = add_elem(&mut doc, "Document", root, None);
    let straddling = add_elem(&mut doc, "P", document, None);
    add_leaf(&mut doc, straddling, mcr(pages[0], 0));
    add_leaf(&mut doc, straddling, mcr(pages[1], 0));
    let first_only = add_elem(&mut doc, "H1", document, Some(pages[0]));
    add_leaf(&mut doc, first_only, Object::Integer(1));
    let second_only = add_elem(&mut doc, "Table", document, Some(pages[1]));
    add_leaf(&mut doc, second_only, Object::Integer(1));

    let insert_index = split_structure_tree(&mut doc, 2).unwrap();
    assert_eq!(insert_index, 1);

    let tops = kid_ids(&doc, root);
    assert_eq!(tops.len(), 2);
    assert_eq!(tops[0], document);
    let document_clone = tops[1];
    assert_eq!(role(&doc, document_clone), b"Document");
    assert_eq!(parent_of(doc.lopdf(), document_clone), Some(root));

    // The original keeps the first-part content.
    assert_eq!(kid_ids(&doc, document), vec![straddling, first_only]);
    let kept = page_marked_content_references(doc.lopdf(), pages[0]);
    assert!(kept.iter().all(|m| m.parent == straddling || m.parent == first_only));
    assert_eq!(kids(doc.lopdf(), straddling).len(), 1);

    // Exactly one clone of the straddling element; the second-part element
    // is moved, not copied.
    let clone_kids = kid_ids(&doc, document_clone);
    assert_eq!(clone_kids.len(), 2);
    let straddling_clone = clone_kids[0];
    assert_eq!(role(&doc, straddling_clone), b"P");
    assert_eq!(clone_kids[1], second_only);
    assert_eq!(parent_of(doc.lopdf(), second_only), Some(document_clone));

    let moved = page_marked_content_references(doc.lopdf(), pages[1]);
    assert_eq!(moved.len(), 2);
    assert!(moved.iter().any(|m| m.parent == straddling_clone));
    assert!(moved.iter().any(|m| m.parent == second_only));
}

#[test]
fn split_with_nothing_after_the_insertion_point_clones_nothing() {
    let (mut doc, root, pages) = tagged_doc(2);
    let document = add_elem(&mut doc, "Document", root, Some(pages[0]));
    add_leaf(&mut doc, document, Object::Integer(0));
    let objects_before = doc.lopdf().objects.len();

    assert_eq!(split_structure_tree(&mut doc, 2).unwrap(), 1);
    assert_eq!(kid_ids(&doc, root), vec![document]);
    assert_eq!(doc.lopdf().objects.len(), objects_before);
}

#[test]
fn split_fails_on_flushed_tops() {
    let (mut doc, root, pages) = tagged_doc(2);
    let document = add_elem(&mut doc, "Document", root, None);
    let p = add_elem(&mut doc, "P", document, Some(pages[0]));
    add_leaf(&mut doc, p, Object::Integer(0));
    doc.flush(document);

    assert!(matches!(split_structure_tree(&mut doc, 2), Err(KernelError::TagStructureFlushed)));
}

fn link(page_target: ObjectId) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
        "Dest" => vec![Object::Reference(page_target), "Fit".into()],
    }
}

fn objr(annotation: ObjectId, page: ObjectId) -> Object {
    Object::Dictionary(dictionary! { "Type" => "OBJR", "Obj" => annotation, "Pg" => page })
}

#[test]
fn copies_structure_of_copied_pages_only() {
    let (mut source, root, pages) = tagged_doc(2);
    let document = add_elem(&mut source, "Document", root, None);
    let first = add_elem(&mut source, "P", document, Some(pages[0]));
    add_leaf(&mut source, first, Object::Integer(0));
    let second = add_elem(&mut source, "P", document, Some(pages[1]));
    add_leaf(&mut source, second, Object::Integer(0));
    let on_second = source.add_annotation(pages[1], link(pages[1])).unwrap();
    let on_first = source.add_annotation(pages[0], link(pages[0])).unwrap();
    add_leaf(&mut source, second, objr(on_second, pages[1]));
    // Points at an annotation whose page is not copied.
    add_leaf(&mut source, second, objr(on_first, pages[1]));

    let (mut dest, dest_root, _) = tagged_doc(1);
    let copied_pages = source.copy_pages_to(&mut dest, &[2], None).unwrap();
    assert_eq!(dest.page_count(), 2);
    assert_eq!(dest.page_id(2), Some(copied_pages[0]));

    let tops = kid_ids(&dest, dest_root);
    assert_eq!(tops.len(), 1);
    assert_eq!(parent_of(dest.lopdf(), tops[0]), Some(dest_root));
    let copied_kids = kid_ids(&dest, tops[0]);
    assert_eq!(copied_kids.len(), 1);
    let copied_second = copied_kids[0];
    assert_eq!(
        dest.dictionary(copied_second).unwrap().get(b"Pg").unwrap().as_reference().unwrap(),
        copied_pages[0]
    );

    let leaves = kids(dest.lopdf(), copied_second);
    assert_eq!(leaves.len(), 2, "the dangling link OBJR is dropped");
    let obj = leaves[1].as_dict().unwrap().get(b"Obj").unwrap().as_reference().unwrap();
    let annotation = dest.dictionary(obj).unwrap();
    assert_eq!(annotation.get(b"P").unwrap().as_reference().unwrap(), copied_pages[0]);
    assert!(annotation.has(b"StructParent"));
}

#[test]
fn copied_tops_go_between_split_parts() {
    let (mut source, root, pages) = tagged_doc(1);
    let article = add_elem(&mut source, "Art", root, Some(pages[0]));
    add_leaf(&mut source, article, Object::Integer(0));

    let (mut dest, dest_root, dest_pages) = tagged_doc(2);
    let document = add_elem(&mut dest, "Document", dest_root, None);
    add_leaf(&mut dest, document, mcr(dest_pages[0], 0));
    add_leaf(&mut dest, document, mcr(dest_pages[1], 0));

    source.copy_pages_to(&mut dest, &[1], Some(2)).unwrap();

    let tops = kid_ids(&dest, dest_root);
    let roles: Vec<Vec<u8>> = tops.iter().map(|t| role(&dest, *t)).collect();
    assert_eq!(roles, vec![b"Document".to_vec(), b"Art".to_vec(), b"Document".to_vec()]);
    assert_eq!(dest.page_count(), 3);
}

#[test]
fn flushed_source_tags_cannot_be_copied() {
    let (mut source, root, pages) = tagged_doc(1);
    let document = add_elem(&mut source, "Document", root, Some(pages[0]));
    add_leaf(&mut source, document, Object::Integer(0));
    source.flush(document);

    let (mut dest, _, _) = tagged_doc(1);
    assert!(matches!(
        source.copy_pages_to(&mut dest, &[1], None),
        Err(KernelError::CannotCopyFlushedTag)
    ));
}

#[test]
fn untagged_destinations_get_pages_only() {
    let (mut source, root, pages) = tagged_doc(1);
    let document = add_elem(&mut source, "Document", root, Some(pages[0]));
    add_leaf(&mut source, document, Object::Integer(0));

    let mut dest = PdfDocument::new("1.7");
    dest.add_page(100.0, 100.0).unwrap();
    let copied = source.copy_pages_to(&mut dest, &[1], Some(1)).unwrap();
    assert_eq!(dest.page_id(1), Some(copied[0]));
    assert!(dest.struct_tree_root().is_none());
}

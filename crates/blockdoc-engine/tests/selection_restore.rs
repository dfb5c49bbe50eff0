use blockdoc_engine::selection::{self, Collapse};
use blockdoc_engine::surface::Surface;
use blockdoc_engine::{
    BlockId, BlockRegistry, CaretPlace, Document, DomSurface, EditorOptions, Position,
    SurfaceRange,
};
use pretty_assertions::assert_eq;

fn document(markup: &str) -> Document {
    Document::from_markup(markup, BlockRegistry::default(), EditorOptions::default())
}

fn render(doc: &Document) -> DomSurface {
    DomSurface::render(doc.blocks(), doc.registry())
}

/// (owning block, text of caret node, offset)
fn caret(surface: &DomSurface) -> (BlockId, String, usize) {
    let range = surface.selection().unwrap();
    assert!(range.collapsed());
    let (block, _) = surface.owning_block(range.start.node).unwrap();
    let text = surface.text(range.start.node).unwrap_or_default().to_string();
    (block, text, range.start.offset)
}

#[test]
fn caret_survives_sibling_edit() {
    let mut doc = document("<p>first</p><p>hello world</p>");
    let [first, second] = [doc.blocks()[0].id().clone(), doc.blocks()[1].id().clone()];

    let mut surface = render(&doc);
    selection::place_caret(&mut surface, &second, CaretPlace::Offset(5));
    let saved = selection::save(&surface).unwrap();
    assert_eq!((saved.start, saved.collapsed), (5, true));

    doc.set_content(&first, "a <b>much</b> longer first block");
    let mut surface = render(&doc);
    assert!(selection::restore(&mut surface, &saved, None));

    assert_eq!(caret(&surface), (second, "hello world".to_string(), 5));
}

#[test]
fn caret_falls_back_to_text_offset_when_structure_changes() {
    let mut doc = document("<p>hello <b>world</b></p>");
    let id = doc.blocks()[0].id().clone();

    let mut surface = render(&doc);
    selection::place_caret(&mut surface, &id, CaretPlace::Offset(8));
    let saved = selection::save(&surface).unwrap();
    assert_eq!(saved.start_boundary.path, vec![1, 0]);

    doc.set_content(&id, "hello world");
    let mut surface = render(&doc);
    assert!(selection::restore(&mut surface, &saved, None));

    assert_eq!(caret(&surface), (id, "hello world".to_string(), 8));
}

#[test]
fn range_collapses_on_request() {
    let doc = document("<p>0123456789</p>");
    let mut surface = render(&doc);
    let root = surface.block_root(doc.blocks()[0].id()).unwrap();
    let text = surface.text_nodes(root)[0];
    surface.set_selection(Some(SurfaceRange::new(
        Position::new(text, 2),
        Position::new(text, 7),
    )));
    let saved = selection::save(&surface).unwrap();
    assert_eq!(selection::selected_text(&surface).unwrap(), "23456");

    let mut fresh = render(&doc);
    selection::restore(&mut fresh, &saved, Some(Collapse::ToEnd));
    let range = fresh.selection().unwrap();
    assert!(range.collapsed());
    assert_eq!(range.start.offset, 7);
}

#[test]
fn restore_into_removed_block_fails() {
    let mut doc = document("<p>keep</p><p>drop</p>");
    let drop = doc.blocks()[1].id().clone();
    let mut surface = render(&doc);
    selection::place_caret(&mut surface, &drop, CaretPlace::End);
    let saved = selection::save(&surface).unwrap();

    doc.remove_by_id(&drop);
    let mut surface = render(&doc);
    assert!(!selection::restore(&mut surface, &saved, None));
    assert_eq!(surface.selection(), None);
}

#[test]
fn split_then_focus_lands_in_new_block() {
    let mut doc = document("<h2>Hello there</h2><p>after</p>");
    let id = doc.blocks()[0].id().clone();
    let mut surface = render(&doc);
    selection::place_caret(&mut surface, &id, CaretPlace::Offset(5));

    let fresh = doc.split(&id, &mut surface).unwrap();
    assert_eq!(doc.markup(), "<h2>Hello</h2><h2> there</h2><p>after</p>");

    let focus = doc.take_focus_request().unwrap();
    let mut surface = render(&doc);
    assert!(selection::apply_focus(&mut surface, &focus));
    assert_eq!(caret(&surface), (fresh, " there".to_string(), 0));
}

#[test]
fn merge_focus_lands_at_join_point() {
    let mut doc = document("<p>foo</p><p>bar</p>");
    let second = doc.blocks()[1].id().clone();
    let into = doc.merge(&second).unwrap();

    let focus = doc.take_focus_request().unwrap();
    let mut surface = render(&doc);
    selection::apply_focus(&mut surface, &focus);
    assert_eq!(caret(&surface), (into, "foobar".to_string(), 3));
}

#[test]
fn formatting_is_reported_on_selection_change() {
    let mut doc = document(r#"<p>plain <b>bold <a href="/x">link</a></b></p>"#);
    let id = doc.blocks()[0].id().clone();
    let mut surface = render(&doc);
    selection::place_caret(&mut surface, &id, CaretPlace::Offset(13));

    let state = doc.notify_selection_changed(&surface).unwrap();
    assert!(state.bold);
    assert!(!state.italic);
    assert_eq!(state.link.as_deref(), Some("/x"));
    assert_eq!(state.block_id, Some(id));
}

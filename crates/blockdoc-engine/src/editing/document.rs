use std::time::Duration;

use super::context::{self, BlockContext, ListPath};
use super::{
    ChangeCallback, Cmd, Debouncer, DocumentEvent, EventBus, FocusRequest, History,
    HistoryDirection, Listener, Patch,
};
use crate::formatting::{self, FormatState};
use crate::markup::{parse_markup, to_markup};
use crate::model::{Block, BlockChange, BlockId, BlockInit, is_markup_empty, same_shape};
use crate::registry::{BlockRegistry, BlockType};
use crate::selection::{self, CaretPlace};
use crate::surface::{NewNode, Surface};

/// Attribute of the transient element marking the caret during a split.
pub const SPLIT_MARKER_ATTR: &str = "data-split-marker";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorOptions {
    /// Entries kept on each of the undo and redo stacks
    pub history_capacity: usize,
    /// Delay between a style edit and its history snapshot
    pub style_debounce: Duration,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            style_debounce: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Edit,
    History,
}

/// The tree manager.
///
/// Owns the block tree and is the only thing that mutates it. Every
/// structural operation runs to completion before returning:
///
/// 1. locate the block by id (see [`context`])
/// 2. mutate the owning list
/// 3. re-serialize; if the markup differs from the last emitted markup,
///    push the previous markup to [`History`], call the change callback and
///    raise [`DocumentEvent::DocumentChanged`]
///
/// Preconditions that do not hold (unknown id, first block on merge, empty
/// split half) make the operation a no-op returning `false`/`None`.
///
/// Two things are deferred. Focus after an insert, split or merge is left as
/// a [`FocusRequest`] for the next rendering pass to pick up with
/// [`Document::take_focus_request`]. Style edits are snapshotted through a
/// [`Debouncer`] driven by [`Document::advance`].
///
/// ```
/// use blockdoc_engine::{BlockRegistry, BlockType, Cmd, Document, EditorOptions};
///
/// let mut doc = Document::from_markup(
///     "<p>first</p>",
///     BlockRegistry::default(),
///     EditorOptions::default(),
/// );
/// let anchor = doc.blocks()[0].id().clone();
/// let patch = doc.apply(Cmd::InsertAfter {
///     anchor,
///     kind: BlockType::H2,
///     content: "second".to_string(),
/// });
///
/// assert_eq!(doc.markup(), "<p>first</p><h2>second</h2>");
/// assert_eq!(patch.focus.map(|f| f.block), Some(patch.changed[0].clone()));
/// ```
pub struct Document {
    registry: BlockRegistry,
    blocks: Vec<Block>,
    history: History,
    debouncer: Debouncer,
    last_emitted: String,
    version: u64,
    focus: Option<FocusRequest>,
    events: EventBus,
    on_change: Option<ChangeCallback>,
}

impl Document {
    pub fn new(blocks: Vec<Block>, registry: BlockRegistry, options: EditorOptions) -> Self {
        let mut doc = Self {
            last_emitted: String::new(),
            blocks,
            history: History::new(options.history_capacity),
            debouncer: Debouncer::new(options.style_debounce),
            registry,
            version: 0,
            focus: None,
            events: EventBus::default(),
            on_change: None,
        };
        doc.ensure_top_level();
        doc.last_emitted = doc.markup();
        doc
    }

    pub fn from_markup(markup: &str, registry: BlockRegistry, options: EditorOptions) -> Self {
        let blocks = parse_markup(markup, &registry);
        Self::new(blocks, registry, options)
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Current markup of the whole tree.
    pub fn markup(&self) -> String {
        to_markup(&self.blocks, &self.registry)
    }

    /// Markup most recently handed to the change callback.
    pub fn last_emitted(&self) -> &str {
        &self.last_emitted
    }

    /// Incremented by every mutation of the tree.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn find(&self, id: &BlockId) -> Option<&Block> {
        context::block(&self.blocks, id)
    }

    pub fn context(&self, id: &BlockId) -> Option<BlockContext> {
        context::find(&self.blocks, id)
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.events.subscribe(listener);
    }

    pub fn on_change(&mut self, callback: ChangeCallback) {
        self.on_change = Some(callback);
    }

    pub fn pending_focus(&self) -> Option<&FocusRequest> {
        self.focus.as_ref()
    }

    /// Take the focus request left by the last insert, split or merge. Call
    /// after the surface shows the new tree.
    pub fn take_focus_request(&mut self) -> Option<FocusRequest> {
        self.focus.take()
    }

    /// Apply command to document
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let pending = self.focus.take();
        let changed = match cmd {
            Cmd::InsertAfter {
                anchor,
                kind,
                content,
            } => self.insert_after(&anchor, kind, content).into_iter().collect(),
            Cmd::InsertBefore {
                anchor,
                kind,
                content,
            } => self.insert_before(&anchor, kind, content).into_iter().collect(),
            Cmd::Remove { id } => self.remove_by_id(&id).then_some(id).into_iter().collect(),
            Cmd::Move { id, to, anchor } => self
                .move_block(&id, to, anchor.as_ref())
                .then_some(id)
                .into_iter()
                .collect(),
            Cmd::Merge { id } => match self.merge(&id) {
                Some(into) => vec![into, id],
                None => Vec::new(),
            },
            Cmd::ToggleType { id, to } => {
                self.toggle_type(&id, to).then_some(id).into_iter().collect()
            }
            Cmd::SetContent { id, content } => {
                self.set_content(&id, content).then_some(id).into_iter().collect()
            }
            Cmd::Select { id, additive } => {
                self.select(&id, additive).then_some(id).into_iter().collect()
            }
        };

        // Only a request made by this command is reported
        let focus = self.focus.clone();
        if focus.is_none() {
            self.focus = pending;
            self.drop_stale_focus();
        }
        Patch {
            changed,
            focus,
            version: self.version,
        }
    }

    pub fn insert_after(
        &mut self,
        anchor: &BlockId,
        kind: BlockType,
        content: impl Into<String>,
    ) -> Option<BlockId> {
        self.insert_adjacent(anchor, kind, content.into(), 1)
    }

    pub fn insert_before(
        &mut self,
        anchor: &BlockId,
        kind: BlockType,
        content: impl Into<String>,
    ) -> Option<BlockId> {
        self.insert_adjacent(anchor, kind, content.into(), 0)
    }

    fn insert_adjacent(
        &mut self,
        anchor: &BlockId,
        kind: BlockType,
        content: String,
        shift: usize,
    ) -> Option<BlockId> {
        let Some(ctx) = self.context(anchor) else {
            log::debug!("Insert skipped: anchor {anchor} not found");
            return None;
        };
        let block = Block::new(BlockInit::new(kind, content), &self.registry);
        let id = block.id().clone();

        context::list_mut(&mut self.blocks, &ctx.list)?.insert(ctx.index + shift, block);

        self.request_focus(id.clone(), CaretPlace::Start);
        self.touch();
        self.commit_structure();
        Some(id)
    }

    /// Remove a block. An emptied multi-column block is removed as well, and
    /// an emptied document gets a fresh default block.
    pub fn remove_by_id(&mut self, id: &BlockId) -> bool {
        let Some(ctx) = self.context(id) else {
            log::debug!("Remove skipped: block {id} not found");
            return false;
        };
        let container = self.container_of(&ctx);
        let Some(list) = context::list_mut(&mut self.blocks, &ctx.list) else {
            return false;
        };
        list.remove(ctx.index);

        if let Some(container) = container {
            self.collapse_if_empty(&container);
        }
        self.ensure_top_level();
        self.drop_stale_focus();
        self.touch();
        self.commit_structure();
        true
    }

    /// Move a block to index `to` of the list owning `anchor`, or of the
    /// top-level list when there is no anchor.
    pub fn move_block(&mut self, id: &BlockId, to: usize, anchor: Option<&BlockId>) -> bool {
        let Some(block) = self.find(id) else {
            log::debug!("Move skipped: block {id} not found");
            return false;
        };
        if let Some(anchor) = anchor {
            if block.contains(anchor) {
                log::debug!("Move skipped: {anchor} lies inside {id}");
                return false;
            }
            if self.context(anchor).is_none() {
                log::debug!("Move skipped: anchor {anchor} not found");
                return false;
            }
        }

        let Some(ctx) = self.context(id) else {
            return false;
        };
        let container = self.container_of(&ctx);
        let Some(block) = context::list_mut(&mut self.blocks, &ctx.list).map(|l| l.remove(ctx.index))
        else {
            return false;
        };

        let destination = match anchor {
            Some(anchor) => self.context(anchor).map(|c| c.list),
            None => Some(ListPath::default()),
        };
        let Some(list) = destination.and_then(|path| context::list_mut(&mut self.blocks, &path))
        else {
            log::warn!("Move of {id} lost its destination, putting it back");
            if let Some(list) = context::list_mut(&mut self.blocks, &ctx.list) {
                list.insert(ctx.index, block);
            }
            return false;
        };
        let at = to.min(list.len());
        list.insert(at, block);

        if let Some(container) = container {
            self.collapse_if_empty(&container);
        }
        self.ensure_top_level();
        self.touch();
        self.commit_structure();
        true
    }

    /// Split a block at the caret shown on `surface`.
    ///
    /// The caret is marked with a transient element, the block's rendered
    /// content is partitioned at the marker, and the marker is removed again
    /// before anything else happens. The block keeps the part before the
    /// caret; a new block of the same type takes the rest. A caret at either
    /// end leaves everything as it was.
    pub fn split<S: Surface + ?Sized>(&mut self, id: &BlockId, surface: &mut S) -> Option<BlockId> {
        let kind = self.find(id)?.kind();
        if kind.is_media() || kind.is_columns() {
            log::debug!("Split skipped: {kind} blocks cannot be split");
            return None;
        }
        let Some(root) = surface.block_root(id) else {
            log::debug!("Split skipped: block {id} not rendered");
            return None;
        };
        let Ok(range) = selection::require(surface) else {
            log::debug!("Split skipped: no selection");
            return None;
        };
        if !surface.contains(root, range.start.node) {
            log::debug!("Split skipped: caret outside block {id}");
            return None;
        }

        let saved = selection::save(surface);
        let marker = surface.insert_at(
            range.start,
            NewNode::element("span", &[(SPLIT_MARKER_ATTR, "")]),
        );
        let rendered = marker.map(|_| surface.inner_markup(root));
        if let Some(marker) = marker {
            surface.remove_node(marker);
        }
        surface.normalize(root);
        if let Some(saved) = &saved {
            selection::restore(surface, saved, None);
        }

        let Some(rendered) = rendered else {
            log::warn!("Split of {id} failed: surface rejected the caret marker");
            return None;
        };
        let nodes = blockdoc_syntax::parse(&rendered);
        let is_marker = |e: &blockdoc_syntax::Element| e.attr(SPLIT_MARKER_ATTR).is_some();
        let Some((before, after)) = blockdoc_syntax::split_at_marker(&nodes, &is_marker) else {
            log::warn!("Split of {id} failed: caret marker missing from rendered content");
            return None;
        };
        let (before, after) = (
            blockdoc_syntax::serialize(&before),
            blockdoc_syntax::serialize(&after),
        );
        if is_markup_empty(&before) || is_markup_empty(&after) {
            log::debug!("Split skipped: caret at the edge of {id}");
            return None;
        }

        let block = context::block_mut(&mut self.blocks, id)?;
        block.set_content(before);
        block.take_changes();

        let ctx = self.context(id)?;
        let fresh = Block::new(BlockInit::new(kind, after), &self.registry);
        let fresh_id = fresh.id().clone();
        context::list_mut(&mut self.blocks, &ctx.list)?.insert(ctx.index + 1, fresh);

        self.request_focus(fresh_id.clone(), CaretPlace::Start);
        self.touch();
        self.commit_structure();
        Some(fresh_id)
    }

    /// Append a block's content to its previous sibling and remove it.
    /// Returns the id of the block merged into.
    pub fn merge(&mut self, id: &BlockId) -> Option<BlockId> {
        let ctx = self.context(id)?;
        if ctx.index == 0 {
            log::debug!("Merge skipped: {id} has no previous sibling");
            return None;
        }
        let list = context::list(&self.blocks, &ctx.list)?;
        let (previous, current) = (&list[ctx.index - 1], &list[ctx.index]);

        let structured = |b: &Block| b.kind().is_columns() || b.kind().is_media();
        if structured(previous) || structured(current) {
            log::debug!("Merge skipped: {} into {} not supported", current.kind(), previous.kind());
            return None;
        }
        if !self
            .registry
            .is_merge_compatible(previous.kind(), current.kind())
        {
            log::debug!(
                "Merge skipped: {} does not accept {}",
                previous.kind(),
                current.kind()
            );
            return None;
        }

        let join = previous.text().chars().count();
        let combined = format!("{}{}", previous.content(), current.content());
        let into = previous.id().clone();

        let list = context::list_mut(&mut self.blocks, &ctx.list)?;
        list[ctx.index - 1].set_content(combined);
        list[ctx.index - 1].take_changes();
        list.remove(ctx.index);

        self.request_focus(into.clone(), CaretPlace::Offset(join));
        self.touch();
        self.commit_structure();
        Some(into)
    }

    /// Replace the tree and re-emit.
    ///
    /// Without `force`, a replacement equal to the current list is dropped,
    /// and an unchanged markup string is not emitted again. Lists that match
    /// by [`same_shape`] but differ in styles, classes or attributes are
    /// adopted.
    pub fn update(&mut self, blocks: Option<Vec<Block>>, force: bool) -> bool {
        if let Some(blocks) = blocks {
            if !force && same_shape(&blocks, &self.blocks) && blocks == self.blocks {
                log::debug!("Update skipped: block list unchanged");
                return false;
            }
            self.blocks = blocks;
            self.ensure_top_level();
            self.touch();
        }
        self.commit(Origin::Edit, force)
    }

    /// Run `f` against a block. Content changes are emitted immediately;
    /// style changes raise [`DocumentEvent::StyleChanged`] and are
    /// snapshotted once the debounce delay has passed.
    pub fn edit_block<R>(&mut self, id: &BlockId, f: impl FnOnce(&mut Block) -> R) -> Option<R> {
        let block = context::block_mut(&mut self.blocks, id)?;
        let result = f(block);
        let changes = block.take_changes();

        if changes.contains(&BlockChange::Style) {
            self.events.emit(&DocumentEvent::StyleChanged(block));
            self.debouncer.schedule(id);
        }
        if !changes.is_empty() {
            self.touch();
        }
        if changes.contains(&BlockChange::Content) {
            self.commit(Origin::Edit, false);
        }
        Some(result)
    }

    pub fn toggle_type(&mut self, id: &BlockId, to: BlockType) -> bool {
        let registry = &self.registry;
        let Some(block) = context::block_mut(&mut self.blocks, id) else {
            return false;
        };
        if !block.toggle_type(to, registry) {
            return false;
        }
        block.take_changes();
        self.touch();
        self.commit_structure();
        true
    }

    pub fn set_content(&mut self, id: &BlockId, content: impl Into<String>) -> bool {
        self.edit_block(id, |b| b.set_content(content))
            .unwrap_or(false)
    }

    /// Adopt the surface's rendering of a block as its content.
    pub fn sync_from_surface<S: Surface + ?Sized>(&mut self, id: &BlockId, surface: &S) -> bool {
        let Some(block) = self.find(id) else {
            return false;
        };
        if block.kind().is_media() || block.kind().is_columns() {
            return false;
        }
        let Some(root) = surface.block_root(id) else {
            log::debug!("Sync skipped: block {id} not rendered");
            return false;
        };
        let content = surface.inner_markup(root);
        self.set_content(id, content)
    }

    pub fn select(&mut self, id: &BlockId, additive: bool) -> bool {
        if self.find(id).is_none() {
            return false;
        }
        context::visit_mut(&mut self.blocks, &mut |b| {
            if b.id() == id {
                b.set_selected(true);
            } else if !additive {
                b.set_selected(false);
            }
        });
        true
    }

    pub fn clear_selection(&mut self) {
        context::visit_mut(&mut self.blocks, &mut |b| b.set_selected(false));
    }

    pub fn selected_ids(&self) -> Vec<BlockId> {
        self.blocks
            .iter()
            .flat_map(|b| b.descendants())
            .filter(|b| b.is_selected())
            .map(|b| b.id().clone())
            .collect()
    }

    /// Push a snapshot, the current markup by default.
    pub fn save_state(&mut self, snapshot: Option<String>) -> bool {
        let snapshot = snapshot.unwrap_or_else(|| self.markup());
        self.history.save_state(snapshot)
    }

    pub fn undo(&mut self) -> bool {
        self.flush_pending_styles();
        let current = self.markup();
        let Some(entry) = self.history.undo(&current) else {
            log::debug!("Nothing to undo");
            return false;
        };
        self.restore_snapshot(entry, HistoryDirection::Undo);
        true
    }

    pub fn redo(&mut self) -> bool {
        self.flush_pending_styles();
        let current = self.markup();
        let Some(entry) = self.history.redo(&current) else {
            log::debug!("Nothing to redo");
            return false;
        };
        self.restore_snapshot(entry, HistoryDirection::Redo);
        true
    }

    /// Move the debounce clock forward. Each style slot that comes due runs
    /// a forced update. Returns the number of slots fired.
    pub fn advance(&mut self, elapsed: Duration) -> usize {
        let fired = self.debouncer.advance(elapsed);
        for id in &fired {
            log::debug!("Style snapshot for {id}");
            self.commit(Origin::Edit, true);
        }
        fired.len()
    }

    pub fn has_pending_snapshot(&self) -> bool {
        self.debouncer.has_pending()
    }

    /// Detect the formatting at the surface's selection and raise
    /// [`DocumentEvent::SelectionChanged`].
    pub fn notify_selection_changed<S: Surface + ?Sized>(
        &mut self,
        surface: &S,
    ) -> Option<FormatState> {
        let state = formatting::detect(surface)?;
        self.events.emit(&DocumentEvent::SelectionChanged(&state));
        Some(state)
    }

    /// Commit style edits still waiting on the debounce clock, so history
    /// holds the state before them.
    fn flush_pending_styles(&mut self) {
        if self.debouncer.has_pending() {
            self.debouncer.clear();
            self.commit(Origin::Edit, false);
        }
    }

    fn restore_snapshot(&mut self, markup: String, direction: HistoryDirection) {
        self.blocks = parse_markup(&markup, &self.registry);
        self.debouncer.clear();
        self.focus = None;
        self.touch();
        self.commit(Origin::History, false);
        self.events.emit(&DocumentEvent::HistoryChanged {
            markup: &markup,
            direction,
        });
    }

    fn commit(&mut self, origin: Origin, force: bool) -> bool {
        let markup = self.markup();
        if !force && markup == self.last_emitted {
            log::debug!("Markup unchanged, nothing emitted");
            return false;
        }

        let previous = std::mem::replace(&mut self.last_emitted, markup);
        if origin == Origin::Edit {
            self.history.save_state(previous);
        }

        if let Some(callback) = self.on_change.as_mut()
            && let Err(e) = callback(&self.last_emitted)
        {
            log::warn!("Change callback failed: {e:#}");
        }
        self.events
            .emit(&DocumentEvent::DocumentChanged(&self.blocks));
        true
    }

    /// Commit after a change to the tree's structure. Subscribers hear about
    /// it even when the clean markup is unchanged, as with an inserted empty
    /// block; the change callback and history only see markup changes.
    fn commit_structure(&mut self) {
        if !self.commit(Origin::Edit, false) {
            self.events
                .emit(&DocumentEvent::DocumentChanged(&self.blocks));
        }
    }

    fn drop_stale_focus(&mut self) {
        if let Some(focus) = &self.focus
            && self.find(&focus.block).is_none()
        {
            log::debug!("Dropping focus request for removed block {}", focus.block);
            self.focus = None;
        }
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    fn request_focus(&mut self, block: BlockId, place: CaretPlace) {
        self.focus = Some(FocusRequest { block, place });
    }

    fn ensure_top_level(&mut self) {
        if self.blocks.is_empty() {
            log::debug!("Document emptied, adding a default block");
            self.blocks.push(Block::default_block(&self.registry));
        }
    }

    /// Id of the multi-column block owning the list in `ctx`.
    fn container_of(&self, ctx: &BlockContext) -> Option<BlockId> {
        let (parent, index) = ctx.parent()?;
        context::list(&self.blocks, &parent)?
            .get(index)
            .map(|b| b.id().clone())
    }

    /// Remove `container` if all its columns are empty, then repeat for the
    /// container holding it.
    fn collapse_if_empty(&mut self, container: &BlockId) {
        let mut next = Some(container.clone());
        while let Some(id) = next.take() {
            let Some(ctx) = self.context(&id) else {
                return;
            };
            let emptied = self
                .find(&id)
                .and_then(Block::columns)
                .is_some_and(|cols| cols.iter().all(|c| c.blocks.is_empty()));
            if !emptied {
                return;
            }
            next = self.container_of(&ctx);
            if let Some(list) = context::list_mut(&mut self.blocks, &ctx.list) {
                list.remove(ctx.index);
                log::debug!("Collapsed emptied columns block {id}");
            }
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("blocks", &self.blocks)
            .field("version", &self.version)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DomSurface, Position, SurfaceRange};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc(markup: &str) -> Document {
        Document::from_markup(markup, BlockRegistry::default(), EditorOptions::default())
    }

    fn ids(doc: &Document) -> Vec<BlockId> {
        doc.blocks().iter().map(|b| b.id().clone()).collect()
    }

    fn contents(doc: &Document) -> Vec<String> {
        doc.blocks().iter().map(|b| b.content().to_string()).collect()
    }

    fn caret_in(doc: &Document, id: &BlockId, offset: usize) -> DomSurface {
        let mut surface = DomSurface::render(doc.blocks(), doc.registry());
        selection::place_caret(&mut surface, id, CaretPlace::Offset(offset));
        surface
    }

    #[test]
    fn test_empty_markup_yields_one_default_block() {
        let doc = doc("");
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.blocks()[0].kind(), BlockType::Paragraph);
    }

    #[test]
    fn test_insert_before_and_after() {
        let mut doc = doc("<p>middle</p>");
        let middle = ids(&doc)[0].clone();

        doc.insert_after(&middle, BlockType::Paragraph, "after").unwrap();
        let before = doc.insert_before(&middle, BlockType::H1, "before").unwrap();

        assert_eq!(contents(&doc), vec!["before", "middle", "after"]);
        assert_eq!(
            doc.take_focus_request(),
            Some(FocusRequest {
                block: before,
                place: CaretPlace::Start
            })
        );
        assert_eq!(doc.take_focus_request(), None);
    }

    #[test]
    fn test_insert_with_unknown_anchor_is_noop() {
        let mut doc = doc("<p>x</p>");
        let version = doc.version();
        assert_eq!(doc.insert_after(&BlockId::new("nope"), BlockType::Paragraph, "y"), None);
        assert_eq!(doc.version(), version);
        assert_eq!(doc.blocks().len(), 1);
    }

    #[test]
    fn test_removing_everything_leaves_one_default_block() {
        let mut doc = doc("<p>a</p><p>b</p><h2>c</h2>");
        for id in ids(&doc) {
            assert!(doc.remove_by_id(&id));
        }
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.blocks()[0].kind(), BlockType::Paragraph);
        assert!(doc.blocks()[0].is_content_empty());
    }

    #[test]
    fn test_split_in_middle() {
        let mut doc = doc("<p>aaabbbb</p>");
        let id = ids(&doc)[0].clone();
        let mut surface = caret_in(&doc, &id, 3);

        let fresh = doc.split(&id, &mut surface).unwrap();

        assert_eq!(contents(&doc), vec!["aaa", "bbbb"]);
        assert_eq!(doc.blocks()[1].kind(), BlockType::Paragraph);
        assert_eq!(doc.pending_focus().map(|f| &f.block), Some(&fresh));
        // the surface is left as it was found
        let caret = surface.selection().unwrap().start;
        assert_eq!((surface.text(caret.node), caret.offset), (Some("aaabbbb"), 3));
    }

    #[test]
    fn test_split_keeps_inline_wrappers() {
        let mut doc = doc("<h3>one <b>two three</b></h3>");
        let id = ids(&doc)[0].clone();
        let mut surface = caret_in(&doc, &id, 7);

        doc.split(&id, &mut surface).unwrap();
        assert_eq!(contents(&doc), vec!["one <b>two</b>", "<b> three</b>"]);
        assert_eq!(doc.blocks()[1].kind(), BlockType::H3);
    }

    #[test]
    fn test_split_at_edges_is_noop() {
        for offset in [0, 7] {
            let mut doc = doc("<p>aaabbbb</p>");
            let id = ids(&doc)[0].clone();
            let mut surface = caret_in(&doc, &id, offset);

            assert_eq!(doc.split(&id, &mut surface), None);
            assert_eq!(contents(&doc), vec!["aaabbbb"]);
            assert_eq!(surface.markup(), DomSurface::render(doc.blocks(), doc.registry()).markup());
        }
    }

    #[test]
    fn test_split_without_selection_is_noop() {
        let mut doc = doc("<p>aaabbbb</p>");
        let id = ids(&doc)[0].clone();
        let mut surface = DomSurface::render(doc.blocks(), doc.registry());
        assert_eq!(doc.split(&id, &mut surface), None);

        let other = doc.insert_after(&id, BlockType::Paragraph, "other").unwrap();
        let mut surface = caret_in(&doc, &other, 2);
        assert_eq!(doc.split(&id, &mut surface), None);
    }

    #[test]
    fn test_merge_first_block_is_noop() {
        let mut doc = doc("<p>a</p><p>b</p>");
        let first = ids(&doc)[0].clone();
        assert_eq!(doc.merge(&first), None);
        assert_eq!(doc.blocks().len(), 2);
    }

    #[test]
    fn test_merge_compatible_blocks() {
        let mut doc = doc("<p>foo <i>x</i></p><h2>bar</h2>");
        let [first, second] = [ids(&doc)[0].clone(), ids(&doc)[1].clone()];

        assert_eq!(doc.merge(&second), Some(first.clone()));
        assert_eq!(contents(&doc), vec!["foo <i>x</i>bar"]);
        assert_eq!(
            doc.take_focus_request(),
            Some(FocusRequest {
                block: first,
                place: CaretPlace::Offset(5)
            })
        );
    }

    #[test]
    fn test_merge_incompatible_blocks_is_noop() {
        let mut doc = doc("<pre>code</pre><p>text</p>");
        let second = ids(&doc)[1].clone();
        assert_eq!(doc.merge(&second), None);
        assert_eq!(doc.blocks().len(), 2);
        assert_eq!(doc.history().undo_len(), 0);
    }

    #[test]
    fn test_move_clamps_destination() {
        let mut doc = doc("<p>a</p><p>b</p><p>c</p>");
        let a = ids(&doc)[0].clone();
        assert!(doc.move_block(&a, 99, None));
        assert_eq!(contents(&doc), vec!["b", "c", "a"]);
        assert!(doc.move_block(&a, 0, None));
        assert_eq!(contents(&doc), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_toggle_type_reshapes_list_content() {
        let mut doc = doc("<p>milk</p>");
        let id = ids(&doc)[0].clone();
        assert!(doc.toggle_type(&id, BlockType::UnorderedList));
        assert_eq!(doc.markup(), "<ul><li>milk</li></ul>");
        assert!(doc.toggle_type(&id, BlockType::Paragraph));
        assert_eq!(doc.markup(), "<p>milk</p>");
        assert!(!doc.toggle_type(&id, BlockType::Paragraph));
    }

    #[test]
    fn test_update_with_same_triplets_calls_back_once() {
        let mut doc = doc("<p>a</p>");
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        doc.on_change(Box::new(move |_: &str| -> anyhow::Result<()> {
            *counter.borrow_mut() += 1;
            Ok(())
        }));

        let mut edited = doc.blocks().to_vec();
        edited[0].set_content("b");
        assert!(doc.update(Some(edited.clone()), false));
        assert!(!doc.update(Some(edited), false));
        assert_eq!(*calls.borrow(), 1);

        assert!(doc.update(None, true));
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_failing_change_callback_is_contained() {
        let mut doc = doc("<p>a</p>");
        doc.on_change(Box::new(|_: &str| -> anyhow::Result<()> {
            anyhow::bail!("subscriber exploded")
        }));
        let id = ids(&doc)[0].clone();
        assert!(doc.set_content(&id, "b"));
        assert_eq!(doc.last_emitted(), "<p>b</p>");
    }

    #[test]
    fn test_selection_flags() {
        let mut doc = doc("<p>a</p><p>b</p>");
        let [a, b] = [ids(&doc)[0].clone(), ids(&doc)[1].clone()];

        doc.select(&a, false);
        doc.select(&b, true);
        assert_eq!(doc.selected_ids(), vec![a.clone(), b.clone()]);
        doc.select(&b, false);
        assert_eq!(doc.selected_ids(), vec![b]);
        doc.clear_selection();
        assert!(doc.selected_ids().is_empty());
        assert!(!doc.select(&BlockId::new("nope"), false));
    }

    #[test]
    fn test_sync_from_surface_adopts_edits() {
        let mut doc = doc("<p>hello</p>");
        let id = ids(&doc)[0].clone();
        let mut surface = DomSurface::render(doc.blocks(), doc.registry());
        let root = surface.block_root(&id).unwrap();
        let text = surface.text_nodes(root)[0];
        surface.set_text(text, "hello there");
        surface.set_selection(Some(SurfaceRange::caret(Position::new(text, 0))));

        assert!(doc.sync_from_surface(&id, &surface));
        assert_eq!(doc.markup(), "<p>hello there</p>");
        assert!(doc.history().can_undo());
    }

    #[test]
    fn test_update_adopts_style_only_changes() {
        let mut doc = doc("<p>a</p>");
        let mut styled = doc.blocks().to_vec();
        styled[0].set_style("color", "red");

        assert!(doc.update(Some(styled), false));
        assert_eq!(doc.markup(), r#"<p style="color: red">a</p>"#);
        assert!(doc.history().can_undo());
    }

    #[test]
    fn test_patch_focus_comes_from_its_own_command() {
        let mut doc = doc("<p>a</p><p>b</p>");
        let [a, b] = [ids(&doc)[0].clone(), ids(&doc)[1].clone()];

        let inserted = doc.apply(Cmd::InsertAfter {
            anchor: a.clone(),
            kind: BlockType::Paragraph,
            content: "new".to_string(),
        });
        let fresh = inserted.changed[0].clone();
        assert_eq!(inserted.focus.map(|f| f.block), Some(fresh.clone()));

        let selected = doc.apply(Cmd::Select { id: b, additive: false });
        assert_eq!(selected.focus, None);
        // still waiting for the rendering pass
        assert_eq!(doc.pending_focus().map(|f| &f.block), Some(&fresh));

        let removed = doc.apply(Cmd::Remove { id: fresh });
        assert_eq!(removed.focus, None);
        assert_eq!(doc.pending_focus(), None);
    }
}

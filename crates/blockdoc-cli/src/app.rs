use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use blockdoc_engine::editing::context;
use blockdoc_engine::selection;
use blockdoc_engine::{
    Block, BlockId, BlockRegistry, BlockType, CaretPlace, Cmd, Document, DomSurface,
    EditorOptions, io,
};
use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use relative_path::{RelativePath, RelativePathBuf};

const ALIGNMENTS: [Option<&str>; 4] = [None, Some("left"), Some("center"), Some("right")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Files,
    Blocks,
}

/// One line of the block pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub depth: usize,
    pub id: BlockId,
    pub kind: BlockType,
    pub text: String,
}

/// An open document and the surface it is shown on.
pub struct Session {
    pub path: RelativePathBuf,
    pub doc: Document,
    surface: DomSurface,
    selected: Option<BlockId>,
    caret: usize,
    dirty: bool,
}

impl Session {
    fn new(path: RelativePathBuf, doc: Document) -> Self {
        let surface = DomSurface::render(doc.blocks(), doc.registry());
        let selected = doc.blocks().first().map(|b| b.id().clone());
        let mut session = Self {
            path,
            doc,
            surface,
            selected,
            caret: 0,
            dirty: false,
        };
        session.refresh();
        session
    }

    pub fn selected(&self) -> Option<&BlockId> {
        self.selected.as_ref()
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        collect_rows(self.doc.blocks(), 0, &mut rows);
        rows
    }

    fn selected_block(&self) -> Option<&Block> {
        self.selected.as_ref().and_then(|id| self.doc.find(id))
    }

    /// Re-render after an edit and carry out any pending focus request.
    fn refresh(&mut self) {
        self.surface = DomSurface::render(self.doc.blocks(), self.doc.registry());

        if let Some(focus) = self.doc.take_focus_request() {
            selection::apply_focus(&mut self.surface, &focus);
            self.caret = match focus.place {
                CaretPlace::Start => 0,
                CaretPlace::End => self.text_len(&focus.block),
                CaretPlace::Offset(n) => n,
            };
            self.selected = Some(focus.block);
        }

        let rows = self.rows();
        let still_there = self
            .selected
            .as_ref()
            .is_some_and(|id| rows.iter().any(|r| &r.id == id));
        if !still_there {
            self.selected = rows.first().map(|r| r.id.clone());
            self.caret = 0;
        }
        if let Some(id) = self.selected.clone() {
            self.caret = self.caret.min(self.text_len(&id));
            self.doc.select(&id, false);
        }
    }

    fn text_len(&self, id: &BlockId) -> usize {
        self.doc.find(id).map_or(0, |b| b.text().chars().count())
    }

    fn select_row(&mut self, delta: isize) {
        let rows = self.rows();
        if rows.is_empty() {
            return;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|id| rows.iter().position(|r| &r.id == id))
            .unwrap_or(0);
        let next = (current as isize + delta).rem_euclid(rows.len() as isize) as usize;
        self.selected = Some(rows[next].id.clone());
        self.caret = 0;
        self.refresh();
    }

    fn move_caret(&mut self, delta: isize) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        let len = self.text_len(&id) as isize;
        self.caret = (self.caret as isize + delta).clamp(0, len) as usize;
        selection::place_caret(&mut self.surface, &id, CaretPlace::Offset(self.caret));
    }

    /// Run an edit against the selected block; returns a status line.
    fn edit(&mut self, key: char) -> Option<String> {
        let id = self.selected.clone()?;
        let changed = match key {
            'o' | 'O' => {
                let cmd = if key == 'o' {
                    Cmd::InsertAfter {
                        anchor: id,
                        kind: self.doc.registry().default_type,
                        content: String::new(),
                    }
                } else {
                    Cmd::InsertBefore {
                        anchor: id,
                        kind: self.doc.registry().default_type,
                        content: String::new(),
                    }
                };
                !self.doc.apply(cmd).changed.is_empty()
            }
            'd' => !self.doc.apply(Cmd::Remove { id }).changed.is_empty(),
            'J' => self.shift(&id, 1),
            'K' => self.shift(&id, -1),
            'm' => !self.doc.apply(Cmd::Merge { id }).changed.is_empty(),
            's' => {
                selection::place_caret(&mut self.surface, &id, CaretPlace::Offset(self.caret));
                self.doc.split(&id, &mut self.surface).is_some()
            }
            't' => {
                let to = self.next_type(&id)?;
                !self.doc.apply(Cmd::ToggleType { id, to }).changed.is_empty()
            }
            'a' => self.cycle_alignment(&id),
            'u' => self.doc.undo(),
            'r' => self.doc.redo(),
            _ => return None,
        };

        if !changed {
            return Some("Nothing changed".to_string());
        }
        self.dirty = true;
        self.refresh();
        Some(format!("v{}", self.doc.version()))
    }

    /// Move a block one place within its own list.
    fn shift(&mut self, id: &BlockId, delta: isize) -> bool {
        let Some(ctx) = self.doc.context(id) else {
            return false;
        };
        let Some(siblings) = context::list(self.doc.blocks(), &ctx.list) else {
            return false;
        };
        let to = ctx.index as isize + delta;
        if to < 0 || to as usize >= siblings.len() {
            return false;
        }
        // Column lists are addressed through a sibling
        let anchor = if ctx.list.is_top_level() {
            None
        } else {
            siblings
                .iter()
                .map(|b| b.id().clone())
                .find(|sibling| sibling != id)
        };
        let patch = self.doc.apply(Cmd::Move {
            id: id.clone(),
            to: to as usize,
            anchor,
        });
        !patch.changed.is_empty()
    }

    /// The first type after the current one, in declaration order, that the
    /// registry allows switching to.
    fn next_type(&self, id: &BlockId) -> Option<BlockType> {
        let kind = self.doc.find(id)?.kind();
        let targets = self.doc.registry().transitions(kind);
        let start = BlockType::ALL.iter().position(|k| *k == kind)?;
        (1..BlockType::ALL.len())
            .map(|step| BlockType::ALL[(start + step) % BlockType::ALL.len()])
            .find(|k| targets.contains(k))
    }

    fn cycle_alignment(&mut self, id: &BlockId) -> bool {
        let Some(block) = self.doc.find(id) else {
            return false;
        };
        let current = block.styles().get("text-align");
        let position = ALIGNMENTS.iter().position(|a| *a == current).unwrap_or(0);
        let next = ALIGNMENTS[(position + 1) % ALIGNMENTS.len()];

        self.doc
            .edit_block(id, |b| match next {
                Some(align) => b.set_style("text-align", align),
                None => b.remove_style("text-align"),
            })
            .unwrap_or(false)
    }
}

fn collect_rows(blocks: &[Block], depth: usize, rows: &mut Vec<Row>) {
    for block in blocks {
        let text = if block.kind().is_media() {
            block.content().to_string()
        } else {
            block.text()
        };
        rows.push(Row {
            depth,
            id: block.id().clone(),
            kind: block.kind(),
            text,
        });
        for column in block.columns().unwrap_or_default() {
            collect_rows(&column.blocks, depth + 1, rows);
        }
    }
}

pub struct App {
    documents_path: PathBuf,
    registry: BlockRegistry,
    options: EditorOptions,
    pub files: Vec<RelativePathBuf>,
    pub file_list_state: ListState,
    pub pane: Pane,
    pub session: Option<Session>,
    pub status: String,
}

impl App {
    pub fn new(
        documents_path: PathBuf,
        registry: BlockRegistry,
        options: EditorOptions,
    ) -> Result<Self> {
        let files = io::scan_documents(&documents_path)?
            .iter()
            .filter_map(|p| p.strip_prefix(&documents_path).ok())
            .filter_map(|p| RelativePathBuf::from_path(p).ok())
            .collect::<Vec<_>>();

        let mut file_list_state = ListState::default();
        if !files.is_empty() {
            file_list_state.select(Some(0));
        }

        Ok(Self {
            documents_path,
            registry,
            options,
            files,
            file_list_state,
            pane: Pane::Files,
            session: None,
            status: String::new(),
        })
    }

    /// Handle one key press. Returns false when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        match (self.pane, code) {
            (_, KeyCode::Char('q')) => return Ok(false),
            (_, KeyCode::Tab) => {
                self.pane = match self.pane {
                    Pane::Files => Pane::Blocks,
                    Pane::Blocks => Pane::Files,
                };
            }
            (_, KeyCode::Char('w')) => self.write()?,
            (Pane::Files, KeyCode::Down | KeyCode::Char('j')) => self.step_file(1),
            (Pane::Files, KeyCode::Up | KeyCode::Char('k')) => self.step_file(-1),
            (Pane::Files, KeyCode::Enter) => self.open_selected()?,
            (Pane::Blocks, code) => self.handle_block_key(code),
            _ => {}
        }
        Ok(true)
    }

    /// Advance the style snapshot clock of the open document.
    pub fn tick(&mut self, elapsed: Duration) {
        if let Some(session) = self.session.as_mut()
            && session.doc.advance(elapsed) > 0
        {
            log::debug!("Style snapshot taken for {}", session.path);
        }
    }

    fn handle_block_key(&mut self, code: KeyCode) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match code {
            KeyCode::Down | KeyCode::Char('j') => session.select_row(1),
            KeyCode::Up | KeyCode::Char('k') => session.select_row(-1),
            KeyCode::Left | KeyCode::Char('h') => session.move_caret(-1),
            KeyCode::Right | KeyCode::Char('l') => session.move_caret(1),
            KeyCode::Char(c) => {
                if let Some(status) = session.edit(c) {
                    self.status = status;
                }
            }
            _ => {}
        }
    }

    fn step_file(&mut self, delta: isize) {
        if self.files.is_empty() {
            return;
        }
        let current = self.file_list_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(self.files.len() as isize) as usize;
        self.file_list_state.select(Some(next));
    }

    fn open_selected(&mut self) -> Result<()> {
        let Some(path) = self
            .file_list_state
            .selected()
            .and_then(|i| self.files.get(i))
            .cloned()
        else {
            return Ok(());
        };
        self.open(&path)
    }

    pub fn open(&mut self, path: &RelativePath) -> Result<()> {
        let markup = io::read_document(path, &self.documents_path)
            .with_context(|| format!("Failed to open {path}"))?;
        let doc = Document::from_markup(&markup, self.registry.clone(), self.options.clone());
        log::info!("Opened {path} with {} blocks", doc.blocks().len());

        self.session = Some(Session::new(path.to_relative_path_buf(), doc));
        self.pane = Pane::Blocks;
        self.status = format!("Opened {path}");
        Ok(())
    }

    fn write(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        io::write_document(&session.path, &self.documents_path, &session.doc.markup())?;
        session.dirty = false;
        log::info!("Wrote {}", session.path);
        self.status = format!("Wrote {}", session.path);
        Ok(())
    }
}

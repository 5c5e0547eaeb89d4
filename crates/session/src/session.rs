//! The edit-commit controller: one session per open document window.
//!
//! A `Session` translates discrete input commands into engine transactions
//! and keeps the grid display, the selection fields, and the document
//! lifecycle consistent after every one of them. It owns the engine and
//! the document state; the display surface and dialog chrome are passed
//! into each operation, so nothing here depends on a live UI.
//!
//! Every operation runs to completion on the caller's single thread before
//! the next input event is processed. The only deferred work is the clear
//! of the transient "saved" acknowledgment, modeled as an epoch-guarded
//! one-shot callback (see [`Session::notice_elapsed`]).

use std::path::Path;

use gridpad_core::cell_ref::{CellRef, InvalidNameError};
use gridpad_core::selection::{Direction, Selection};

use crate::document::{CloseOutcome, Document, SaveOutcome};
use crate::engine::Engine;
use crate::error::{display_text, EditError};
use crate::surface::{Chrome, CloseChoice, GridView};

/// Time units the "saved" acknowledgment stays visible before its
/// scheduled clear fires.
pub const SAVED_NOTICE_DELAY: u64 = 5;

/// Discrete input events, decoupled from any particular input surface.
///
/// Key presses, button activations, and menu actions all reduce to these;
/// the window chrome maps whatever bindings it likes onto them.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Select(CellRef),
    Move(Direction),
    Commit(String),
    Save,
    SaveAs,
    Close,
}

/// Reply from [`Session::dispatch`] for outcomes the window must act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    Done,
    /// A commit was refused or a save did not complete.
    Rejected,
    /// The window may close.
    CloseApproved,
    /// The user vetoed the close; the document stays open.
    CloseVetoed,
}

#[derive(Debug)]
pub struct Session<E: Engine> {
    engine: E,
    selection: Selection,
    document: Document,
    notice_epoch: u64,
}

impl<E: Engine> Session<E> {
    /// Session over a fresh, empty document.
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            selection: Selection::new(),
            document: Document::new(),
            notice_epoch: 0,
        }
    }

    /// Session over a document loaded from `path`. The document is born
    /// bound, so plain Save writes back to the same file without asking.
    pub fn open(path: &Path) -> Result<Self, EditError> {
        let engine = E::load_from(path).map_err(EditError::Persistence)?;
        Ok(Self {
            engine,
            selection: Selection::new(),
            document: Document::bound_to(path.to_path_buf()),
            notice_epoch: 0,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selected(&self) -> CellRef {
        self.selection.active()
    }

    /// Paint the full grid and the selection fields onto a fresh view.
    /// Called once when the window comes up.
    pub fn present(&self, view: &mut dyn GridView) {
        self.refresh_all(view);
        self.refresh_selection(view);
    }

    /// Route one input event to its operation.
    pub fn dispatch(&mut self, cmd: Command, view: &mut dyn GridView, chrome: &mut dyn Chrome) -> Reply {
        match cmd {
            Command::Select(cell) => {
                self.select(cell, view);
                Reply::Done
            }
            Command::Move(dir) => {
                self.move_selection(dir, view);
                Reply::Done
            }
            Command::Commit(text) => match self.commit(&text, view, chrome) {
                Ok(()) => Reply::Done,
                Err(_) => Reply::Rejected,
            },
            Command::Save => match self.save_requested(view, chrome) {
                SaveOutcome::Saved => Reply::Done,
                SaveOutcome::Cancelled | SaveOutcome::Failed => Reply::Rejected,
            },
            Command::SaveAs => match self.save_as_requested(view, chrome) {
                SaveOutcome::Saved => Reply::Done,
                SaveOutcome::Cancelled | SaveOutcome::Failed => Reply::Rejected,
            },
            Command::Close => match self.close_requested(view, chrome) {
                CloseOutcome::Close => Reply::CloseApproved,
                CloseOutcome::Veto => Reply::CloseVetoed,
            },
        }
    }

    /// Select `cell` and republish the selection fields.
    pub fn select(&mut self, cell: CellRef, view: &mut dyn GridView) {
        self.selection.select(cell);
        self.refresh_selection(view);
    }

    /// Direct selection by typed name, gated by the address translator.
    /// This is the one path that can surface [`InvalidNameError`]; arrow
    /// navigation self-clamps and never produces an out-of-grid address.
    pub fn jump_to(&mut self, name: &str, view: &mut dyn GridView) -> Result<(), InvalidNameError> {
        let cell = CellRef::parse(name)?;
        self.select(cell, view);
        Ok(())
    }

    /// Move the selection one cell; a move off the grid edge is a no-op
    /// and fires no refresh.
    pub fn move_selection(&mut self, dir: Direction, view: &mut dyn GridView) {
        if self.selection.step(dir) {
            self.refresh_selection(view);
        }
    }

    /// Commit `text` as the new content of the selected cell.
    ///
    /// On engine rejection the transaction aborts: nothing on the display
    /// or the document changes, the error is acknowledged modally and also
    /// returned. On acceptance the document goes dirty (even when the new
    /// value is an evaluation error), the edited cell is redrawn, and every
    /// non-empty cell is re-fetched and re-pushed.
    pub fn commit(
        &mut self,
        text: &str,
        view: &mut dyn GridView,
        chrome: &mut dyn Chrome,
    ) -> Result<(), EditError> {
        let cell = self.selection.active();
        let name = cell.name();

        if let Err(rejection) = self.engine.set_contents(&name, text) {
            let err = EditError::from(rejection);
            chrome.alert(&err.to_string());
            return Err(err);
        }

        self.document.mark_dirty();
        view.set_cell(cell, &display_text(&self.engine.value(&name)));
        self.refresh_all(view);
        self.refresh_selection(view);
        Ok(())
    }

    /// Save to the bound path, or ask for a destination first when the
    /// document has never been saved. Picker cancel aborts silently.
    pub fn save_requested(&mut self, view: &mut dyn GridView, chrome: &mut dyn Chrome) -> SaveOutcome {
        let path = match self.document.path() {
            Some(p) => p.to_path_buf(),
            None => match chrome.pick_save_path() {
                Some(p) => p,
                None => return SaveOutcome::Cancelled,
            },
        };
        self.save_to(&path, view, chrome)
    }

    /// Always ask for a destination; success rebinds the document.
    pub fn save_as_requested(&mut self, view: &mut dyn GridView, chrome: &mut dyn Chrome) -> SaveOutcome {
        match chrome.pick_save_path() {
            Some(path) => self.save_to(&path, view, chrome),
            None => SaveOutcome::Cancelled,
        }
    }

    fn save_to(&mut self, path: &Path, view: &mut dyn GridView, chrome: &mut dyn Chrome) -> SaveOutcome {
        match self.engine.save(path) {
            Ok(()) => {
                self.document.finalize_save(path);
                self.notice_epoch += 1;
                view.saved_notice(true);
                chrome.schedule_notice_clear(SAVED_NOTICE_DELAY, self.notice_epoch);
                SaveOutcome::Saved
            }
            Err(msg) => {
                // Path and dirty flag stay exactly as they were.
                let err = EditError::Persistence(msg);
                chrome.alert(&err.to_string());
                SaveOutcome::Failed
            }
        }
    }

    /// A scheduled notice clear fired. A stale epoch means a later save
    /// re-armed the notice, so the acknowledgment stays visible until the
    /// last scheduled firing arrives.
    pub fn notice_elapsed(&mut self, epoch: u64, view: &mut dyn GridView) {
        if epoch == self.notice_epoch {
            view.saved_notice(false);
        }
    }

    /// Decide whether the window may close. Clean documents close
    /// unconditionally; dirty ones put the save/discard/cancel choice to
    /// the user, and an unfinished save-then-close vetoes the close rather
    /// than lose data.
    pub fn close_requested(&mut self, view: &mut dyn GridView, chrome: &mut dyn Chrome) -> CloseOutcome {
        if !self.document.is_dirty() && !self.engine.changed() {
            return CloseOutcome::Close;
        }
        match chrome.ask_close_choice() {
            CloseChoice::Save => match self.save_requested(view, chrome) {
                SaveOutcome::Saved => CloseOutcome::Close,
                SaveOutcome::Cancelled | SaveOutcome::Failed => CloseOutcome::Veto,
            },
            CloseChoice::Discard => CloseOutcome::Close,
            CloseChoice::Cancel => CloseOutcome::Veto,
        }
    }

    /// Republish the selected cell's name, value, and raw contents. This
    /// is the single path that keeps the edit surface in step with the
    /// engine after any selection change or accepted edit.
    fn refresh_selection(&self, view: &mut dyn GridView) {
        let cell = self.selection.active();
        let name = cell.name();
        let value = display_text(&self.engine.value(&name));
        let contents = self.engine.contents(&name);
        view.show_selection(&name, &value, &contents);
    }

    /// Blanket recalculation fan-out: re-fetch and re-push every non-empty
    /// cell instead of chasing dependents of one edit. At 26x99 the full
    /// redraw is cheap, and it cannot leave a stale value on screen.
    fn refresh_all(&self, view: &mut dyn GridView) {
        for name in self.engine.non_empty_cells() {
            let Ok(cell) = CellRef::parse(&name) else { continue };
            view.set_cell(cell, &display_text(&self.engine.value(&name)));
        }
    }
}

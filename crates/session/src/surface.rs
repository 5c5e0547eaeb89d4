//! Presentation contracts fulfilled by the window chrome.
//!
//! The session pushes display state out through [`GridView`] and requests
//! dialogs and deferred actions through [`Chrome`]. Both are traits so the
//! whole commit pipeline runs against recorded doubles in tests; any input
//! surface that can deliver [`crate::session::Command`] values and
//! implement these two traits gets the full editing behavior.

use std::path::PathBuf;

use gridpad_core::cell_ref::CellRef;

/// Passive display surface: the cell grid plus the edit-surface fields.
pub trait GridView {
    /// Push display text for one cell at its grid coordinates.
    fn set_cell(&mut self, cell: CellRef, text: &str);

    /// Republish the selected cell's name, computed value, and raw
    /// contents to the name/value/content fields.
    fn show_selection(&mut self, name: &str, value: &str, contents: &str);

    /// Show or hide the transient "saved" acknowledgment.
    fn saved_notice(&mut self, visible: bool);
}

/// User's answer to the unsaved-changes prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseChoice {
    /// Save first, then close.
    Save,
    /// Close and drop the unsaved edits.
    Discard,
    /// Keep the document open.
    Cancel,
}

/// Dialog and timer services owned by the window chrome.
pub trait Chrome {
    /// Blocking modal acknowledgment of an error message. Returns once the
    /// user has dismissed it.
    fn alert(&mut self, message: &str);

    /// Ask the user for a save destination. `None` means cancelled.
    fn pick_save_path(&mut self) -> Option<PathBuf>;

    /// Ask what to do with unsaved changes before closing.
    fn ask_close_choice(&mut self) -> CloseChoice;

    /// Schedule a one-shot call to `Session::notice_elapsed(epoch)` after
    /// `delay` time units on the event loop. A scheduled firing is never
    /// cancelled; the session ignores stale epochs.
    fn schedule_notice_clear(&mut self, delay: u64, epoch: u64);
}

//! Document identity and dirty/saved lifecycle.

use std::path::{Path, PathBuf};

/// File binding and dirty state for one open document.
///
/// A fresh document is unbound; the path binds on the first successful
/// save and plain Save then reuses it without prompting. A document opened
/// from an existing file is born bound to that file.
#[derive(Clone, Debug, Default)]
pub struct Document {
    path: Option<PathBuf>,
    dirty: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document opened from an existing file: bound and clean.
    pub fn bound_to(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            dirty: false,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// File name for the title bar, or "Untitled" before the first save.
    pub fn file_name(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    }

    /// An edit was accepted by the engine. The flag is set even when the
    /// resulting value is an evaluation error: the edit itself succeeded.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// A write to `path` succeeded: bind the path and clear the dirty flag.
    /// Failed writes must not reach this; they leave both fields untouched.
    pub fn finalize_save(&mut self, path: &Path) {
        self.path = Some(path.to_path_buf());
        self.dirty = false;
    }
}

/// Result of a save request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The user cancelled the destination picker; nothing was written.
    Cancelled,
    /// The write failed; path and dirty flag are untouched.
    Failed,
}

/// Verdict of a close request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    Close,
    Veto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unbound_and_clean() {
        let doc = Document::new();
        assert_eq!(doc.path(), None);
        assert!(!doc.is_dirty());
        assert_eq!(doc.file_name(), "Untitled");
    }

    #[test]
    fn test_finalize_save_binds_and_cleans() {
        let mut doc = Document::new();
        doc.mark_dirty();
        doc.finalize_save(Path::new("/tmp/ledger.sprd"));
        assert!(!doc.is_dirty());
        assert_eq!(doc.path(), Some(Path::new("/tmp/ledger.sprd")));
        assert_eq!(doc.file_name(), "ledger.sprd");
    }

    #[test]
    fn test_bound_to_is_clean() {
        let doc = Document::bound_to(PathBuf::from("/tmp/budget.sprd"));
        assert!(!doc.is_dirty());
        assert_eq!(doc.file_name(), "budget.sprd");
    }

    #[test]
    fn test_dirty_survives_repeated_edits() {
        let mut doc = Document::new();
        doc.mark_dirty();
        doc.mark_dirty();
        assert!(doc.is_dirty());
    }
}

//! Client-side edit buffers with linear undo/redo, plus the search debounce.
//!
//! The web client keeps two independent draft buffers (the new-note form and
//! the currently open note's edit form). Each content change pushes the
//! previous value onto the undo stack and invalidates the redo stack; saving,
//! cancelling, or closing a form resets both stacks. None of this state is
//! ever persisted — "save" submits only the final buffer value.

use std::time::{Duration, Instant};

use uuid::Uuid;

/// A linear-history undo/redo buffer over a string draft.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    value: String,
    undo_stack: Vec<String>,
    redo_stack: Vec<String>,
}

impl EditBuffer {
    /// Create a buffer seeded with an initial value and empty history.
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            value: initial.into(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Current draft value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Apply an edit: the previous value becomes undoable and any redo
    /// history is invalidated.
    pub fn edit(&mut self, new_value: impl Into<String>) {
        let new_value = new_value.into();
        if new_value == self.value {
            return;
        }
        self.undo_stack.push(std::mem::replace(&mut self.value, new_value));
        self.redo_stack.clear();
    }

    /// Undo the last edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(previous) => {
                self.redo_stack
                    .push(std::mem::replace(&mut self.value, previous));
                true
            }
            None => false,
        }
    }

    /// Redo a previously undone edit. Returns false when there is nothing
    /// to redo.
    pub fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                self.undo_stack
                    .push(std::mem::replace(&mut self.value, next));
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Reset to a fresh value with empty history (form close/save/cancel).
    pub fn reset(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

/// Per-session UI editing state: one buffer for the creation draft and one
/// for the currently open note, keyed by note id. The two histories are
/// fully independent.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    create_draft: EditBuffer,
    open_note: Option<(Uuid, EditBuffer)>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_draft(&mut self) -> &mut EditBuffer {
        &mut self.create_draft
    }

    /// Discard the creation draft (after save or cancel).
    pub fn close_create_draft(&mut self) {
        self.create_draft.reset("");
    }

    /// Open a note for editing, seeding the edit buffer with its content.
    /// Any previously open note's history is dropped.
    pub fn open_note(&mut self, note_id: Uuid, content: impl Into<String>) -> &mut EditBuffer {
        self.open_note = Some((note_id, EditBuffer::new(content)));
        self.edit_draft().unwrap()
    }

    /// The edit buffer for the open note, if any.
    pub fn edit_draft(&mut self) -> Option<&mut EditBuffer> {
        self.open_note.as_mut().map(|(_, buf)| buf)
    }

    pub fn open_note_id(&self) -> Option<Uuid> {
        self.open_note.as_ref().map(|(id, _)| *id)
    }

    /// Close the open note's edit form, dropping its history.
    pub fn close_note(&mut self) {
        self.open_note = None;
    }
}

/// Fixed-delay keystroke debounce deciding when a search request may fire.
///
/// Pure clock-in, decision-out: the caller reports keystrokes with a
/// timestamp and polls [`SearchDebounce::ready`] with the current time.
#[derive(Debug, Clone)]
pub struct SearchDebounce {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

/// Delay applied after the last keystroke before a List call is issued.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

impl SearchDebounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a keystroke, restarting the delay window.
    pub fn input(&mut self, query: impl Into<String>, at: Instant) {
        self.pending = Some((query.into(), at));
    }

    /// Return the query to issue if the delay has elapsed, consuming it.
    pub fn ready(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, at)) if now.duration_since(*at) >= self.delay => {
                self.pending.take().map(|(q, _)| q)
            }
            _ => None,
        }
    }
}

impl Default for SearchDebounce {
    fn default() -> Self {
        Self::new(DEFAULT_SEARCH_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undo_twice_then_redo_twice() {
        let mut buf = EditBuffer::new("a");
        buf.edit("ab");
        buf.edit("abc");

        assert!(buf.undo());
        assert_eq!(buf.value(), "ab");
        assert!(buf.undo());
        assert_eq!(buf.value(), "a");
        assert!(!buf.undo());

        assert!(buf.redo());
        assert_eq!(buf.value(), "ab");
        assert!(buf.redo());
        assert_eq!(buf.value(), "abc");
        assert!(!buf.redo());
    }

    #[test]
    fn test_new_edit_after_undo_clears_redo() {
        let mut buf = EditBuffer::new("a");
        buf.edit("ab");
        buf.edit("abc");
        buf.undo();
        assert!(buf.can_redo());

        buf.edit("abX");
        assert!(!buf.can_redo());
        assert!(!buf.redo());
        assert_eq!(buf.value(), "abX");

        // The divergent history still undoes linearly.
        buf.undo();
        assert_eq!(buf.value(), "ab");
    }

    #[test]
    fn test_identical_edit_is_a_no_op() {
        let mut buf = EditBuffer::new("a");
        buf.edit("a");
        assert!(!buf.can_undo());
    }

    #[test]
    fn test_reset_clears_both_stacks() {
        let mut buf = EditBuffer::new("a");
        buf.edit("ab");
        buf.undo();
        assert!(buf.can_redo());

        buf.reset("saved");
        assert_eq!(buf.value(), "saved");
        assert!(!buf.can_undo());
        assert!(!buf.can_redo());
    }

    #[test]
    fn test_session_buffers_are_independent() {
        let mut session = EditorSession::new();
        session.create_draft().edit("draft text");

        let note_id = Uuid::now_v7();
        session.open_note(note_id, "stored content");
        session.edit_draft().unwrap().edit("stored content, edited");

        // Undoing the edit draft leaves the creation draft alone.
        assert!(session.edit_draft().unwrap().undo());
        assert_eq!(session.edit_draft().unwrap().value(), "stored content");
        assert_eq!(session.create_draft().value(), "draft text");
        assert_eq!(session.open_note_id(), Some(note_id));
    }

    #[test]
    fn test_closing_note_drops_history() {
        let mut session = EditorSession::new();
        session.open_note(Uuid::now_v7(), "content");
        session.edit_draft().unwrap().edit("content!");
        session.close_note();
        assert!(session.edit_draft().is_none());
        assert!(session.open_note_id().is_none());
    }

    #[test]
    fn test_debounce_fires_only_after_quiet_period() {
        let mut debounce = SearchDebounce::new(Duration::from_millis(300));
        let t0 = Instant::now();

        debounce.input("mi", t0);
        assert_eq!(debounce.ready(t0 + Duration::from_millis(100)), None);

        // A fresh keystroke restarts the window.
        debounce.input("milk", t0 + Duration::from_millis(200));
        assert_eq!(debounce.ready(t0 + Duration::from_millis(400)), None);

        let fired = debounce.ready(t0 + Duration::from_millis(500));
        assert_eq!(fired.as_deref(), Some("milk"));

        // Consumed: does not fire twice.
        assert_eq!(debounce.ready(t0 + Duration::from_secs(1)), None);
    }
}

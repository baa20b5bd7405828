//! Local view of a notebook's notes.

use notebook_protocol::{Note, NoteId, SyncState};

/// The authoritative local view of the notes of one notebook.
///
/// Notes are kept sorted by `(position, id)`, which is the render order.
/// The store never talks to the network; the session couples every
/// mutation here with the matching queue entry.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
    next_position: u64,
}

impl NoteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `notes`.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let mut store = Self::new();
        store.apply_remote_snapshot(notes);
        store
    }

    /// Adds a note with a freshly minted id at the end of the order.
    ///
    /// The note starts out `Pending`.
    pub fn add_note(&mut self, content: impl Into<String>) -> Note {
        let note = Note::new(NoteId::new(), content, self.next_position);
        self.next_position += 1;
        self.notes.push(note.clone());
        note
    }

    /// Replaces the content of a note and marks it `Pending`.
    ///
    /// Returns the updated note, or `None` if the note is not present.
    pub fn edit_note(&mut self, id: &NoteId, content: impl Into<String>) -> Option<Note> {
        let note = self.notes.iter_mut().find(|n| n.id == *id)?;
        note.content = content.into();
        note.sync_state = SyncState::Pending;
        Some(note.clone())
    }

    /// Removes a note from the view.
    ///
    /// Returns the removed note, or `None` if it was not present.
    pub fn delete_note(&mut self, id: &NoteId) -> Option<Note> {
        let index = self.notes.iter().position(|n| n.id == *id)?;
        Some(self.notes.remove(index))
    }

    /// Returns the notes in render order.
    pub fn list_notes(&self) -> Vec<Note> {
        self.notes.clone()
    }

    /// Returns a note by id.
    pub fn get(&self, id: &NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == *id)
    }

    /// Replaces the contents of the store with a reconciled list.
    ///
    /// This is the only way remote-origin notes enter the store. Ids in
    /// `notes` must be unique.
    pub fn apply_remote_snapshot(&mut self, mut notes: Vec<Note>) {
        notes.sort_by_key(Note::order_key);
        self.next_position = notes
            .iter()
            .map(|n| n.position.saturating_add(1))
            .max()
            .unwrap_or(0)
            .max(self.next_position);
        self.notes = notes;
    }

    /// Sets the sync state of a note.
    ///
    /// Returns true if the note exists and its state changed.
    pub(crate) fn set_sync_state(&mut self, id: &NoteId, state: SyncState) -> bool {
        match self.notes.iter_mut().find(|n| n.id == *id) {
            Some(note) if note.sync_state != state => {
                note.sync_state = state;
                true
            }
            _ => false,
        }
    }

    /// Returns the number of visible notes.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns true if there are no visible notes.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_appends_in_order() {
        let mut store = NoteStore::new();
        let one = store.add_note("one");
        let two = store.add_note("two");

        assert!(two.position > one.position);
        assert_eq!(one.sync_state, SyncState::Pending);

        let contents: Vec<_> = store.list_notes().into_iter().map(|n| n.content).collect();
        assert_eq!(contents, vec!["one", "two"]);
    }

    #[test]
    fn edit_missing_is_noop() {
        let mut store = NoteStore::new();
        assert!(store.edit_note(&NoteId::new(), "x").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn edit_marks_pending() {
        let mut store = NoteStore::new();
        let note = store.add_note("one");
        store.set_sync_state(&note.id, SyncState::Synced);

        let edited = store.edit_note(&note.id, "one more").unwrap();
        assert_eq!(edited.content, "one more");
        assert_eq!(edited.sync_state, SyncState::Pending);
    }

    #[test]
    fn delete_removes() {
        let mut store = NoteStore::new();
        let note = store.add_note("one");
        assert_eq!(store.delete_note(&note.id).unwrap().id, note.id);
        assert!(store.delete_note(&note.id).is_none());
        assert!(store.get(&note.id).is_none());
    }

    #[test]
    fn snapshot_sorts_and_advances_positions() {
        let mut store = NoteStore::new();
        let a = Note::new(NoteId::new(), "a", 7);
        let b = Note::new(NoteId::new(), "b", 2);
        store.apply_remote_snapshot(vec![a.clone(), b.clone()]);

        let ids: Vec<_> = store.list_notes().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);

        let c = store.add_note("c");
        assert_eq!(c.position, 8);
    }

    #[test]
    fn snapshot_never_reuses_positions() {
        let mut store = NoteStore::new();
        store.add_note("a");
        store.add_note("b");
        store.apply_remote_snapshot(Vec::new());

        let c = store.add_note("c");
        assert_eq!(c.position, 2);
    }

    #[test]
    fn set_sync_state_reports_change() {
        let mut store = NoteStore::new();
        let note = store.add_note("a");
        assert!(store.set_sync_state(&note.id, SyncState::Synced));
        assert!(!store.set_sync_state(&note.id, SyncState::Synced));
        assert!(!store.set_sync_state(&NoteId::new(), SyncState::Failed));
    }
}

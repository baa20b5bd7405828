//! Per-note deduplicated queue of pending operations.

use notebook_protocol::{NoteId, PendingOperation};

/// Ordered queue of mutations awaiting remote confirmation.
///
/// # Invariants
///
/// - At most one entry per note
/// - Entries are ordered by the first time their note was queued; merging a
///   newer mutation keeps the entry in place
/// - Every (re)write stamps the entry with a fresh, strictly increasing
///   revision
#[derive(Debug, Clone)]
pub struct SyncQueue {
    entries: Vec<PendingOperation>,
    next_revision: u64,
}

impl SyncQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_revision: 1,
        }
    }

    /// Restores a queue from persisted entries.
    ///
    /// Duplicate entries for the same note are folded together with the
    /// regular merge rule.
    pub fn from_entries(entries: Vec<PendingOperation>) -> Self {
        let next_revision = entries.iter().map(|e| e.revision).max().unwrap_or(0) + 1;
        let mut queue = Self {
            entries: Vec::with_capacity(entries.len()),
            next_revision,
        };
        for entry in entries {
            let revision = entry.revision;
            match queue.position(&entry.note_id) {
                Some(index) => {
                    queue.entries[index].absorb(entry);
                    queue.entries[index].revision = revision.max(queue.entries[index].revision);
                }
                None => queue.entries.push(entry),
            }
        }
        queue
    }

    /// Enqueues an operation, merging it into an existing entry for the
    /// same note.
    ///
    /// Returns the revision now carried by the note's entry.
    pub fn enqueue(&mut self, operation: PendingOperation) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;

        match self.position(&operation.note_id) {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.absorb(operation);
                entry.revision = revision;
            }
            None => {
                let mut operation = operation;
                operation.revision = revision;
                self.entries.push(operation);
            }
        }
        revision
    }

    /// Returns all entries in queue order.
    pub fn peek_all(&self) -> Vec<PendingOperation> {
        self.entries.clone()
    }

    /// Iterates over the entries in queue order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.entries.iter()
    }

    /// Returns the entry for a note.
    pub fn get(&self, note_id: &NoteId) -> Option<&PendingOperation> {
        self.entries.iter().find(|e| e.note_id == *note_id)
    }

    /// Removes the entry for a note.
    pub fn remove(&mut self, note_id: &NoteId) -> Option<PendingOperation> {
        let index = self.position(note_id)?;
        Some(self.entries.remove(index))
    }

    /// Removes the entry for a note only if it still carries `revision`.
    ///
    /// Returns false when the entry was rewritten (or removed) since that
    /// revision was read, in which case the newer entry stays queued.
    pub fn remove_if_current(&mut self, note_id: &NoteId, revision: u64) -> bool {
        match self.position(note_id) {
            Some(index) if self.entries[index].revision == revision => {
                self.entries.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Returns true if no operations are pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of pending operations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn position(&self, note_id: &NoteId) -> Option<usize> {
        self.entries.iter().position(|e| e.note_id == *note_id)
    }
}

impl Default for SyncQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_protocol::{Note, OperationKind};
    use proptest::prelude::*;

    fn note(content: &str) -> Note {
        Note::new(NoteId::new(), content, 0)
    }

    #[test]
    fn create_update_delete_collapses() {
        let mut queue = SyncQueue::new();
        let mut n = note("one");

        queue.enqueue(PendingOperation::create(&n));
        n.content = "one more".into();
        queue.enqueue(PendingOperation::update(&n));
        queue.enqueue(PendingOperation::delete(n.id));

        let all = queue.peek_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, OperationKind::Delete);
        assert!(all[0].payload.is_none());
    }

    #[test]
    fn update_after_create_stays_create() {
        let mut queue = SyncQueue::new();
        let mut n = note("one");
        queue.enqueue(PendingOperation::create(&n));
        n.content = "two".into();
        queue.enqueue(PendingOperation::update(&n));

        let entry = queue.get(&n.id).unwrap();
        assert_eq!(entry.kind, OperationKind::Create);
        assert_eq!(entry.payload.as_ref().unwrap().content, "two");
    }

    #[test]
    fn merge_preserves_position() {
        let mut queue = SyncQueue::new();
        let a = note("a");
        let b = note("b");
        queue.enqueue(PendingOperation::create(&a));
        queue.enqueue(PendingOperation::create(&b));
        queue.enqueue(PendingOperation::update(&a));

        let order: Vec<_> = queue.iter().map(|e| e.note_id).collect();
        assert_eq!(order, vec![a.id, b.id]);
    }

    #[test]
    fn stale_revision_is_not_removed() {
        let mut queue = SyncQueue::new();
        let n = note("a");
        let first = queue.enqueue(PendingOperation::create(&n));
        let second = queue.enqueue(PendingOperation::update(&n));
        assert!(second > first);

        assert!(!queue.remove_if_current(&n.id, first));
        assert_eq!(queue.len(), 1);
        assert!(queue.remove_if_current(&n.id, second));
        assert!(queue.is_empty());
    }

    #[test]
    fn remove_by_note() {
        let mut queue = SyncQueue::new();
        let n = note("a");
        queue.enqueue(PendingOperation::create(&n));
        assert!(queue.remove(&n.id).is_some());
        assert!(queue.remove(&n.id).is_none());
    }

    #[test]
    fn restore_continues_revisions() {
        let mut queue = SyncQueue::new();
        let n = note("a");
        queue.enqueue(PendingOperation::create(&n));
        let last = queue.enqueue(PendingOperation::update(&n));

        let mut restored = SyncQueue::from_entries(queue.peek_all());
        assert_eq!(restored.get(&n.id).unwrap().revision, last);
        assert!(restored.enqueue(PendingOperation::update(&n)) > last);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Create(usize),
        Update(usize),
        Delete(usize),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0..4usize).prop_map(Step::Create),
            (0..4usize).prop_map(Step::Update),
            (0..4usize).prop_map(Step::Delete),
        ]
    }

    proptest! {
        #[test]
        fn at_most_one_entry_per_note(steps in prop::collection::vec(step_strategy(), 0..40)) {
            let notes: Vec<Note> = (0..4).map(|i| note(&i.to_string())).collect();
            let mut queue = SyncQueue::new();
            let mut first_seen: Vec<NoteId> = Vec::new();
            let mut deleted = [false; 4];

            for step in steps {
                let (index, op) = match step {
                    Step::Create(i) => (i, PendingOperation::create(&notes[i])),
                    Step::Update(i) => (i, PendingOperation::update(&notes[i])),
                    Step::Delete(i) => (i, PendingOperation::delete(notes[i].id)),
                };
                if matches!(op.kind, OperationKind::Delete) {
                    deleted[index] = true;
                }
                if !first_seen.contains(&notes[index].id) {
                    first_seen.push(notes[index].id);
                }
                queue.enqueue(op);
            }

            let order: Vec<NoteId> = queue.iter().map(|e| e.note_id).collect();
            prop_assert_eq!(&order, &first_seen);

            for (i, n) in notes.iter().enumerate() {
                if let Some(entry) = queue.get(&n.id) {
                    prop_assert_eq!(entry.kind == OperationKind::Delete, deleted[i]);
                }
            }
        }
    }
}

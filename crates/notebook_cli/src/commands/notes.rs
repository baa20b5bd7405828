//! Note commands.

use super::{parse_note_id, print_report, Context};
use notebook_protocol::{Note, SyncState};
use serde::Serialize;

/// A note as printed by `list --format json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    /// Note id.
    pub id: String,
    /// Content.
    pub content: String,
    /// Ordering key.
    pub position: u64,
    /// Sync state.
    pub state: &'static str,
}

impl From<&Note> for NoteView {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id.to_string(),
            content: note.content.clone(),
            position: note.position,
            state: state_label(note.sync_state),
        }
    }
}

fn state_label(state: SyncState) -> &'static str {
    match state {
        SyncState::Pending => "pending",
        SyncState::Synced => "synced",
        SyncState::Failed => "failed",
    }
}

/// Runs the list command.
pub async fn list(
    ctx: &Context,
    notebook: &str,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.open(notebook)?;
    let notes = session.reconcile().await?;
    print_report(&session.flush().await);

    match format {
        "json" => {
            let views: Vec<NoteView> = notes.iter().map(NoteView::from).collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        _ => {
            if notes.is_empty() {
                println!("Notebook {} is empty", session.notebook_id());
            }
            for note in &notes {
                println!("{}  [{}]  {}", note.id, state_label(note.sync_state), note.content);
            }
        }
    }
    Ok(())
}

/// Runs the add command.
pub async fn add(
    ctx: &Context,
    notebook: &str,
    content: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.open(notebook)?;
    session.reconcile().await?;
    let note = session.add_note(content)?;
    println!("{}", note.id);
    print_report(&session.flush().await);
    Ok(())
}

/// Runs the edit command.
pub async fn edit(
    ctx: &Context,
    notebook: &str,
    note: &str,
    content: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let note_id = parse_note_id(note)?;
    let session = ctx.open(notebook)?;
    session.reconcile().await?;
    if !session.edit_note(&note_id, content)? {
        return Err(format!("No note {note_id} in notebook {}", session.notebook_id()).into());
    }
    print_report(&session.flush().await);
    Ok(())
}

/// Runs the delete command.
pub async fn delete(
    ctx: &Context,
    notebook: &str,
    note: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let note_id = parse_note_id(note)?;
    let session = ctx.open(notebook)?;
    session.reconcile().await?;
    if !session.delete_note(&note_id)? {
        return Err(format!("No note {note_id} in notebook {}", session.notebook_id()).into());
    }
    print_report(&session.flush().await);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notebook_protocol::NoteId;

    #[test]
    fn json_view() {
        let note = Note::new(NoteId::new(), "milk", 3);
        let json = serde_json::to_value(NoteView::from(&note)).unwrap();
        assert_eq!(json["content"], "milk");
        assert_eq!(json["position"], 3);
        assert_eq!(json["state"], "pending");
    }

    #[tokio::test]
    async fn add_while_service_is_down_keeps_change() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), "http://127.0.0.1:9".into());

        add(&ctx, "offline-book", "written offline").await.unwrap();

        let session = ctx.open("offline-book").unwrap();
        assert_eq!(session.pending_count(), 1);
        assert_eq!(session.list_notes()[0].content, "written offline");
    }
}

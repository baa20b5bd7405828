//! Notebook-level commands.

use super::{print_report, Context};
use notebook_protocol::NotebookId;

/// Runs the new command.
///
/// The notebook exists locally right away; the service learns about it
/// with its first note.
pub async fn new(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let notebook_id = NotebookId::mint(rand::random());
    let session = ctx.open(notebook_id.as_str())?;
    session.reconcile().await?;
    println!("{}", session.share_text());
    Ok(())
}

/// Runs the sync command.
pub async fn sync(ctx: &Context, notebook: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.open(notebook)?;
    let notes = session.reconcile().await?;
    let report = session.flush().await;
    println!("{} note(s)", notes.len());
    if report.is_complete() && report.sent == 0 {
        println!("Nothing to send");
    }
    print_report(&report);
    Ok(())
}

/// Runs the status command.
pub fn status(ctx: &Context, notebook: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.open(notebook)?;
    let pending = session.pending_operations();
    println!(
        "Notebook {}: {} note(s), {} queued change(s)",
        session.notebook_id(),
        session.list_notes().len(),
        pending.len()
    );
    for op in &pending {
        println!("  {:?} {}", op.kind, op.note_id);
    }
    Ok(())
}

/// Runs the share command.
pub fn share(ctx: &Context, notebook: &str) -> Result<(), Box<dyn std::error::Error>> {
    let session = ctx.open(notebook)?;
    println!("{}", session.share_text());
    Ok(())
}

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// The document id is the file stem: `unprocessed/0001234.pdf` → `0001234`.
pub fn document_id(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// PDFs waiting in `dir`, sorted by file name. Subdirectories are ignored.
pub async fn list_pending(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut pending = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && is_pdf(&path) {
            pending.push(path);
        }
    }
    pending.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pending)
}

/// Move a finished document to `<processed_dir>/<id>.pdf`.
///
/// An existing file at the destination is never overwritten; the new one gets
/// a random suffix instead. Returns the final path.
pub async fn move_processed(
    document: &Path,
    processed_dir: &Path,
    document_id: &str,
) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(processed_dir).await?;
    let mut dest = processed_dir.join(format!("{document_id}.pdf"));
    if tokio::fs::try_exists(&dest).await? {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        dest = processed_dir.join(format!("{document_id}-{suffix}.pdf"));
    }

    if tokio::fs::rename(document, &dest).await.is_err() {
        // Different filesystem.
        tokio::fs::copy(document, &dest).await?;
        tokio::fs::remove_file(document).await?;
    }
    Ok(dest)
}

// ── Watch-folder integration ──────────────────────────────────────────────────

/// Spawn a notify watcher on `watch_dir` that sends newly created PDFs to `tx`.
/// The returned watcher must be kept alive for watching to continue.
pub fn spawn_intake_watcher(
    watch_dir: &Path,
    tx: mpsc::Sender<PathBuf>,
) -> notify::Result<impl notify::Watcher> {
    use notify::{EventKind, RecursiveMode, Watcher};

    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        if let Ok(ev) = event {
            if matches!(ev.kind, EventKind::Create(_)) {
                for path in ev.paths.into_iter().filter(|p| is_pdf(p)) {
                    if let Err(e) = tx.try_send(path) {
                        tracing::warn!("Intake queue full, dropping event: {e}");
                    }
                }
            }
        }
    })?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

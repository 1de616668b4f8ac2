//! Orphaned file cleanup command handler

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_cleanup_files(config: &Config) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;

    let report = state
        .video_service
        .cleanup_orphans()
        .await
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    println!("Cleanup of {} complete", config.storage.upload_path);
    println!("{:-<70}", "");
    for name in &report.removed {
        println!("  removed  {name}");
    }
    for (name, error) in &report.failed {
        println!("  FAILED   {name}: {error}");
    }
    println!();
    println!(
        "Removed {} orphaned files, {} failures",
        report.removed.len(),
        report.failed.len()
    );

    Ok(())
}

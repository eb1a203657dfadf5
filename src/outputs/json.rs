//! One-shot JSON export of the feed.
//!
//! Each export lands in its own timestamped file:
//! ```text
//! export_dir/
//! └── hackathons_20251019_142501.json
//! ```

use crate::models::Hackathon;
use chrono::{DateTime, Local};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// File name for an export taken at `at`.
pub fn export_filename(at: DateTime<Local>) -> String {
    format!("hackathons_{}.json", at.format("%Y%m%d_%H%M%S"))
}

/// Write `hackathons` as pretty JSON into `export_dir`.
///
/// # Returns
///
/// The path of the written file.
#[instrument(level = "info", skip_all, fields(export_dir = %export_dir, count = hackathons.len()))]
pub async fn write_feed(
    hackathons: &[Hackathon],
    export_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(hackathons)?;
    let path = PathBuf::from(export_dir).join(export_filename(Local::now()));

    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote hackathon export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Source, sample_hackathon};
    use chrono::TimeZone;

    #[test]
    fn test_export_filename() {
        let at = Local.with_ymd_and_hms(2025, 10, 19, 14, 25, 1).unwrap();
        assert_eq!(export_filename(at), "hackathons_20251019_142501.json");
    }

    #[tokio::test]
    async fn test_write_feed() {
        let dir = tempfile::TempDir::new().unwrap();
        let feed = vec![
            sample_hackathon("HackMIT", Source::Mlh),
            sample_hackathon("Code Jam", Source::HackerEarth),
        ];
        let path = write_feed(&feed, dir.path().to_str().unwrap()).await.unwrap();

        let raw = fs::read_to_string(&path).await.unwrap();
        let back: Vec<Hackathon> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, feed);
        assert!(raw.contains("\n  {"), "pretty printed");
    }
}

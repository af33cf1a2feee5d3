//! Region icons.
//!
//! The images in the region source directory are turned into square PNG
//! icons of a fixed size for the web front end. The output directory is
//! rebuilt on every import.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::images;

/// Outcome of a region icon import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionIconReport {
    /// Image files found in the source directory.
    pub found: usize,
    /// Icons written.
    pub processed: usize,
    /// Files that could not be converted, with the reason.
    pub failed: Vec<String>,
}

/// Image files in `dir` with one of `extensions`, sorted by name.
fn image_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                let ext = format!(".{ext}");
                extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
            });
        if path.is_file() && matches {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Convert every region image into a square icon in the output
/// directory.
///
/// A file that fails to convert is logged and listed in the report; the
/// rest are still processed.
///
/// # Errors
///
/// Returns [`Error::SourceMissing`] if the source directory does not
/// exist, or an I/O error if the directories cannot be read or created.
pub fn import_region_icons(config: &Config) -> Result<RegionIconReport> {
    let source_dir = config.region_icon_source_dir();
    let output_dir = config.region_icon_output_dir();
    let size = config.region_icons.size;

    if !source_dir.is_dir() {
        return Err(Error::SourceMissing { path: source_dir });
    }

    let files = image_files(&source_dir, &config.region_icons.extensions)?;
    info!("Found {} region images in {}", files.len(), source_dir.display());

    if output_dir.exists() {
        std::fs::remove_dir_all(&output_dir)?;
    }
    std::fs::create_dir_all(&output_dir).map_err(|source| Error::DirectoryCreate {
        path: output_dir.clone(),
        source,
    })?;

    let mut report = RegionIconReport {
        found: files.len(),
        ..RegionIconReport::default()
    };
    for file in &files {
        let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let dest = output_dir.join(images::png_name(name));
        match images::fit_square(file, &dest, size) {
            Ok(()) => {
                debug!("Wrote {}", dest.display());
                report.processed += 1;
            }
            Err(e) => {
                warn!("Skipping region image: {e}");
                report.failed.push(format!("{name}: {e}"));
            }
        }
    }

    info!(
        "Region icons: {}/{} written to {}",
        report.processed,
        report.found,
        output_dir.display()
    );
    Ok(report)
}

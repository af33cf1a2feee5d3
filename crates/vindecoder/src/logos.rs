//! Matching brand logo files to factories.
//!
//! Logo files are named after the brand (`general_motors.png`). Both the
//! brand and the factory names are normalized, and a factory gets a logo
//! when the brand name, or one of its configured aliases, appears in the
//! factory name as whole words. Each matched file is written to the logo
//! output directory as a PNG thumbnail of a fixed height, which the HTTP
//! server serves from.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::images;
use crate::storage::{Storage, WmiFactory};

/// Corporate boilerplate that says nothing about the brand.
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(ltd|limited|inc|incorporated|corp|corporation|gmbh|ag|sa|pty|llc|co|auto|cars|suv|plant|joint venture|export)\b",
    )
    .expect("static regex")
});

/// Separators inside brand names.
static DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/,&-]").expect("static regex"));

/// Anything that is not a lowercase letter, digit or whitespace.
static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("static regex"));

/// Number of logos listed in [`LogoImportReport::top_logos`].
const TOP_LOGOS: usize = 10;

/// Normalize a brand or manufacturer name for matching.
///
/// Boilerplate words are removed, the rest is lowercased, `/ , & -`
/// become spaces, other punctuation is dropped and whitespace collapsed:
/// `"Harley-Davidson Motor Co., Inc."` → `"harley davidson motor"`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let name = BOILERPLATE.replace_all(name, "");
    let name = name.to_lowercase();
    let name = DELIMITERS.replace_all(&name, " ");
    let name = NON_ALNUM.replace_all(&name, "");
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A logo file found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoFile {
    /// File name, e.g. `general_motors.png`.
    pub filename: String,
    /// Brand as spelled in the file name, e.g. `general motors`.
    pub brand_name: String,
    /// Normalized brand name followed by its normalized aliases.
    pub search_terms: Vec<String>,
}

/// List the logo files in `dir`, sorted by file name.
///
/// Only files whose extension (case-insensitive) is listed in
/// `extensions` are returned.
///
/// # Errors
///
/// Returns [`Error::SourceMissing`] if `dir` does not exist, or an I/O
/// error if it cannot be read.
pub fn scan_logo_files(
    dir: &Path,
    extensions: &[String],
    aliases: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<LogoFile>> {
    if !dir.is_dir() {
        return Err(Error::SourceMissing {
            path: dir.to_path_buf(),
        });
    }

    let aliases = normalize_aliases(aliases);
    let mut logos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let (Some(filename), Some(stem), Some(ext)) = (
            path.file_name().and_then(|n| n.to_str()),
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            continue;
        };
        let ext = format!(".{}", ext.to_lowercase());
        if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            continue;
        }

        let brand_name = stem.replace('_', " ");
        let normalized = normalize_name(&brand_name);
        let mut search_terms = vec![normalized.clone()];
        if let Some(extra) = aliases.get(&normalized) {
            search_terms.extend(extra.iter().cloned());
        }
        search_terms.dedup();
        search_terms.retain(|t| !t.is_empty());

        logos.push(LogoFile {
            filename: filename.to_string(),
            brand_name,
            search_terms,
        });
    }

    logos.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(logos)
}

/// Aliases keyed and valued by their normalized form, so that
/// `"General Motors" = ["GM"]` applies to `general_motors.png`.
fn normalize_aliases(aliases: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, Vec<String>> {
    let mut normalized: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (brand, terms) in aliases {
        let entry = normalized.entry(normalize_name(brand)).or_default();
        for term in terms.iter().map(|t| normalize_name(t)) {
            if !entry.contains(&term) {
                entry.push(term);
            }
        }
    }
    normalized
}

/// Word-bounded patterns for each search term of a logo.
fn term_patterns(logo: &LogoFile) -> Result<Vec<Regex>> {
    logo.search_terms
        .iter()
        .map(|term| {
            Regex::new(&format!(r"\b{}\b", regex::escape(term)))
                .map_err(|e| Error::internal(format!("bad logo pattern for '{term}': {e}")))
        })
        .collect()
}

/// Logos matching each factory, keyed by factory id.
///
/// A logo is listed at most once per factory.
///
/// # Errors
///
/// Returns an error if a search pattern cannot be compiled.
pub fn find_matches<'a>(
    logos: &'a [LogoFile],
    factories: &[WmiFactory],
) -> Result<BTreeMap<i64, Vec<&'a LogoFile>>> {
    let normalized: Vec<(i64, String)> = factories
        .iter()
        .filter_map(|f| f.id.map(|id| (id, normalize_name(&f.name))))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let mut mappings: BTreeMap<i64, Vec<&LogoFile>> = BTreeMap::new();
    for logo in logos {
        let patterns = term_patterns(logo)?;
        if patterns.is_empty() {
            continue;
        }
        for (id, name) in &normalized {
            if patterns.iter().any(|p| p.is_match(name)) {
                let matched = mappings.entry(*id).or_default();
                if !matched.iter().any(|l| l.filename == logo.filename) {
                    matched.push(logo);
                }
            }
        }
    }
    Ok(mappings)
}

/// Outcome of a logo import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoImportReport {
    /// Logo files found in the source directory.
    pub logos_found: usize,
    /// Factories in the database.
    pub factories_total: usize,
    /// Factories that matched at least one logo.
    pub factories_matched: usize,
    /// PNG thumbnails written to the output directory.
    pub thumbnails_created: usize,
    /// Matched logo files that could not be converted.
    pub thumbnails_failed: Vec<String>,
    /// Factory/logo rows written.
    pub mappings_created: usize,
    /// Logos linked to the most factories.
    pub top_logos: Vec<(String, i64)>,
}

impl LogoImportReport {
    /// Share of factories with a logo, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn coverage_percent(&self) -> f64 {
        if self.factories_total == 0 {
            0.0
        } else {
            self.factories_matched as f64 / self.factories_total as f64 * 100.0
        }
    }
}

fn recreate_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)?;
        debug!("Removed {}", dir.display());
    }
    std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

/// Match the configured logo directory against all factories and
/// replace the stored factory/logo links.
///
/// The output directory is emptied first, then each matched logo is
/// written into it once as `<stem>.png`. A logo that fails to convert is
/// logged and left unlinked; links always use the thumbnail's name.
///
/// # Errors
///
/// Returns an error if the logo directory is missing, a file operation
/// fails, or a database operation fails.
pub fn import(storage: &Storage, config: &Config) -> Result<LogoImportReport> {
    let source_dir = config.logo_source_dir();
    let output_dir = config.logo_output_dir();

    let logos = scan_logo_files(&source_dir, &config.logos.extensions, &config.logos.aliases)?;
    info!("Found {} logos in {}", logos.len(), source_dir.display());

    let factories = storage.factories()?;
    info!("Matching against {} factories", factories.len());

    let mappings = find_matches(&logos, &factories)?;
    info!(
        "Found {} logo mappings across {} factories",
        mappings.values().map(Vec::len).sum::<usize>(),
        mappings.len()
    );

    recreate_dir(&output_dir)?;

    // Source file name to thumbnail name, for the logos that converted
    let mut thumbnails: HashMap<&str, Option<String>> = HashMap::new();
    let mut written = HashSet::new();
    let mut failed = Vec::new();
    for logo in mappings.values().flatten() {
        if thumbnails.contains_key(logo.filename.as_str()) {
            continue;
        }
        // `ford.svg` and `ford.png` share one thumbnail
        let name = images::png_name(&logo.filename);
        if written.contains(&name) {
            thumbnails.insert(logo.filename.as_str(), Some(name));
            continue;
        }
        let result = images::thumbnail_to_height(
            &source_dir.join(&logo.filename),
            &output_dir.join(&name),
            config.logos.thumbnail_height,
        );
        let converted = match result {
            Ok((width, height)) => {
                debug!("Wrote {name} ({width}x{height})");
                written.insert(name.clone());
                Some(name)
            }
            Err(e) => {
                warn!("Skipping logo: {e}");
                failed.push(format!("{}: {e}", logo.filename));
                None
            }
        };
        thumbnails.insert(logo.filename.as_str(), converted);
    }

    let mappings_created = storage.in_transaction(|storage| {
        let removed = storage.clear_logos()?;
        if removed > 0 {
            debug!("Cleared {removed} old logo links");
        }
        let mut created = 0;
        for (factory_id, matched) in &mappings {
            for logo in matched {
                let Some(Some(name)) = thumbnails.get(logo.filename.as_str()) else {
                    continue;
                };
                if storage.insert_logo(*factory_id, name)? {
                    created += 1;
                }
            }
        }
        Ok(created)
    })?;

    let report = LogoImportReport {
        logos_found: logos.len(),
        factories_total: factories.len(),
        factories_matched: mappings.len(),
        thumbnails_created: written.len(),
        thumbnails_failed: failed,
        mappings_created,
        top_logos: storage.top_logos(TOP_LOGOS)?,
    };

    if report.factories_matched == 0 && report.logos_found > 0 {
        warn!("No factory matched any logo");
    }
    info!(
        "Logo import finished: {} mappings, {}/{} factories ({:.1}%)",
        report.mappings_created,
        report.factories_matched,
        report.factories_total,
        report.coverage_percent()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory(id: i64, name: &str) -> WmiFactory {
        WmiFactory {
            id: Some(id),
            wmi: format!("W{id:02}"),
            name: name.to_string(),
            ..WmiFactory::default()
        }
    }

    fn logo(filename: &str, terms: &[&str]) -> LogoFile {
        LogoFile {
            filename: filename.to_string(),
            brand_name: filename.to_string(),
            search_terms: terms.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(
            normalize_name("Harley-Davidson Motor Co., Inc."),
            "harley davidson motor"
        );
        assert_eq!(normalize_name("Ford Motor Company"), "ford motor company");
        assert_eq!(normalize_name("Rolls/Royce & Bentley"), "rolls royce bentley");
        assert_eq!(normalize_name("BMW AG"), "bmw");
        assert_eq!(normalize_name("  Škoda   Auto  "), "koda");
        assert_eq!(normalize_name("SAIC GM Wuling"), "saic gm wuling");
    }

    #[test]
    fn test_normalize_boilerplate_is_word_bounded() {
        // `co` inside `cobra` and `sa` inside `saab` survive
        assert_eq!(normalize_name("Cobra Cars"), "cobra");
        assert_eq!(normalize_name("Saab"), "saab");
        assert_eq!(normalize_name("Tata Motors Joint Venture"), "tata motors");
    }

    #[test]
    fn test_match_respects_word_boundaries() {
        let logos = [logo("ford.png", &["ford"])];
        let factories = [factory(1, "Ford Motor Company"), factory(2, "Stanford Trucks")];

        let matches = find_matches(&logos, &factories).unwrap();
        assert!(matches.contains_key(&1));
        assert!(!matches.contains_key(&2));
    }

    #[test]
    fn test_match_multi_word_and_alias() {
        let logos = [logo("general_motors.png", &["general motors", "gm"])];
        let factories = [
            factory(1, "General Motors LLC"),
            factory(2, "GM Korea"),
            factory(3, "General Dynamics Motors"),
        ];

        let matches = find_matches(&logos, &factories).unwrap();
        assert_eq!(matches.keys().copied().collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn test_match_lists_logo_once() {
        let logos = [logo("vw.png", &["volkswagen", "vw"])];
        let factories = [factory(1, "Volkswagen VW")];

        let matches = find_matches(&logos, &factories).unwrap();
        assert_eq!(matches[&1].len(), 1);
    }

    #[test]
    fn test_scan_logo_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["general_motors.png", "ford.SVG", "notes.txt", "volkswagen.jpg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let config = Config::default();
        let logos =
            scan_logo_files(dir.path(), &config.logos.extensions, &config.logos.aliases).unwrap();

        let names: Vec<_> = logos.iter().map(|l| l.filename.as_str()).collect();
        assert_eq!(names, ["ford.SVG", "general_motors.png", "volkswagen.jpg"]);
        assert_eq!(logos[1].brand_name, "general motors");
        assert_eq!(logos[1].search_terms, ["general motors", "gm"]);
        assert_eq!(logos[2].search_terms, ["volkswagen", "vw"]);
    }

    #[test]
    fn test_scan_normalizes_alias_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("general_motors.png"), b"x").unwrap();
        std::fs::write(dir.path().join("mercedes_benz.png"), b"x").unwrap();

        let aliases = BTreeMap::from([
            ("General Motors".to_string(), vec!["GM".to_string()]),
            ("Mercedes-Benz".to_string(), vec!["Daimler AG".to_string()]),
        ]);
        let logos = scan_logo_files(dir.path(), &[".png".to_string()], &aliases).unwrap();

        assert_eq!(logos[0].search_terms, ["general motors", "gm"]);
        assert_eq!(logos[1].search_terms, ["mercedes benz", "daimler"]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let err = scan_logo_files(
            Path::new("/nonexistent/brands"),
            &[".png".to_string()],
            &BTreeMap::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::SourceMissing { .. }));
    }

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]))
            .save_with_format(path, image::ImageFormat::Png)
            .unwrap();
    }

    #[test]
    fn test_import() {
        let dir = tempfile::tempdir().unwrap();
        let brands = dir.path().join("brands");
        let output = dir.path().join("logos");
        std::fs::create_dir(&brands).unwrap();
        write_png(&brands.join("ford.png"), 400, 200);
        std::fs::write(
            brands.join("honda.svg"),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="30"><circle cx="15" cy="15" r="15"/></svg>"#,
        )
        .unwrap();
        write_png(&brands.join("tesla.png"), 50, 50);
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("stale.png"), b"old").unwrap();

        let mut config = Config::default();
        config.logos.source_dir = Some(brands);
        config.logos.output_dir = Some(output.clone());

        let storage = Storage::open_in_memory().unwrap();
        for (wmi, name) in [
            ("1FA", "Ford Motor Company"),
            ("1FT", "Ford Trucks"),
            ("JHM", "Honda"),
            ("ZZZ", "Stanford Cars"),
        ] {
            storage
                .insert_factory(&WmiFactory {
                    wmi: wmi.to_string(),
                    name: name.to_string(),
                    ..WmiFactory::default()
                })
                .unwrap();
        }

        let report = import(&storage, &config).unwrap();

        assert_eq!(report.logos_found, 3);
        assert_eq!(report.factories_total, 4);
        assert_eq!(report.factories_matched, 3);
        assert_eq!(report.mappings_created, 3);
        assert_eq!(report.thumbnails_created, 2);
        assert!(report.thumbnails_failed.is_empty());
        assert_eq!(report.top_logos[0], ("ford.png".to_string(), 2));

        assert_eq!(image::image_dimensions(output.join("ford.png")).unwrap(), (200, 100));
        assert_eq!(image::image_dimensions(output.join("honda.png")).unwrap(), (100, 100));
        assert!(!output.join("honda.svg").exists());
        assert!(!output.join("tesla.png").exists());
        assert!(!output.join("stale.png").exists());

        let honda = storage.factory_by_wmi("JHM").unwrap().unwrap();
        assert_eq!(
            storage.logos_for_factory(honda.id.unwrap()).unwrap(),
            ["honda.png"]
        );

        // Re-running replaces the links instead of duplicating them
        let again = import(&storage, &config).unwrap();
        assert_eq!(again.mappings_created, 3);
        assert_eq!(storage.stats().unwrap().factory_logos, 3);
    }

    #[test]
    fn test_import_skips_unreadable_logos() {
        let dir = tempfile::tempdir().unwrap();
        let brands = dir.path().join("brands");
        std::fs::create_dir(&brands).unwrap();
        write_png(&brands.join("ford.png"), 20, 10);
        std::fs::write(brands.join("honda.jpg"), b"not a jpeg").unwrap();

        let mut config = Config::default();
        config.logos.source_dir = Some(brands);
        config.logos.output_dir = Some(dir.path().join("logos"));
        config.logos.thumbnail_height = 40;

        let storage = Storage::open_in_memory().unwrap();
        for (wmi, name) in [("1FA", "Ford"), ("JHM", "Honda")] {
            storage
                .insert_factory(&WmiFactory {
                    wmi: wmi.to_string(),
                    name: name.to_string(),
                    ..WmiFactory::default()
                })
                .unwrap();
        }

        let report = import(&storage, &config).unwrap();

        assert_eq!(report.factories_matched, 2);
        assert_eq!(report.thumbnails_created, 1);
        assert_eq!(report.mappings_created, 1);
        assert_eq!(report.thumbnails_failed.len(), 1);
        assert!(report.thumbnails_failed[0].starts_with("honda.jpg"));
        assert_eq!(
            image::image_dimensions(config.logo_output_dir().join("ford.png")).unwrap(),
            (80, 40)
        );
    }

    #[test]
    fn test_coverage_percent() {
        let report = LogoImportReport {
            logos_found: 1,
            factories_total: 4,
            factories_matched: 1,
            thumbnails_created: 1,
            thumbnails_failed: Vec::new(),
            mappings_created: 1,
            top_logos: Vec::new(),
        };
        assert!((report.coverage_percent() - 25.0).abs() < f64::EPSILON);
    }
}

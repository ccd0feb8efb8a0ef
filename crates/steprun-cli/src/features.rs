//! Feature document discovery and loading.
//!
//! Paths name a document or a directory, optionally suffixed with `:line`.
//! Directories are walked recursively and their documents loaded in sorted
//! path order.

use std::path::{Path, PathBuf};
use steprun_core::{ConfigError, Feature};

const EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Split `path:line` into its parts. The suffix only counts when it parses
/// as a number, so drive letters such as `D:\` or `/c:/` stay in the path.
pub fn extract_feature_path_line(p: &str) -> (&str, Option<u32>) {
    if let Some(i) = p.rfind(':') {
        if i > 0 {
            if let Ok(line) = p[i + 1..].parse::<u32>() {
                return (&p[..i], Some(line));
            }
        }
    }
    (p, None)
}

pub fn load_features(paths: &[String]) -> Result<Vec<Feature>, ConfigError> {
    let mut features = Vec::new();
    for raw in paths {
        let (path, line) = extract_feature_path_line(raw);
        let root = Path::new(path);
        if !root.exists() {
            return Err(ConfigError::FeaturePathUnavailable {
                path: path.to_string(),
            });
        }
        let documents = if root.is_dir() {
            let mut found = Vec::new();
            collect_documents(root, &mut found).map_err(|e| ConfigError::FeatureParse {
                path: path.to_string(),
                detail: e.to_string(),
            })?;
            found.sort();
            found
        } else {
            vec![root.to_path_buf()]
        };

        for doc in documents {
            let mut feature = parse_document(&doc)?;
            if let Some(line) = line {
                if !apply_line_filter(&mut feature, line) {
                    continue;
                }
            }
            features.push(feature);
        }
    }
    tracing::debug!(count = features.len(), "loaded feature documents");
    Ok(features)
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e))
}

fn collect_documents(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let ft = entry.file_type()?;
        if ft.is_dir() {
            collect_documents(&path, out)?;
        } else if ft.is_file() && is_document(&path) {
            out.push(path);
        }
    }
    Ok(())
}

pub fn parse_document(path: &Path) -> Result<Feature, ConfigError> {
    let display = path.display().to_string();
    let parse_error = |detail: String| ConfigError::FeatureParse {
        path: display.clone(),
        detail,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| parse_error(e.to_string()))?;
    let mut feature: Feature = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&raw).map_err(|e| parse_error(e.to_string()))?,
        Some("yaml" | "yml") => serde_yaml::from_str(&raw).map_err(|e| parse_error(e.to_string()))?,
        _ => {
            return Err(parse_error(
                "unsupported document type, expected .json, .yaml or .yml".to_string(),
            ))
        }
    };
    feature.path.clone_from(&display);
    Ok(feature)
}

/// Keep only the scenario declared on `line`; the feature's own line keeps
/// everything. Returns false when nothing is left to run.
fn apply_line_filter(feature: &mut Feature, line: u32) -> bool {
    if feature.line == line {
        return true;
    }
    feature.scenarios.retain(|s| s.line == line);
    !feature.scenarios.is_empty()
}

use std::path::{Path, PathBuf};

use coco_dataset::{MissingImagePolicy, ScanOptions, DEFAULT_REPORT_LIMIT};
use data_contracts::FinitePolicy;
use serde::Deserialize;

const DEFAULT_CONFIG_NAME: &str = "coco-tools.toml";
const CONFIG_ENV: &str = "COCO_TOOLS_CONFIG";
const DEFAULT_ANNOTATIONS: &str = "data/coco/annotations/instances_train.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    pub annotations: PathBuf,
    pub scan: ScanOptions,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            annotations: PathBuf::from(DEFAULT_ANNOTATIONS),
            scan: ScanOptions::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ToolConfigFile {
    annotations: Option<String>,
    scan: Option<ScanSection>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ScanSection {
    limit: Option<usize>,
    missing_image: Option<MissingImagePolicy>,
    finite: Option<FinitePolicy>,
}

impl ToolConfig {
    /// Load from `$COCO_TOOLS_CONFIG`, else `./coco-tools.toml`, else defaults.
    pub fn load() -> Self {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME));
        let cfg = Self::from_path(&path).unwrap_or_default();
        cfg.warn_if_invalid();
        cfg
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "tools config unreadable; using defaults");
                return None;
            }
        };
        match toml::from_str::<ToolConfigFile>(&raw) {
            Ok(file) => Some(Self::from_file(file)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "tools config invalid; using defaults");
                None
            }
        }
    }

    fn from_file(file: ToolConfigFile) -> Self {
        let scan = file.scan.unwrap_or_default();
        ToolConfig {
            annotations: file
                .annotations
                .map(|v| expand_path(&v))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ANNOTATIONS)),
            scan: ScanOptions {
                limit: scan.limit.unwrap_or(DEFAULT_REPORT_LIMIT),
                missing_image: scan.missing_image.unwrap_or_default(),
                finite: scan.finite.unwrap_or_default(),
            },
        }
    }

    fn warn_if_invalid(&self) {
        if self.annotations.as_os_str().is_empty() {
            tracing::warn!("tools config: annotations is empty; pass the path on the command line");
        }
    }
}

fn expand_path(raw: &str) -> PathBuf {
    let mut out = raw.to_string();
    if let Some(stripped) = out.strip_prefix('~') {
        if let Ok(home) = std::env::var("HOME") {
            out = format!("{home}{stripped}");
        }
    }
    PathBuf::from(expand_env(&out))
}

/// Replace `${VAR}` with its value; unknown variables are left as written.
fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match std::env::var(key) {
                    Ok(val) => out.push_str(&val),
                    Err(_) => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

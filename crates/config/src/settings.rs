//! `settings.json`: the persisted producer inputs.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    Error,
    defaults::{DEFAULT_APPEARANCE, DEFAULT_EXCEL_MODE, DEFAULT_PILOT_MACRO, DEFAULT_REPORT_TYPE},
    error::excerpt_at,
};

/// A named, runnable macro in the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroDefinition {
    /// Display label; defaults to the registry id.
    pub label: String,
    /// Workbook path; blank means the pilot workbook.
    pub workbook_path: String,
    /// Macro to run, serialised as `macro`.
    #[serde(rename = "macro")]
    pub macro_name: String,
    /// Semicolon-separated argument list.
    pub args: String,
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Colour scheme name, kept for the desktop front end.
    pub appearance: String,
    /// `minimized`, `hidden` or `visible`; anything else is treated as minimized.
    pub excel_mode: String,
    /// Lower-case report frequency key.
    pub report_type: String,
    /// Workbook opened by a plain `run`.
    pub pilot_path: String,
    /// Macro run by a plain `run`; blank means the report type's default.
    pub pilot_macro: String,
    /// Semicolon-separated argument list.
    pub pilot_args: String,
    /// Optional registry of additional macros, keyed by id.
    pub macros: BTreeMap<String, MacroDefinition>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            appearance: DEFAULT_APPEARANCE.to_string(),
            excel_mode: DEFAULT_EXCEL_MODE.to_string(),
            report_type: DEFAULT_REPORT_TYPE.to_string(),
            pilot_path: String::new(),
            pilot_macro: DEFAULT_PILOT_MACRO.to_string(),
            pilot_args: String::new(),
            macros: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Parse settings from a JSON string. `path` is only used for errors.
    pub fn from_json(source: &str, path: &Path) -> Result<Self, Error> {
        let mut s: Self = serde_json::from_str(source).map_err(|e| {
            let (line, col) = (e.line(), e.column());
            Error::Parse {
                path: path.to_path_buf(),
                line,
                col,
                message: e.to_string(),
                excerpt: excerpt_at(source, line, col),
            }
        })?;
        s.normalize();
        Ok(s)
    }

    /// Registry entries without a macro name are dropped; missing labels
    /// fall back to the id; the report type is lower-cased.
    fn normalize(&mut self) {
        let report = self.report_type.trim().to_ascii_lowercase();
        if !report.is_empty() {
            self.report_type = report;
        } else {
            self.report_type = DEFAULT_REPORT_TYPE.to_string();
        }
        self.macros.retain(|id, m| {
            let keep = !m.macro_name.trim().is_empty();
            if !keep {
                debug!(id = %id, "dropping registry entry without a macro name");
            }
            keep
        });
        for (id, m) in &mut self.macros {
            if m.label.is_empty() {
                m.label = id.clone();
            }
        }
    }
}

/// Load settings from `path`. A missing file yields defaults.
pub fn load(path: &Path) -> Result<Settings, Error> {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(Error::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            });
        }
    };
    Settings::from_json(&source, path)
}

/// Write `settings` to `path` as pretty-printed JSON.
pub fn save(path: &Path, settings: &Settings) -> Result<(), Error> {
    let write_err = |message: String| Error::Write {
        path: path.to_path_buf(),
        message,
    };
    let mut json = serde_json::to_string_pretty(settings).map_err(|e| write_err(e.to_string()))?;
    json.push('\n');
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty())
        && let Err(e) = fs::create_dir_all(dir)
    {
        warn!(dir = %dir.display(), error = %e, "could not create settings directory");
    }
    fs::write(path, json).map_err(|e| write_err(e.to_string()))
}

/// Split a semicolon-separated argument string, trimming each item and
/// skipping empty ones.
pub fn split_args(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

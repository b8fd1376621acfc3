//! Resolve what to run from settings plus command-line overrides.

use std::path::PathBuf;

use crate::{Error, Settings, defaults::DEFAULT_PILOT_MACRO, default_macro_for, split_args};

/// Per-invocation overrides. Each `Some` wins over the settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOverrides {
    /// Registry id to start from instead of the pilot settings.
    pub macro_id: Option<String>,
    /// Workbook path.
    pub workbook: Option<PathBuf>,
    /// Macro name, bare or `Book.xlsm!Name`.
    pub macro_name: Option<String>,
    /// Semicolon-separated.
    pub args: Option<String>,
    /// Idle window mode.
    pub excel_mode: Option<String>,
}

/// A fully resolved run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Workbook to open or activate.
    pub workbook: PathBuf,
    /// Macro to run.
    pub macro_name: String,
    /// Macro arguments, in order.
    pub args: Vec<String>,
    /// Raw mode string; the engine coerces it.
    pub excel_mode: String,
}

/// Apply precedence: override, then the registry entry (when `macro_id` is
/// set), then the pilot settings. A registry entry with a blank workbook or
/// blank args borrows the pilot's. An empty pilot macro falls back to the
/// report type's default.
pub fn resolve_run(settings: &Settings, overrides: &RunOverrides) -> Result<RunRequest, Error> {
    let (workbook, macro_name, args) = match &overrides.macro_id {
        Some(id) => {
            let def = settings
                .macros
                .get(id)
                .ok_or_else(|| Error::UnknownMacroId(id.clone()))?;
            let workbook = if def.workbook_path.trim().is_empty() {
                settings.pilot_path.clone()
            } else {
                def.workbook_path.clone()
            };
            let args = if def.args.trim().is_empty() {
                settings.pilot_args.clone()
            } else {
                def.args.clone()
            };
            (workbook, def.macro_name.clone(), args)
        }
        None => {
            let macro_name = if settings.pilot_macro.trim().is_empty() {
                default_macro_for(&settings.report_type)
                    .unwrap_or(DEFAULT_PILOT_MACRO)
                    .to_string()
            } else {
                settings.pilot_macro.clone()
            };
            (settings.pilot_path.clone(), macro_name, settings.pilot_args.clone())
        }
    };

    let workbook = match &overrides.workbook {
        Some(p) => p.clone(),
        None if workbook.trim().is_empty() => return Err(Error::MissingWorkbook),
        None => PathBuf::from(workbook.trim()),
    };
    if workbook.as_os_str().is_empty() {
        return Err(Error::MissingWorkbook);
    }

    let macro_name = overrides
        .macro_name
        .as_deref()
        .unwrap_or(&macro_name)
        .trim()
        .to_string();
    if macro_name.is_empty() {
        return Err(Error::MissingMacro);
    }

    let args = split_args(overrides.args.as_deref().unwrap_or(&args));
    let excel_mode = overrides
        .excel_mode
        .as_deref()
        .unwrap_or(&settings.excel_mode)
        .trim()
        .to_ascii_lowercase();

    Ok(RunRequest {
        workbook,
        macro_name,
        args,
        excel_mode,
    })
}

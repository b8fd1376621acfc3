//! Persisted settings for reporting-hub: the pilot workbook, its macro and
//! arguments, the preferred Excel window mode, and an optional registry of
//! named macros.

use std::{env, path::PathBuf};

mod defaults;
mod error;
mod run;
mod settings;

#[cfg(test)]
mod test_resolve;
#[cfg(test)]
mod test_settings;

pub use defaults::{
    DEFAULT_APPEARANCE, DEFAULT_EXCEL_MODE, DEFAULT_PILOT_MACRO, DEFAULT_REPORT_TYPE,
    REPORT_TYPE_MACROS, SETTINGS_FILE, default_macro_for,
};
pub use error::{Error, excerpt_at};
pub use run::{RunOverrides, RunRequest, resolve_run};
pub use settings::{MacroDefinition, Settings, load, save, split_args};

/// `settings.json` in the current working directory.
pub fn default_settings_path() -> PathBuf {
    let mut p = env::current_dir().unwrap_or_default();
    p.push(SETTINGS_FILE);
    p
}

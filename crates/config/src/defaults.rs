//! Built-in defaults.

/// Macro used when neither the settings nor the report type name one.
pub const DEFAULT_PILOT_MACRO: &str = "Run_MonthEnd_Update";

/// Report frequency selected by default.
pub const DEFAULT_REPORT_TYPE: &str = "monthly";

/// Window mode used when settings do not name one.
pub const DEFAULT_EXCEL_MODE: &str = "minimized";

/// Colour scheme used when settings do not name one.
pub const DEFAULT_APPEARANCE: &str = "Dark";

/// Settings file name, resolved against the working directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// Known report frequencies and their default macro.
pub const REPORT_TYPE_MACROS: &[(&str, &str)] = &[
    ("weekly", "Run_Weekly_Update"),
    ("monthly", "Run_MonthEnd_Update"),
    ("quarterly", "Run_Quarterly_Update"),
    ("semiannual", "Run_Semiannual_Update"),
];

/// Default macro for a report frequency (case-insensitive).
pub fn default_macro_for(report_type: &str) -> Option<&'static str> {
    let key = report_type.trim().to_ascii_lowercase();
    REPORT_TYPE_MACROS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, m)| *m)
}

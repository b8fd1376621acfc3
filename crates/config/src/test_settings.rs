#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, fs};

    use crate::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.excel_mode, "minimized");
        assert_eq!(s.pilot_macro, "Run_MonthEnd_Update");
        assert_eq!(s.report_type, "monthly");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "pilot_path": "C:/reports/Pilot.xlsm", "report_type": " Weekly " }"#)
            .unwrap();
        let s = load(&path).unwrap();
        assert_eq!(s.pilot_path, "C:/reports/Pilot.xlsm");
        assert_eq!(s.report_type, "weekly");
        assert_eq!(s.appearance, "Dark");
        assert!(s.macros.is_empty());
    }

    #[test]
    fn registry_entries_without_macro_are_dropped() {
        let json = r#"{
            "macros": {
                "eom": { "workbook_path": "a.xlsm", "macro": "Run_MonthEnd_Update" },
                "blank": { "label": "Nothing", "workbook_path": "b.xlsm", "macro": "  " }
            }
        }"#;
        let s = Settings::from_json(json, "settings.json".as_ref()).unwrap();
        assert_eq!(s.macros.len(), 1);
        let eom = &s.macros["eom"];
        assert_eq!(eom.label, "eom");
        assert_eq!(eom.macro_name, "Run_MonthEnd_Update");
    }

    #[test]
    fn invalid_json_reports_location() {
        let json = "{\n  \"excel_mode\": \"hidden\",\n  \"pilot_path\": \n}";
        let err = Settings::from_json(json, "settings.json".as_ref()).unwrap_err();
        match &err {
            Error::Parse { line, excerpt, .. } => {
                assert_eq!(*line, 4);
                assert!(excerpt.contains('^'));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.pretty().starts_with("Settings parse error at settings.json:4:"));
    }

    #[test]
    fn save_then_load_preserves_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut macros = BTreeMap::new();
        macros.insert(
            "q".to_string(),
            MacroDefinition {
                label: "Quarterly".into(),
                workbook_path: "Q.xlsm".into(),
                macro_name: "Run_Quarterly_Update".into(),
                args: "2024;Q3".into(),
            },
        );
        let s = Settings {
            excel_mode: "visible".into(),
            pilot_args: "a;b".into(),
            macros,
            ..Settings::default()
        };
        save(&path, &s).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"macro\": \"Run_Quarterly_Update\""));
        assert_eq!(load(&path).unwrap(), s);
    }

    #[test]
    fn split_args_trims_and_skips_empty() {
        assert_eq!(split_args("a; b;;c ;"), vec!["a", "b", "c"]);
        assert!(split_args("").is_empty());
        assert!(split_args(" ; ").is_empty());
    }

    #[test]
    fn report_type_defaults() {
        assert_eq!(default_macro_for("weekly"), Some("Run_Weekly_Update"));
        assert_eq!(default_macro_for("Quarterly"), Some("Run_Quarterly_Update"));
        assert_eq!(default_macro_for("semiannual"), Some("Run_Semiannual_Update"));
        assert_eq!(default_macro_for("daily"), None);
    }

    #[test]
    fn default_path_is_settings_file_in_cwd() {
        let p = default_settings_path();
        assert!(p.ends_with(SETTINGS_FILE));
        assert!(p.is_absolute());
    }
}

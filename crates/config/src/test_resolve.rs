#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::*;

    fn settings() -> Settings {
        let mut s = Settings {
            pilot_path: "Pilot.xlsm".into(),
            pilot_macro: "Run_MonthEnd_Update".into(),
            pilot_args: "2024; 12".into(),
            excel_mode: "Hidden".into(),
            ..Settings::default()
        };
        s.macros.insert(
            "weekly".into(),
            MacroDefinition {
                label: "Weekly".into(),
                workbook_path: "Weekly.xlsm".into(),
                macro_name: "Run_Weekly_Update".into(),
                args: "W1".into(),
            },
        );
        s
    }

    #[test]
    fn pilot_defaults_when_no_overrides() {
        let r = resolve_run(&settings(), &RunOverrides::default()).unwrap();
        assert_eq!(r.workbook, PathBuf::from("Pilot.xlsm"));
        assert_eq!(r.macro_name, "Run_MonthEnd_Update");
        assert_eq!(r.args, vec!["2024", "12"]);
        assert_eq!(r.excel_mode, "hidden");
    }

    #[test]
    fn registry_entry_replaces_pilot_values() {
        let o = RunOverrides {
            macro_id: Some("weekly".into()),
            ..RunOverrides::default()
        };
        let r = resolve_run(&settings(), &o).unwrap();
        assert_eq!(r.workbook, PathBuf::from("Weekly.xlsm"));
        assert_eq!(r.macro_name, "Run_Weekly_Update");
        assert_eq!(r.args, vec!["W1"]);
    }

    #[test]
    fn registry_entry_without_workbook_uses_pilot_path() {
        let mut s = settings();
        s.macros.insert(
            "adhoc".into(),
            MacroDefinition {
                label: "Ad hoc".into(),
                workbook_path: String::new(),
                macro_name: "Run_Adhoc".into(),
                args: "A1".into(),
            },
        );
        let o = RunOverrides {
            macro_id: Some("adhoc".into()),
            ..RunOverrides::default()
        };
        let r = resolve_run(&s, &o).unwrap();
        assert_eq!(r.workbook, PathBuf::from("Pilot.xlsm"));
        assert_eq!(r.macro_name, "Run_Adhoc");
        assert_eq!(r.args, vec!["A1"]);
    }

    #[test]
    fn registry_entry_without_args_uses_pilot_args() {
        let mut s = settings();
        s.macros.insert(
            "weekly".into(),
            MacroDefinition {
                label: "Weekly".into(),
                workbook_path: " ".into(),
                macro_name: "Run_Weekly_Update".into(),
                args: String::new(),
            },
        );
        let o = RunOverrides {
            macro_id: Some("weekly".into()),
            ..RunOverrides::default()
        };
        let r = resolve_run(&s, &o).unwrap();
        assert_eq!(r.workbook, PathBuf::from("Pilot.xlsm"));
        assert_eq!(r.args, vec!["2024", "12"]);
    }

    #[test]
    fn overrides_win_over_registry() {
        let o = RunOverrides {
            macro_id: Some("weekly".into()),
            workbook: Some("Other.xlsm".into()),
            macro_name: Some("Custom".into()),
            args: Some("x;y".into()),
            excel_mode: Some("visible".into()),
        };
        let r = resolve_run(&settings(), &o).unwrap();
        assert_eq!(r.workbook, PathBuf::from("Other.xlsm"));
        assert_eq!(r.macro_name, "Custom");
        assert_eq!(r.args, vec!["x", "y"]);
        assert_eq!(r.excel_mode, "visible");
    }

    #[test]
    fn empty_args_override_clears_args() {
        let o = RunOverrides {
            args: Some(String::new()),
            ..RunOverrides::default()
        };
        assert!(resolve_run(&settings(), &o).unwrap().args.is_empty());
    }

    #[test]
    fn unknown_id_is_rejected() {
        let o = RunOverrides {
            macro_id: Some("nope".into()),
            ..RunOverrides::default()
        };
        assert_eq!(
            resolve_run(&settings(), &o),
            Err(Error::UnknownMacroId("nope".into()))
        );
    }

    #[test]
    fn missing_workbook_and_macro() {
        let mut s = settings();
        s.pilot_path = "  ".into();
        assert_eq!(
            resolve_run(&s, &RunOverrides::default()),
            Err(Error::MissingWorkbook)
        );

        let o = RunOverrides {
            macro_name: Some(" ".into()),
            ..RunOverrides::default()
        };
        assert_eq!(resolve_run(&settings(), &o), Err(Error::MissingMacro));
    }

    #[test]
    fn blank_pilot_macro_uses_report_type_default() {
        let mut s = settings();
        s.pilot_macro = String::new();
        s.report_type = "quarterly".into();
        let r = resolve_run(&s, &RunOverrides::default()).unwrap();
        assert_eq!(r.macro_name, "Run_Quarterly_Update");

        s.report_type = "daily".into();
        let r = resolve_run(&s, &RunOverrides::default()).unwrap();
        assert_eq!(r.macro_name, DEFAULT_PILOT_MACRO);
    }
}

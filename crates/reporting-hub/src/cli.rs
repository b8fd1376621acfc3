//! Command-line interface definitions for reporting-hub.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use config::RunOverrides;
use logging::LogArgs;

/// Command-line interface for the `reporting-hub` binary.
#[derive(Parser, Debug)]
#[command(
    name = "reporting-hub",
    about = "Run reporting macros in a dedicated Excel instance",
    version
)]
pub struct Cli {
    /// Path to the settings file [default: ./settings.json].
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Logging controls.
    #[command(flatten)]
    pub log: LogArgs,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the macros declared in the settings registry.
    List,
    /// Open the pilot workbook and run its macro.
    Run(RunArgs),
    /// Launch Excel, keep it visible for ten seconds, then quit.
    Show(ShowArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Registry id to run instead of the pilot settings.
    #[arg(long = "macro", value_name = "ID")]
    pub macro_id: Option<String>,

    /// Workbook to open, overriding the settings.
    #[arg(long, value_name = "PATH")]
    pub pilot: Option<PathBuf>,

    /// Macro name, overriding the settings.
    #[arg(long, value_name = "NAME")]
    pub macro_name: Option<String>,

    /// Semicolon-separated macro arguments, e.g. `2024;Q3`.
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub args: Option<String>,

    /// Main window mode while idle: minimized, hidden or visible.
    #[arg(long, value_name = "MODE")]
    pub excel_mode: Option<String>,

    /// Quit Excel once the macro has finished.
    #[arg(long)]
    pub quit_excel: bool,

    /// Window enforcer poll interval.
    #[arg(
        long,
        value_parser = humantime::parse_duration,
        default_value = "450ms",
        value_name = "DURATION"
    )]
    pub poll: Duration,

    /// Minimum spacing between main-window enforcements while no dialog is open.
    #[arg(
        long,
        value_parser = humantime::parse_duration,
        default_value = "1500ms",
        value_name = "DURATION"
    )]
    pub enforce_every: Duration,
}

impl RunArgs {
    /// Overrides for run resolution.
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            macro_id: self.macro_id.clone(),
            workbook: self.pilot.clone(),
            macro_name: self.macro_name.clone(),
            args: self.args.clone(),
            excel_mode: self.excel_mode.clone(),
        }
    }
}

/// Arguments for the `show` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Mode restored after the visible window closes.
    #[arg(long, value_name = "MODE")]
    pub excel_mode: Option<String>,
}

#![warn(missing_docs)]

//! Entry point for the `reporting-hub` binary.

mod cli;
mod error;
mod run;

use std::{io, process, sync::Arc};

use clap::Parser;
use tracing::{debug, error};
use winops::RealWinOps;
use xl_com::ComBridge;
use xl_engine::{EnforcerCfg, WorkerCfg};

use crate::{
    cli::{Cli, Commands},
    error::Result,
    run::Console,
};

fn main() {
    let cli = Cli::parse();
    let spec = logging::init(&cli.log);
    debug!(%spec, "logging initialised");
    if let Err(err) = dispatch(cli) {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(err.exit_code());
    }
}

/// Load settings and dispatch to the chosen subcommand.
fn dispatch(cli: Cli) -> Result<()> {
    let Cli {
        settings, command, ..
    } = cli;
    let path = settings.unwrap_or_else(config::default_settings_path);
    debug!(path = %path.display(), "loading settings");
    let settings = config::load(&path)?;

    match command {
        Commands::List => run::list(&settings, &mut io::stdout().lock()),
        Commands::Run(args) => {
            let req = config::resolve_run(&settings, &args.overrides())?;
            let cfg = WorkerCfg {
                enforcer: EnforcerCfg {
                    poll: args.poll,
                    main_period: args.enforce_every,
                },
                ..WorkerCfg::default()
            };
            run::pilot(
                ComBridge,
                Arc::new(RealWinOps),
                cfg,
                &req,
                args.quit_excel,
                &mut Console,
            )
        }
        Commands::Show(args) => {
            let mode = args.excel_mode.unwrap_or(settings.excel_mode);
            run::show(
                ComBridge,
                Arc::new(RealWinOps),
                WorkerCfg::default(),
                &mode,
                &mut Console,
            )
        }
    }
}

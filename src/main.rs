//! Silt - a Markdown static site generator with incremental rebuilds.

mod cli;
mod config;
mod dispatcher;
mod error;
mod logger;
mod render;
mod serve;
mod site;
mod watch;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteSettings;
use dispatcher::Dispatcher;
use serve::serve_site;
use site::Site;
use watch::watch_for_changes_blocking;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_dir = cli.output_dir.as_deref();

    match cli.command {
        Commands::Build { clean } => {
            let mut site = Site::from_settings_file(&cli.settings_file, output_dir, true)?;
            if clean {
                site.clean()?;
            }
            site.build()?;
            log!("build"; "wrote {} pages to {}", site.pages.len(), site.settings.output_dir.display());
            Ok(())
        }
        Commands::Clean => {
            // Cleaning needs no templates or content scan.
            let site = Site::from_settings_file(&cli.settings_file, output_dir, false)?;
            site.clean()?;
            log!("clean"; "emptied {}", site.settings.output_dir.display());
            Ok(())
        }
        Commands::Serve { port } => {
            let settings = SiteSettings::from_path(&cli.settings_file, output_dir)?;
            serve_site(&settings.output_dir, port)
        }
        Commands::Watch { clean } => {
            let mut site = Site::from_settings_file(&cli.settings_file, output_dir, true)?;
            if clean {
                site.clean()?;
            }
            site.build()?;
            log!("watch"; "initial build done, {} pages", site.pages.len());
            watch_for_changes_blocking(Dispatcher::new(site))
        }
        Commands::Version => {
            println!("silt {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

use std::io::Write;

use supatable::Profile;
use tabwriter::TabWriter;

use crate::cli::{GlobalArgs, Output, color::*};

#[derive(Debug, clap::Args)]
pub(crate) struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, clap::Subcommand)]
pub(crate) enum ConfigCommand {
    /// Get the current configuration
    Get(ConfigGetArgs),
}

#[derive(Debug, clap::Args)]
#[command(after_long_help = CliExamples("
  # Show the active profile
  supatable config get

  # Get all profiles
  supatable config get --all
"))]
pub(crate) struct ConfigGetArgs {
    /// Show all the available profiles
    #[arg(short, long)]
    pub all: bool,
}

pub(crate) fn handle(args: ConfigArgs, global: GlobalArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Get(args) => config_get(args, global),
    }
}

fn config_get(args: ConfigGetArgs, global: GlobalArgs) -> anyhow::Result<()> {
    let mut out = anstream::stdout().lock();

    match (global.output.unwrap_or_default(), args.all) {
        (Output::Tty, false) => {
            let profile = global.load_profile()?;

            let mut tw = TabWriter::new(&mut out).ansi(true);
            print_profile(&mut tw, &profile)?;
            tw.flush()?;
        }
        (Output::Tty, true) => {
            let mut tw = TabWriter::new(&mut out).ansi(true);
            for (i, profile) in Profile::load_all()?.enumerate() {
                if i > 0 {
                    writeln!(&mut tw)?;
                }
                print_profile(&mut tw, &profile)?;
            }
            tw.flush()?;
        }
        (Output::Json, false) => {
            let profile = global.load_profile()?;
            serde_json::to_writer(&mut out, &masked(profile))?;
            writeln!(&mut out)?;
        }
        (Output::Json, true) => {
            let profiles: Vec<_> = Profile::load_all()?.map(masked).collect();
            serde_json::to_writer(&mut out, &profiles)?;
            writeln!(&mut out)?;
        }
    }

    Ok(())
}

/// Hide the API key before printing a profile.
fn masked(profile: Profile) -> Profile {
    Profile {
        api_key: "*********".to_owned(),
        ..profile
    }
}

fn print_profile(out: &mut impl Write, profile: &Profile) -> anyhow::Result<()> {
    let table = profile.table.as_deref().unwrap_or("(none)");

    writeln!(out, "{HEADER}Profile {:?}{HEADER:#}", profile.name)?;
    writeln!(out, "{GREEN}URL{GREEN:#}\t{}", profile.base_url)?;
    writeln!(out, "{GREEN}API Key{GREEN:#}\t*********")?;
    writeln!(out, "{GREEN}Table{GREEN:#}\t{table}")?;

    Ok(())
}

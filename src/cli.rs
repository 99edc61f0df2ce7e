mod color;
mod config;
mod rows;

use std::time;

use anyhow::bail;
use clap::{Parser, Subcommand};
use http::StatusCode;
use supatable::{Client, Profile, config::Overrides};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "supatable",
    about = "Read and write rows of a PostgREST table",
    version = env!("SUPATABLE_VERSION"),
    propagate_version = true
)]
pub(crate) struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// How to format output.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Output {
    Json,
    #[default]
    Tty,
}

#[derive(Debug, clap::Args)]
#[command(next_help_heading = "Global Options")]
pub(crate) struct GlobalArgs {
    /// Name of the profile to use
    #[arg(long, short = 'P', global = true)]
    pub profile: Option<String>,
    /// Project identifier, or the full URL of the REST endpoint
    #[arg(long, global = true)]
    pub project: Option<String>,
    /// API key to authenticate with
    #[arg(long, global = true)]
    pub api_key: Option<String>,
    /// Table to operate on
    #[arg(long, short = 't', global = true)]
    pub table: Option<String>,
    /// Output format
    #[arg(long, short = 'O', global = true)]
    pub output: Option<Output>,
    /// Timeout (in seconds) for client operations (-1 = no timeout)
    #[arg(long, global = true)]
    pub client_timeout: Option<i64>,
    /// Print verbose logs
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            project: self.project.clone(),
            api_key: self.api_key.clone(),
            table: self.table.clone(),
        }
    }

    /// Resolve the profile selected by the flags and the environment.
    pub(crate) fn load_profile(&self) -> anyhow::Result<Profile> {
        let profile = match self.profile.as_deref() {
            Some(name) => Profile::from_env_with(name, self.overrides())?,
            None => Profile::from_default_env_with(self.overrides())?,
        };

        Ok(profile.with_ua_product("supatable-cli"))
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print version.
    Version,
    /// Read rows from the table
    Read(rows::ReadArgs),
    /// Insert rows into the table
    Insert(rows::InsertArgs),
    /// Update the rows matching a filter
    Update(rows::UpdateArgs),
    /// Delete the rows matching a filter
    Delete(rows::DeleteArgs),
    /// Inspect CLI configuration
    Config(config::ConfigArgs),
}

pub(crate) struct Cli {
    pub(crate) global: GlobalArgs,
    pub(crate) client: Client,
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    // Some commands don't require a table, or any config.
    match args.command {
        Command::Version => {
            println!("supatable {}", env!("SUPATABLE_VERSION"));
            return Ok(());
        }
        Command::Config(config_args) => return config::handle(config_args, args.global),
        _ => (),
    }

    let profile = args.global.load_profile()?;

    let timeout = match args.global.client_timeout {
        Some(-1) | None => None,
        Some(v) if v > 0 => Some(time::Duration::from_secs(v as _)),
        Some(v) => bail!("Invalid timeout value: {v}"),
    };

    let transport = supatable::HttpTransport::new(timeout)?;
    debug!(profile = %profile.name, command = ?args.command, "cli invocation");

    let cli = Cli {
        global: args.global,
        client: Client::with_transport(profile, transport),
    };

    let res = match args.command {
        Command::Version => unreachable!(),
        Command::Config(_) => unreachable!(),
        Command::Read(args) => rows::handle_read(&cli, args),
        Command::Insert(args) => rows::handle_insert(&cli, args),
        Command::Update(args) => rows::handle_update(&cli, args),
        Command::Delete(args) => rows::handle_delete(&cli, args),
    };

    res.map_err(explain)
}

/// The status of a failed request, if that's what the error is.
pub(crate) fn request_status(err: &anyhow::Error) -> Option<StatusCode> {
    err.downcast_ref::<supatable::Error>()?.status()
}

fn explain(err: anyhow::Error) -> anyhow::Error {
    if matches!(
        err.downcast_ref::<supatable::Error>(),
        Some(supatable::Error::MissingTable)
    ) {
        return err.context("Pass --table, or set `table` in the profile");
    }

    match request_status(&err) {
        Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            err.context("The server rejected the API key")
        }
        Some(StatusCode::NOT_FOUND) => err.context("The table does not exist"),
        _ => err,
    }
}

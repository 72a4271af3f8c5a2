//! Command line interface.

use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Args, Parser, Subcommand};

use crate::config::loader::Overrides;
use crate::config::schema::Mode;

#[derive(Debug, Parser)]
#[command(name = "roosevelt")]
#[command(version, about = "Run, build and maintain a Roosevelt app", long_about = None)]
pub struct Cli {
    /// Project root. Defaults to the current directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse `args`, dropping flags this binary does not recognize so that
    /// configuration falls back to its other layers. Returns the dropped
    /// arguments alongside.
    pub fn parse_lenient<I, T>(args: I) -> Result<(Self, Vec<String>), clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        let mut ignored = Vec::new();
        loop {
            let err = match Self::try_parse_from(&args) {
                Ok(cli) => return Ok((cli, ignored)),
                Err(err) if err.kind() == ErrorKind::UnknownArgument => err,
                Err(err) => return Err(err),
            };
            let unknown = match err.get(ContextKind::InvalidArg) {
                Some(ContextValue::String(arg)) => arg.clone(),
                _ => return Err(err),
            };
            let with_value = format!("{unknown}=");
            let position = args.iter().skip(1).position(|arg| {
                arg.to_str()
                    .is_some_and(|arg| arg == unknown || arg.starts_with(&with_value))
            });
            let Some(position) = position else {
                return Err(err);
            };
            ignored.push(args.remove(position + 1).to_string_lossy().into_owned());
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the app server
    Start(StartArgs),
    /// Audit, scaffold and compile assets without serving
    Build(StartArgs),
    /// Compare the project's config and scripts against the defaults
    Audit,
    /// Remove compiled assets and the public folder
    Clean,
    /// Stop a detached HTML validator
    KillValidator,
}

#[derive(Debug, Clone, Default, Args)]
pub struct StartArgs {
    /// Run in production mode
    #[arg(short = 'p', long, conflicts_with = "development_mode")]
    pub production_mode: bool,

    /// Run in development mode
    #[arg(short = 'd', long)]
    pub development_mode: bool,

    /// Worker threads: a number or `max`
    #[arg(long, value_name = "N|max")]
    pub cores: Option<Cores>,

    #[arg(long, conflicts_with = "disable_validator")]
    pub enable_validator: bool,

    #[arg(long)]
    pub disable_validator: bool,

    /// Run the validator as a child of the app
    #[arg(long, conflicts_with = "detach_validator")]
    pub attach_validator: bool,

    /// Run the validator in its own process so it survives restarts
    #[arg(long)]
    pub detach_validator: bool,
}

impl StartArgs {
    /// Config overrides implied by the flags.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            mode: flag_pair(self.production_mode, self.development_mode)
                .map(|production| if production { Mode::Production } else { Mode::Development }),
            validator: flag_pair(self.enable_validator, self.disable_validator),
            validator_detached: flag_pair(self.detach_validator, self.attach_validator),
            auto_killer: None,
        }
    }
}

fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

/// `--cores` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cores {
    Count(usize),
    Max,
}

impl FromStr for Cores {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("max") {
            return Ok(Cores::Max);
        }
        match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(format!("expected a positive number or `max`, got `{s}`")),
            Ok(n) => Ok(Cores::Count(n)),
        }
    }
}

impl Cores {
    /// Worker thread count for the runtime.
    pub fn worker_threads(self) -> usize {
        match self {
            Cores::Count(n) => n,
            Cores::Max => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! `xrun` owns exactly one flag, `--version`. Everything else on the command
//! line belongs to the build command and is forwarded untouched, including
//! `-V`, `-h` and `--help`.

use std::ffi::OsString;

use clap::{Arg, ArgAction, Command, CommandFactory, FromArgMatches, Parser};

/// Command-line arguments for `xrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "xrun",
    version,
    about = "Rebuild and restart an application whenever its sources change.",
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct CliArgs {
    /// Arguments appended to the build command.
    #[arg(
        value_name = "BUILD_ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        num_args = 0..
    )]
    pub build_args: Vec<String>,
}

/// The clap command, with a long-only `--version` flag in place of clap's
/// built-in `-V/--version`.
pub fn command() -> Command {
    CliArgs::command().arg(
        Arg::new("version")
            .long("version")
            .action(ArgAction::Version)
            .help("Print version"),
    )
}

/// Parse `args` (including the program name).
pub fn try_parse_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    CliArgs::from_arg_matches(&matches)
}

/// Parse the process arguments.
///
/// Prints the version and exits 0 on `--version`.
pub fn parse() -> CliArgs {
    match try_parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(err) => err.exit(),
    }
}

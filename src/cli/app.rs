//! Main CLI application

use crate::error::{KargarError, RunError};
use crate::help::{render_build_help, render_task_help};
use crate::logging::{self, Verbosity};
use crate::runner::{Build, DEFAULT_TASK};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::ffi::OsString;
use std::io;

/// CLI application for a build program
pub struct App {
    /// The clap command
    command: Command,
    /// Build whose tasks are run
    build: Build,
}

impl App {
    /// Create an app for a build
    pub fn new(build: Build) -> Self {
        let command = build_command(&build);
        App { command, build }
    }

    /// The clap command built for this build
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Run with the process arguments. Exits on `--help` and `--version`.
    pub async fn run(self) -> Result<(), KargarError> {
        let matches = self.command.clone().get_matches();
        self.execute(matches).await
    }

    /// Run with explicit arguments, the first one being the program name
    pub async fn run_from<I, T>(self, args: I) -> Result<(), KargarError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self.command.clone().try_get_matches_from(args)?;
        self.execute(matches).await
    }

    async fn execute(mut self, matches: ArgMatches) -> Result<(), KargarError> {
        logging::init(get_verbosity(&matches));

        if let Some(shell) = matches.get_one::<Shell>("completions").copied() {
            let name = self.command.get_name().to_string();
            generate(shell, &mut self.command, name, &mut io::stdout());
            return Ok(());
        }

        if let Some(name) = matches.get_one::<String>("describe") {
            let task = self
                .build
                .task(name)
                .ok_or_else(|| RunError::NoSuchTask(name.clone()))?;
            print!("{}", render_task_help(&task, &[]));
            return Ok(());
        }

        let mut tasks = get_tasks(&matches);
        if tasks.is_empty() {
            if self.build.task(DEFAULT_TASK).is_none() {
                let flags = flag_lines(&self.command);
                print!(
                    "{}",
                    render_build_help(&self.build.meta, &self.build.registry().summaries(), &flags)
                );
                return Ok(());
            }
            tasks.push(DEFAULT_TASK.to_string());
        }

        self.build.run(tasks.as_slice()).await?;
        Ok(())
    }
}

/// Build the clap command from the build's metadata
fn build_command(build: &Build) -> Command {
    let meta = &build.meta;
    let mut cmd = Command::new(meta.name.clone())
        .about(meta.usage.clone())
        .arg(
            Arg::new("tasks")
                .value_name("TASK")
                .num_args(0..)
                .help("Tasks to run, in order"),
        )
        .arg(
            Arg::new("describe")
                .short('d')
                .long("describe")
                .value_name("TASK")
                .help("Show help for a task"),
        )
        .arg(
            Arg::new("completions")
                .long("completions")
                .value_name("SHELL")
                .value_parser(value_parser!(Shell))
                .help("Print a shell completion script"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print debug output")
                .action(ArgAction::SetTrue),
        );

    if !meta.version.is_empty() {
        cmd = cmd.version(meta.version.clone());
    }
    if !meta.author.is_empty() {
        cmd = cmd.author(meta.author.clone());
    }

    cmd
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Requested task names, in command-line order
fn get_tasks(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("tasks")
        .map(|tasks| tasks.cloned().collect())
        .unwrap_or_default()
}

/// One help line per option, for the build help text
fn flag_lines(command: &Command) -> Vec<String> {
    command
        .get_arguments()
        .filter(|arg| !arg.is_positional())
        .map(|arg| {
            let names: Vec<String> = arg
                .get_short()
                .map(|s| format!("-{s}"))
                .into_iter()
                .chain(arg.get_long().map(|l| format!("--{l}")))
                .collect();
            let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
            format!("{:<20} {}", names.join(", "), help)
        })
        .collect()
}

/// Run a build as a command-line program
pub async fn run(build: Build) -> Result<(), KargarError> {
    App::new(build).run().await
}

/// Print an error the way the CLI reports failures
pub fn report(err: &KargarError) {
    eprintln!("{} {}", "error:".red().bold(), err);
}

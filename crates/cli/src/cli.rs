use crate::tracing::{LogLevel, TracingFormat};
use clap::{ArgAction, Parser};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "aws-init")]
#[command(
    about = "Resolve aws-secret: references in the environment, then run and supervise a command"
)]
#[command(long_about = None)]
#[command(version, disable_version_flag = true, disable_help_flag = true)]
pub struct Cli {
    /// Command to run, followed by its arguments
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "health"
    )]
    pub command: Vec<String>,

    #[allow(dead_code, reason = "clap prints the version itself")]
    #[arg(short = 'v', long = "version", action = ArgAction::Version, help = "Print version")]
    version: Option<bool>,

    #[allow(dead_code, reason = "clap prints help itself")]
    #[arg(long = "help", action = ArgAction::Help, help = "Print help")]
    help: Option<bool>,

    // `-h` is the health check; liveness probes run `aws-init -h`
    #[arg(short = 'h', long, help = "Check AWS credentials via STS and exit")]
    pub health: bool,

    #[arg(
        long,
        env = "AWS_INIT_RESOLVE_TIMEOUT",
        value_name = "SECS",
        help = "Deadline for resolving all secret references"
    )]
    pub resolve_timeout: Option<u64>,

    #[arg(
        long,
        env = "AWS_INIT_LOG_LEVEL",
        help = "Set logging level",
        default_value = "info",
        value_enum
    )]
    pub log_level: LogLevel,

    #[arg(
        long,
        env = "AWS_INIT_LOG_FORMAT",
        help = "Log output format",
        default_value = "pretty",
        value_enum
    )]
    pub log_format: TracingFormat,
}

impl Cli {
    pub fn resolve_timeout(&self) -> Option<Duration> {
        self.resolve_timeout.map(Duration::from_secs)
    }

    /// Program and arguments, if a command was given.
    pub fn program(&self) -> Option<(&String, &[String])> {
        self.command.split_first()
    }
}

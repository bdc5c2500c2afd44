//! aws-init: resolve `aws-secret:` references in the environment, then run a
//! command as a supervised child and exit with its exit code.

mod cli;
mod errors;
mod tracing;

use crate::cli::Cli;
use crate::errors::CliError;
use crate::tracing::TracingConfig;
use ::tracing::{error, info, instrument};
use aws_init_aws::{AwsConnector, HEALTH_CHECK_TIMEOUT, health_check};
use aws_init_secrets::{ResolveContext, resolve_environment};
use aws_init_supervisor::Supervisor;
use clap::Parser;
use std::io;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let code = match run_main().await {
        Ok(code) => code,
        Err(report) => {
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{report:?}");
            }
            1
        }
    };
    std::process::exit(code);
}

async fn run_main() -> miette::Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; usage errors exit 1
            let _ = e.print();
            return Ok(i32::from(e.use_stderr()));
        }
    };

    crate::tracing::init_tracing(&TracingConfig {
        format: cli.log_format,
        level: cli.log_level.into(),
    })
    .map_err(|e| CliError::Tracing {
        message: e.to_string(),
    })?;

    if std::process::id() == 1 {
        info!("Running as init process (pid 1)");
    }

    if cli.health {
        run_health_check().await?;
        return Ok(0);
    }

    let Some((program, args)) = cli.program() else {
        error!("No command given");
        return Ok(1);
    };

    let env = resolve_startup_environment(&cli).await?;
    Ok(Supervisor::new().run(program, args, &env).await)
}

#[instrument(name = "aws_init_health")]
async fn run_health_check() -> miette::Result<()> {
    match health_check(HEALTH_CHECK_TIMEOUT).await {
        Ok(identity) => {
            info!(account = ?identity.account, arn = ?identity.arn, "Health check passed");
            #[allow(clippy::print_stdout)]
            {
                println!("health check passed");
            }
            Ok(())
        }
        Err(source) => {
            error!(error = %source, "Health check failed");
            Err(CliError::Health { source }.into())
        }
    }
}

/// Resolve the process environment, cancelling on `SIGINT`/`SIGTERM`.
#[instrument(name = "aws_init_resolve", skip_all)]
async fn resolve_startup_environment(cli: &Cli) -> miette::Result<Vec<String>> {
    let mut ctx = ResolveContext::with_token(CancellationToken::new());
    if let Some(timeout) = cli.resolve_timeout() {
        ctx = ctx.with_timeout(timeout);
    }

    let watcher = match cancel_on_shutdown_signal(ctx.token().clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            error!(error = %e, "Failed to install startup signal handlers");
            None
        }
    };

    let connector = AwsConnector::new();
    let result = resolve_environment(process_environment(), &connector, &ctx).await;

    if let Some(watcher) = watcher {
        watcher.abort();
    }

    result.map_err(|e| {
        error!(error = %e, "Secret resolution failed");
        CliError::resolve(e).into()
    })
}

fn cancel_on_shutdown_signal(token: CancellationToken) -> io::Result<JoinHandle<()>> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM during secret resolution, cancelling"),
            _ = sigint.recv() => info!("Received SIGINT during secret resolution, cancelling"),
        }
        token.cancel();
    }))
}

/// `KEY=value` entries of our own environment; non UTF-8 entries are skipped.
fn process_environment() -> Vec<String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some(format!("{key}={value}")),
            (key, _) => {
                ::tracing::warn!(key = ?key, "Skipping non UTF-8 environment entry");
                None
            }
        })
        .collect()
}

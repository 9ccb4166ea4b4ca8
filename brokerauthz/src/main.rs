/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use brokerauthz_core::AccessControl;
use brokerauthz_core::AppConfig;
use brokerauthz_core::AuthorizationAction;
use brokerauthz_core::AuthzError;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal::unix::SignalKind;
use tokio::signal::unix::signal;

/// Requested command line operation.
enum Command {
    /// Print one verdict per action.
    Authorize {
        principal: String,
        actions: Vec<AuthorizationAction>,
    },
    /// Verify the password read from stdin.
    Authenticate { username: String, password: String },
}

impl Command {
    /// Parse command line arguments after the binary name.
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        match args.next().as_deref() {
            Some("authorize") => {
                let principal = args
                    .next()
                    .ok_or_else(|| "Missing principal.".to_string())?;
                let actions = args
                    .map(|arg| arg.parse::<AuthorizationAction>())
                    .collect::<Result<Vec<_>, _>>()?;
                if actions.is_empty() {
                    return Err("At least one action is required.".to_string());
                }
                Ok(Self::Authorize { principal, actions })
            }
            Some("authenticate") => {
                let username = args
                    .next()
                    .ok_or_else(|| "Missing username.".to_string())?;
                let password = Self::read_password()?;
                Ok(Self::Authenticate { username, password })
            }
            Some(other) => Err(format!("Unknown command '{other}'.")),
            None => Err("Missing command.".to_string()),
        }
    }

    /// Read a single line from stdin without the line ending.
    fn read_password() -> Result<String, String> {
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map_err(|e| format!("Unable to read password from stdin: {e}"))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Application main entrypoint.
fn main() -> ExitCode {
    if let Err(e) = init_logger() {
        println!("Failed to initialize logging: {e:?}");
        return ExitCode::FAILURE;
    }
    #[cfg(feature = "tracing")]
    {
        // Enable tracing via the RUST_LOG environment variable. Example:
        //
        // ```
        // RUST_LOG="ldap3=trace"
        // ```
        let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stderr());
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
            .with_writer(non_blocking)
            .init();
    }
    let mut args = std::env::args();
    let cli_name = args.next().unwrap_or_default();
    let command = match Command::parse(args) {
        Ok(command) => command,
        Err(msg) => {
            eprintln!("{msg}");
            print_usage(&cli_name);
            return ExitCode::FAILURE;
        }
    };
    let app_config = match AppConfig::new(env!("CARGO_PKG_NAME")) {
        Ok(app_config) => Arc::new(app_config),
        Err(e) => {
            log::error!("Failed to initialize configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(run_async(app_config, command)),
        Err(e) => {
            log::error!("Failed to start async runtime: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage(cli_name: &str) {
    println!(
        "{cli_name} - Directory group based broker authorization

Usage:
    {cli_name} authorize [principal] [resource_type:operation[:resource_name]]...
    {cli_name} authenticate [username] < password

Example
    {cli_name} authorize kafka_user topic:read:orders topic:write:orders group:read
    "
    );
}

/// Initialize the logging system and apply filters.
///
/// Logs are written to stderr, since stdout carries the verdicts.
fn init_logger() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        // Set default log level
        .filter_level(log::LevelFilter::Info)
        //.filter_level(log::LevelFilter::Trace)
        // Customize logging for dependencies
        .filter(Some("ldap3"), log::LevelFilter::Warn)
        .filter(Some("rustls::client"), log::LevelFilter::Info)
        .filter(Some("brokerauthz_core::authz"), log::LevelFilter::Info)
        .filter(
            Some("brokerauthz_dp_ldap::ldap_connector"),
            log::LevelFilter::Info,
        )
        .write_style(env_logger::fmt::WriteStyle::Auto)
        .target(env_logger::fmt::Target::Stderr)
        .is_test(false)
        .parse_env(
            env_logger::Env::new()
                .filter("LOG_LEVEL")
                .write_style("LOG_STYLE"),
        )
        .try_init()
}

/// Async code entry point.
async fn run_async(app_config: Arc<AppConfig>, command: Command) -> ExitCode {
    let access_control = match AccessControl::new(&app_config) {
        Ok(access_control) => access_control,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let res = tokio::select! {
        res = run_command(&access_control, command) => {
            log::trace!("command finished");
            res
        },
        _ = block_until_signaled() => {
            log::trace!("signals_future finished");
            Ok(false)
        },
    }
    .map_err(|e| {
        if e.kind().is_transient() {
            log::error!("{e} (The directory might be temporarily unavailable.)");
        } else {
            log::error!("{e}");
        }
    });
    if matches!(res, Ok(true)) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run the command and return `true` if everything was allowed.
async fn run_command(
    access_control: &Arc<AccessControl>,
    command: Command,
) -> Result<bool, AuthzError> {
    match command {
        Command::Authorize { principal, actions } => {
            let results = access_control.authorize(&principal, &actions).await?;
            for (action, result) in actions.iter().zip(&results) {
                println!("{result} {action}");
            }
            Ok(results.iter().all(|result| result.is_allowed()))
        }
        Command::Authenticate { username, password } => {
            let authenticated = access_control.authenticate(&username, &password).await?;
            println!(
                "{}",
                if authenticated {
                    "AUTHENTICATED"
                } else {
                    "DENIED"
                }
            );
            Ok(authenticated)
        }
    }
}

/// Block until SIGTERM or SIGINT is recieved.
async fn block_until_signaled() {
    let (Ok(mut sigint), Ok(mut sigterm)) = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) else {
        log::warn!("Unable to listen for signals.");
        return std::future::pending().await;
    };
    tokio::select! {
        _ = sigterm.recv() => {
            log::debug!("SIGTERM recieved.")
        },
        _ = sigint.recv() => {
            log::debug!("SIGINT recieved.")
        },
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> impl Iterator<Item = String> {
        args.iter()
            .map(|arg| arg.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_authorize() {
        let command = Command::parse(args(&[
            "authorize",
            "kafka_user",
            "topic:read:orders",
            "cluster:idempotent_write",
        ]))
        .unwrap();
        let Command::Authorize { principal, actions } = command else {
            panic!("Expected authorize command");
        };
        assert_eq!(principal, "kafka_user");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].resource_name(), Some("orders"));
        assert!(Command::parse(args(&["authorize", "kafka_user"])).is_err());
        assert!(Command::parse(args(&["authorize", "kafka_user", "queue:read"])).is_err());
        assert!(Command::parse(args(&["revoke"])).is_err());
        assert!(Command::parse(args(&[])).is_err());
    }
}

use cloudlink::{ApiError, Config, DeviceApi, IdentityStore, KeyringIdentityStore, SttApi};
use std::{env, path::PathBuf, process::ExitCode, sync::Arc};
use thiserror::Error;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// The keyring service our device identity is stored under.
const KEYRING_SERVICE: &str = "cloudlink";

const USAGE: &str = "usage: cloudlink [--config <path>] <command>

commands:
    code <state>                  request a pairing code
    activate <state> <token>      activate this device
    device                        look up this device
    setting                       look up this device's settings
    stt <flac-file> <lang> [limit]  transcribe FLAC audio (limit defaults to 1)";

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("unable to read audio from {path}: {source}")]
    Audio {
        path: PathBuf,
        source: std::io::Error,
    },
}

enum Command {
    Code { state: String },
    Activate { state: String, token: String },
    Device,
    Setting,
    Stt {
        audio_path: PathBuf,
        language: String,
        limit: u32,
    },
}

/// Quick and dirty argument parsing, returning the config path alongside our command.
fn parse_args(mut args: impl Iterator<Item = String>) -> Option<(Option<PathBuf>, Command)> {
    let mut config_path = None;
    let mut name = args.next()?;
    if name == "--config" {
        config_path = Some(PathBuf::from(args.next()?));
        name = args.next()?;
    }

    let command = match name.as_str() {
        "code" => Command::Code { state: args.next()? },
        "activate" => Command::Activate {
            state: args.next()?,
            token: args.next()?,
        },
        "device" => Command::Device,
        "setting" => Command::Setting,
        "stt" => Command::Stt {
            audio_path: PathBuf::from(args.next()?),
            language: args.next()?,
            limit: match args.next() {
                Some(limit) => limit.parse().ok()?,
                None => 1,
            },
        },
        _ => return None,
    };
    Some((config_path, command))
}

async fn run(config_path: Option<PathBuf>, command: Command) -> Result<(), CliError> {
    let config = Config::load(config_path.as_deref()).map_err(ApiError::from)?;
    let identity: Arc<dyn IdentityStore> =
        Arc::new(KeyringIdentityStore::open(KEYRING_SERVICE).map_err(ApiError::from)?);

    let payload = match command {
        Command::Code { state } => DeviceApi::new(&config, identity)?.get_code(&state).await?,
        Command::Activate { state, token } => {
            let mut device = DeviceApi::new(&config, identity.clone())?;
            let payload = device.activate(&state, &token).await?;
            // A successful activation hands us our first set of tokens.
            identity
                .save(&payload.clone().into_json())
                .map_err(ApiError::from)?;
            payload
        }
        Command::Device => DeviceApi::new(&config, identity)?.find().await?,
        Command::Setting => DeviceApi::new(&config, identity)?.find_setting().await?,
        Command::Stt {
            audio_path,
            language,
            limit,
        } => {
            let audio = tokio::fs::read(&audio_path)
                .await
                .map_err(|source| CliError::Audio {
                    path: audio_path,
                    source,
                })?;
            SttApi::new(&config, identity)?
                .stt(audio, &language, limit)
                .await?
        }
    };

    println!("{payload}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some((config_path, command)) = parse_args(env::args().skip(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(config_path, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<(Option<PathBuf>, Command)> {
        parse_args(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn parses_config_path_before_command() {
        let (config_path, command) = parse(&["--config", "cloudlink.toml", "device"]).unwrap();
        assert_eq!(config_path, Some(PathBuf::from("cloudlink.toml")));
        assert!(matches!(command, Command::Device));
    }

    #[test]
    fn stt_limit_defaults_to_one() {
        let (_, command) = parse(&["stt", "hello.flac", "en-US"]).unwrap();
        match command {
            Command::Stt {
                audio_path, limit, ..
            } => {
                assert_eq!(audio_path, PathBuf::from("hello.flac"));
                assert_eq!(limit, 1);
            }
            _ => panic!("expected stt command"),
        }
    }

    #[test]
    fn rejects_incomplete_or_unknown_commands() {
        assert!(parse(&[]).is_none());
        assert!(parse(&["activate", "state-only"]).is_none());
        assert!(parse(&["stt", "a.flac", "en-US", "many"]).is_none());
        assert!(parse(&["reboot"]).is_none());
    }
}

pub mod capture;        // Raw capture files on disk
pub mod config;         // Configuration management
pub mod datalog_writer; // JSON lines snapshot log
pub mod error;          // Codec error type
pub mod options;        // Command line options parsing
pub mod prelude;        // Common imports and types
pub mod renogy;         // Register block and frame codecs

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::capture::CaptureStore;
use crate::datalog_writer::DatalogWriter;
use crate::options::Command;
use crate::prelude::*;
use crate::renogy::frame::{ReadRequest, ReadResponse, WriteRequest};
use std::io::Write;

/// Initialises env_logger with `loglevel` as the default filter; `RUST_LOG`
/// still takes precedence.
pub fn init_logging(loglevel: &str) {
    let env = env_logger::Env::default().default_filter_or(loglevel);
    if let Err(e) = env_logger::Builder::from_env(env)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .try_init()
    {
        eprintln!("Failed to initialise logging: {}", e);
    }
}

/// Main application entry point
pub fn app(options: Options) -> Result<()> {
    let config = Config::load(options.config_file.as_deref())?;
    init_logging(&config.loglevel);

    debug!("renogy-modbus {} starting", CARGO_PKG_VERSION);

    let stdout = std::io::stdout();
    execute(&options.command, &config, &mut stdout.lock())
}

/// Runs one command, writing anything meant for the user to `out`.
pub fn execute(command: &Command, config: &Config, out: &mut dyn Write) -> Result<()> {
    let store = CaptureStore::new(&config.capture_dir);

    match command {
        Command::Decode { file, frame } => {
            let snapshot = decode_file(&store, file, *frame, config.slave_id)?;

            let json = if config.pretty {
                serde_json::to_string_pretty(&snapshot)?
            } else {
                serde_json::to_string(&snapshot)?
            };
            writeln!(out, "{}", json)?;

            if let Some(path) = &config.datalog_file {
                DatalogWriter::new(path)?.write_snapshot(&snapshot)?;
            }
        }

        Command::Encode { file, output, frame } => {
            let content = std::fs::read_to_string(file)
                .map_err(|err| file_error!("error reading {}: {}", file, err))?;
            let snapshot: Snapshot = serde_json::from_str(&content)
                .with_context(|| format!("error parsing snapshot {}", file))?;

            let bytes = if *frame {
                WriteRequest::new(config.slave_id, &snapshot)?.bytes()
            } else {
                snapshot.encode()?
            };

            match output {
                Some(path) => {
                    std::fs::write(path, &bytes)
                        .with_context(|| format!("error writing {}", path))?;
                    info!("Wrote {} bytes to {}", bytes.len(), path);
                }
                None => writeln!(out, "{}", hex(&bytes))?,
            }
        }

        Command::Request => {
            writeln!(out, "{}", hex(&ReadRequest::new(config.slave_id).bytes()))?;
        }

        Command::Store { file } => {
            let bytes = store.load(file)?;
            // only complete blocks go in the store
            Snapshot::decode(&bytes)?;
            let path = store.save(&bytes)?;
            writeln!(out, "{}", path.display())?;
        }
    }

    Ok(())
}

fn decode_file(store: &CaptureStore, file: &str, frame: bool, slave_id: u8) -> Result<Snapshot> {
    let bytes = store.load(file)?;
    let block = if frame {
        ReadResponse::decode(&bytes, slave_id)
            .with_context(|| format!("{} is not a valid response frame", file))?
    } else {
        bytes
    };

    Snapshot::decode(&block).with_context(|| format!("error decoding {}", file))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_format() {
        assert_eq!(hex(&[0x01, 0x03, 0xef]), "01 03 ef");
        assert_eq!(hex(&[]), "");
    }

    #[test]
    fn request_command() -> Result<()> {
        let mut out = Vec::new();
        execute(&Command::Request, &Config::default(), &mut out)?;
        assert_eq!(String::from_utf8(out)?, "01 03 01 00 00 23 05 ef\n");
        Ok(())
    }
}

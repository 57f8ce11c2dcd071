use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

const DEFAULT_LOG_FILTER: &str = "warn,plexi=info";
const DEFAULT_LOG_FILE_PATH: &str = "logs/plexi.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type InitResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogOutput {
    Stderr,
    File,
    Both,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LogOptions {
    json: bool,
    output: LogOutput,
    file_path: PathBuf,
}

fn options_from_env(mut get_var: impl FnMut(&str) -> Option<String>) -> LogOptions {
    let json = get_var("LOG_FORMAT")
        .map(|value| value.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let output = match get_var("LOG_OUTPUT")
        .map(|value| value.trim().to_ascii_lowercase())
        .as_deref()
    {
        Some("file") => LogOutput::File,
        Some("both") => LogOutput::Both,
        _ => LogOutput::Stderr,
    };

    let file_path = get_var("LOG_FILE_PATH")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE_PATH));

    LogOptions {
        json,
        output,
        file_path,
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn build_file_writer(path: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| std::ffi::OsStr::new("plexi.log"));

    fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

fn init_with_writer(json: bool, writer: BoxMakeWriter) -> InitResult {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}

/// Install the global subscriber. Failure to set up file output degrades to
/// stderr with a warning; nothing here aborts the process.
pub fn init() {
    let options = options_from_env(|key| env::var(key).ok());

    let result = match options.output {
        LogOutput::Stderr => init_with_writer(options.json, BoxMakeWriter::new(std::io::stderr)),
        LogOutput::File | LogOutput::Both => {
            let include_stderr = options.output == LogOutput::Both;
            match build_file_writer(&options.file_path) {
                Ok((file_writer, guard)) => {
                    let writer = if include_stderr {
                        BoxMakeWriter::new(std::io::stderr.and(file_writer))
                    } else {
                        BoxMakeWriter::new(file_writer)
                    };
                    let result = init_with_writer(options.json, writer);
                    if result.is_ok() {
                        let _ = LOG_GUARD.set(guard);
                    }
                    result
                }
                Err(err) => {
                    eprintln!(
                        "plexi: failed to initialize log output at '{}': {}; using stderr instead",
                        options.file_path.display(),
                        err
                    );
                    init_with_writer(options.json, BoxMakeWriter::new(std::io::stderr))
                }
            }
        }
    };

    let _ = result;
}

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use nacham_error::{NachamError, Result};
use nacham_validate::{
    Profile, ValidationOptions, ValidationRequest, ValidationWorker, decode_source,
    serial_from_file_name,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Report permits export.
const EXIT_EXPORTABLE: u8 = 0;
/// Report blocks export.
const EXIT_BLOCKED: u8 = 1;

#[derive(Debug)]
struct CliConfig {
    file: PathBuf,
    serial: Option<String>,
    profile: Option<PathBuf>,
    options_json: Option<String>,
    pretty: bool,
    log_level: String,
    progress: bool,
}

fn print_help() {
    let help = "\
nacham - validate a NACHAM payment file

USAGE:
    nacham [OPTIONS] <FILE>

OPTIONS:
    --serial <N>           Serial used for the file identifier check (default: digits at the end of the file name)
    --profile <PATH>       TOML validation profile (default: built-in)
    --options <JSON>       Validation toggles, e.g. '{\"checkCredits\":false}'
    --pretty               Pretty-print the JSON report
    --log-level <LEVEL>    Log filter when RUST_LOG is unset (default: warn)
    --no-progress          Do not print progress to stderr
    -h, --help             Show this help

EXIT CODES:
    0  the file may be exported
    1  the report blocks export
    2  usage or configuration error
    3  the file could not be read or decoded
    4  internal error
";
    println!("{help}");
}

fn value<'a>(args: &'a [String], index: usize, flag: &str) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| NachamError::Usage(format!("{flag} requires a value")))
}

/// `Ok(None)` when help was requested.
fn parse_args(args: &[String]) -> Result<Option<CliConfig>> {
    let mut file = None;
    let mut config = CliConfig {
        file: PathBuf::new(),
        serial: None,
        profile: None,
        options_json: None,
        pretty: false,
        log_level: "warn".to_owned(),
        progress: true,
    };

    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--serial" => {
                index += 1;
                config.serial = Some(value(args, index, "--serial")?.to_owned());
            }
            "--profile" => {
                index += 1;
                config.profile = Some(PathBuf::from(value(args, index, "--profile")?));
            }
            "--options" => {
                index += 1;
                config.options_json = Some(value(args, index, "--options")?.to_owned());
            }
            "--log-level" => {
                index += 1;
                config.log_level = value(args, index, "--log-level")?.to_owned();
            }
            "--pretty" => config.pretty = true,
            "--no-progress" => config.progress = false,
            "-h" | "--help" => {
                print_help();
                return Ok(None);
            }
            flag if flag.starts_with("--") => {
                return Err(NachamError::Usage(format!("unknown option: {flag}")));
            }
            path => {
                if file.replace(PathBuf::from(path)).is_some() {
                    return Err(NachamError::Usage(format!("unexpected argument: {path}")));
                }
            }
        }
        index += 1;
    }

    config.file = file.ok_or_else(|| NachamError::Usage("missing <FILE> argument".to_owned()))?;
    Ok(Some(config))
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

fn load_options(config: &CliConfig) -> Result<ValidationOptions> {
    let options = match &config.options_json {
        Some(json) => ValidationOptions::from_json_str(json)?,
        None => ValidationOptions::default(),
    };
    let serial = config.serial.clone().or_else(|| {
        config
            .file
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(serial_from_file_name)
    });
    Ok(match serial {
        Some(serial) => options.with_serial(serial),
        None => options,
    })
}

fn load_profile(path: Option<&Path>) -> Result<Profile> {
    path.map_or_else(|| Ok(Profile::default()), Profile::load)
}

fn run(args: &[String]) -> Result<u8> {
    let Some(config) = parse_args(args)? else {
        return Ok(EXIT_EXPORTABLE);
    };
    init_tracing(&config.log_level);

    let options = load_options(&config)?;
    let profile = Arc::new(load_profile(config.profile.as_deref())?);
    let bytes = std::fs::read(&config.file)?;
    let text = decode_source(&bytes)?;
    debug!(
        path = %config.file.display(),
        bytes = bytes.len(),
        serial = options.serial_from_name.as_str(),
        "source decoded"
    );

    let mut worker = ValidationWorker::spawn()?;
    let show_progress = config.progress;
    let mut last = None;
    let report = worker.validate(ValidationRequest::new(text, options, profile), |pct| {
        if show_progress && last != Some(pct) {
            last = Some(pct);
            eprint!("\rvalidating... {pct:>3}%");
        }
    })?;
    if show_progress {
        eprintln!();
    }

    let json = report.to_json(config.pretty)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;

    let exportable = report.permits_export();
    info!(
        records = report.record_count(),
        error_lines = report.error_line_count(),
        global_errors = report.global_errors.len(),
        exportable,
        "validation complete"
    );
    Ok(if exportable { EXIT_EXPORTABLE } else { EXIT_BLOCKED })
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            eprintln!("ERROR nacham: {error}");
            ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(1))
        }
    }
}

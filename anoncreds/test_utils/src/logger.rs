use std::{env, io::Write, sync::Once};

use chrono::Local;
use env_logger::{fmt::Formatter, Builder, WriteStyle};
use log::Record;

use crate::errors::error::{TestUtilsError, TestUtilsResult};

static INIT: Once = Once::new();

/// Installs the test logger once per process. Nothing is logged unless `RUST_LOG` is set;
/// `RUST_LOG_FORMATTER=text_no_color` drops the ANSI level colors.
pub fn init_logger() {
    INIT.call_once(|| {
        if let Ok(filters) = env::var("RUST_LOG") {
            if let Err(err) = try_init(&filters) {
                eprintln!("{err}");
            }
        }
    });
}

fn try_init(filters: &str) -> TestUtilsResult<()> {
    let write_style = match env::var("RUST_LOG_FORMATTER").as_deref() {
        Ok("text_no_color") => WriteStyle::Never,
        _ => WriteStyle::Auto,
    };
    Builder::new()
        .format(write_record)
        .write_style(write_style)
        .parse_filters(filters)
        .try_init()
        .map_err(|err| TestUtilsError::LoggingError(format!("cannot install test logger: {err}")))
}

fn write_record(buf: &mut Formatter, record: &Record<'_>) -> std::io::Result<()> {
    let level = buf.default_level_style(record.level());
    writeln!(
        buf,
        "{} {level}{:<5}{level:#} {} ({}:{}) {}",
        Local::now().format("%H:%M:%S%.3f"),
        record.level(),
        record.target(),
        record.file().unwrap_or("?"),
        record.line().unwrap_or_default(),
        record.args()
    )
}

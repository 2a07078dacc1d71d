use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Metadata, Record};

/// Prints library and tool logs to stderr, keeping stdout for command output.
///
/// With `-v` every line also names the module and line it came from.
pub struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if log::max_level() >= LevelFilter::Debug {
            eprintln!(
                "{} {} {}",
                label(record.level()),
                origin(record).dimmed(),
                record.args()
            );
        } else {
            eprintln!("{} {}", label(record.level()), record.args());
        }
    }

    fn flush(&self) {}
}

/// Same shape as the `error:` line printed when a command fails.
fn label(level: Level) -> ColoredString {
    let text = match level {
        Level::Error => "error:",
        Level::Warn => "warning:",
        Level::Info => "info:",
        Level::Debug => "debug:",
        Level::Trace => "trace:",
    };

    match level {
        Level::Error => text.bold().red(),
        Level::Warn => text.bold().yellow(),
        Level::Info => text.bold().cyan(),
        Level::Debug | Level::Trace => text.bold().dimmed(),
    }
}

/// `module:line` of a record, falling back to its target.
fn origin(record: &Record) -> String {
    let module = record.module_path().unwrap_or_else(|| record.target());

    match record.line() {
        Some(line) => format!("{}:{}", module, line),
        None => module.to_owned(),
    }
}

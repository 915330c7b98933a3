// -- facade.rs --

use {
    crate::{severity::Severity, Logger},
    log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError},
};

// --

/// Adapter that lets the `log` crate macros feed a [`Logger`]. The five
/// `log` levels map onto the matching severity bits; fatal and verbose are
/// only reachable through the native macros.
pub struct Facade {
    logger: Logger,
}

impl Facade {
    pub fn new(logger: Logger) -> Facade {
        Facade { logger }
    }

    fn severity(level: Level) -> Severity {
        match level {
            Level::Error => Severity::Error,
            Level::Warn => Severity::Warn,
            Level::Info => Severity::Info,
            Level::Debug => Severity::Debug,
            Level::Trace => Severity::Trace,
        }
    }
}

impl Log for Facade {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.logger.severity_mask() & Facade::severity(metadata.level()).bit() != 0
    }

    fn log(&self, record: &Record) {
        // emit re-checks the mask; the target stands in for the function name
        // the native macros capture.
        self.logger
            .emit(Facade::severity(record.level()), record.target(), *record.args());
    }

    fn flush(&self) {}
}

// --

/// Installs a clone of the logger as the global `log` backend.
pub fn install(logger: Logger) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(Facade::new(logger)))?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

// --

// -- record.rs --

use {crate::severity::Severity, chrono::Local, std::fmt};

// --

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%6f";

// --

/// A fully formatted log line together with the severity it was emitted at.
/// Built once by the dispatch path and owned by exactly one party at a time:
/// the producer, then the queue, then whoever writes it to the sink.
pub(crate) struct LogRecord {
    pub line: String,
    pub severity: Severity,
}

impl LogRecord {
    pub fn format(severity: Severity, function: &str, args: fmt::Arguments) -> LogRecord {
        let line = format!(
            "[{}] [{}] [{}] {}\n",
            Local::now().format(TIME_FORMAT),
            function,
            severity.tag(),
            args
        );
        LogRecord { line, severity }
    }
}

// --

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_function_and_tag() {
        let record = LogRecord::format(Severity::Info, "module::call", format_args!("x = {}", 3));
        assert!(record.line.starts_with('['));
        assert!(record.line.contains("] [module::call] [info] x = 3"));
        assert!(record.line.ends_with('\n'));
        assert_eq!(record.severity, Severity::Info);
    }
}

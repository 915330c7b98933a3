// -- lib.rs --

//! rotalog is an embeddable logging library: records are filtered through a
//! severity bitmask, formatted with a timestamp and the caller's function
//! name, then written to a size-rotated set of files, either synchronously
//! or through a worker thread, with optional colored terminal echo.

mod config;
pub mod facade;
mod logger;
mod queue;
mod record;
mod severity;
mod sink;

// --

pub use {
    logger::{Error, Logger, DEFAULT_FILE_NAME},
    severity::{Severity, MASK_ALL, MASK_NONE},
};

// --

/// Expands to the full path of the enclosing function.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}

/// Logs a fatal error message (system is unusable).
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.emit($crate::Severity::Fatal, $crate::function_name!(), format_args!($($arg)+))
    };
}

/// Logs a non-fatal error message (system is still usable).
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.emit($crate::Severity::Error, $crate::function_name!(), format_args!($($arg)+))
    };
}

/// Logs something unusual that might require attention.
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.emit($crate::Severity::Warn, $crate::function_name!(), format_args!($($arg)+))
    };
}

/// Logs an information message.
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.emit($crate::Severity::Info, $crate::function_name!(), format_args!($($arg)+))
    };
}

/// Logs a message for debugging purposes.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.emit($crate::Severity::Debug, $crate::function_name!(), format_args!($($arg)+))
    };
}

/// Logs the path of the execution.
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)+) => {
        $logger.emit($crate::Severity::Trace, $crate::function_name!(), format_args!($($arg)+))
    };
}

/// Logs verbose details.
#[macro_export]
macro_rules! log_verbose {
    ($logger:expr, $($arg:tt)+) => {
        $logger.emit($crate::Severity::Verbose, $crate::function_name!(), format_args!($($arg)+))
    };
}

/// Checks the condition and, when it fails, logs an unfiltered fatal record
/// with the file, line and condition, flushes any buffered records and
/// aborts the process.
#[macro_export]
macro_rules! log_assert {
    ($logger:expr, $condition:expr) => {
        if !$condition {
            $logger.assert_failed(
                stringify!($condition),
                None,
                file!(),
                line!(),
                $crate::function_name!(),
            );
        }
    };
    ($logger:expr, $condition:expr, $message:expr) => {
        if !$condition {
            $logger.assert_failed(
                stringify!($condition),
                Some($message),
                file!(),
                line!(),
                $crate::function_name!(),
            );
        }
    };
}

/// Aborts as if an assertion failed.
#[macro_export]
macro_rules! log_abort {
    ($logger:expr) => {
        $logger.assert_failed("abort", None, file!(), line!(), $crate::function_name!())
    };
    ($logger:expr, $message:expr) => {
        $logger.assert_failed(
            "abort",
            Some($message),
            file!(),
            line!(),
            $crate::function_name!(),
        )
    };
}

/// Checks the condition and logs a warning when it fails, without aborting.
#[macro_export]
macro_rules! log_expect {
    ($logger:expr, $condition:expr) => {
        if !$condition {
            $logger.expect_failed(stringify!($condition), None, $crate::function_name!());
        }
    };
    ($logger:expr, $condition:expr, $message:expr) => {
        if !$condition {
            $logger.expect_failed(stringify!($condition), Some($message), $crate::function_name!());
        }
    };
}

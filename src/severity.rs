// -- severity.rs --

use std::fmt;

// --

/// Bitmask value with every severity level disabled.
pub const MASK_NONE: u8 = 0x00;

/// Bitmask value with every severity level enabled.
pub const MASK_ALL: u8 = 0x7f;

pub(crate) const COLOR_RESET: &str = "\x1b[0m";

// --

/// The severity levels a record can be emitted at, one bit each so they can
/// be combined into an enable mask.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Fatal = 1 << 0,
    Error = 1 << 1,
    Warn = 1 << 2,
    Info = 1 << 3,
    Debug = 1 << 4,
    Trace = 1 << 5,
    Verbose = 1 << 6,
}

impl Severity {
    pub const ALL: [Severity; 7] = [
        Severity::Fatal,
        Severity::Error,
        Severity::Warn,
        Severity::Info,
        Severity::Debug,
        Severity::Trace,
        Severity::Verbose,
    ];

    pub fn bit(self) -> u8 {
        self as u8
    }

    pub fn tag(self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Trace => "trace",
            Severity::Verbose => "verbose",
        }
    }

    pub(crate) fn color(self) -> &'static str {
        match self {
            Severity::Fatal => "\x1b[91m",
            Severity::Error => "\x1b[31m",
            Severity::Warn => "\x1b[93m",
            Severity::Info => "\x1b[32m",
            Severity::Debug => "\x1b[96m",
            Severity::Trace => "\x1b[36m",
            Severity::Verbose => "\x1b[90m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.tag())
    }
}

// --

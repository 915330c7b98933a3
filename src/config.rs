// -- config.rs --

use {
    crate::severity::MASK_ALL,
    std::{fs, io, path::Path},
};

// --

/// Name of the persisted configuration file, created next to the log file.
pub(crate) const CONFIG_FILE_NAME: &str = "rotalog.conf";

const LOG_LEVEL_KEY: &str = "LOG_LEVEL";
const FILE_SIZE_KEY: &str = "FILE_SIZE";
const FILE_COUNT_KEY: &str = "FILE_COUNT";
const TERMINAL_MODE_KEY: &str = "TERMINAL_MODE";
const BUFFER_MODE_KEY: &str = "BUFFER_MODE";

// --

/// The five persisted settings, read at initialization and written back with
/// their runtime values at shutdown.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct Settings {
    pub severity_mask: u8,
    pub file_size: u64,
    pub file_count: u8,
    pub terminal_mode: bool,
    pub buffer_mode: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            severity_mask: MASK_ALL,
            file_size: 0,
            file_count: 0,
            terminal_mode: false,
            buffer_mode: false,
        }
    }
}

// --

/// Reads the configuration, creating a file with default values when none
/// exists. Malformed lines never fail the load; they are reported back as
/// complaints so the engine can log them once it is running.
pub(crate) fn load(path: &Path) -> io::Result<(Settings, Vec<String>)> {
    if !path.exists() {
        let settings = Settings::default();
        save(path, &settings)?;
        return Ok((settings, Vec::new()));
    }

    let text = fs::read_to_string(path)?;
    let mut settings = Settings::default();
    let mut complaints = Vec::new();

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => {
                complaints.push(format!(
                    "configuration line {} is not \"KEY = VALUE\": {}",
                    number + 1,
                    line
                ));
                continue;
            }
        };

        let parsed = match value.parse::<u64>() {
            Ok(parsed) => parsed,
            Err(_) => {
                complaints.push(format!(
                    "configuration line {} has a non-numeric value: {}",
                    number + 1,
                    line
                ));
                continue;
            }
        };

        if key.eq_ignore_ascii_case(LOG_LEVEL_KEY) {
            settings.severity_mask = parsed as u8 & MASK_ALL;
        } else if key.eq_ignore_ascii_case(FILE_SIZE_KEY) {
            settings.file_size = parsed;
        } else if key.eq_ignore_ascii_case(FILE_COUNT_KEY) {
            if parsed > u64::from(u8::MAX) {
                complaints.push(format!(
                    "configuration line {} has a file count over {}: {}",
                    number + 1,
                    u8::MAX,
                    line
                ));
            } else {
                settings.file_count = parsed as u8;
            }
        } else if key.eq_ignore_ascii_case(TERMINAL_MODE_KEY) {
            settings.terminal_mode = parsed != 0;
        } else if key.eq_ignore_ascii_case(BUFFER_MODE_KEY) {
            settings.buffer_mode = parsed != 0;
        } else {
            complaints.push(format!(
                "configuration line {} has an unknown key: {}",
                number + 1,
                key
            ));
        }
    }

    Ok((settings, complaints))
}

/// Writes the configuration with its explanatory comments, replacing
/// whatever was there before.
pub(crate) fn save(path: &Path, settings: &Settings) -> io::Result<()> {
    let text = format!(
        "# Configuration read at initialization and written back at shutdown\n\
         # with the values in effect at that point.\n\
         \n\
         # Bitmask enabling/disabling logs\n\
         # 2^0 - fatal | 2^1 - error | 2^2 - warn | 2^3 - info | 2^4 - debug | 2^5 - trace | 2^6 - verbose\n\
         {} = {}\n\
         \n\
         # Maximum size of a log file in bytes, 0 - rotation disabled\n\
         {} = {}\n\
         \n\
         # Count of additional numbered log files\n\
         {} = {}\n\
         \n\
         # 1 - logs are echoed to the terminal | 0 - file only\n\
         {} = {}\n\
         \n\
         # 1 - records are buffered and written by a worker thread | 0 - synchronous\n\
         {} = {}\n",
        LOG_LEVEL_KEY,
        settings.severity_mask,
        FILE_SIZE_KEY,
        settings.file_size,
        FILE_COUNT_KEY,
        settings.file_count,
        TERMINAL_MODE_KEY,
        settings.terminal_mode as u8,
        BUFFER_MODE_KEY,
        settings.buffer_mode as u8,
    );
    fs::write(path, text)
}

// --

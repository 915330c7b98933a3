// -- logger.rs --

use {
    crate::{
        config::{self, Settings},
        queue::Queue,
        record::LogRecord,
        severity::{Severity, COLOR_RESET, MASK_ALL},
        sink::{RotatingSink, SinkError},
    },
    std::{
        fmt, io,
        io::Write,
        path::{Path, PathBuf},
        process,
        sync::{
            atomic::{AtomicBool, AtomicU8, Ordering},
            Arc, Mutex, MutexGuard, PoisonError, Weak,
        },
        thread::{self, JoinHandle},
    },
    thiserror::Error,
};

// --

/// File name used when the caller passes an empty path.
pub const DEFAULT_FILE_NAME: &str = "messages";

const WORKER_THREAD_NAME: &str = "rotalog-sink";

/// Function tag attached to records the engine emits about itself.
const SELF_TAG: &str = "rotalog";

// --

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open log file \"{path}\": {source}")]
    OpenFile { path: PathBuf, source: io::Error },
    #[error("failed to access configuration \"{path}\": {source}")]
    Configuration { path: PathBuf, source: io::Error },
    #[error("failed to spawn the sink worker thread: {0}")]
    SpawnWorker(#[source] io::Error),
    #[error("the logger has been shut down")]
    ShutDown,
}

// --

/// Handle to one logging engine. Clones share the same engine; the engine
/// shuts down on [`Logger::deinit`] or when the last handle is dropped.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
}

struct Shared {
    mask: AtomicU8,
    terminal: AtomicBool,
    buffered: AtomicBool,
    initialized: AtomicBool,
    // The one lock covering the file handle, rotation counters and
    // thresholds. Producers in synchronous mode and the worker both write
    // through it, so lines never interleave.
    sink: Mutex<RotatingSink>,
    // Serializes buffered-mode transitions and buffered pushes, so a record
    // can never land in a queue that is being torn down.
    worker: Mutex<Option<Worker>>,
    config_path: PathBuf,
}

struct Worker {
    queue: Queue,
    handle: JoinHandle<()>,
}

// --

impl Logger {
    /// Opens the log file (truncating it), loads the persisted configuration
    /// and starts a logging session. Failures roll back everything acquired
    /// so far; retrying is always safe.
    pub fn init<P: AsRef<Path>>(file_path: P) -> Result<Logger, Error> {
        let path = file_path.as_ref();
        let base = if path.as_os_str().is_empty() {
            PathBuf::from(DEFAULT_FILE_NAME)
        } else {
            path.to_path_buf()
        };
        let config_path = match base.parent() {
            Some(parent) => parent.join(config::CONFIG_FILE_NAME),
            None => PathBuf::from(config::CONFIG_FILE_NAME),
        };

        let (settings, complaints) =
            config::load(&config_path).map_err(|source| Error::Configuration {
                path: config_path.clone(),
                source,
            })?;
        let sink = RotatingSink::open(base.clone(), settings.file_size, settings.file_count)
            .map_err(|source| Error::OpenFile { path: base, source })?;

        let logger = Logger {
            shared: Arc::new(Shared {
                mask: AtomicU8::new(settings.severity_mask),
                terminal: AtomicBool::new(settings.terminal_mode),
                buffered: AtomicBool::new(false),
                initialized: AtomicBool::new(true),
                sink: Mutex::new(sink),
                worker: Mutex::new(None),
                config_path,
            }),
        };

        for complaint in &complaints {
            logger.emit(Severity::Warn, SELF_TAG, format_args!("{}", complaint));
        }
        if settings.buffer_mode {
            // Same degradation as a rejected runtime toggle: the session
            // stays up, synchronous.
            if let Err(error) = logger.set_buffer_mode(true) {
                logger.emit(
                    Severity::Error,
                    SELF_TAG,
                    format_args!("failed to enable buffered logging: {}", error),
                );
            }
        }
        logger.emit(
            Severity::Info,
            SELF_TAG,
            format_args!(
                "logging session started (mask: {}, file size: {}, file count: {})",
                settings.severity_mask, settings.file_size, settings.file_count
            ),
        );
        Ok(logger)
    }

    /// Initializes with [`DEFAULT_FILE_NAME`].
    pub fn init_default() -> Result<Logger, Error> {
        Logger::init("")
    }

    /// Shuts the engine down: drains buffered records, persists the
    /// configuration and closes the file. Emission through remaining clones
    /// becomes a no-op.
    pub fn deinit(self) {
        self.shared.shutdown();
    }

    /// Entry point behind the `log_*!` macros. Filters on the severity mask,
    /// formats outside the lock and delivers either through the queue or
    /// directly to the sink.
    pub fn emit(&self, severity: Severity, function: &str, args: fmt::Arguments) {
        if !self.shared.initialized.load(Ordering::Relaxed) {
            return;
        }
        if self.shared.mask.load(Ordering::Relaxed) & severity.bit() == 0 {
            return;
        }

        let record = LogRecord::format(severity, function, args);
        if self.shared.buffered.load(Ordering::Acquire) {
            let slot = lock(&self.shared.worker);
            if let Some(worker) = slot.as_ref() {
                // A record the queue will not take is dropped; logging never
                // fails into the host application.
                let _ = worker.queue.push(record);
                return;
            }
        }
        self.shared.write_record(&record);
    }

    pub fn set_severity_mask(&self, mask: u8) {
        self.shared.mask.store(mask & MASK_ALL, Ordering::Relaxed);
    }

    pub fn severity_mask(&self) -> u8 {
        self.shared.mask.load(Ordering::Relaxed)
    }

    /// Maximum bytes per file before rotation; 0 disables rotation.
    pub fn set_file_size(&self, file_size: u64) {
        lock(&self.shared.sink).set_file_size(file_size);
    }

    pub fn file_size(&self) -> u64 {
        lock(&self.shared.sink).file_size()
    }

    /// Count of additional numbered files next to the base file.
    pub fn set_file_count(&self, file_count: u8) {
        lock(&self.shared.sink).set_file_count(file_count);
    }

    pub fn file_count(&self) -> u8 {
        lock(&self.shared.sink).file_count()
    }

    pub fn set_terminal_mode(&self, terminal_mode: bool) {
        self.shared.terminal.store(terminal_mode, Ordering::Relaxed);
    }

    pub fn terminal_mode(&self) -> bool {
        self.shared.terminal.load(Ordering::Relaxed)
    }

    /// Enables or disables buffered delivery. Disabling interrupts the
    /// worker, joins it and drains anything still queued into the sink, so
    /// no record is lost across the transition.
    pub fn set_buffer_mode(&self, buffer_mode: bool) -> Result<(), Error> {
        if !self.shared.initialized.load(Ordering::Relaxed) {
            return Err(Error::ShutDown);
        }
        let mut slot = lock(&self.shared.worker);
        if buffer_mode == slot.is_some() {
            return Ok(());
        }

        if buffer_mode {
            let queue = Queue::new();
            let consumer = queue.clone();
            let shared = Arc::downgrade(&self.shared);
            self.shared.buffered.store(true, Ordering::Release);
            match thread::Builder::new()
                .name(WORKER_THREAD_NAME.into())
                .spawn(move || worker_loop(shared, consumer))
            {
                Ok(handle) => {
                    *slot = Some(Worker { queue, handle });
                    Ok(())
                }
                Err(source) => {
                    self.shared.buffered.store(false, Ordering::Release);
                    Err(Error::SpawnWorker(source))
                }
            }
        } else {
            self.shared.buffered.store(false, Ordering::Release);
            if let Some(worker) = slot.take() {
                self.shared.stop_worker(worker);
            }
            Ok(())
        }
    }

    pub fn buffer_mode(&self) -> bool {
        self.shared.buffered.load(Ordering::Acquire)
    }

    /// Behind `log_assert!`/`log_abort!`: flushes buffered records, writes
    /// the failure regardless of the mask and aborts the process.
    pub fn assert_failed(
        &self,
        condition: &str,
        message: Option<&str>,
        file: &str,
        line: u32,
        function: &str,
    ) -> ! {
        let _ = self.set_buffer_mode(false);

        let record = match message {
            Some(message) => LogRecord::format(
                Severity::Fatal,
                function,
                format_args!(
                    "assertion \"{}\" failed at {}:{} ({})",
                    condition, file, line, message
                ),
            ),
            None => LogRecord::format(
                Severity::Fatal,
                function,
                format_args!("assertion \"{}\" failed at {}:{}", condition, file, line),
            ),
        };
        self.shared.write_record(&record);
        let _ = write!(io::stderr(), "{}", record.line);
        lock(&self.shared.sink).flush();
        process::abort();
    }

    /// Behind `log_expect!`: a failed expectation is only worth a warning.
    pub fn expect_failed(&self, condition: &str, message: Option<&str>, function: &str) {
        match message {
            Some(message) => self.emit(
                Severity::Warn,
                function,
                format_args!("expectation \"{}\" failed ({})", condition, message),
            ),
            None => self.emit(
                Severity::Warn,
                function,
                format_args!("expectation \"{}\" failed", condition),
            ),
        }
    }
}

// --

impl Shared {
    fn write_record(&self, record: &LogRecord) {
        // Console echo and file write share the sink's critical section, so
        // neither output can interleave across threads.
        let mut sink = lock(&self.sink);
        if self.terminal.load(Ordering::Relaxed) {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            let _ = write!(
                stdout,
                "{}{}{}",
                record.severity.color(),
                record.line,
                COLOR_RESET
            );
        }
        match sink.write(record.line.as_bytes()) {
            Ok(()) => {}
            Err(SinkError::Rotate(error)) => {
                // The record itself landed in the old file; report the failed
                // rollover without re-evaluating rotation.
                if self.mask.load(Ordering::Relaxed) & Severity::Error.bit() != 0 {
                    let report = LogRecord::format(
                        Severity::Error,
                        SELF_TAG,
                        format_args!("log rotation failed: {}", error),
                    );
                    let _ = sink.write_raw(report.line.as_bytes());
                }
                if !sink.has_handle() {
                    let _ = writeln!(
                        io::stderr(),
                        "rotalog: log rotation failed and no log file is open: {}",
                        error
                    );
                }
            }
            // Surfaced once when the handle was lost.
            Err(SinkError::NoHandle) => {}
            Err(SinkError::Write(error)) => {
                let _ = writeln!(io::stderr(), "rotalog: failed to write log record: {}", error);
            }
        }
    }

    /// Interrupts, joins and drains one worker. Caller holds the worker slot
    /// lock, so producers racing a push wait here and then fall back to the
    /// synchronous path.
    fn stop_worker(&self, worker: Worker) {
        worker.queue.interrupt();
        // The final teardown can start on the worker itself (the last handle
        // dropped while the worker held a temporary strong reference); a
        // thread cannot join itself.
        let joined = worker.handle.thread().id() != thread::current().id();
        if joined {
            let _ = worker.handle.join();
        }
        // Oldest first: a record the worker popped but could not write,
        // then whatever is still queued.
        if let Some(record) = worker.queue.take_orphan() {
            self.write_record(&record);
        }
        while let Some(record) = worker.queue.try_pop() {
            self.write_record(&record);
        }
        debug_assert!(worker.queue.is_empty());
        if !joined {
            // This frame sits inside the worker's own loop, and the drain
            // above consumed the interrupt. Leave a fresh one so the loop
            // wakes once more and exits instead of blocking forever.
            worker.queue.interrupt();
        }
    }

    /// Idempotent shutdown shared by `deinit` and the final drop.
    fn shutdown(&self) {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return;
        }

        // One guard for the whole snapshot; struct-literal temporaries live
        // to the end of the statement, so locking per field would take the
        // non-reentrant sink mutex twice.
        let settings = {
            let sink = lock(&self.sink);
            Settings {
                severity_mask: self.mask.load(Ordering::Relaxed),
                file_size: sink.file_size(),
                file_count: sink.file_count(),
                terminal_mode: self.terminal.load(Ordering::Relaxed),
                buffer_mode: self.buffered.load(Ordering::Acquire),
            }
        };

        {
            let mut slot = lock(&self.worker);
            self.buffered.store(false, Ordering::Release);
            if let Some(worker) = slot.take() {
                self.stop_worker(worker);
            }
        }

        if settings.severity_mask & Severity::Info.bit() != 0 {
            let farewell =
                LogRecord::format(Severity::Info, SELF_TAG, format_args!("logging session ended"));
            self.write_record(&farewell);
        }
        if let Err(error) = config::save(&self.config_path, &settings) {
            let report = LogRecord::format(
                Severity::Error,
                SELF_TAG,
                format_args!("failed to persist configuration: {}", error),
            );
            self.write_record(&report);
        }
        lock(&self.sink).close();
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// --

fn worker_loop(shared: Weak<Shared>, queue: Queue) {
    loop {
        match queue.pop() {
            Some(record) => match shared.upgrade() {
                Some(shared) => shared.write_record(&record),
                None => {
                    // The engine is tearing down. This record is older than
                    // anything still queued, so park it where the drain looks
                    // first instead of re-pushing it behind younger records.
                    queue.park_orphan(record);
                    return;
                }
            },
            None => {
                // Woken without data. Keep waiting only while buffered mode
                // is still on.
                let enabled = shared
                    .upgrade()
                    .map(|shared| shared.buffered.load(Ordering::Acquire))
                    .unwrap_or(false);
                if !enabled {
                    return;
                }
            }
        }
    }
}

// A poisoned lock only means some thread panicked mid-write; the state is a
// log file, so keep going rather than spreading the panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// --

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::fs,
        tempfile::{tempdir, TempDir},
    };

    fn session(name: &str) -> (TempDir, Logger) {
        let dir = tempdir().unwrap();
        let logger = Logger::init(dir.path().join(name)).unwrap();
        (dir, logger)
    }

    fn lines_with(path: &std::path::Path, marker: &str) -> usize {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .filter(|line| line.contains(marker))
            .count()
    }

    #[test]
    fn emit_writes_a_formatted_line() {
        let (dir, logger) = session("basic.log");
        logger.emit(Severity::Info, "test::case", format_args!("payload {}", 1));
        logger.deinit();

        let text = fs::read_to_string(dir.path().join("basic.log")).unwrap();
        assert!(text.contains("] [test::case] [info] payload 1"));
    }

    #[test]
    fn masked_severities_are_filtered_out() {
        let (dir, logger) = session("mask.log");
        logger.set_severity_mask(Severity::Error.bit() | Severity::Fatal.bit());
        logger.emit(Severity::Info, "f", format_args!("marker-info"));
        logger.emit(Severity::Error, "f", format_args!("marker-error"));
        logger.deinit();

        let path = dir.path().join("mask.log");
        assert_eq!(lines_with(&path, "marker-info"), 0);
        assert_eq!(lines_with(&path, "marker-error"), 1);
    }

    #[test]
    fn getters_echo_setters() {
        let (_dir, logger) = session("get.log");
        logger.set_severity_mask(0x2a);
        logger.set_file_size(12345);
        logger.set_file_count(4);
        logger.set_terminal_mode(true);

        assert_eq!(logger.severity_mask(), 0x2a);
        assert_eq!(logger.file_size(), 12345);
        assert_eq!(logger.file_count(), 4);
        assert!(logger.terminal_mode());
        assert!(!logger.buffer_mode());

        logger.set_terminal_mode(false);
        assert!(!logger.terminal_mode());
        logger.deinit();
    }

    #[test]
    fn mask_setter_ignores_unknown_bits() {
        let (_dir, logger) = session("clamp.log");
        logger.set_severity_mask(0xff);
        assert_eq!(logger.severity_mask(), crate::MASK_ALL);
        logger.deinit();
    }

    #[test]
    fn buffered_records_arrive_after_disable() {
        let (dir, logger) = session("buffered.log");
        logger.set_buffer_mode(true).unwrap();
        assert!(logger.buffer_mode());
        for i in 0..50 {
            logger.emit(Severity::Info, "f", format_args!("queued {}", i));
        }
        logger.set_buffer_mode(false).unwrap();
        assert!(!logger.buffer_mode());
        logger.deinit();

        assert_eq!(lines_with(&dir.path().join("buffered.log"), "queued "), 50);
    }

    #[test]
    fn toggling_the_same_mode_twice_is_a_no_op() {
        let (_dir, logger) = session("toggle.log");
        logger.set_buffer_mode(true).unwrap();
        logger.set_buffer_mode(true).unwrap();
        logger.set_buffer_mode(false).unwrap();
        logger.set_buffer_mode(false).unwrap();
        logger.deinit();
    }

    #[test]
    fn emission_after_deinit_is_a_no_op() {
        let (dir, logger) = session("late.log");
        let survivor = logger.clone();
        logger.deinit();

        survivor.emit(Severity::Error, "f", format_args!("too late"));
        assert!(matches!(
            survivor.set_buffer_mode(true),
            Err(Error::ShutDown)
        ));
        survivor.deinit();

        assert_eq!(lines_with(&dir.path().join("late.log"), "too late"), 0);
    }

    #[test]
    fn dropping_the_last_handle_shuts_down() {
        let dir = tempdir().unwrap();
        {
            let logger = Logger::init(dir.path().join("drop.log")).unwrap();
            logger.set_buffer_mode(true).unwrap();
            logger.emit(Severity::Info, "f", format_args!("queued before drop"));
        }
        // The drain ran and the configuration was persisted.
        assert_eq!(
            lines_with(&dir.path().join("drop.log"), "queued before drop"),
            1
        );
        assert!(dir.path().join(config::CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn empty_path_falls_back_to_the_default_name() {
        // Runs in the crate root; clean up behind ourselves.
        let logger = Logger::init("").unwrap();
        logger.deinit();
        assert!(fs::metadata(DEFAULT_FILE_NAME).is_ok());
        let _ = fs::remove_file(DEFAULT_FILE_NAME);
        let _ = fs::remove_file(config::CONFIG_FILE_NAME);
    }

    #[test]
    fn expectation_failure_logs_a_warning() {
        let (dir, logger) = session("expect.log");
        logger.expect_failed("x > 0", Some("boundary"), "test::fn");
        logger.deinit();

        let text = fs::read_to_string(dir.path().join("expect.log")).unwrap();
        assert!(text.contains("[warn] expectation \"x > 0\" failed (boundary)"));
    }
}

// -- delivery.rs --

use {
    crossbeam_channel::bounded,
    rotalog::{log_error, log_info, Logger, Severity},
    std::{
        fs,
        path::Path,
        thread,
        time::{Duration, Instant},
    },
    tempfile::tempdir,
};

// --

fn marker_lines(path: &Path, marker: &str) -> Vec<String> {
    if !path.exists() {
        return Vec::new();
    }
    fs::read_to_string(path)
        .expect("log file is not readable")
        .lines()
        .filter(|line| line.contains(marker))
        .map(|line| line.to_string())
        .collect()
}

// --

#[test]
fn every_mask_filters_every_severity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sweep.log");
    let logger = Logger::init(&path).unwrap();

    for mask in 0..=127u8 {
        logger.set_severity_mask(mask);
        for severity in Severity::ALL.iter() {
            logger.emit(*severity, "sweep", format_args!("sweep-mark {}", mask));
        }
    }
    logger.set_severity_mask(rotalog::MASK_ALL);
    logger.deinit();

    // A record lands iff its bit is set: sum of popcounts over all masks.
    let expected: usize = (0..=127u8).map(|mask| mask.count_ones() as usize).sum();
    assert_eq!(marker_lines(&path, "sweep-mark").len(), expected);
}

#[test]
fn error_only_mask_drops_the_info_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("errors.log");
    let logger = Logger::init(&path).unwrap();

    logger.set_severity_mask(Severity::Error.bit() | Severity::Fatal.bit());
    log_info!(logger, "mark-info should vanish");
    log_error!(logger, "mark-error should stay");
    logger.deinit();

    assert_eq!(marker_lines(&path, "mark-info").len(), 0);
    let errors = marker_lines(&path, "mark-error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("[error]"));
}

#[test]
fn rotation_spills_into_numbered_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.log");
    let logger = Logger::init(&path).unwrap();

    logger.set_file_size(100);
    logger.set_file_count(2);
    assert_eq!(logger.file_count(), 2);

    let padding = "x".repeat(60);
    for i in 0..10 {
        log_info!(logger, "rot-mark {} {}", i, padding);
    }
    logger.deinit();

    let first = dir.path().join("a.log.1");
    let second = dir.path().join("a.log.2");
    assert!(path.exists());
    assert!(first.exists());
    assert!(second.exists());

    // Whatever survived the wrap-around is made of complete lines.
    let mut survivors = 0;
    for file in [&path, &first, &second].iter() {
        let text = fs::read_to_string(file).unwrap();
        for line in text.lines() {
            assert!(line.starts_with('['), "torn line: {}", line);
        }
        survivors += marker_lines(file, "rot-mark").len();
    }
    assert!(survivors > 0);
}

#[test]
fn buffered_burst_keeps_every_line_whole() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("burst.log");
    let logger = Logger::init(&path).unwrap();
    logger.set_buffer_mode(true).unwrap();

    let mut producers = Vec::new();
    for thread_id in 0..4 {
        let logger = logger.clone();
        producers.push(thread::spawn(move || {
            for i in 0..250 {
                log_info!(logger, "burst-mark t{} n{:03} end", thread_id, i);
            }
        }));
    }
    for producer in producers {
        producer.join().expect("producer panicked");
    }
    logger.set_buffer_mode(false).unwrap();
    logger.deinit();

    let lines = marker_lines(&path, "burst-mark");
    assert_eq!(lines.len(), 1000);
    for line in &lines {
        assert!(line.starts_with('['), "torn line: {}", line);
        assert!(line.ends_with(" end"), "torn line: {}", line);
    }

    // FIFO per producer: each thread's records appear in emission order.
    for thread_id in 0..4 {
        let tag = format!("t{} ", thread_id);
        let mine: Vec<&String> = lines.iter().filter(|line| line.contains(&tag)).collect();
        assert_eq!(mine.len(), 250);
        for (i, line) in mine.iter().enumerate() {
            assert!(line.contains(&format!("n{:03} ", i)));
        }
    }
}

#[test]
fn mode_switch_loses_nothing_and_duplicates_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("switch.log");
    let logger = Logger::init(&path).unwrap();

    logger.set_buffer_mode(true).unwrap();
    for i in 0..200 {
        log_info!(logger, "switch-mark {:03} end", i);
    }
    logger.set_buffer_mode(false).unwrap();
    logger.deinit();

    let lines = marker_lines(&path, "switch-mark");
    assert_eq!(lines.len(), 200);
    for i in 0..200 {
        let tag = format!("switch-mark {:03} end", i);
        assert_eq!(
            lines.iter().filter(|line| line.contains(&tag)).count(),
            1,
            "record {} was lost or duplicated",
            i
        );
    }
}

#[test]
fn settings_survive_a_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("persist.log");

    let logger = Logger::init(&path).unwrap();
    logger.set_severity_mask(0x03);
    logger.set_file_size(512);
    logger.set_file_count(3);
    logger.set_buffer_mode(true).unwrap();
    logger.deinit();

    let logger = Logger::init(&path).unwrap();
    assert_eq!(logger.severity_mask(), 0x03);
    assert_eq!(logger.file_size(), 512);
    assert_eq!(logger.file_count(), 3);
    assert!(logger.buffer_mode());
    assert!(!logger.terminal_mode());
    logger.deinit();
}

#[test]
fn deinit_of_a_buffered_session_returns_promptly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("teardown.log");
    let (done_tx, done_rx) = bounded(1);

    let worker_path = path.clone();
    thread::spawn(move || {
        let logger = Logger::init(&worker_path).unwrap();
        logger.set_buffer_mode(true).unwrap();
        for i in 0..100 {
            log_info!(logger, "teardown-mark {:03}", i);
        }
        logger.deinit();
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("deinit did not finish");
    assert_eq!(marker_lines(&path, "teardown-mark").len(), 100);
}

#[test]
fn dropping_the_last_handle_shuts_down_promptly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("lasthandle.log");
    let (done_tx, done_rx) = bounded(1);

    let worker_path = path.clone();
    thread::spawn(move || {
        {
            let logger = Logger::init(&worker_path).unwrap();
            logger.set_buffer_mode(true).unwrap();
            for i in 0..100 {
                log_info!(logger, "lasthandle-mark {:03}", i);
            }
        }
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("dropping the last handle did not finish");

    // The final drain may run on the worker thread when it held the last
    // strong reference; give it a moment to land on disk.
    let deadline = Instant::now() + Duration::from_secs(10);
    while marker_lines(&path, "lasthandle-mark").len() < 100 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(marker_lines(&path, "lasthandle-mark").len(), 100);
}

#[test]
fn macros_capture_the_calling_function() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("names.log");
    let logger = Logger::init(&path).unwrap();

    log_info!(logger, "name-mark");
    logger.deinit();

    let lines = marker_lines(&path, "name-mark");
    assert_eq!(lines.len(), 1);
    assert!(
        lines[0].contains("macros_capture_the_calling_function"),
        "missing function name: {}",
        lines[0]
    );
}

// -- basic.rs --

use rotalog::{log_debug, log_expect, log_info, log_warn, Logger};

// --

fn main() {
    let logger = Logger::init("demo.log").expect("failed to initialize rotalog");
    logger.set_terminal_mode(true);
    logger.set_file_size(32 * 1024);
    logger.set_file_count(5);

    log_info!(logger, "demo starting");
    log_debug!(logger, "this is a debug {}", "message");

    if let Err(error) = logger.set_buffer_mode(true) {
        log_warn!(logger, "staying synchronous: {}", error);
    }

    let mut producers = Vec::new();
    for thread_id in 0..4 {
        let logger = logger.clone();
        producers.push(std::thread::spawn(move || {
            for i in 0..500 {
                log_info!(logger, "thread {} record {}", thread_id, i);
            }
        }));
    }
    for producer in producers {
        producer.join().expect("producer panicked");
    }

    log_expect!(logger, 3 * 4 == 12, "arithmetic still works");
    log_info!(logger, "demo done");
    logger.deinit();
}

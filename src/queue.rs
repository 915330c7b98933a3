// -- queue.rs --

use {
    crate::record::LogRecord,
    crossbeam_channel::{unbounded, Receiver, Sender},
    std::sync::{Arc, Mutex, PoisonError},
};

// --

/// Why a blocked consumer woke up: either a record arrived or somebody asked
/// it to stop waiting. Making the reason explicit keeps the consumer loop's
/// post-wake check a plain state inspection.
enum Wake {
    Record(LogRecord),
    Interrupt,
}

// --

/// Unbounded FIFO queue of pending records. All handles are clones of the
/// same channel pair, so push order is pop order across any number of
/// producers.
#[derive(Clone)]
pub(crate) struct Queue {
    tx: Sender<Wake>,
    rx: Receiver<Wake>,
    // A record a consumer popped but could no longer write. It is older
    // than anything still in the channel, so drains take it first.
    orphan: Arc<Mutex<Option<LogRecord>>>,
}

impl Queue {
    pub fn new() -> Queue {
        let (tx, rx) = unbounded();
        Queue {
            tx,
            rx,
            orphan: Arc::new(Mutex::new(None)),
        }
    }

    /// Appends at the tail. Returns false only if the channel is gone, in
    /// which case the record is handed back to the caller by being dropped.
    pub fn push(&self, record: LogRecord) -> bool {
        self.tx.send(Wake::Record(record)).is_ok()
    }

    /// Blocks until a record or an interrupt arrives. Returns None on an
    /// interrupt, so a caller that still wants a record must loop.
    pub fn pop(&self) -> Option<LogRecord> {
        match self.rx.recv() {
            Ok(Wake::Record(record)) => Some(record),
            Ok(Wake::Interrupt) | Err(_) => None,
        }
    }

    /// Non-blocking pop used while draining; stray interrupts are skipped so
    /// no record behind one is missed.
    pub fn try_pop(&self) -> Option<LogRecord> {
        while let Ok(wake) = self.rx.try_recv() {
            if let Wake::Record(record) = wake {
                return Some(record);
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Hands back a popped record that can no longer be written by the
    /// consumer; re-pushing it would put the oldest record behind younger
    /// ones.
    pub fn park_orphan(&self, record: LogRecord) {
        let mut slot = self.orphan.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(record);
    }

    /// Takes the parked record, if any. Called at the head of a drain.
    pub fn take_orphan(&self) -> Option<LogRecord> {
        self.orphan
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Wakes one blocked `pop` without enqueuing a record.
    pub fn interrupt(&self) {
        let _ = self.tx.send(Wake::Interrupt);
    }
}

// --

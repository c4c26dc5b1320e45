#![allow(dead_code)]

use dali_gate::address::Address;
use dali_gate::driver::{Command, Driver, Response};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Commands seen by a `FakeDriver`, shared with the test after the driver
/// is moved away.
pub type SentLog = Arc<Mutex<Vec<(Address, Command)>>>;

/// Driver that answers queries from a queue and records every command.
pub struct FakeDriver {
    answers: VecDeque<u8>,
    pub sent: SentLog,
    /// Fail every command once set.
    pub broken: Arc<AtomicBool>,
}

impl FakeDriver {
    pub fn new(answers: &[u8]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            sent: Arc::new(Mutex::new(Vec::new())),
            broken: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn sent(&self) -> Vec<(Address, Command)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn break_bus(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub fn clear(&mut self) {
        self.sent.lock().unwrap().clear();
    }
}

impl Driver for FakeDriver {
    fn send(&mut self, address: Address, command: Command) -> anyhow::Result<Response> {
        self.sent.lock().unwrap().push((address, command));
        if self.broken.load(Ordering::SeqCst) {
            anyhow::bail!("bus is down");
        }
        if command.is_query() {
            match self.answers.pop_front() {
                Some(value) => Ok(Response::with_value(value)),
                None => anyhow::bail!("no answer"),
            }
        } else {
            Ok(Response::empty())
        }
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// IdGenerator trait for abstracting reading id generation
pub trait IdGenerator: Send + Sync {
    /// Generate a new UUID v4 in hyphenated lowercase format
    fn uuid_v4(&self) -> String;
}

/// Production implementation of IdGenerator using random UUID generation
#[derive(Debug, Clone, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn uuid_v4(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic generator that numbers its ids from a fixed prefix
/// Useful for asserting which reading a store received
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: Arc<Mutex<u64>>,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Arc::new(Mutex::new(0)),
        }
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        *self.next.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn uuid_v4(&self) -> String {
        let mut next = self.next.lock().unwrap_or_else(|p| p.into_inner());
        let id = format!("{}-{}", self.prefix, *next);
        *next += 1;
        id
    }
}

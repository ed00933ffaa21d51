use log::{error, info, warn};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

const HISTORY_LIMIT: usize = 20;

/// Operator-visible status channel.
///
/// Every line goes to the `log` facade and into a short rolling history that
/// a status panel can display. Clones share the same history.
#[derive(Clone)]
pub struct LogManager {
    history: Arc<Mutex<VecDeque<String>>>,
}

impl LogManager {
    pub fn new() -> Self {
        Self {
            history: Arc::new(Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT))),
        }
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
        self.push(message);
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", message);
        self.push(message);
    }

    pub fn error(&self, message: &str) {
        error!("{}", message);
        self.push(message);
    }

    /// Oldest first.
    pub fn history(&self) -> Vec<String> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<String> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.back().cloned()
    }

    fn push(&self, message: &str) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(message.to_string());
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

//! Client-side navigation.
//!
//! The HTTP adapter uses a [`Navigator`] to force the login view when the
//! server rejects the credentials; the CLI and tests observe the location.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::info;

use crate::routes::paths;

/// Maximum number of past locations kept by [`History`]
const MAX_TRAIL: usize = 32;

pub trait Navigator: Send + Sync {
    /// Replace the current location
    fn navigate(&self, path: &str);

    fn location(&self) -> String;
}

#[derive(Debug)]
pub struct History {
    inner: Mutex<HistoryInner>,
}

#[derive(Debug)]
struct HistoryInner {
    current: String,
    trail: VecDeque<String>,
}

impl History {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(HistoryInner {
                current: start.into(),
                trail: VecDeque::new(),
            }),
        }
    }

    /// Previously visited locations, oldest first
    pub fn trail(&self) -> Vec<String> {
        self.inner.lock().trail.iter().cloned().collect()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(paths::LOGIN)
    }
}

impl Navigator for History {
    fn navigate(&self, path: &str) {
        let mut inner = self.inner.lock();
        if inner.current == path {
            return;
        }
        info!(from = %inner.current, to = path, "Navigating");
        let previous = std::mem::replace(&mut inner.current, path.to_string());
        inner.trail.push_back(previous);
        if inner.trail.len() > MAX_TRAIL {
            inner.trail.pop_front();
        }
    }

    fn location(&self) -> String {
        self.inner.lock().current.clone()
    }
}

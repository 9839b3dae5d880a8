use std::collections::VecDeque;

/// Bounded, recency-ordered cache of recently observed subpaths
///
/// Paths are appended at the back; once the window holds more than its capacity
/// the oldest entry is dropped from the front.
#[derive(Debug, Clone)]
pub struct ObservationWindow {
    paths: VecDeque<String>,
    capacity: usize,
}

impl ObservationWindow {
    /// Default number of paths retained
    pub const DEFAULT_CAPACITY: usize = 50;

    /// Creates an empty window; a zero capacity is raised to 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            paths: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a path, evicting the oldest entry if the window overflows
    pub fn push(&mut self, path: impl Into<String>) {
        self.paths.push_back(path.into());
        while self.paths.len() > self.capacity {
            self.paths.pop_front();
        }
    }

    /// Iterates from the most recently pushed path to the oldest
    pub fn recent_first(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().rev().map(String::as_str)
    }

    /// Snapshot of the window in recency order (index 0 = most recent)
    pub fn candidates(&self) -> Vec<String> {
        self.recent_first().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

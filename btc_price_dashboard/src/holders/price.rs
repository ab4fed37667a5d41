use std::collections::VecDeque;

use crate::models::PricePoint;

/// Number of points kept for the chart.
pub const BUFFER_CAPACITY: usize = 10;

/// Newest-first window over the most recent price points.
///
/// Owned by a single refresh controller, so it carries no locking of its own.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    points: VecDeque<PricePoint>,
    capacity: usize,
}

impl RollingBuffer {
    pub fn new() -> Self {
        Self::with_capacity(BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        RollingBuffer {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Replaces the contents with the first `capacity` points of `points`,
    /// which are expected newest-first.
    pub fn replace(&mut self, points: Vec<PricePoint>) {
        self.points = points.into_iter().take(self.capacity).collect();
    }

    /// Prepends `point` and drops whatever falls off the end.
    pub fn push_front(&mut self, point: PricePoint) {
        self.points.push_front(point);
        self.points.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&PricePoint> {
        self.points.front()
    }

    pub fn previous(&self) -> Option<&PricePoint> {
        self.points.get(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<PricePoint> {
        self.points.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

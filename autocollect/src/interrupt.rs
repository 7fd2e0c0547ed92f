use crate::geometry::Point;

pub const DEFAULT_INTERRUPT_THRESHOLD: i32 = 10;

/// Detects a human taking over the pointer during a click batch.
///
/// The reference is where the bot last left the pointer. Any movement beyond
/// `threshold` (Manhattan distance) from it was not made by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptMonitor {
    reference: Point,
    threshold: i32,
}

impl InterruptMonitor {
    pub fn new(reference: Point, threshold: i32) -> Self {
        Self {
            reference,
            threshold,
        }
    }

    pub fn reference(&self) -> Point {
        self.reference
    }

    /// Records where the pointer is after the bot's own action.
    pub fn observe(&mut self, position: Point) {
        self.reference = position;
    }

    pub fn intervened(&self, current: Point) -> bool {
        self.reference.manhattan_distance(current) > self.threshold
    }
}

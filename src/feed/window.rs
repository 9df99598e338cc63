/// How much of the buffer is exposed, advancing in fixed increments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayWindow {
    increment: usize,
    display_count: usize,
    /// Count the UI has asked for; `display_count` catches up as items arrive.
    requested: usize,
    has_more: bool,
}

impl DisplayWindow {
    pub fn new(increment: usize) -> Self {
        Self {
            increment: increment.max(1),
            display_count: 0,
            requested: 0,
            has_more: true,
        }
    }

    pub fn increment(&self) -> usize {
        self.increment
    }

    pub fn display_count(&self) -> usize {
        self.display_count
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn reset(&mut self) {
        self.display_count = 0;
        self.requested = 0;
    }

    /// Advances by one increment, capped at what is buffered.
    ///
    /// Returns true when the buffer could not cover the full increment.
    pub fn reveal_next(&mut self, buffered: usize) -> bool {
        self.requested = self.display_count + self.increment;
        self.settle(buffered);
        self.display_count < self.requested
    }

    /// Asks for one more increment without revealing anything yet. Used when
    /// the buffer is exhausted and the next page has to arrive first.
    pub fn request_next(&mut self) {
        self.requested = self.display_count + self.increment;
    }

    /// Reveals up to the requested count after the buffer grew.
    pub fn settle(&mut self, buffered: usize) {
        self.display_count = self.requested.min(buffered);
    }

    /// Re-derives `has_more`. Nothing else writes it.
    pub fn recompute(&mut self, buffered: usize, last_page_reached: bool) {
        self.has_more = self.display_count < buffered || !last_page_reached;
    }
}

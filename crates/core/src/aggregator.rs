//! Folds streamed tokens into the response for the current turn.

/// Accumulates the in-progress reply for one turn.
///
/// The buffer is readable at any time, so consumers may render a partial,
/// growing string while tokens are still arriving.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamAggregator {
    buffer: String,
    complete: bool,
}

impl StreamAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new turn, discarding whatever the previous one left behind,
    /// including an unfinished partial reply.
    pub fn on_turn_start(&mut self) {
        self.buffer.clear();
        self.complete = false;
    }

    /// Appends one streamed token.
    pub fn on_token(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.complete = false;
    }

    /// Marks the turn complete. The content is left untouched.
    pub fn on_end(&mut self) {
        self.complete = true;
    }

    pub fn response(&self) -> &str {
        &self.buffer
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

//! Turns response snapshots into incremental terminal output.

use chatstream_client::{ConnectionState, Response};

const BOT_PREFIX: &str = "Bot: ";

/// Tracks what has already been printed for the current reply so each
/// snapshot only writes the new tail.
///
/// Turn boundaries come from [`Response::turn`], never from the text, so a
/// reply identical to the previous one is still printed even when the watch
/// channel coalesced the intermediate snapshots.
#[derive(Debug, Default)]
pub struct ReplyRenderer {
    turn: u64,
    shown: String,
    finished: bool,
}

impl ReplyRenderer {
    /// Returns the text to write for `response`, possibly empty.
    pub fn update(&mut self, response: &Response) -> String {
        let mut out = String::new();

        if response.turn != self.turn {
            if !self.shown.is_empty() && !self.finished {
                out.push('\n');
            }
            self.turn = response.turn;
            self.shown.clear();
            self.finished = false;
        }
        if self.finished {
            return out;
        }

        // Within one turn the text only grows.
        let suffix = response
            .text
            .strip_prefix(self.shown.as_str())
            .unwrap_or_default();
        if !suffix.is_empty() {
            if self.shown.is_empty() {
                out.push_str(BOT_PREFIX);
            }
            out.push_str(suffix);
            self.shown.push_str(suffix);
        }
        if response.complete && !self.shown.is_empty() {
            out.push('\n');
            self.finished = true;
        }
        out
    }
}

/// One-line connectivity marker.
pub fn status_line(state: ConnectionState) -> String {
    let flag = if state.is_online() { "online" } else { "offline" };
    format!("[{flag}: {state}]\n")
}

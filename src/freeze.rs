//! Line-break freezing.
//!
//! Some template engines normalise whitespace. Freezing swaps raw `\n` / `\r`
//! characters for sentinel entities before expansion, and unfreezing restores
//! them afterwards. Input that already contains a sentinel string cannot be
//! told apart from a frozen break.

/// Default sentinel for `\n`.
pub const NEWLINE_SENTINEL: &str = "&newl;";
/// Default sentinel for `\r`.
pub const RETURN_SENTINEL: &str = "&retn;";

/// Sentinel pair used to freeze and unfreeze line breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Freezer {
    newline: String,
    carriage_return: String,
}

impl Default for Freezer {
    fn default() -> Self {
        Self::new(NEWLINE_SENTINEL, RETURN_SENTINEL)
    }
}

impl Freezer {
    pub fn new(newline: impl Into<String>, carriage_return: impl Into<String>) -> Self {
        Self {
            newline: newline.into(),
            carriage_return: carriage_return.into(),
        }
    }

    /// Replace every `\n` and `\r` with its sentinel.
    pub fn freeze(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\n' => out.push_str(&self.newline),
                '\r' => out.push_str(&self.carriage_return),
                other => out.push(other),
            }
        }
        out
    }

    /// Restore the characters replaced by [`Freezer::freeze`].
    pub fn unfreeze(&self, text: &str) -> String {
        text.replace(&self.carriage_return, "\r")
            .replace(&self.newline, "\n")
    }
}

/// Freeze with the default sentinels.
pub fn freeze(text: &str) -> String {
    Freezer::default().freeze(text)
}

/// Unfreeze with the default sentinels.
pub fn unfreeze(text: &str) -> String {
    Freezer::default().unfreeze(text)
}

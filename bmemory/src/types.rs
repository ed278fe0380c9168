//! Derived conversation views read back from persisted usage.
//!
//! ```rust
//! use bmemory::ContextWindowUsage;
//!
//! let usage = ContextWindowUsage::new(3_200, 128_000);
//! assert_eq!(usage.to_string(), "2.50 %");
//! ```

use std::fmt::{Display, Formatter};

/// How much of a model's context window the latest recorded round consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindowUsage {
    pub total_tokens: u64,
    pub context_window: u64,
}

impl ContextWindowUsage {
    pub fn new(total_tokens: u64, context_window: u64) -> Self {
        Self {
            total_tokens,
            context_window,
        }
    }

    /// `0.0` for a zero-sized window.
    pub fn percentage(&self) -> f64 {
        if self.context_window == 0 {
            return 0.0;
        }
        self.total_tokens as f64 / self.context_window as f64 * 100.0
    }
}

impl Display for ContextWindowUsage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} %", self.percentage())
    }
}

//! Turn-level policy knobs.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use bchat::{ChatPolicy, DisconnectPolicy};
//!
//! let policy = ChatPolicy::default()
//!     .with_max_rounds(0)
//!     .with_multi_round_tools(true)
//!     .with_title_timeout(Duration::from_secs(5));
//!
//! assert_eq!(policy.max_rounds, 1);
//! assert_eq!(policy.on_disconnect, DisconnectPolicy::CompleteRound);
//! ```

use std::time::Duration;

/// What happens to the round in flight when the client stops reading frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectPolicy {
    /// Keep draining the provider so the round is finalized and recorded.
    #[default]
    CompleteRound,
    /// Drop the provider stream at once; the unfinished round is not persisted.
    AbortRound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPolicy {
    /// Upper bound on provider round-trips per turn, counting the first.
    pub max_rounds: u32,
    /// Keep tools attached after the first round.
    pub multi_round_tools: bool,
    /// Require a tool call on the first round when tools are attached.
    pub force_tool_first_round: bool,
    pub generate_titles: bool,
    pub title_timeout: Duration,
    pub on_disconnect: DisconnectPolicy,
    pub readiness_timeout: Duration,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            multi_round_tools: false,
            force_tool_first_round: false,
            generate_titles: true,
            title_timeout: Duration::from_secs(15),
            on_disconnect: DisconnectPolicy::CompleteRound,
            readiness_timeout: Duration::from_secs(120),
        }
    }
}

impl ChatPolicy {
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_multi_round_tools(mut self, enabled: bool) -> Self {
        self.multi_round_tools = enabled;
        self
    }

    pub fn with_force_tool_first_round(mut self, enabled: bool) -> Self {
        self.force_tool_first_round = enabled;
        self
    }

    pub fn with_title_generation(mut self, enabled: bool) -> Self {
        self.generate_titles = enabled;
        self
    }

    pub fn with_title_timeout(mut self, timeout: Duration) -> Self {
        self.title_timeout = timeout;
        self
    }

    pub fn with_disconnect_policy(mut self, policy: DisconnectPolicy) -> Self {
        self.on_disconnect = policy;
        self
    }

    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    /// Whether tool schemas are attached on the given 1-based round.
    pub fn tools_enabled_for_round(&self, round: u32) -> bool {
        round <= 1 || self.multi_round_tools
    }

    pub fn force_tool_for_round(&self, round: u32) -> bool {
        round <= 1 && self.force_tool_first_round
    }
}

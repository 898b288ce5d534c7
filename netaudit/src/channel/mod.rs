//! Channel layer: the send/expect primitive every negotiation step is built on.
//!
//! A [`Channel`] owns a [`Transport`](crate::transport::Transport), strips
//! terminal escape sequences from everything it reads, and exposes
//! `expect(patterns, timeout)` over the output received since the last match.

mod buffer;
mod expect;
mod patterns;

pub use buffer::PatternBuffer;
pub use expect::{Channel, Match};
pub use patterns::{Pattern, PromptMatcher};

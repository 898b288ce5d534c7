//! Expect-style channel over an interactive transport.

use std::time::Duration;

use log::{debug, trace};

use super::buffer::PatternBuffer;
use super::patterns::Pattern;
use crate::error::ChannelError;
use crate::transport::Transport;

/// Line terminator appended by [`Channel::send`].
const LINE_ENDING: &[u8] = b"\n";

/// A successful [`Channel::expect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Index of the pattern that matched.
    pub index: usize,

    /// Output received before the match.
    pub before: String,

    /// The matched text itself.
    pub matched: String,
}

impl Match {
    /// Everything consumed by this expect, up to and including the match.
    pub fn consumed(&self) -> String {
        format!("{}{}", self.before, self.matched)
    }
}

/// Interactive channel providing `send` and `expect` over a transport.
///
/// This is the only place that reads from or writes to the transport; the
/// negotiator and executor are written purely in terms of these two calls,
/// which lets the same logic drive an SSH shell or a raw Telnet socket.
pub struct Channel<T> {
    transport: T,
    buffer: PatternBuffer,
    open: bool,
}

impl<T: Transport> Channel<T> {
    /// Wrap an already-open transport.
    pub fn new(transport: T) -> Self {
        Self::with_search_depth(transport, PatternBuffer::default().search_depth())
    }

    /// Wrap a transport, overriding the prompt search depth.
    pub fn with_search_depth(transport: T, search_depth: usize) -> Self {
        Self {
            transport,
            buffer: PatternBuffer::new(search_depth),
            open: true,
        }
    }

    /// Write `text` followed by a line terminator.
    pub async fn send(&mut self, text: &str) -> Result<(), ChannelError> {
        debug!("send: {:?}", text);
        self.write_line(text).await
    }

    /// Like [`send`](Self::send) but never logs the text (passwords, secrets).
    pub async fn send_hidden(&mut self, text: &str) -> Result<(), ChannelError> {
        debug!("send: <hidden>");
        self.write_line(text).await
    }

    async fn write_line(&mut self, text: &str) -> Result<(), ChannelError> {
        if !self.open {
            return Err(ChannelError::Closed);
        }
        let mut data = Vec::with_capacity(text.len() + LINE_ENDING.len());
        data.extend_from_slice(text.as_bytes());
        data.extend_from_slice(LINE_ENDING);
        self.transport.write(&data).await?;
        Ok(())
    }

    /// Wait until the output since the last match matches one of `patterns`.
    ///
    /// The earliest match in the output wins; on a tie the pattern listed
    /// first wins. The matched output is consumed from the buffer.
    pub async fn expect(
        &mut self,
        patterns: &[Pattern],
        timeout: Duration,
    ) -> Result<Match, ChannelError> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if let Some((index, span)) = self.buffer.find(patterns) {
                let consumed = self.buffer.consume(span.end);
                let before = String::from_utf8_lossy(&consumed[..span.start]).into_owned();
                let matched = String::from_utf8_lossy(&consumed[span.start..]).into_owned();
                trace!("expect: pattern {} matched {:?}", index, matched);
                return Ok(Match {
                    index,
                    before,
                    matched,
                });
            }

            if !self.open {
                return Err(ChannelError::Closed);
            }

            match tokio::time::timeout_at(deadline, self.transport.read()).await {
                Err(_) => {
                    debug!(
                        "expect: no match for {:?} within {:?}, buffered {:?}",
                        patterns.iter().map(Pattern::as_str).collect::<Vec<_>>(),
                        timeout,
                        self.buffer.as_str_lossy()
                    );
                    return Err(ChannelError::Timeout(timeout));
                }
                Ok(Ok(Some(chunk))) => {
                    trace!("read {} bytes", chunk.len());
                    self.buffer.extend(&chunk);
                }
                Ok(Ok(None)) => {
                    debug!("transport reached end of stream");
                    self.open = false;
                }
                Ok(Err(e)) => {
                    self.open = false;
                    return Err(e.into());
                }
            }
        }
    }

    /// Close the transport. Errors while closing are logged, not returned.
    pub async fn close(&mut self) {
        self.open = false;
        if let Err(e) = self.transport.close().await {
            debug!("error while closing transport: {}", e);
        }
    }

    /// Whether the transport is still open.
    pub fn is_open(&self) -> bool {
        self.open
    }
}

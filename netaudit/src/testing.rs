//! In-memory scripted device for negotiation and executor tests.
//!
//! The script is a greeting plus an ordered list of `(line, reply)` steps.
//! Each line written by the session is checked against the next step; on a
//! match the reply becomes readable, one read per chunk when it was scripted
//! in chunks. An unexpected line gets no reply, so the
//! session under test times out. Reads pend until output is available, or
//! return end-of-stream once every step has run when `then_close` is set.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::error::TransportError;
use crate::transport::Transport;

#[derive(Debug, Default)]
struct Script {
    steps: VecDeque<(String, Vec<String>)>,
    pending: VecDeque<Vec<u8>>,
    partial_line: Vec<u8>,
    raw_sent: Vec<u8>,
    sent: Vec<String>,
    close_when_done: bool,
    closed: bool,
}

impl Script {
    fn receive(&mut self, data: &[u8]) {
        self.raw_sent.extend_from_slice(data);
        for &byte in data {
            if byte != b'\n' {
                self.partial_line.push(byte);
                continue;
            }
            let line = String::from_utf8_lossy(&self.partial_line).into_owned();
            self.partial_line.clear();

            if self.steps.front().is_some_and(|(expected, _)| *expected == line) {
                if let Some((_, chunks)) = self.steps.pop_front() {
                    self.pending.extend(
                        chunks
                            .into_iter()
                            .filter(|chunk| !chunk.is_empty())
                            .map(String::into_bytes),
                    );
                }
            }
            self.sent.push(line);
        }
    }
}

/// Builder for a [`ScriptedTransport`].
#[derive(Debug)]
pub struct ScriptBuilder {
    script: Script,
}

impl ScriptBuilder {
    /// Reply with `reply` when `line` is written next. An empty reply is silence.
    pub fn reply(mut self, line: impl Into<String>, reply: impl Into<String>) -> Self {
        self.script.steps.push_back((line.into(), vec![reply.into()]));
        self
    }

    /// Like [`reply`](Self::reply), delivering each chunk as a separate read.
    pub fn reply_chunks<I, S>(mut self, line: impl Into<String>, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks = chunks.into_iter().map(Into::into).collect();
        self.script.steps.push_back((line.into(), chunks));
        self
    }

    /// End the stream once all steps have run and their output was read.
    pub fn then_close(mut self) -> Self {
        self.script.close_when_done = true;
        self
    }

    pub fn build(self) -> (ScriptedTransport, ScriptHandle) {
        let state = Arc::new(Mutex::new(self.script));
        let notify = Arc::new(Notify::new());
        let transport = ScriptedTransport {
            state: state.clone(),
            notify,
        };
        (transport, ScriptHandle { state })
    }
}

/// Transport half of a scripted device.
#[derive(Debug)]
pub struct ScriptedTransport {
    state: Arc<Mutex<Script>>,
    notify: Arc<Notify>,
}

impl ScriptedTransport {
    /// Start a script; `greeting` is readable immediately.
    #[allow(clippy::new_ret_no_self)]
    pub fn new(greeting: &str) -> ScriptBuilder {
        let mut script = Script::default();
        if !greeting.is_empty() {
            script.pending.push_back(greeting.as_bytes().to_vec());
        }
        ScriptBuilder { script }
    }
}

fn lock(state: &Mutex<Script>) -> MutexGuard<'_, Script> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Transport for ScriptedTransport {
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        {
            let mut script = lock(&self.state);
            if script.closed {
                return Err(TransportError::Disconnected);
            }
            script.receive(data);
        }
        self.notify.notify_one();
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            {
                let mut script = lock(&self.state);
                if let Some(chunk) = script.pending.pop_front() {
                    return Ok(Some(chunk));
                }
                if script.closed || (script.close_when_done && script.steps.is_empty()) {
                    return Ok(None);
                }
            }
            self.notify.notified().await;
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        lock(&self.state).closed = true;
        self.notify.notify_one();
        Ok(())
    }
}

/// Test-side view of a scripted device.
#[derive(Debug, Clone)]
pub struct ScriptHandle {
    state: Arc<Mutex<Script>>,
}

impl ScriptHandle {
    /// Complete lines written by the session, in order.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    /// Every byte written by the session.
    pub fn raw_sent(&self) -> Vec<u8> {
        lock(&self.state).raw_sent.clone()
    }

    /// How many times exactly `line` was written.
    pub fn count(&self, line: &str) -> usize {
        lock(&self.state).sent.iter().filter(|l| *l == line).count()
    }

    /// Whether the session closed the transport.
    pub fn closed(&self) -> bool {
        lock(&self.state).closed
    }
}

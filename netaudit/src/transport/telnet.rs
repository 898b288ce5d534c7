//! Raw Telnet transport.
//!
//! Telnet is plain bytes on a socket plus in-band option negotiation
//! (RFC 854/855). The decoder strips IAC sequences from the stream and
//! answers option requests: ECHO and SUPPRESS-GO-AHEAD are accepted, every
//! other option is refused. Login happens in-band, driven by the negotiator.

use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Transport;
use crate::error::TransportError;

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

const OPT_ECHO: u8 = 1;
const OPT_SGA: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    Data,
    Iac,
    Negotiate(u8),
    Subnegotiation,
    SubnegotiationIac,
}

/// Incremental IAC decoder; state survives across reads.
#[derive(Debug)]
struct TelnetDecoder {
    state: DecodeState,
}

impl TelnetDecoder {
    fn new() -> Self {
        Self {
            state: DecodeState::Data,
        }
    }

    /// Split `input` into user data and the negotiation replies it calls for.
    fn decode(&mut self, input: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &byte in input {
            self.state = match (self.state, byte) {
                (DecodeState::Data, IAC) => DecodeState::Iac,
                (DecodeState::Data, b) => {
                    data.push(b);
                    DecodeState::Data
                }
                (DecodeState::Iac, IAC) => {
                    data.push(IAC);
                    DecodeState::Data
                }
                (DecodeState::Iac, verb @ (DO | DONT | WILL | WONT)) => DecodeState::Negotiate(verb),
                (DecodeState::Iac, SB) => DecodeState::Subnegotiation,
                // NOP, GA, AYT and other two-byte commands carry no data
                (DecodeState::Iac, _) => DecodeState::Data,
                (DecodeState::Negotiate(verb), option) => {
                    if let Some(answer) = Self::answer(verb, option) {
                        trace!("telnet: {} {} -> {}", verb, option, answer);
                        replies.extend_from_slice(&[IAC, answer, option]);
                    }
                    DecodeState::Data
                }
                (DecodeState::Subnegotiation, IAC) => DecodeState::SubnegotiationIac,
                (DecodeState::Subnegotiation, _) => DecodeState::Subnegotiation,
                (DecodeState::SubnegotiationIac, SE) => DecodeState::Data,
                (DecodeState::SubnegotiationIac, _) => DecodeState::Subnegotiation,
            };
        }
    }

    /// Our answer to an option request. Refusals of refusals are not acknowledged.
    fn answer(verb: u8, option: u8) -> Option<u8> {
        match verb {
            WILL if option == OPT_ECHO || option == OPT_SGA => Some(DO),
            WILL => Some(DONT),
            DO if option == OPT_SGA => Some(WILL),
            DO => Some(WONT),
            _ => None,
        }
    }
}

/// Telnet client transport over any byte stream (normally a `TcpStream`).
pub struct TelnetTransport<S> {
    stream: S,
    decoder: TelnetDecoder,
    /// Decoded data not yet handed to the caller.
    pending: Vec<u8>,
    read_buf: Box<[u8]>,
}

impl<S> TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: TelnetDecoder::new(),
            pending: Vec::new(),
            read_buf: vec![0u8; 4096].into_boxed_slice(),
        }
    }

    /// Escape IAC bytes and turn bare LF into the NVT CR LF line ending.
    fn encode(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + 2);
        for &byte in data {
            match byte {
                IAC => out.extend_from_slice(&[IAC, IAC]),
                b'\n' => out.extend_from_slice(b"\r\n"),
                b => out.push(b),
            }
        }
        out
    }
}

impl<S> Transport for TelnetTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.stream.write_all(&Self::encode(data)).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            if !self.pending.is_empty() {
                return Ok(Some(std::mem::take(&mut self.pending)));
            }

            let n = self.stream.read(&mut self.read_buf).await?;
            if n == 0 {
                return Ok(None);
            }

            let mut replies = Vec::new();
            self.decoder
                .decode(&self.read_buf[..n], &mut self.pending, &mut replies);

            if !replies.is_empty() {
                self.stream.write_all(&replies).await?;
                self.stream.flush().await?;
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

//! PTY channel for interactive device sessions.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use russh::ChannelMsg;
use russh::client::Msg;

use super::buffer::PatternBuffer;
use crate::error::{ChannelError, Result};

/// Interactive shell channel with pattern-based reads.
///
/// Wraps a russh session channel. Everything the device prints lands in a
/// [`PatternBuffer`]; reads complete when a pattern shows up in the tail.
pub struct PtyChannel {
    channel: russh::Channel<Msg>,
    buffer: PatternBuffer,
}

impl PtyChannel {
    /// Wrap an already-opened shell channel, searching the last
    /// `search_depth` bytes for prompts.
    pub fn new(channel: russh::Channel<Msg>, search_depth: usize) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::new(search_depth),
        }
    }

    /// Send a line of input, terminated with a newline.
    ///
    /// Any unread output still in the buffer is discarded first.
    pub async fn send(&mut self, input: &str) -> Result<()> {
        self.buffer.clear();
        let line = format!("{input}\n");
        self.channel
            .data(line.as_bytes())
            .await
            .map_err(ChannelError::Ssh)?;
        Ok(())
    }

    /// Read until `pattern` matches the buffer tail, returning everything read.
    pub async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.buffer.tail_contains(pattern) {
                return Ok(self.buffer.take());
            }

            let msg = tokio::time::timeout_at(deadline, self.channel.wait())
                .await
                .map_err(|_| ChannelError::PatternTimeout(timeout))?;

            match msg {
                Some(ChannelMsg::Data { ref data }) => {
                    trace!("channel: {} bytes", data.len());
                    self.buffer.extend(data);
                }
                Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                    self.buffer.extend(data);
                }
                Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                    return Err(ChannelError::Closed.into());
                }
                Some(_) => {}
            }
        }
    }

    /// Signal end of input to the remote shell.
    pub async fn close(&self) -> Result<()> {
        self.channel.eof().await.map_err(ChannelError::Ssh)?;
        Ok(())
    }
}

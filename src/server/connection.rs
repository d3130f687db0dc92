//! Incremental request framing over a byte stream.
//!
//! The reader knows two boundaries and nothing else about HTTP: the blank
//! line that ends the header block, and the declared length that ends the
//! body. Bytes may arrive in fragments of any size.

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::parser::{find_header_end, parse_head, HttpRequest, HEADER_TERMINATOR};
use crate::server::config::ServerConfig;
use crate::server::error::{Error, ReadPhase};
use crate::server::ConnectionId;

/// Reads one header block and one body from a stream.
pub struct ConnectionReader<'a, S> {
    stream: &'a mut S,
    // Bytes received but not yet handed out. After `read_head` this holds
    // whatever part of the body arrived together with the headers.
    buf: Vec<u8>,
    chunk: Vec<u8>,
    max_header_size: usize,
}

impl<'a, S: AsyncRead + Unpin> ConnectionReader<'a, S> {
    pub fn new(stream: &'a mut S, read_buffer_size: usize, max_header_size: usize) -> Self {
        Self {
            stream,
            buf: Vec::new(),
            chunk: vec![0; read_buffer_size.max(1)],
            max_header_size,
        }
    }

    /// Read until `\r\n\r\n` and return everything before it.
    ///
    /// Bytes that arrived after the terminator stay buffered for
    /// [`read_body`](Self::read_body). A header block longer than
    /// `max_header_size` is rejected whether it arrives in one read or many.
    pub async fn read_head(&mut self) -> Result<Vec<u8>, Error> {
        let mut search_from = 0;

        loop {
            if let Some(pos) = find_header_end(&self.buf[search_from..]) {
                let end = search_from + pos;
                if end > self.max_header_size {
                    return Err(Error::HeadersTooLarge(self.max_header_size));
                }
                let head = self.buf[..end].to_vec();
                self.buf.drain(..end + HEADER_TERMINATOR.len());
                return Ok(head);
            }

            // Without a terminator the last three bytes may still start one,
            // so only what precedes them is known to be header block.
            let block_len = self.buf.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
            if block_len > self.max_header_size {
                return Err(Error::HeadersTooLarge(self.max_header_size));
            }

            // The terminator may straddle the previous read and the next one.
            search_from = self.buf.len().saturating_sub(HEADER_TERMINATOR.len() - 1);

            let n = self.stream.read(&mut self.chunk).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed {
                    phase: ReadPhase::Headers,
                    received: self.buf.len(),
                });
            }
            self.buf.extend_from_slice(&self.chunk[..n]);
        }
    }

    /// Read exactly `declared` body bytes, starting with any already buffered.
    ///
    /// Reads are sized to what is still missing, so nothing past the declared
    /// length is ever requested from the stream. Surplus bytes that came in
    /// with the headers are dropped.
    pub async fn read_body(&mut self, declared: usize) -> Result<Vec<u8>, Error> {
        let mut body = std::mem::take(&mut self.buf);
        if body.len() > declared {
            debug!("Dropping {} bytes past declared body length", body.len() - declared);
            body.truncate(declared);
        }

        while body.len() < declared {
            let want = (declared - body.len()).min(self.chunk.len());
            let n = self.stream.read(&mut self.chunk[..want]).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed {
                    phase: ReadPhase::Body,
                    received: body.len(),
                });
            }
            body.extend_from_slice(&self.chunk[..n]);
        }

        Ok(body)
    }
}

/// Read and parse one complete request from `stream`.
pub async fn read_request<S>(
    stream: &mut S,
    connection: ConnectionId,
    config: &ServerConfig,
) -> Result<HttpRequest, Error>
where
    S: AsyncRead + Unpin,
{
    let mut reader = ConnectionReader::new(stream, config.read_buffer_size, config.max_header_size);

    let head = reader.read_head().await?;
    let (line, headers) = parse_head(&head)?;

    let declared = headers.content_length()?.unwrap_or(0);
    if declared > config.max_body_size {
        return Err(Error::BodyTooLarge {
            declared,
            limit: config.max_body_size,
        });
    }

    let body = reader.read_body(declared).await?;
    Ok(HttpRequest::new(line, headers, body, connection))
}

//! Newline-delimited transports for the MCP server.
//!
//! Framing is the same on every stream:
//!
//! - messages are UTF-8 encoded JSON-RPC
//! - each message is one line, terminated by `\n`
//! - messages never contain embedded newlines
//!
//! On stdio, stdout carries protocol messages only; logging goes to stderr.

use std::fmt;
use std::io;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Default bind address for the TCP transport.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port for the TCP transport.
pub const DEFAULT_PORT: u16 = 8000;

/// Which stream the server talks over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// stdin / stdout of the current process.
    Stdio,
    /// A TCP listener; one client connection is served at a time.
    Tcp {
        /// Bind address.
        host: String,
        /// Bind port.
        port: u16,
    },
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => f.write_str("stdio"),
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

/// A line-framed JSON-RPC channel over any async reader and writer.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

impl LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Creates a transport over the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Wraps a buffered reader and a writer.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Reads the next message line without its terminator.
    ///
    /// Returns `None` once the peer closes the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the line is not valid UTF-8.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }

        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }

        Ok(Some(line))
    }

    /// Serialises and writes one message followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_message<T: Serialize + ?Sized>(&mut self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        // Compact serde_json output escapes newlines inside strings
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Consumes the transport, returning the reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{JsonRpcResponse, RequestId};

    #[tokio::test]
    async fn reads_lines_and_strips_terminators() {
        let input: &[u8] = b"first\r\nsecond\nlast";
        let mut transport = LineTransport::new(input, Vec::new());

        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("first"));
        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("second"));
        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("last"));
        assert_eq!(transport.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn reads_from_a_chunked_stream() {
        let reader = tokio_test::io::Builder::new()
            .read(b"{\"a\":")
            .read(b"1}\n")
            .build();
        let mut transport = LineTransport::new(BufReader::new(reader), Vec::new());

        assert_eq!(transport.read_line().await.unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(transport.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn writes_one_line_per_message() {
        let mut transport = LineTransport::new(&b""[..], Vec::new());
        let response = JsonRpcResponse::success(
            RequestId::Number(1),
            serde_json::json!({"text": "line one\nline two"}),
        );

        transport.write_message(&response).await.unwrap();
        transport.write_message(&response).await.unwrap();

        let (_, written) = transport.into_parts();
        let written = String::from_utf8(written).unwrap();
        assert_eq!(written.matches('\n').count(), 2);
        assert!(written.contains(r"line one\nline two"));
    }

    #[test]
    fn transport_display() {
        assert_eq!(Transport::Stdio.to_string(), "stdio");
        let tcp = Transport::Tcp {
            host: "0.0.0.0".to_string(),
            port: 9000,
        };
        assert_eq!(tcp.to_string(), "tcp://0.0.0.0:9000");
    }
}

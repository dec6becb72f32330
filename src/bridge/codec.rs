//! Driver wire protocol codec
//!
//! Messages use HTTP-style headers followed by a JSON body:
//! ```text
//! Content-Length: <byte-length>\r\n
//! \r\n
//! <JSON body>
//! ```

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::engine::SessionError;

/// Upper bound on a single message body
const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

fn read_error(e: io::Error) -> SessionError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        SessionError::Disconnected
    } else {
        SessionError::Fault(format!("driver read failed: {}", e))
    }
}

/// Read one message from the stream
///
/// Parses the Content-Length header and reads the JSON body
pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, SessionError> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await.map_err(read_error)?;

        if bytes_read == 0 {
            return Err(SessionError::Disconnected);
        }

        // Empty line ends the headers
        if line == "\r\n" || line == "\n" {
            break;
        }

        let line = line.trim();
        if let Some(value) = line.strip_prefix("Content-Length:") {
            content_length = Some(value.trim().parse().map_err(|_| {
                SessionError::Protocol(format!("Invalid Content-Length: {}", value.trim()))
            })?);
        }
    }

    let len = content_length
        .ok_or_else(|| SessionError::Protocol("Missing Content-Length header".to_string()))?;

    if len > MAX_MESSAGE_BYTES {
        return Err(SessionError::Protocol(format!(
            "Content-Length too large: {} bytes",
            len
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(read_error)?;

    String::from_utf8(body).map_err(|e| SessionError::Protocol(format!("Invalid UTF-8: {}", e)))
}

/// Write one message to the stream
///
/// Adds the Content-Length header and writes the JSON body
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    json: &str,
) -> Result<(), SessionError> {
    let header = format!("Content-Length: {}\r\n\r\n", json.len());

    let write = async {
        writer.write_all(header.as_bytes()).await?;
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await
    };

    write.await.map_err(|e| match e.kind() {
        io::ErrorKind::BrokenPipe => SessionError::Disconnected,
        _ => SessionError::Fault(format!("driver write failed: {}", e)),
    })
}

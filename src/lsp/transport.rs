//! Content-Length framing for JSON-RPC messages over a byte stream

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::TransportError;

const CONTENT_LENGTH: &str = "content-length";

/// Largest body the reader buffers
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

pub struct MessageReader<R> {
    reader: BufReader<R>,
    max_size: usize,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_max_size(inner, MAX_MESSAGE_SIZE)
    }

    pub fn with_max_size(inner: R, max_size: usize) -> Self {
        Self {
            reader: BufReader::new(inner),
            max_size,
        }
    }

    /// Reads the next message body as raw bytes. `Ok(None)` means the
    /// stream ended cleanly between messages.
    ///
    /// A body longer than the size limit is skipped without being buffered
    /// and reported as `MessageTooLarge`; the stream stays on a frame
    /// boundary, so reading can go on.
    pub async fn read_message(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut content_length: Option<usize> = None;
        let mut saw_header = false;

        loop {
            let mut line = String::new();
            let bytes = self.reader.read_line(&mut line).await?;
            if bytes == 0 {
                if !saw_header {
                    return Ok(None);
                }
                return Err(TransportError::MissingContentLength);
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                if saw_header {
                    break;
                }
                // stray blank line between messages
                continue;
            }
            saw_header = true;

            let (name, value) = trimmed
                .split_once(':')
                .ok_or_else(|| TransportError::InvalidHeader(trimmed.to_string()))?;
            if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
                let length = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| TransportError::InvalidHeader(trimmed.to_string()))?;
                content_length = Some(length);
            }
        }

        let length = content_length.ok_or(TransportError::MissingContentLength)?;
        if length > self.max_size {
            let mut body = (&mut self.reader).take(length as u64);
            tokio::io::copy(&mut body, &mut tokio::io::sink()).await?;
            return Err(TransportError::MessageTooLarge {
                length,
                max: self.max_size,
            });
        }

        let mut body = vec![0_u8; length];
        self.reader.read_exact(&mut body).await?;
        Ok(Some(body))
    }
}

pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_message(&mut self, body: impl AsRef<[u8]>) -> Result<(), TransportError> {
        let body = body.as_ref();
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(body).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read_all(input: &[u8]) -> Vec<Result<Option<Vec<u8>>, TransportError>> {
        let mut reader = MessageReader::new(input);
        let mut results = Vec::new();
        loop {
            let result = reader.read_message().await;
            let done = !matches!(result, Ok(Some(_)));
            results.push(result);
            if done {
                return results;
            }
        }
    }

    #[tokio::test]
    async fn reads_consecutive_messages_until_eof() {
        let input = b"Content-Length: 2\r\n\r\n{}Content-Length: 4\r\n\r\nnull";

        let results = read_all(input).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().as_deref(), Some(&b"{}"[..]));
        assert_eq!(results[1].as_ref().unwrap().as_deref(), Some(&b"null"[..]));
        assert!(matches!(results[2], Ok(None)));
    }

    #[tokio::test]
    async fn header_names_are_case_insensitive_and_extra_headers_ignored() {
        let input =
            b"content-length: 2\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n[]";

        let mut reader = MessageReader::new(&input[..]);

        assert_eq!(reader.read_message().await.unwrap().as_deref(), Some(&b"[]"[..]));
    }

    #[tokio::test]
    async fn body_length_counts_bytes_not_chars() {
        let body = r#"{"text":"é"}"#;
        let input = format!("Content-Length: {}\r\n\r\n{}", body.len(), body);

        let mut reader = MessageReader::new(input.as_bytes());

        assert_eq!(
            reader.read_message().await.unwrap().as_deref(),
            Some(body.as_bytes())
        );
    }

    #[tokio::test]
    async fn missing_content_length_is_an_error() {
        let mut reader = MessageReader::new(&b"Content-Type: json\r\n\r\n{}"[..]);

        assert!(matches!(
            reader.read_message().await,
            Err(TransportError::MissingContentLength)
        ));
    }

    #[tokio::test]
    async fn malformed_content_length_is_an_error() {
        let mut reader = MessageReader::new(&b"Content-Length: many\r\n\r\n{}"[..]);

        assert!(matches!(
            reader.read_message().await,
            Err(TransportError::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn truncated_body_is_an_io_error() {
        let mut reader = MessageReader::new(&b"Content-Length: 10\r\n\r\n{}"[..]);

        assert!(matches!(
            reader.read_message().await,
            Err(TransportError::Io(_))
        ));
    }

    #[tokio::test]
    async fn writer_frames_and_reader_accepts_the_frame() {
        let mut buffer = Vec::new();
        MessageWriter::new(&mut buffer)
            .write_message(r#"{"jsonrpc":"2.0"}"#)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(buffer.clone()).unwrap(),
            "Content-Length: 17\r\n\r\n{\"jsonrpc\":\"2.0\"}"
        );
        let mut reader = MessageReader::new(&buffer[..]);
        assert_eq!(
            reader.read_message().await.unwrap().as_deref(),
            Some(&br#"{"jsonrpc":"2.0"}"#[..])
        );
    }

    #[tokio::test]
    async fn bodies_are_returned_without_utf8_validation() {
        let input = b"Content-Length: 2\r\n\r\n\xff\xfe";

        let mut reader = MessageReader::new(&input[..]);

        assert_eq!(
            reader.read_message().await.unwrap().as_deref(),
            Some(&[0xff_u8, 0xfe][..])
        );
    }

    #[tokio::test]
    async fn oversized_body_is_skipped_and_the_next_frame_still_reads() {
        let input = b"Content-Length: 6\r\n\r\n123456Content-Length: 2\r\n\r\n{}";

        let mut reader = MessageReader::with_max_size(&input[..], 4);

        assert!(matches!(
            reader.read_message().await,
            Err(TransportError::MessageTooLarge { length: 6, max: 4 })
        ));
        assert_eq!(reader.read_message().await.unwrap().as_deref(), Some(&b"{}"[..]));
        assert!(matches!(reader.read_message().await, Ok(None)));
    }

    #[tokio::test]
    async fn huge_content_length_is_rejected_without_allocating() {
        let input = format!("Content-Length: {}\r\n\r\n{{}}", usize::MAX);

        let mut reader = MessageReader::new(input.as_bytes());

        assert!(matches!(
            reader.read_message().await,
            Err(TransportError::MessageTooLarge { length: usize::MAX, .. })
        ));
        assert!(matches!(reader.read_message().await, Ok(None)));
    }
}

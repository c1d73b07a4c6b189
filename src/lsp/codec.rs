//! LSP base-protocol framing: `Content-Length: N\r\n\r\n{json}`.

use std::io;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const CONTENT_LENGTH: &str = "content-length";

/// Encode one message with its header.
pub fn encode(message: &Value) -> Vec<u8> {
    let body = message.to_string();
    let mut out = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    out.extend_from_slice(body.as_bytes());
    out
}

pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, message: &Value) -> io::Result<()> {
    writer.write_all(&encode(message)).await?;
    writer.flush().await
}

/// Read one framed message.
///
/// Returns `Ok(None)` on a clean EOF between messages. Header names are
/// matched case-insensitively; headers other than `Content-Length` are
/// ignored.
pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<Option<Value>> {
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            if saw_header {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed inside message header",
                ));
            }
            return Ok(None);
        }

        let header = line.trim_end_matches(['\r', '\n']);
        if header.is_empty() {
            if saw_header {
                break;
            }
            // Stray blank line between messages.
            continue;
        }
        saw_header = true;

        let Some((name, value)) = header.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            let value = value.trim();
            let parsed = value.parse::<usize>().map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid Content-Length: {value}"),
                )
            })?;
            content_length = Some(parsed);
        }
    }

    let len = content_length.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "message without Content-Length")
    })?;

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    serde_json::from_slice(&body)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_encode_then_read() {
        let msg = json!({ "jsonrpc": "2.0", "id": 1, "result": { "ok": true } });
        let bytes = encode(&msg);
        assert!(bytes.starts_with(b"Content-Length: "));

        let mut reader = BufReader::new(&bytes[..]);
        let decoded = read_message(&mut reader).await.unwrap();
        assert_eq!(decoded, Some(msg));
        assert_eq!(read_message(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_header_case_and_extra_headers() {
        let body = r#"{"jsonrpc":"2.0","method":"x"}"#;
        let raw = format!(
            "content-length: {}\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{}",
            body.len(),
            body
        );
        let mut reader = BufReader::new(raw.as_bytes());
        let decoded = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(decoded["method"], "x");
    }

    #[tokio::test]
    async fn test_multibyte_body_uses_byte_length() {
        let msg = json!({ "text": "héllo → wörld" });
        let bytes = encode(&msg);
        let mut reader = BufReader::new(&bytes[..]);
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(msg));
    }

    #[tokio::test]
    async fn test_missing_length_is_an_error() {
        let raw = "Content-Type: foo\r\n\r\n{}";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_message(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_non_ascii_header_is_skipped() {
        let raw = "X-Custom-Headeér: 1\r\nContent-Length: 2\r\n\r\n{}";
        let mut reader = BufReader::new(raw.as_bytes());
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(json!({})));

        let raw = "Content-Lengthé: 2\r\n\r\n{}";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_message(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_header_without_colon_is_ignored() {
        let raw = "garbage\r\nContent-Length: 2\r\n\r\n{}";
        let mut reader = BufReader::new(raw.as_bytes());
        assert_eq!(read_message(&mut reader).await.unwrap(), Some(json!({})));
    }

    #[tokio::test]
    async fn test_truncated_header_is_an_error() {
        let raw = "Content-Length: 10\r\n";
        let mut reader = BufReader::new(raw.as_bytes());
        let err = read_message(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}

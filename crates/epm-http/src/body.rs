use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::context::{FetchState, Response};
use crate::error::Error;
use crate::stream::Conn;

/// TCP/TLS receive timeout: a peer that goes silent mid-response for
/// longer than this is treated as gone. There's no separate overall fetch
/// timeout — a slow-but-steady peer can take as long as it needs.
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs one socket read/write future under [`READ_TIMEOUT`], turning both
/// an I/O error and an elapsed timeout into an [`Error`].
pub(crate) async fn timed<T>(
    host: &str,
    port: u16,
    fut: impl std::future::Future<Output = std::io::Result<T>>,
) -> Result<T, Error> {
    match tokio::time::timeout(READ_TIMEOUT, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::ReadTimeout { host: host.to_string(), port }),
    }
}

/// Drains the response body per RFC 7230 §3.3.3, writing bytes to `sink`
/// as they arrive and reporting progress before each flush. Chunked and
/// Content-Length bodies know when they're done; a body with neither
/// header runs until the peer closes the connection.
pub(crate) async fn drain_body(
    reader: &mut BufReader<Conn>,
    host: &str,
    port: u16,
    response: &Response,
    mut sink: impl Write,
    mut on_progress: impl FnMut(FetchState, u64, Option<u64>),
) -> Result<u64, Error> {
    if response.is_chunked() {
        drain_chunked(reader, host, port, &mut sink, &mut on_progress).await
    } else if let Some(expected) = response.content_length() {
        drain_fixed(reader, host, port, expected, &mut sink, &mut on_progress).await
    } else {
        drain_until_eof(reader, host, port, &mut sink, &mut on_progress).await
    }
}

const BUF_SIZE: usize = 8192;

async fn drain_fixed(
    reader: &mut BufReader<Conn>,
    host: &str,
    port: u16,
    expected: u64,
    sink: &mut impl Write,
    on_progress: &mut impl FnMut(FetchState, u64, Option<u64>),
) -> Result<u64, Error> {
    let mut remaining = expected;
    let mut read = 0u64;
    let mut buf = vec![0u8; BUF_SIZE];
    while remaining > 0 {
        let want = usize::try_from(remaining.min(BUF_SIZE as u64)).unwrap_or(BUF_SIZE);
        let n = timed(host, port, reader.read(&mut buf[..want])).await?;
        if n == 0 {
            return Err(Error::BodyTruncated);
        }
        sink.write_all(&buf[..n])?;
        read += n as u64;
        remaining -= n as u64;
        on_progress(FetchState::RecvBody, read, Some(expected));
    }
    Ok(read)
}

async fn drain_until_eof(
    reader: &mut BufReader<Conn>,
    host: &str,
    port: u16,
    sink: &mut impl Write,
    on_progress: &mut impl FnMut(FetchState, u64, Option<u64>),
) -> Result<u64, Error> {
    let mut read = 0u64;
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = timed(host, port, reader.read(&mut buf)).await?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n])?;
        read += n as u64;
        on_progress(FetchState::RecvBody, read, None);
    }
    Ok(read)
}

async fn drain_chunked(
    reader: &mut BufReader<Conn>,
    host: &str,
    port: u16,
    sink: &mut impl Write,
    on_progress: &mut impl FnMut(FetchState, u64, Option<u64>),
) -> Result<u64, Error> {
    let mut read = 0u64;
    loop {
        let mut size_line = String::new();
        timed(host, port, reader.read_line(&mut size_line)).await?;
        let size_text = size_line.trim_end_matches(['\r', '\n']);
        let size_text = size_text.split(';').next().unwrap_or(size_text);
        let size = u64::from_str_radix(size_text.trim(), 16)
            .map_err(|_| Error::MalformedChunkLength(size_line.clone()))?;

        if size == 0 {
            // Drain trailer fields up to the terminating blank line.
            loop {
                let mut trailer = String::new();
                timed(host, port, reader.read_line(&mut trailer)).await?;
                if trailer == "\r\n" || trailer.is_empty() {
                    break;
                }
            }
            break;
        }

        let mut remaining = size;
        let mut buf = vec![0u8; BUF_SIZE];
        while remaining > 0 {
            let want = usize::try_from(remaining.min(BUF_SIZE as u64)).unwrap_or(BUF_SIZE);
            let n = timed(host, port, reader.read(&mut buf[..want])).await?;
            if n == 0 {
                return Err(Error::BodyTruncated);
            }
            sink.write_all(&buf[..n])?;
            read += n as u64;
            remaining -= n as u64;
            on_progress(FetchState::RecvBody, read, None);
        }

        // Each chunk is followed by a trailing CRLF.
        let mut crlf = [0u8; 2];
        timed(host, port, reader.read_exact(&mut crlf)).await?;
    }
    Ok(read)
}

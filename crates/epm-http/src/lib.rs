//! A minimal HTTP(S)/1.1 GET client.
//!
//! No connection pooling, no request methods beyond GET, no automatic
//! redirect following — a 3xx response is handed back to the caller like
//! any other response, headers and all, so the scheduler layer decides
//! whether and how to chase it. TLS is pinned to 1.2 and its root store
//! is process-wide, configured once via [`certs`] and read by every
//! subsequent request.

mod body;
mod context;
mod error;
mod stream;
mod tls;

use std::io::Write;

use rustls_pki_types::ServerName;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

pub use context::{FetchState, Response, Scheme};
pub use error::Error;
pub use tls::{certs, current as current_tls_config, CertKind};

use context::{parse_header_line, parse_status_line, validate_no_crlf};
use stream::Conn;

const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Issues a single GET request and streams the response body into `sink`.
///
/// `on_progress` is called at each named phase (and repeatedly during
/// `RecvBody`, with bytes read so far and the total if known from
/// Content-Length). The connection is always closed afterward; this
/// client never reuses sockets across calls.
pub async fn get(
    scheme: Scheme,
    host: &str,
    port: u16,
    request_target: &str,
    mut sink: impl Write,
    mut on_progress: impl FnMut(FetchState, u64, Option<u64>),
) -> Result<Response, Error> {
    validate_no_crlf(host)?;
    validate_no_crlf(request_target)?;

    on_progress(FetchState::Connect, 0, None);
    let tcp = TcpStream::connect((host, port))
        .await
        .map_err(|source| Error::Connect { host: host.to_string(), port, source })?;

    let conn = match scheme {
        Scheme::Http => Conn::Plain(tcp),
        Scheme::Https => {
            on_progress(FetchState::Handshake, 0, None);
            let config = tls::current();
            let connector = tokio_rustls::TlsConnector::from(config);
            let server_name = ServerName::try_from(host.to_string())
                .map_err(|source| Error::Handshake { host: host.to_string(), source: std::io::Error::other(source) })?;
            let tls_stream = connector
                .connect(server_name, tcp)
                .await
                .map_err(|source| Error::Handshake { host: host.to_string(), source })?;
            Conn::Tls(Box::new(tls_stream))
        }
    };

    let mut reader = BufReader::new(conn);

    on_progress(FetchState::Send, 0, None);
    let request = format!(
        "GET {request_target} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\nUser-Agent: epm-http\r\nAccept: */*\r\n\r\n"
    );
    reader
        .get_mut()
        .write_all(request.as_bytes())
        .await
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::WriteZero {
                Error::ShortWrite { host: host.to_string() }
            } else {
                Error::Io(source)
            }
        })?;

    on_progress(FetchState::RecvHeader, 0, None);
    let (status, headers) = read_head(&mut reader, host, port).await?;

    // A redirect is handed back as data (headers include Location) rather
    // than followed or treated as an error; any other non-200 status is a
    // hard failure.
    if status != 200 && !matches!(status, 301 | 302 | 303) {
        return Err(Error::NonOkStatus(status));
    }

    let mut response = Response { status, headers, body_len: 0 };

    if status == 200 {
        let body_len =
            body::drain_body(&mut reader, host, port, &response, &mut sink, &mut on_progress).await?;
        response.body_len = body_len;
    }

    Ok(response)
}

async fn read_head(
    reader: &mut BufReader<Conn>,
    host: &str,
    port: u16,
) -> Result<(u16, Vec<(String, String)>), Error> {
    let mut budget = MAX_HEADER_BYTES;

    let mut status_line = String::new();
    read_capped_line(reader, host, port, &mut status_line, &mut budget).await?;
    let status = parse_status_line(&status_line)?;

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        read_capped_line(reader, host, port, &mut line, &mut budget).await?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        if let Some(header) = parse_header_line(&line) {
            headers.push(header);
        }
    }

    Ok((status, headers))
}

async fn read_capped_line(
    reader: &mut BufReader<Conn>,
    host: &str,
    port: u16,
    line: &mut String,
    budget: &mut usize,
) -> Result<(), Error> {
    let n = body::timed(host, port, reader.read_line(line)).await?;
    *budget = budget.checked_sub(n).ok_or(Error::HeaderBufferExceeded)?;
    Ok(())
}

use crate::error::Error;

/// Connection scheme selected by the caller; decides whether `get` wraps
/// the socket in a TLS 1.2 session before sending anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

/// Where a fetch currently sits, reported to the progress callback so a
/// caller can render "connecting" vs "downloading" distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Connect,
    Handshake,
    Send,
    RecvHeader,
    RecvBody,
}

/// What came back: the status line, the header fields in wire order, and
/// how many body bytes were written to the caller's sink.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body_len: u64,
}

impl Response {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn content_length(&self) -> Option<u64> {
        self.header("content-length").and_then(|v| v.trim().parse().ok())
    }

    pub(crate) fn is_chunked(&self) -> bool {
        self.header("transfer-encoding")
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    }
}

/// Rejects a host or request-target carrying an embedded CR or LF, which
/// would otherwise let a caller smuggle extra header lines into the
/// request we build.
pub(crate) fn validate_no_crlf(value: &str) -> Result<(), Error> {
    if value.contains(['\r', '\n']) {
        Err(Error::EmbeddedNewline)
    } else {
        Ok(())
    }
}

pub(crate) fn parse_status_line(line: &str) -> Result<u16, Error> {
    let mut parts = line.trim_end().splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let status = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(Error::MalformedStatusLine(line.to_string()));
    }
    status
        .parse::<u16>()
        .map_err(|_| Error::MalformedStatusLine(line.to_string()))
}

pub(crate) fn parse_header_line(line: &str) -> Option<(String, String)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (name, value) = line.split_once(':')?;
    Some((name.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ok_status_line() {
        assert_eq!(parse_status_line("HTTP/1.1 200 OK\r\n").unwrap(), 200);
    }

    #[test]
    fn rejects_non_http_status_line() {
        assert!(parse_status_line("GET / HTTP/1.1\r\n").is_err());
    }

    #[test]
    fn parses_header_field() {
        let (name, value) = parse_header_line("Content-Length: 42\r\n").unwrap();
        assert_eq!(name, "Content-Length");
        assert_eq!(value, "42");
    }

    #[test]
    fn rejects_embedded_newline_in_host() {
        assert!(validate_no_crlf("example.com\r\nX-Evil: 1").is_err());
    }

    #[test]
    fn response_header_lookup_is_case_insensitive() {
        let response = Response {
            status: 200,
            headers: vec![("Content-Length".to_string(), "10".to_string())],
            body_len: 0,
        };
        assert_eq!(response.content_length(), Some(10));
        assert!(!response.is_chunked());
    }
}

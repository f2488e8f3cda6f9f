use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("can't connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("tls handshake with {host} failed: {source}")]
    Handshake {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("short write sending request to {host}")]
    ShortWrite { host: String },

    #[error("response header buffer length exceeded")]
    HeaderBufferExceeded,

    #[error("received non 200-response: {0}")]
    NonOkStatus(u16),

    #[error("malformed response status line: {0:?}")]
    MalformedStatusLine(String),

    #[error("malformed chunk length line: {0:?}")]
    MalformedChunkLength(String),

    #[error("connection closed unexpectedly while reading the response body")]
    BodyTruncated,

    #[error("timed out waiting on {host}:{port} after 5s")]
    ReadTimeout { host: String, port: u16 },

    #[error("host or request-target contains an embedded CR/LF")]
    EmbeddedNewline,

    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[error("can't load certificates from {path}: {source}", path = .path.display())]
    Certs {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("system certificate store is not supported on this platform")]
    SystemCertsUnsupported,
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(source)
    }
}

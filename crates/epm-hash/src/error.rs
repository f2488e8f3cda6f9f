use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("can't hash {path}: {source}", path = .path.display())]
    OpenFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};

use crate::error::Error;

/// The kind of certificate source `certs()` installs.
#[derive(Debug, Clone)]
pub enum CertKind<'a> {
    /// Parse every CA in a directory.
    Dir(&'a Path),
    /// Parse a single PEM bundle file.
    File(&'a Path),
    /// The platform's trust store.
    System,
    /// Switch to verify-optional.
    NoVerify,
}

static CONFIG: OnceLock<RwLock<Arc<ClientConfig>>> = OnceLock::new();

fn slot() -> &'static RwLock<Arc<ClientConfig>> {
    CONFIG.get_or_init(|| RwLock::new(Arc::new(default_config())))
}

fn default_config() -> ClientConfig {
    let mut store = RootCertStore::empty();
    store.extend(webpki_root_certs::TLS_SERVER_ROOTS.iter().cloned());
    build_config(store, false)
}

fn build_config(store: RootCertStore, no_verify: bool) -> ClientConfig {
    let builder = ClientConfig::builder_with_protocol_versions(&[&rustls::version::TLS12]);
    if no_verify {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAny))
            .with_no_client_auth()
    } else {
        builder
            .with_root_certificates(store)
            .with_no_client_auth()
    }
}

/// The process-wide TLS configuration. Reinitializing via [`certs`] drops
/// the prior `Arc<ClientConfig>` (and whatever it alone was keeping
/// alive) as soon as every in-flight connection using it finishes.
pub fn current() -> Arc<ClientConfig> {
    Arc::clone(&slot().read().unwrap_or_else(std::sync::PoisonError::into_inner))
}

pub fn certs(kind: CertKind<'_>) -> Result<(), Error> {
    let config = match kind {
        CertKind::Dir(dir) => build_config(load_dir(dir)?, false),
        CertKind::File(path) => build_config(load_file(path)?, false),
        CertKind::System => build_config(load_system()?, false),
        CertKind::NoVerify => build_config(RootCertStore::empty(), true),
    };
    *slot().write().unwrap_or_else(std::sync::PoisonError::into_inner) = Arc::new(config);
    Ok(())
}

fn load_dir(dir: &Path) -> Result<RootCertStore, Error> {
    let mut store = RootCertStore::empty();
    let entries = fs_err::read_dir(dir).map_err(|source| Error::Certs {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| Error::Certs {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_cert = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("pem" | "crt" | "cer")
        );
        if !is_cert {
            continue;
        }
        if let Err(source) = add_file_to_store(&mut store, &path) {
            tracing::warn!(path = %path.display(), %source, "skipping unreadable certificate");
        }
    }
    Ok(store)
}

fn load_file(path: &Path) -> Result<RootCertStore, Error> {
    let mut store = RootCertStore::empty();
    add_file_to_store(&mut store, path).map_err(|source| Error::Certs {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(store)
}

fn add_file_to_store(store: &mut RootCertStore, path: &Path) -> std::io::Result<()> {
    let bytes = fs_err::read(path)?;
    let mut reader = std::io::BufReader::new(bytes.as_slice());
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert?;
        let _ = store.add(cert);
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn load_system() -> Result<RootCertStore, Error> {
    // Matches the original: the macOS system store requires Security
    // Framework bindings the core never pulled in, so this path fails
    // outright rather than silently falling back to the webpki bundle.
    Err(Error::SystemCertsUnsupported)
}

#[cfg(not(target_os = "macos"))]
fn load_system() -> Result<RootCertStore, Error> {
    let mut store = RootCertStore::empty();
    let result = rustls_native_certs::load_native_certs();
    for source in result.errors {
        tracing::warn!(%source, "error loading a native certificate");
    }
    for cert in result.certs {
        let _ = store.add(cert);
    }
    Ok(store)
}

/// Installed by `certs("noverify")`: accepts every presented certificate.
/// Used only when the caller has explicitly opted out of verification.
#[derive(Debug)]
struct AcceptAny;

impl ServerCertVerifier for AcceptAny {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
        ]
    }
}

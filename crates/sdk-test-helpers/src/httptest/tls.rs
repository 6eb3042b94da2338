// crates/sdk-test-helpers/src/httptest/tls.rs
// ============================================================================
// Module: Server TLS Configuration
// Description: Certificate material for HTTPS test servers.
// Purpose: Serve HTTPS locally with generated or supplied certificates.
// Dependencies: rcgen, rustls, rustls-pki-types, thiserror
// ============================================================================

//! ## Overview
//! [`ServerTlsConfig::self_signed`] generates an ephemeral certificate valid
//! for `localhost` and `127.0.0.1`, so no private keys are committed. Clients
//! must trust [`ServerTlsConfig::certificate_pem`] as a root, or disable
//! certificate verification.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use rcgen::CertifiedKey;
use rcgen::generate_simple_self_signed;
use rustls::ServerConfig;
use rustls_pki_types::CertificateDer;
use rustls_pki_types::PrivateKeyDer;
use rustls_pki_types::pem::PemObject;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// TLS setup failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TlsError {
    /// Certificate generation failed.
    #[error("certificate generation failed: {0}")]
    Generate(String),
    /// Certificate or key PEM could not be parsed.
    #[error("invalid PEM: {0}")]
    InvalidPem(String),
    /// rustls rejected the certificate and key.
    #[error("invalid TLS configuration: {0}")]
    Config(String),
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Server certificate and private key.
///
/// # Invariants
/// - The certificate and key PEM both parsed when the value was built.
#[derive(Clone)]
pub struct ServerTlsConfig {
    /// Certificate, PEM encoded.
    certificate_pem: String,
    /// Private key, PEM encoded.
    private_key_pem: String,
    /// Certificate, DER encoded.
    certificate_der: CertificateDer<'static>,
}

impl ServerTlsConfig {
    /// Generates a self-signed certificate for `localhost` and `127.0.0.1`.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError::Generate`] if key or certificate generation fails.
    pub fn self_signed() -> Result<Self, TlsError> {
        let CertifiedKey {
            cert,
            signing_key,
        } = generate_simple_self_signed(vec!["localhost".to_string(), "127.0.0.1".to_string()])
            .map_err(|err| TlsError::Generate(err.to_string()))?;
        Ok(Self {
            certificate_pem: cert.pem(),
            private_key_pem: signing_key.serialize_pem(),
            certificate_der: cert.der().clone(),
        })
    }

    /// Uses an existing certificate and private key.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError::InvalidPem`] if either input does not parse.
    pub fn from_pem(certificate_pem: &str, private_key_pem: &str) -> Result<Self, TlsError> {
        let certificate_der = CertificateDer::from_pem_slice(certificate_pem.as_bytes())
            .map_err(|err| TlsError::InvalidPem(format!("certificate: {err}")))?;
        PrivateKeyDer::from_pem_slice(private_key_pem.as_bytes())
            .map_err(|err| TlsError::InvalidPem(format!("private key: {err}")))?;
        Ok(Self {
            certificate_pem: certificate_pem.to_string(),
            private_key_pem: private_key_pem.to_string(),
            certificate_der,
        })
    }

    /// Returns the certificate in PEM form.
    #[must_use]
    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    /// Returns the private key in PEM form.
    #[must_use]
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// Returns the certificate in DER form.
    #[must_use]
    pub fn certificate_der(&self) -> &[u8] {
        self.certificate_der.as_ref()
    }

    /// Builds a rustls server configuration offering HTTP/1.1.
    ///
    /// # Errors
    ///
    /// Returns [`TlsError`] if the key does not parse or does not match the
    /// certificate.
    pub fn rustls_server_config(&self) -> Result<Arc<ServerConfig>, TlsError> {
        let key = PrivateKeyDer::from_pem_slice(self.private_key_pem.as_bytes())
            .map_err(|err| TlsError::InvalidPem(format!("private key: {err}")))?;
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let mut config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|err| TlsError::Config(err.to_string()))?
            .with_no_client_auth()
            .with_single_cert(vec![self.certificate_der.clone()], key)
            .map_err(|err| TlsError::Config(err.to_string()))?;
        config.alpn_protocols = vec![b"http/1.1".to_vec()];
        Ok(Arc::new(config))
    }
}

impl fmt::Debug for ServerTlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTlsConfig")
            .field("private_key_pem", &"<redacted>")
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

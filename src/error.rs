//! use csrkit::error::CsrKitError;

use thiserror::Error;

use crate::key::Cipher;

/// Represents errors that can occur while issuing a certificate signing request.
///
/// Every variant is fatal for the issuance attempt: nothing produced before
/// the failure may be treated as valid output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsrKitError {
    /// Error during key pair generation (entropy exhausted or unsupported size).
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error while encoding a distinguished name or an extension.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error while decoding DER or PEM input.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error while signing the certification request.
    #[error("Signing error: {0}")]
    SigningError(String),

    /// A signature did not verify against the given public key.
    #[error("Signature verification failed: {0}")]
    VerificationError(String),

    /// The selected cipher has no key generation support.
    #[error("Unsupported cipher: {0}")]
    UnsupportedCipher(Cipher),

    /// Error while loading the issuance configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<der::Error> for CsrKitError {
    /// Converts a `der::Error` into a `CsrKitError`.
    fn from(err: der::Error) -> Self {
        CsrKitError::DecodingError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for CsrKitError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        CsrKitError::EncodingError(err.to_string())
    }
}

impl From<pem::PemError> for CsrKitError {
    fn from(err: pem::PemError) -> Self {
        CsrKitError::DecodingError(err.to_string())
    }
}

impl From<std::io::Error> for CsrKitError {
    fn from(err: std::io::Error) -> Self {
        CsrKitError::IoError(err.to_string())
    }
}

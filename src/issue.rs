use tracing::{info, instrument};
use zeroize::Zeroizing;

use crate::config::IssuanceConfig;
use crate::csr::extensions::encode_extension;
use crate::csr::params::build_subject;
use crate::csr::{CertificateRequest, assemble_and_sign};
use crate::error::CsrKitError;
use crate::key::{Cipher, RSA_KEY_SIZE, generate_key_pair};

/// Suggested permissions of the written certification request.
pub const CSR_FILE_MODE: u32 = 0o644;

/// Suggested permissions of the written private key. Never world readable.
pub const KEY_FILE_MODE: u32 = 0o600;

/// The output of one issuance run: a signed request and the private key it
/// was signed with, both PEM-encoded.
pub struct IssuedRequest {
    pub request: CertificateRequest,
    pub csr_pem: String,
    pub key_pem: Zeroizing<String>,
    pub csr_mode: u32,
    pub key_mode: u32,
}

impl std::fmt::Debug for IssuedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedRequest")
            .field("csr_pem", &self.csr_pem)
            .field("csr_mode", &format_args!("{:o}", self.csr_mode))
            .field("key_mode", &format_args!("{:o}", self.key_mode))
            .finish_non_exhaustive()
    }
}

/// Runs the whole pipeline for `config`: validates and encodes the subject
/// and the extensions, generates a fresh 4096-bit RSA key pair and signs the
/// request with it.
///
/// Nothing is returned unless every step succeeded.
#[instrument(
    name = "issue_certificate_request",
    skip_all,
    fields(csr.cn = %config.common_name, csr.cipher = %config.cipher)
)]
pub fn issue(config: IssuanceConfig) -> Result<IssuedRequest, CsrKitError> {
    if config.cipher != Cipher::Rsa {
        return Err(CsrKitError::UnsupportedCipher(config.cipher));
    }

    let subject = build_subject(&config.identity())?;
    let extensions = config
        .extension_specs()?
        .iter()
        .map(encode_extension)
        .collect::<Result<Vec<_>, _>>()?;

    let key_pair = generate_key_pair(RSA_KEY_SIZE)?;
    let signed = assemble_and_sign(subject, extensions, &key_pair)?;

    info!(
        csr.subject = %signed.request.subject_name(),
        key.bits = key_pair.bits(),
        "issued certificate signing request"
    );

    Ok(IssuedRequest {
        request: signed.request,
        csr_pem: signed.csr_pem,
        key_pem: signed.key_pem,
        csr_mode: CSR_FILE_MODE,
        key_mode: KEY_FILE_MODE,
    })
}

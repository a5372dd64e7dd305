pub mod extensions;
pub mod params;

use der::asn1::AnyRef;
use der::{Decode, Encode};
use rsa::RsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use tracing::{debug, instrument};
use x509_cert::name::Name;
use x509_cert::request::CertReq;
use x509_cert::spki::AlgorithmIdentifierOwned;
use zeroize::Zeroizing;

use crate::error::CsrKitError;
use crate::key::KeyPair;
use crate::pem_utils::{CERTIFICATE_REQUEST_LABEL, der_to_pem, pem_to_der};
use crate::request_info::CertificateRequestDraft;
use crate::signer::verify_data;
use params::{ExtensionParam, SubjectIdentity};

pub type Result<T> = std::result::Result<T, CsrKitError>;

/// Represents the supported signature algorithms for certification requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-384 with RSA encryption (RSASSA-PKCS1-v1_5).
    Sha384WithRSA,
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    ///
    /// RFC 4055 requires the parameters of the PKCS#1 v1.5 algorithms to be NULL.
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha384WithRSA => AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION,
                parameters: Some(AnyRef::NULL.into()),
            },
        }
    }
}

impl TryFrom<&AlgorithmIdentifierOwned> for SignatureAlgorithm {
    type Error = CsrKitError;

    fn try_from(value: &AlgorithmIdentifierOwned) -> Result<Self> {
        match value.oid {
            const_oid::db::rfc5912::SHA_384_WITH_RSA_ENCRYPTION => {
                Ok(SignatureAlgorithm::Sha384WithRSA)
            }
            other => Err(CsrKitError::DecodingError(format!(
                "unsupported signature algorithm {other}"
            ))),
        }
    }
}

/// Represents a signed PKCS#10 certification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRequest {
    /// The inner representation of the request.
    pub inner: CertReq,
}

impl CertificateRequest {
    /// Encodes the request into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CsrKitError::EncodingError(e.to_string()))
    }

    /// Encodes the request into a `CERTIFICATE REQUEST` PEM block.
    pub fn to_pem(&self) -> Result<String> {
        Ok(der_to_pem(&self.to_der()?, CERTIFICATE_REQUEST_LABEL))
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: CertReq::from_der(der)?,
        })
    }

    pub fn from_pem(pem: &str) -> Result<Self> {
        Self::from_der(&pem_to_der(pem, CERTIFICATE_REQUEST_LABEL)?)
    }

    pub fn subject_name(&self) -> &Name {
        &self.inner.info.subject
    }

    /// Decodes the subject back into a [`SubjectIdentity`].
    pub fn subject(&self) -> Result<SubjectIdentity> {
        SubjectIdentity::from_x509_name(self.subject_name())
    }

    pub fn signature_algorithm(&self) -> Result<SignatureAlgorithm> {
        SignatureAlgorithm::try_from(&self.inner.algorithm)
    }

    /// Returns the requested extensions in the order they were encoded.
    pub fn extensions(&self) -> Result<Vec<ExtensionParam>> {
        let draft =
            CertificateRequestDraft::from_cert_req_info(&self.inner.info, self.signature_algorithm()?)?;
        Ok(draft.extensions)
    }

    /// Returns the RSA public key embedded in the request.
    pub fn public_key(&self) -> Result<RsaPublicKey> {
        let spki_der = self.inner.info.public_key.to_der()?;
        RsaPublicKey::from_public_key_der(&spki_der)
            .map_err(|e| CsrKitError::DecodingError(e.to_string()))
    }

    /// Verifies the request signature against `public_key`.
    pub fn verify(&self, public_key: &RsaPublicKey) -> Result<()> {
        self.signature_algorithm()?;

        let info_der = self
            .inner
            .info
            .to_der()
            .map_err(|e| CsrKitError::EncodingError(e.to_string()))?;
        let signature = self.inner.signature.as_bytes().ok_or_else(|| {
            CsrKitError::VerificationError("signature is not octet aligned".to_string())
        })?;

        verify_data(&info_der, signature, public_key)
    }

    /// Verifies the request signature against the public key it carries.
    pub fn verify_self(&self) -> Result<()> {
        self.verify(&self.public_key()?)
    }
}

/// The signed request together with both PEM artifacts.
pub struct SignedRequest {
    pub request: CertificateRequest,
    /// `CERTIFICATE REQUEST` PEM block.
    pub csr_pem: String,
    /// `RSA PRIVATE KEY` PEM block, unencrypted PKCS#1.
    pub key_pem: Zeroizing<String>,
}

impl std::fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedRequest")
            .field("request", &self.request)
            .field("csr_pem", &self.csr_pem)
            .finish_non_exhaustive()
    }
}

/// Builds the certification request for `subject` and `extensions`, signs it
/// with `key_pair` and serializes the request and the private key as PEM.
///
/// The request is checked against the key pair's public key before anything
/// is returned.
#[instrument(name = "assemble_and_sign", skip_all, fields(subject = %subject))]
pub fn assemble_and_sign(
    subject: Name,
    extensions: Vec<ExtensionParam>,
    key_pair: &KeyPair,
) -> Result<SignedRequest> {
    let draft = CertificateRequestDraft::new(subject, key_pair.to_spki()?, extensions);
    let request = draft.sign(key_pair)?;

    request
        .verify(key_pair.public_key())
        .map_err(|e| CsrKitError::SigningError(format!("self-check failed: {e}")))?;

    let csr_pem = request.to_pem()?;
    let key_pem = key_pair.to_pkcs1_pem()?;

    debug!(csr.pem_len = csr_pem.len(), "serialized certification request");

    Ok(SignedRequest {
        request,
        csr_pem,
        key_pem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::extensions::{
        BasicConstraints, ExtendedKeyUsage, ExtensionSpec, KeyUsage, ToAndFromX509Extension,
        encode_extension,
    };
    use crate::key::RSA_KEY_SIZE;

    fn sign_minimal(key_pair: &KeyPair) -> SignedRequest {
        let subject = SubjectIdentity::builder()
            .common_name("unit")
            .build()
            .to_x509_name()
            .unwrap();
        let extensions = [
            ExtensionSpec::BasicConstraints(BasicConstraints {
                is_ca: true,
                max_path_length: Some(1),
            }),
            ExtensionSpec::KeyUsage(KeyUsage::from_names(&["keyCertSign", "cRLSign"]).unwrap()),
            ExtensionSpec::ExtendedKeyUsage(ExtendedKeyUsage::default()),
        ]
        .iter()
        .map(encode_extension)
        .collect::<Result<Vec<_>>>()
        .unwrap();

        assemble_and_sign(subject, extensions, key_pair).unwrap()
    }

    #[test]
    fn signed_request_survives_pem_round_trip() {
        let key_pair = KeyPair::generate_rsa(RSA_KEY_SIZE).unwrap();
        let signed = sign_minimal(&key_pair);

        assert!(
            signed
                .csr_pem
                .starts_with("-----BEGIN CERTIFICATE REQUEST-----\n")
        );
        let parsed = CertificateRequest::from_pem(&signed.csr_pem).unwrap();
        assert_eq!(parsed, signed.request);
        parsed.verify_self().unwrap();
        assert_eq!(&parsed.public_key().unwrap(), key_pair.public_key());
        assert_eq!(
            parsed.signature_algorithm().unwrap(),
            SignatureAlgorithm::Sha384WithRSA
        );

        let extensions = parsed.extensions().unwrap();
        assert_eq!(extensions.len(), 3);
        assert_eq!(
            extensions[0].to_extension::<BasicConstraints>().unwrap(),
            BasicConstraints {
                is_ca: true,
                max_path_length: Some(1),
            }
        );
        assert_eq!(extensions[1].oid, KeyUsage::OID);
    }

    #[test]
    fn algorithm_identifier_carries_null_parameters() {
        let algorithm = AlgorithmIdentifierOwned::from(SignatureAlgorithm::Sha384WithRSA);
        assert_eq!(
            algorithm.to_der().unwrap(),
            vec![
                0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x0c,
                0x05, 0x00
            ]
        );
    }

    #[test]
    fn rejects_unknown_signature_algorithm() {
        let algorithm = AlgorithmIdentifierOwned {
            oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
            parameters: None,
        };
        assert!(matches!(
            SignatureAlgorithm::try_from(&algorithm),
            Err(CsrKitError::DecodingError(_))
        ));
    }
}

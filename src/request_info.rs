use der::asn1::{Any, BitString, SetOfVec};
use der::{Decode, Encode};
use tracing::{debug, instrument};
use x509_cert::attr::Attribute;
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::request::{CertReq, CertReqInfo, Version};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::csr::params::ExtensionParam;
use crate::csr::{CertificateRequest, SignatureAlgorithm};
use crate::error::CsrKitError;
use crate::key::KeyPair;
use crate::signer::sign_data;

/// PKCS#9 `extensionRequest` attribute type (RFC 2985, section 5.4.2).
pub const EXTENSION_REQUEST_OID: const_oid::ObjectIdentifier =
    const_oid::db::rfc5912::ID_EXTENSION_REQ;

/// Represents the unsigned portion of a PKCS#10 certification request.
///
/// # Fields
/// * `subject` - The distinguished name of the requester.
/// * `subject_public_key` - The public key the request binds to the subject.
/// * `signature_algorithm` - The algorithm the request will be signed with.
/// * `extensions` - Requested X.509 extensions, folded into one
///   `extensionRequest` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateRequestDraft {
    pub subject: Name,
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    pub signature_algorithm: SignatureAlgorithm,
    pub extensions: Vec<ExtensionParam>,
}

impl CertificateRequestDraft {
    /// Creates a draft signed with SHA-384 with RSA.
    pub fn new(
        subject: Name,
        subject_public_key: SubjectPublicKeyInfoOwned,
        extensions: Vec<ExtensionParam>,
    ) -> Self {
        Self {
            subject,
            subject_public_key,
            signature_algorithm: SignatureAlgorithm::Sha384WithRSA,
            extensions,
        }
    }

    /// Converts the draft into a `CertReqInfo` for DER encoding.
    pub fn to_cert_req_info(&self) -> Result<CertReqInfo, CsrKitError> {
        let extensions = self
            .extensions
            .iter()
            .map(ExtensionParam::to_x509_extension)
            .collect::<Result<Vec<Extension>, _>>()?;

        let mut attributes = SetOfVec::new();
        if !extensions.is_empty() {
            let value = Any::encode_from(&extensions)
                .map_err(|e| CsrKitError::EncodingError(e.to_string()))?;
            let values = SetOfVec::try_from(vec![value])
                .map_err(|e| CsrKitError::EncodingError(e.to_string()))?;
            attributes
                .insert(Attribute {
                    oid: EXTENSION_REQUEST_OID,
                    values,
                })
                .map_err(|e| CsrKitError::EncodingError(e.to_string()))?;
        }

        Ok(CertReqInfo {
            version: Version::V1,
            subject: self.subject.clone(),
            public_key: self.subject_public_key.clone(),
            attributes,
        })
    }

    /// Creates a draft from a decoded `CertReqInfo`.
    pub fn from_cert_req_info(
        info: &CertReqInfo,
        signature_algorithm: SignatureAlgorithm,
    ) -> Result<Self, CsrKitError> {
        let mut extensions = Vec::new();
        for attribute in info.attributes.iter() {
            if attribute.oid != EXTENSION_REQUEST_OID {
                continue;
            }
            for value in attribute.values.iter() {
                let requested = Vec::<Extension>::from_der(&value.to_der()?)?;
                extensions.extend(requested.iter().map(ExtensionParam::from_x509_extension));
            }
        }

        Ok(Self {
            subject: info.subject.clone(),
            subject_public_key: info.public_key.clone(),
            signature_algorithm,
            extensions,
        })
    }

    /// Signs the draft with `key_pair`, consuming it.
    ///
    /// Fails with [`CsrKitError::SigningError`] when the draft's public key
    /// does not belong to `key_pair`.
    #[instrument(name = "sign_certificate_request", skip_all, fields(subject = %self.subject))]
    pub fn sign(self, key_pair: &KeyPair) -> Result<CertificateRequest, CsrKitError> {
        if self.subject_public_key != key_pair.to_spki()? {
            return Err(CsrKitError::SigningError(
                "the request's public key does not belong to the signing key pair".to_string(),
            ));
        }

        let info = self.to_cert_req_info()?;
        let info_der = info
            .to_der()
            .map_err(|e| CsrKitError::EncodingError(e.to_string()))?;
        let signature = sign_data(&info_der, key_pair)?;

        debug!(
            csr.extensions = self.extensions.len(),
            csr.signature_algorithm = ?self.signature_algorithm,
            "signed certification request"
        );

        Ok(CertificateRequest {
            inner: CertReq {
                info,
                algorithm: self.signature_algorithm.into(),
                signature: BitString::from_bytes(&signature)
                    .map_err(|e| CsrKitError::SigningError(e.to_string()))?,
            },
        })
    }
}

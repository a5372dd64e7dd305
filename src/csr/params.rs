use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519::{C, CN, L, O, ST};
use der::{Tag, Tagged};
use der::asn1::{Any, OctetString, PrintableStringRef, Utf8StringRef};
use tracing::{debug, instrument};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{Name, RdnSequence, RelativeDistinguishedName};

use super::extensions::ToAndFromX509Extension;
use crate::error::CsrKitError;

/// Subject identity of a certification request.
///
/// Each optional attribute is a list so that multi-valued attributes can be
/// expressed later; today every value is encoded as its own RDN.
///
/// # Fields
/// * `common_name` - The common name (CN).
/// * `country` - Two-letter country codes (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder)]
pub struct SubjectIdentity {
    #[builder(into)]
    pub common_name: String,
    #[builder(default)]
    pub country: Vec<String>,
    #[builder(default)]
    pub state: Vec<String>,
    #[builder(default)]
    pub locality: Vec<String>,
    #[builder(default)]
    pub organization: Vec<String>,
}

/// Upper bounds from RFC 5280, Appendix A.1.
const UB_COMMON_NAME: usize = 64;
const UB_STATE_NAME: usize = 128;
const UB_LOCALITY_NAME: usize = 128;
const UB_ORGANIZATION_NAME: usize = 64;
const COUNTRY_CODE_LEN: usize = 2;

impl SubjectIdentity {
    /// Attribute type, values and upper bound, in RDN order.
    fn attributes(&self) -> [(ObjectIdentifier, &[String], usize); 5] {
        [
            (CN, std::slice::from_ref(&self.common_name), UB_COMMON_NAME),
            (C, &self.country, COUNTRY_CODE_LEN),
            (ST, &self.state, UB_STATE_NAME),
            (L, &self.locality, UB_LOCALITY_NAME),
            (O, &self.organization, UB_ORGANIZATION_NAME),
        ]
    }

    /// Converts the identity into an X.509 `Name`.
    ///
    /// RDNs are emitted as CommonName, Country, State, Locality,
    /// Organization. Empty values are skipped.
    pub fn to_x509_name(&self) -> Result<Name, CsrKitError> {
        let mut rdns = Vec::new();

        for (oid, values, upper_bound) in self.attributes() {
            for value in values.iter().filter(|v| !v.is_empty()) {
                let value = encode_attribute_value(oid, value, upper_bound)?;
                let rdn = RelativeDistinguishedName::try_from(vec![AttributeTypeAndValue {
                    oid,
                    value,
                }])
                .map_err(|e| CsrKitError::EncodingError(e.to_string()))?;
                rdns.push(rdn);
            }
        }

        Ok(RdnSequence(rdns))
    }

    /// Creates a `SubjectIdentity` from an X.509 `Name`.
    ///
    /// Attributes other than CN, C, ST, L and O are ignored.
    pub fn from_x509_name(name: &Name) -> Result<Self, CsrKitError> {
        let mut identity = SubjectIdentity::default();
        let mut common_names = Vec::new();

        for (oid, value) in name_attributes(name)? {
            match oid {
                CN => common_names.push(value),
                C => identity.country.push(value),
                ST => identity.state.push(value),
                L => identity.locality.push(value),
                O => identity.organization.push(value),
                _ => {}
            }
        }

        if common_names.len() > 1 {
            return Err(CsrKitError::DecodingError(
                "subject carries more than one common name".to_string(),
            ));
        }
        identity.common_name = common_names.pop().unwrap_or_default();

        Ok(identity)
    }
}

/// DER-encodes the identity as an RDN sequence.
#[instrument(name = "build_subject", skip_all, fields(subject.cn = %identity.common_name))]
pub fn build_subject(identity: &SubjectIdentity) -> Result<Name, CsrKitError> {
    let name = identity.to_x509_name()?;
    debug!(subject = %name, rdns = name.0.len(), "built subject name");
    Ok(name)
}

/// Flattens a `Name` into `(attribute type, value)` pairs in RDN order.
pub fn name_attributes(name: &Name) -> Result<Vec<(ObjectIdentifier, String)>, CsrKitError> {
    let mut attributes = Vec::new();
    for rdn in name.0.iter() {
        for atv in rdn.0.iter() {
            match atv.value.tag() {
                Tag::Utf8String | Tag::PrintableString | Tag::Ia5String => {}
                tag => {
                    return Err(CsrKitError::DecodingError(format!(
                        "unsupported string type {tag} for attribute {}",
                        atv.oid
                    )));
                }
            }
            let value = std::str::from_utf8(atv.value.value())
                .map_err(|e| CsrKitError::DecodingError(e.to_string()))?;
            attributes.push((atv.oid, value.to_string()));
        }
    }
    Ok(attributes)
}

fn encode_attribute_value(
    oid: ObjectIdentifier,
    value: &str,
    upper_bound: usize,
) -> Result<Any, CsrKitError> {
    let length = value.chars().count();

    if oid == C {
        if length != COUNTRY_CODE_LEN {
            return Err(CsrKitError::EncodingError(format!(
                "country code \"{value}\" must be exactly {COUNTRY_CODE_LEN} characters"
            )));
        }
        let printable = PrintableStringRef::new(value).map_err(|e| {
            CsrKitError::EncodingError(format!("country code \"{value}\" is not printable: {e}"))
        })?;
        return Any::encode_from(&printable).map_err(|e| CsrKitError::EncodingError(e.to_string()));
    }

    if length > upper_bound {
        return Err(CsrKitError::EncodingError(format!(
            "value for attribute {oid} is {length} characters long, at most {upper_bound} are allowed"
        )));
    }

    let utf8 = Utf8StringRef::new(value).map_err(|e| CsrKitError::EncodingError(e.to_string()))?;
    Any::encode_from(&utf8).map_err(|e| CsrKitError::EncodingError(e.to_string()))
}

/// Represents an X.509 extension.
///
/// This struct contains the OID, criticality, and value of an extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a specific extension.
    ///
    /// # Arguments
    /// * `extension` - The extension to encode.
    /// * `critical` - Indicates if the extension is critical.
    pub fn from_extension<E: ToAndFromX509Extension>(
        extension: &E,
        critical: bool,
    ) -> Result<Self, CsrKitError> {
        let value = extension.to_x509_extension_value()?;
        Ok(Self {
            oid: E::OID,
            critical,
            value,
        })
    }

    /// Decodes an `ExtensionParam` into a specific extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, CsrKitError> {
        if self.oid != E::OID {
            return Err(CsrKitError::DecodingError(format!(
                "extension {} is not {}",
                self.oid,
                E::OID
            )));
        }
        E::from_x509_extension_value(&self.value)
    }

    /// Converts into the `x509_cert` representation.
    pub fn to_x509_extension(&self) -> Result<x509_cert::ext::Extension, CsrKitError> {
        Ok(x509_cert::ext::Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())
                .map_err(|e| CsrKitError::EncodingError(e.to_string()))?,
        })
    }

    /// Converts from the `x509_cert` representation.
    pub fn from_x509_extension(extension: &x509_cert::ext::Extension) -> Self {
        Self {
            oid: extension.extn_id,
            critical: extension.critical,
            value: extension.extn_value.as_bytes().to_vec(),
        }
    }
}

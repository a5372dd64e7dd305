use std::str::FromStr;

use const_oid::AssociatedOid;
use der::{Decode, Encode, oid::ObjectIdentifier};

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

use super::params::ExtensionParam;
use crate::error::CsrKitError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use csrkit::csr::extensions::{BasicConstraints, ToAndFromX509Extension};
/// let bc = BasicConstraints { is_ca: true, max_path_length: Some(0) };
/// let encoded = bc.to_x509_extension_value().unwrap();
/// let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(bc, decoded);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CsrKitError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CsrKitError>
    where
        Self: Sized;
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the subject may act as a CA and its path length.
///
/// # Fields
/// * `is_ca` - Indicates if the subject is a CA.
/// * `max_path_length` - The maximum number of intermediate CAs allowed. Ignored
///   unless `is_ca` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CsrKitError> {
        // cA is DEFAULT FALSE, so der elides it; pathLenConstraint is only
        // meaningful for CAs.
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length.filter(|_| self.is_ca),
        };

        bc.to_der()
            .map_err(|e| CsrKitError::EncodingError(e.to_string()))
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, CsrKitError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

/// Highest bit position defined for the Key Usage BIT STRING (`decipherOnly`).
pub const MAX_KEY_USAGE_BIT: u8 = 8;

/// Key usage names in bit order, as written in RFC 5280.
const KEY_USAGE_NAMES: [(&str, KeyUsages); 9] = [
    ("digitalSignature", KeyUsages::DigitalSignature),
    ("nonRepudiation", KeyUsages::NonRepudiation),
    ("keyEncipherment", KeyUsages::KeyEncipherment),
    ("dataEncipherment", KeyUsages::DataEncipherment),
    ("keyAgreement", KeyUsages::KeyAgreement),
    ("keyCertSign", KeyUsages::KeyCertSign),
    ("cRLSign", KeyUsages::CRLSign),
    ("encipherOnly", KeyUsages::EncipherOnly),
    ("decipherOnly", KeyUsages::DecipherOnly),
];

/// Represents the Key Usage extension.
///
/// This extension defines the cryptographic operations the key may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl Default for KeyUsage {
    fn default() -> Self {
        Self(FlagSet::empty())
    }
}

impl KeyUsage {
    /// Builds a key usage from bit positions (0 = `digitalSignature`,
    /// 8 = `decipherOnly`).
    pub fn from_bit_positions(positions: &[u8]) -> Result<Self, CsrKitError> {
        let mut flags = FlagSet::empty();
        for &position in positions {
            flags |= key_usage_from_bit(position)?;
        }
        Ok(Self(flags))
    }

    /// Builds a key usage from RFC 5280 names such as `digitalSignature`.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, CsrKitError> {
        let mut flags = FlagSet::empty();
        for name in names {
            flags |= parse_key_usage(name.as_ref())?;
        }
        Ok(Self(flags))
    }

    /// Returns the set bit positions in ascending order.
    pub fn bit_positions(&self) -> Vec<u8> {
        let bits = self.0.bits();
        (0..=MAX_KEY_USAGE_BIT)
            .filter(|position| bits & (1u16 << *position) != 0)
            .collect()
    }
}

/// Maps a Key Usage bit position to its flag.
pub fn key_usage_from_bit(position: u8) -> Result<KeyUsages, CsrKitError> {
    KEY_USAGE_NAMES
        .get(usize::from(position))
        .map(|(_, usage)| *usage)
        .ok_or_else(|| {
            CsrKitError::EncodingError(format!(
                "key usage bit {position} is out of range (0..={MAX_KEY_USAGE_BIT})"
            ))
        })
}

/// Parses a Key Usage name. Matching is case-insensitive and accepts
/// `contentCommitment` as the newer name of `nonRepudiation`.
pub fn parse_key_usage(name: &str) -> Result<KeyUsages, CsrKitError> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("contentCommitment") {
        return Ok(KeyUsages::NonRepudiation);
    }
    KEY_USAGE_NAMES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, usage)| *usage)
        .ok_or_else(|| CsrKitError::EncodingError(format!("unknown key usage \"{name}\"")))
}

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CsrKitError> {
        let ku = X509KeyUsage(self.0);
        ku.to_der()
            .map_err(|e| CsrKitError::EncodingError(e.to_string()))
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CsrKitError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
/// All purposes are carried by one extension entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ExtendedKeyUsageOption>,
}

impl ExtendedKeyUsage {
    /// Builds the extension from purpose names or dotted OIDs.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, CsrKitError> {
        let usage = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { usage })
    }

    /// Returns the purpose OIDs in declaration order.
    pub fn oids(&self) -> Vec<ObjectIdentifier> {
        self.usage.iter().map(|v| (*v).into()).collect()
    }
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, CsrKitError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(self.oids());
        eku.to_der()
            .map_err(|e| CsrKitError::EncodingError(e.to_string()))
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, CsrKitError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        let usage = eku.0.into_iter().map(ExtendedKeyUsageOption::from).collect();
        Ok(Self { usage })
    }
}

/// Represents an option for the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
    /// Any other purpose, identified by its OID.
    Other(ObjectIdentifier),
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        match value {
            ExtendedKeyUsageOption::OcspSigning => const_oid::db::rfc5912::ID_KP_OCSP_SIGNING,
            ExtendedKeyUsageOption::ServerAuth => const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => const_oid::db::rfc5912::ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => {
                const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION
            }
            ExtendedKeyUsageOption::TimeStamping => const_oid::db::rfc5912::ID_KP_TIME_STAMPING,
            ExtendedKeyUsageOption::Other(oid) => oid,
        }
    }
}

impl From<ObjectIdentifier> for ExtendedKeyUsageOption {
    fn from(oid: ObjectIdentifier) -> Self {
        match oid {
            const_oid::db::rfc5912::ID_KP_OCSP_SIGNING => ExtendedKeyUsageOption::OcspSigning,
            const_oid::db::rfc5912::ID_KP_SERVER_AUTH => ExtendedKeyUsageOption::ServerAuth,
            const_oid::db::rfc5912::ID_KP_CLIENT_AUTH => ExtendedKeyUsageOption::ClientAuth,
            const_oid::db::rfc5912::ID_KP_CODE_SIGNING => ExtendedKeyUsageOption::CodeSigning,
            const_oid::db::rfc5912::ID_KP_EMAIL_PROTECTION => {
                ExtendedKeyUsageOption::EmailProtection
            }
            const_oid::db::rfc5912::ID_KP_TIME_STAMPING => ExtendedKeyUsageOption::TimeStamping,
            other => ExtendedKeyUsageOption::Other(other),
        }
    }
}

impl FromStr for ExtendedKeyUsageOption {
    type Err = CsrKitError;

    /// Accepts the RFC 5280 purpose names (case-insensitive) or a dotted OID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CsrKitError::EncodingError(
                "empty extended key usage".to_string(),
            ));
        }

        let named = [
            ("serverAuth", ExtendedKeyUsageOption::ServerAuth),
            ("clientAuth", ExtendedKeyUsageOption::ClientAuth),
            ("codeSigning", ExtendedKeyUsageOption::CodeSigning),
            ("emailProtection", ExtendedKeyUsageOption::EmailProtection),
            ("timeStamping", ExtendedKeyUsageOption::TimeStamping),
            ("OCSPSigning", ExtendedKeyUsageOption::OcspSigning),
        ];
        if let Some((_, option)) = named.iter().find(|(name, _)| name.eq_ignore_ascii_case(s)) {
            return Ok(*option);
        }

        if s.starts_with(|c: char| c.is_ascii_digit()) {
            // const-oid reads an empty arc as 0.
            if !s
                .split('.')
                .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
            {
                return Err(CsrKitError::EncodingError(format!(
                    "invalid extended key usage OID \"{s}\": malformed arc"
                )));
            }
            return ObjectIdentifier::new(s)
                .map(ExtendedKeyUsageOption::from)
                .map_err(|e| {
                    CsrKitError::EncodingError(format!("invalid extended key usage OID \"{s}\": {e}"))
                });
        }

        Err(CsrKitError::EncodingError(format!(
            "unknown extended key usage \"{s}\""
        )))
    }
}

/// The extensions a certification request carries, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionSpec {
    BasicConstraints(BasicConstraints),
    KeyUsage(KeyUsage),
    ExtendedKeyUsage(ExtendedKeyUsage),
}

impl ExtensionSpec {
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            ExtensionSpec::BasicConstraints(_) => BasicConstraints::OID,
            ExtensionSpec::KeyUsage(_) => KeyUsage::OID,
            ExtensionSpec::ExtendedKeyUsage(_) => ExtendedKeyUsage::OID,
        }
    }

    /// All three kinds are requested as critical.
    pub fn critical(&self) -> bool {
        true
    }
}

/// Encodes an extension into its OID, criticality and DER value.
///
/// Either the full value is produced or an [`CsrKitError::EncodingError`]
/// is returned.
pub fn encode_extension(spec: &ExtensionSpec) -> Result<ExtensionParam, CsrKitError> {
    let critical = spec.critical();
    match spec {
        ExtensionSpec::BasicConstraints(bc) => ExtensionParam::from_extension(bc, critical),
        ExtensionSpec::KeyUsage(ku) => ExtensionParam::from_extension(ku, critical),
        ExtensionSpec::ExtendedKeyUsage(eku) => ExtensionParam::from_extension(eku, critical),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_basic_constraints_encoding_decoding() {
        let original = BasicConstraints {
            is_ca: true,
            max_path_length: Some(3),
        };
        let encoded = original.to_x509_extension_value().unwrap();
        assert_eq!(
            encoded,
            vec![0x30, 0x06, 0x01, 0x01, 0xff, 0x02, 0x01, 0x03]
        );
        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(0))]
    #[case(Some(7))]
    fn test_basic_constraints_never_encodes_path_length_for_leaf(#[case] path: Option<u8>) {
        let leaf = BasicConstraints {
            is_ca: false,
            max_path_length: path,
        };
        let encoded = leaf.to_x509_extension_value().unwrap();
        assert_eq!(encoded, vec![0x30, 0x00]);

        let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(decoded, BasicConstraints::default());
    }

    #[test]
    fn test_key_usage_encoding_decoding() {
        let original = KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment);
        let encoded = original.to_x509_extension_value().unwrap();
        assert_eq!(encoded, vec![0x03, 0x02, 0x05, 0xa0]);
        let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
        assert_eq!(decoded.bit_positions(), vec![0, 2]);
    }

    #[test]
    fn test_key_usage_every_bit_set_survives_encoding() {
        for mask in 0u16..(1 << (MAX_KEY_USAGE_BIT + 1)) {
            let positions: Vec<u8> = (0..=MAX_KEY_USAGE_BIT)
                .filter(|position| mask & (1u16 << *position) != 0)
                .collect();
            let original = KeyUsage::from_bit_positions(&positions).unwrap();
            let encoded = original.to_x509_extension_value().unwrap();
            let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
            assert_eq!(decoded, original, "mask {mask:#05x}");
            assert_eq!(decoded.bit_positions(), positions, "mask {mask:#05x}");
        }
    }

    #[test]
    fn test_extended_key_usage_from_names_rejects_empty_arc() {
        assert!(matches!(
            ExtendedKeyUsage::from_names(&["serverAuth", "1.2..3"]),
            Err(CsrKitError::EncodingError(_))
        ));
    }

    #[test]
    fn test_key_usage_rejects_out_of_range_bit() {
        let err = KeyUsage::from_bit_positions(&[0, 9]).unwrap_err();
        assert!(matches!(err, CsrKitError::EncodingError(_)));
    }

    #[rstest]
    #[case("digitalSignature", KeyUsages::DigitalSignature)]
    #[case("DigitalSignature", KeyUsages::DigitalSignature)]
    #[case("contentCommitment", KeyUsages::NonRepudiation)]
    #[case("keyEncipherment", KeyUsages::KeyEncipherment)]
    #[case("keyAgreement", KeyUsages::KeyAgreement)]
    #[case("cRLSign", KeyUsages::CRLSign)]
    fn test_parse_key_usage(#[case] name: &str, #[case] expected: KeyUsages) {
        assert_eq!(parse_key_usage(name).unwrap(), expected);
    }

    #[test]
    fn test_parse_key_usage_rejects_unknown_name() {
        assert!(matches!(
            parse_key_usage("signEverything"),
            Err(CsrKitError::EncodingError(_))
        ));
    }

    #[test]
    fn test_extended_key_usage_encoding_decoding() {
        let original = ExtendedKeyUsage {
            usage: vec![
                ExtendedKeyUsageOption::ServerAuth,
                ExtendedKeyUsageOption::ClientAuth,
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = ExtendedKeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_extended_key_usage_from_names_keeps_order_and_custom_oids() {
        let eku =
            ExtendedKeyUsage::from_names(&["clientAuth", "1.3.6.1.4.1.311.20.2.2", "serverAuth"])
                .unwrap();
        assert_eq!(
            eku.oids(),
            vec![
                const_oid::db::rfc5912::ID_KP_CLIENT_AUTH,
                ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.20.2.2"),
                const_oid::db::rfc5912::ID_KP_SERVER_AUTH,
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("1")]
    #[case("1.2..3")]
    #[case("1..2")]
    #[case("1.2.840.113549..1")]
    #[case("1.2.3.")]
    #[case("1.2.3a")]
    #[case("webAuth")]
    fn test_extended_key_usage_rejects_bad_purpose(#[case] input: &str) {
        assert!(matches!(
            input.parse::<ExtendedKeyUsageOption>(),
            Err(CsrKitError::EncodingError(_))
        ));
    }

    #[test]
    fn test_encode_extension_marks_every_kind_critical() {
        let specs = [
            ExtensionSpec::BasicConstraints(BasicConstraints::default()),
            ExtensionSpec::KeyUsage(KeyUsage(KeyUsages::DigitalSignature.into())),
            ExtensionSpec::ExtendedKeyUsage(ExtendedKeyUsage::default()),
        ];
        let oids = ["2.5.29.19", "2.5.29.15", "2.5.29.37"];

        for (spec, oid) in specs.iter().zip(oids) {
            let param = encode_extension(spec).unwrap();
            assert!(param.critical);
            assert_eq!(param.oid, ObjectIdentifier::new_unwrap(oid));
            assert_eq!(param.oid, spec.oid());
        }
    }
}

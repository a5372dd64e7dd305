//! The issuance configuration record.
//!
//! The command line builds one [`IssuanceConfig`] (optionally from a YAML
//! file) and hands it to [`crate::issue::issue`] by value. Nothing in the
//! core reads configuration from anywhere else.
//!
//! ```yaml
//! cn: server.example.com
//! dn:
//!   country: DE
//!   state: Schleswig-Holstein
//!   city: Wedel
//!   org: Example GmbH
//! ku:
//!   - digitalSignature
//!   - keyEncipherment
//! eku:
//!   - serverAuth
//!   - clientAuth
//! ```
use std::path::Path;

use bon::Builder;
use serde::Deserialize;

use crate::csr::extensions::{BasicConstraints, ExtendedKeyUsage, ExtensionSpec, KeyUsage};
use crate::csr::params::SubjectIdentity;
use crate::error::CsrKitError;
use crate::key::Cipher;

/// Common name used when neither the configuration nor the command line sets one.
pub const DEFAULT_COMMON_NAME: &str = "default";

/// Distinguished name fields besides the common name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistinguishedNameConfig {
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub org: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasicConstraintsConfig {
    pub ca: bool,
    pub path_len: Option<u8>,
}

/// Everything needed to issue one certification request.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Builder)]
#[serde(default, deny_unknown_fields)]
pub struct IssuanceConfig {
    #[serde(rename = "cn")]
    #[builder(into, default = DEFAULT_COMMON_NAME.to_string())]
    pub common_name: String,

    #[builder(default)]
    pub dn: DistinguishedNameConfig,

    /// Key usage names, e.g. `digitalSignature`.
    #[builder(default)]
    pub ku: Vec<String>,

    /// Extended key usage names (e.g. `serverAuth`) or dotted OIDs.
    #[builder(default)]
    pub eku: Vec<String>,

    #[builder(default)]
    pub basic_constraints: BasicConstraintsConfig,

    #[builder(default)]
    pub cipher: Cipher,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl IssuanceConfig {
    /// Parses a YAML document. An empty document yields the defaults.
    pub fn from_yaml_str(input: &str) -> Result<Self, CsrKitError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(input).map_err(|e| CsrKitError::ConfigError(e.to_string()))
    }

    /// Reads and parses a YAML configuration file.
    pub fn from_path(path: &Path) -> Result<Self, CsrKitError> {
        Self::from_optional_path(path)?.ok_or_else(|| {
            CsrKitError::ConfigError(format!("{} does not exist", path.display()))
        })
    }

    /// Like [`IssuanceConfig::from_path`], but a missing file yields `None`.
    /// Any other read error is still a [`CsrKitError::ConfigError`].
    pub fn from_optional_path(path: &Path) -> Result<Option<Self>, CsrKitError> {
        match std::fs::read_to_string(path) {
            Ok(input) => Self::from_yaml_str(&input).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CsrKitError::ConfigError(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    /// The subject identity described by `cn` and `dn`.
    pub fn identity(&self) -> SubjectIdentity {
        let field = |value: &Option<String>| value.iter().cloned().collect::<Vec<_>>();
        SubjectIdentity {
            common_name: self.common_name.clone(),
            country: field(&self.dn.country),
            state: field(&self.dn.state),
            locality: field(&self.dn.city),
            organization: field(&self.dn.org),
        }
    }

    /// The three requested extensions: Basic Constraints, Key Usage and
    /// Extended Key Usage, in that order.
    pub fn extension_specs(&self) -> Result<Vec<ExtensionSpec>, CsrKitError> {
        Ok(vec![
            ExtensionSpec::BasicConstraints(BasicConstraints {
                is_ca: self.basic_constraints.ca,
                max_path_length: self.basic_constraints.path_len,
            }),
            ExtensionSpec::KeyUsage(KeyUsage::from_names(self.ku.as_slice())?),
            ExtensionSpec::ExtendedKeyUsage(ExtendedKeyUsage::from_names(self.eku.as_slice())?),
        ])
    }
}

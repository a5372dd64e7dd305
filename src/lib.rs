//! # csrkit - Certificate Signing Requests in Pure Rust
//!
//! csrkit issues PKCS#10 certificate signing requests (CSRs) for freshly
//! generated 4096-bit RSA keys, built entirely with RustCrypto libraries.
//! Every request carries a distinguished name and three critical X.509v3
//! extensions:
//!
//! - **Basic Constraints** (`2.5.29.19`): whether the subject may act as a CA
//! - **Key Usage** (`2.5.29.15`): the permitted cryptographic operations
//! - **Extended Key Usage** (`2.5.29.37`): the permitted application purposes,
//!   all carried by a single extension entry
//!
//! The request is signed with SHA-384 with RSA. The request is returned as a
//! `CERTIFICATE REQUEST` PEM block, the private key as an unencrypted PKCS#1
//! `RSA PRIVATE KEY` PEM block.
//!
//! ## Quick Start
//!
//! ### Issuing a request from a configuration record
//!
//! ```rust,no_run
//! use csrkit::{config::IssuanceConfig, issue::issue};
//!
//! # fn main() -> Result<(), csrkit::error::CsrKitError> {
//! let config = IssuanceConfig::builder()
//!     .common_name("server.example.com")
//!     .ku(vec!["digitalSignature".to_string(), "keyEncipherment".to_string()])
//!     .eku(vec!["serverAuth".to_string(), "clientAuth".to_string()])
//!     .build();
//!
//! let issued = issue(config)?;
//! println!("{}", issued.csr_pem);
//! # Ok(())
//! # }
//! ```
//!
//! ### Driving the steps yourself
//!
//! ```rust,no_run
//! use csrkit::{
//!     csr::{
//!         assemble_and_sign,
//!         extensions::{encode_extension, BasicConstraints, ExtensionSpec, KeyUsage, KeyUsages},
//!         params::{build_subject, SubjectIdentity},
//!     },
//!     key::{generate_key_pair, RSA_KEY_SIZE},
//! };
//!
//! # fn main() -> Result<(), csrkit::error::CsrKitError> {
//! let key_pair = generate_key_pair(RSA_KEY_SIZE)?;
//!
//! let subject = build_subject(
//!     &SubjectIdentity::builder()
//!         .common_name("Example CA")
//!         .organization(vec!["Example Corp".to_string()])
//!         .build(),
//! )?;
//!
//! let extensions = [
//!     ExtensionSpec::BasicConstraints(BasicConstraints { is_ca: true, max_path_length: Some(0) }),
//!     ExtensionSpec::KeyUsage(KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign)),
//! ]
//! .iter()
//! .map(encode_extension)
//! .collect::<Result<Vec<_>, _>>()?;
//!
//! let signed = assemble_and_sign(subject, extensions, &key_pair)?;
//! signed.request.verify(key_pair.public_key())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure aborts the whole issuance attempt:
//!
//! ```rust
//! use csrkit::{config::IssuanceConfig, error::CsrKitError, issue::issue, key::Cipher};
//!
//! let config = IssuanceConfig::builder().cipher(Cipher::Ecc).build();
//! match issue(config) {
//!     Err(CsrKitError::UnsupportedCipher(cipher)) => println!("{cipher} is not supported"),
//!     Err(e) => println!("Other error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`]: RSA key generation and PKCS#1 serialization
//! - [`csr`]: Subject names, extensions, request assembly and verification
//! - [`request_info`]: The unsigned request structure
//! - [`signer`]: SHA-384 with RSA signing and verification
//! - [`config`]: The issuance configuration record and its YAML form
//! - [`issue`]: The end-to-end pipeline
//! - [`output`]: Writing the artifacts to disk
//! - [`error`]: Error types

pub mod config;
pub mod csr;
pub mod error;
pub mod issue;
pub mod key;
pub mod logging;
pub mod output;
pub mod pem_utils;
pub mod request_info;
pub mod signer;

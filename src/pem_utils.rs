use crate::error::CsrKitError;

/// PEM label of a PKCS#10 certification request.
pub const CERTIFICATE_REQUEST_LABEL: &str = "CERTIFICATE REQUEST";

/// PEM label of a PKCS#1 RSA private key.
pub const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes, rejecting blocks whose
/// label differs from `expected_label`.
pub fn pem_to_der(pem_str: &str, expected_label: &str) -> Result<Vec<u8>, CsrKitError> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != expected_label {
        return Err(CsrKitError::DecodingError(format!(
            "expected PEM label \"{expected_label}\", found \"{}\"",
            pem.tag()
        )));
    }
    Ok(pem.into_contents())
}

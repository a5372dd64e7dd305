use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use sha2::Sha384;

use crate::error::CsrKitError;
use crate::key::KeyPair;

/// Signs `data` with RSASSA-PKCS1-v1_5 over SHA-384.
pub fn sign_data(data: &[u8], key_pair: &KeyPair) -> Result<Vec<u8>, CsrKitError> {
    let signing_key = SigningKey::<Sha384>::new(key_pair.private_key().clone());
    let signature = signing_key
        .try_sign(data)
        .map_err(|e| CsrKitError::SigningError(e.to_string()))?;
    Ok(signature.to_vec())
}

/// Verifies an RSASSA-PKCS1-v1_5 SHA-384 signature over `data`.
pub fn verify_data(
    data: &[u8],
    signature: &[u8],
    public_key: &RsaPublicKey,
) -> Result<(), CsrKitError> {
    let verifying_key = VerifyingKey::<Sha384>::new(public_key.clone());
    let signature = Signature::try_from(signature)
        .map_err(|e| CsrKitError::VerificationError(e.to_string()))?;
    verifying_key
        .verify(data, &signature)
        .map_err(|e| CsrKitError::VerificationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RSA_KEY_SIZE;

    #[test]
    fn signatures_are_deterministic_and_verify() {
        let key_pair = KeyPair::generate_rsa(RSA_KEY_SIZE).unwrap();
        let first = sign_data(b"certification request info", &key_pair).unwrap();
        let second = sign_data(b"certification request info", &key_pair).unwrap();

        assert_eq!(first.len(), RSA_KEY_SIZE / 8);
        assert_eq!(first, second);
        verify_data(b"certification request info", &first, key_pair.public_key()).unwrap();
    }

    #[test]
    fn tampered_data_fails_verification() {
        let key_pair = KeyPair::generate_rsa(RSA_KEY_SIZE).unwrap();
        let signature = sign_data(b"original", &key_pair).unwrap();

        let err = verify_data(b"tampered", &signature, key_pair.public_key()).unwrap_err();
        assert!(matches!(err, CsrKitError::VerificationError(_)));
    }
}

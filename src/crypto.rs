pub mod account_key;
pub mod eab;
pub mod ed25519;
pub mod es256;
pub mod jwk;
pub mod jws;
pub mod rs256;

use account_key::{AccountKey, GenerateKeyPair, KeyType};
use es256::Es256KeyPair;
use jwk::Jwk;

use crate::{AcmeError, AcmeResult};

/// Generate the default account key type (P-256 ECDSA).
pub fn generate_account_key() -> AccountKey {
    AccountKey::from_pair(Es256KeyPair::generate())
}

/// Build an account key from a bare private JWK, detecting the algorithm
/// from the key type. Used for out-of-account revocation, where the request
/// is signed with the certificate key rather than a registered account key.
pub fn account_key_from_jwk(jwk: &Jwk) -> AcmeResult<AccountKey> {
    let key_type = match (jwk.kty.as_str(), jwk.crv.as_deref()) {
        ("EC", Some("P-256")) => KeyType::Ec256,
        ("OKP", Some("Ed25519")) => KeyType::Ed25519,
        ("RSA", None) => KeyType::Rs256,
        _ => {
            return Err(AcmeError::CryptoError(anyhow::anyhow!(
                "couldn't decode account key from JWK"
            )))
        }
    };
    let pair = account_key::pair_from_jwk(key_type, jwk).map_err(AcmeError::CryptoError)?;
    Ok(AccountKey::from_boxed(pair))
}

#[cfg(test)]
mod tests {
    use crate::crypto::jws::JwsSigner;

    use super::*;

    #[test]
    fn account_key_from_jwk_es256() {
        let jwk = serde_json::from_str(es256::tests::JWK).unwrap();
        let key = account_key_from_jwk(&jwk).unwrap();
        assert_eq!(key.jws_alg(), "ES256");
    }

    #[test]
    fn account_key_from_jwk_ed25519() {
        let jwk = serde_json::from_str(ed25519::tests::JWK).unwrap();
        let key = account_key_from_jwk(&jwk).unwrap();
        assert_eq!(key.jws_alg(), "EdDSA");
    }

    #[test]
    fn account_key_from_jwk_invalid() {
        let jwk: Jwk = serde_json::from_str(r#"{"kty":"oct"}"#).unwrap();
        account_key_from_jwk(&jwk).unwrap_err();
    }
}

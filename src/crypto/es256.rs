use p256::{ecdsa::SigningKey, SecretKey};
use rand::{CryptoRng, RngCore};
use signature::Signer;

use super::{
    account_key::{GenerateKeyPair, KeyPair, KeyType},
    jwk::Jwk,
    jws::JwsSigner,
};

#[derive(Debug)]
pub struct Es256KeyPair(SecretKey);

pub fn from_jwk(jwk: &Jwk) -> anyhow::Result<Es256KeyPair> {
    // p256 speaks JWK natively; round-trip through its parser so the curve
    // and coordinate checks stay in one place.
    let json = serde_json::to_string(jwk)?;
    Ok(SecretKey::from_jwk_str(&json)?.into())
}

impl GenerateKeyPair for Es256KeyPair {
    fn generate_rng(rng: impl CryptoRng + RngCore) -> Self {
        SecretKey::random(rng).into()
    }
}

impl JwsSigner for Es256KeyPair {
    fn jws_alg(&self) -> &str {
        "ES256"
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        SigningKey::from(&self.0).sign(input).as_ref().to_vec()
    }
}

impl KeyPair for Es256KeyPair {
    fn key_type(&self) -> KeyType {
        KeyType::Ec256
    }

    fn private_jwk(&self) -> anyhow::Result<Jwk> {
        Ok(serde_json::from_str(&self.0.to_jwk_string())?)
    }

    fn public_jwk(&self) -> anyhow::Result<Jwk> {
        Ok(serde_json::from_str(&self.0.public_key().to_jwk_string())?)
    }
}

impl From<SecretKey> for Es256KeyPair {
    fn from(secret: SecretKey) -> Self {
        Self(secret)
    }
}

#[cfg(test)]
pub mod tests {
    use once_cell::sync::Lazy;

    use super::*;

    // https://datatracker.ietf.org/doc/html/rfc7517#appendix-A.2
    pub const JWK: &'static str = r#"{
        "kty":"EC", "crv":"P-256",
        "x":"MKBCTNIcKUSDii11ySs3526iDZ8AiTo7Tu6KPAqv7D4",
        "y":"4Etl6SRW2YiLUrN5vfvVHuhp7x8PxltmWWlbbM4IFyM",
        "d":"870MB6gfuTJ4HtUnUvYMyJpr5eUZNP4Bk43bVdj3eAE"
    }"#;

    pub static KEY: Lazy<Es256KeyPair> =
        Lazy::new(|| from_jwk(&serde_json::from_str(JWK).unwrap()).unwrap());

    #[test]
    fn round_trip_jwk() {
        let jwk = KEY.private_jwk().unwrap();
        let expect: Jwk = serde_json::from_str(JWK).unwrap();
        assert_eq!(jwk, expect);
    }

    #[test]
    fn public_jwk_has_no_private_member() {
        assert!(!KEY.public_jwk().unwrap().is_private());
    }

    #[test]
    fn generate_smoke_test() {
        Es256KeyPair::generate();
    }

    #[test]
    fn sign_verifies() {
        use p256::ecdsa::signature::{Signature as _, Verifier};
        use p256::ecdsa::{Signature, VerifyingKey};

        let sig = KEY.jws_sign(b"test");
        let verifier = VerifyingKey::from(&SigningKey::from(&KEY.0));
        let sig = Signature::from_bytes(sig.as_slice()).unwrap();
        verifier.verify(b"test", &sig).unwrap();
    }
}

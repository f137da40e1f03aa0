use ed25519_dalek::{Keypair, PublicKey, SecretKey, Signer, SECRET_KEY_LENGTH};

use crate::base64url;

use super::{
    account_key::{GenerateKeyPair, KeyPair, KeyType},
    jwk::Jwk,
    jws::JwsSigner,
};

#[derive(Debug)]
pub struct Ed25519KeyPair(Keypair);

pub fn from_jwk(jwk: &Jwk) -> anyhow::Result<Ed25519KeyPair> {
    match jwk {
        Jwk {
            kty,
            crv: Some(crv),
            x: Some(x),
            d: Some(d),
            ..
        } if kty == "OKP" && crv == "Ed25519" => {
            let secret = SecretKey::from_bytes(&base64url::decode(d)?)?;
            let public = PublicKey::from_bytes(&base64url::decode(x)?)?;
            Ok(Keypair { secret, public }.into())
        }
        _ => anyhow::bail!("invalid JWK for Ed25519 private key"),
    }
}

impl JwsSigner for Ed25519KeyPair {
    fn jws_alg(&self) -> &str {
        "EdDSA"
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        self.0.sign(input).as_ref().to_vec()
    }
}

impl KeyPair for Ed25519KeyPair {
    fn key_type(&self) -> KeyType {
        KeyType::Ed25519
    }

    fn public_jwk(&self) -> anyhow::Result<Jwk> {
        Ok(Jwk {
            crv: Some("Ed25519".to_string()),
            d: None,
            e: None,
            kty: "OKP".to_string(),
            n: None,
            p: None,
            q: None,
            x: Some(base64url::encode(self.0.public.as_bytes())),
            y: None,
        })
    }

    fn private_jwk(&self) -> anyhow::Result<Jwk> {
        let mut jwk = self.public_jwk()?;
        jwk.d = Some(base64url::encode(self.0.secret.as_bytes()));
        Ok(jwk)
    }
}

impl GenerateKeyPair for Ed25519KeyPair {
    fn generate_rng(mut rng: impl rand::CryptoRng + rand::RngCore) -> Self {
        // Adapted from Keypair::random to avoid rand crate version problem
        let mut bytes = [0u8; SECRET_KEY_LENGTH];
        rng.fill_bytes(&mut bytes[..]);
        let secret = SecretKey::from_bytes(&bytes).expect("SecretKey::from_bytes failed");
        let public: PublicKey = (&secret).into();
        Keypair { secret, public }.into()
    }
}

impl From<Keypair> for Ed25519KeyPair {
    fn from(pair: Keypair) -> Self {
        Self(pair)
    }
}

#[cfg(test)]
pub mod tests {
    use once_cell::sync::Lazy;

    use super::*;

    // https://datatracker.ietf.org/doc/html/rfc8037#appendix-A.1
    pub const JWK: &'static str = r#"{
        "kty":"OKP","crv":"Ed25519",
        "x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo",
        "d":"nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A"
    }"#;

    pub static KEY: Lazy<Ed25519KeyPair> =
        Lazy::new(|| from_jwk(&serde_json::from_str(JWK).unwrap()).unwrap());

    #[test]
    fn round_trip_jwk() {
        let jwk = KEY.private_jwk().unwrap();
        let expect: Jwk = serde_json::from_str(JWK).unwrap();
        assert_eq!(jwk, expect);
    }

    #[test]
    fn generate_smoke_test() {
        Ed25519KeyPair::generate();
    }

    // https://datatracker.ietf.org/doc/html/rfc8037#appendix-A.4
    #[test]
    fn sign_matches_rfc8037_vector() {
        let sig = KEY.jws_sign(
            b"eyJhbGciOiJFZERTQSJ9.RXhhbXBsZSBvZiBFZDI1NTE5IHNpZ25pbmc",
        );
        assert_eq!(
            base64url::encode(sig),
            "hgyY0il_MGCjP0JzlnLWG1PPOt7-09PGcvMg3AIbQR6dWbhijcNR4ki4iylGjg5BhVsPt9g7sVvpAr_MuM0KAg"
        );
    }
}

use rand::{CryptoRng, RngCore};
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};
use sha2::Sha256;

use crate::base64url;

use super::{
    account_key::{GenerateKeyPair, KeyPair, KeyType},
    jwk::Jwk,
    jws::JwsSigner,
};

/// Key size for generated keys. Universally accepted by public ACME servers.
const BITS: usize = 2048;

#[derive(Debug)]
pub struct Rs256KeyPair(RsaPrivateKey);

pub fn from_jwk(jwk: &Jwk) -> anyhow::Result<Rs256KeyPair> {
    if jwk.kty != "RSA" {
        anyhow::bail!("invalid JWK for RSA private key");
    }
    let n = uint_member(jwk, "n", &jwk.n)?;
    let e = uint_member(jwk, "e", &jwk.e)?;
    let d = uint_member(jwk, "d", &jwk.d)?;
    let p = uint_member(jwk, "p", &jwk.p)?;
    let q = uint_member(jwk, "q", &jwk.q)?;
    Ok(Rs256KeyPair(RsaPrivateKey::from_components(
        n,
        e,
        d,
        vec![p, q],
    )?))
}

fn uint_member(jwk: &Jwk, name: &'static str, member: &Option<String>) -> anyhow::Result<BigUint> {
    let value = member
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("RSA JWK of type {:?} is missing {:?}", jwk.kty, name))?;
    Ok(BigUint::from_bytes_be(&base64url::decode(value)?))
}

fn uint_b64(value: &BigUint) -> String {
    base64url::encode(value.to_bytes_be())
}

impl GenerateKeyPair for Rs256KeyPair {
    fn generate_rng(mut rng: impl CryptoRng + RngCore) -> Self {
        let key = RsaPrivateKey::new(&mut rng, BITS).expect("RSA key generation failed");
        Self(key)
    }
}

impl JwsSigner for Rs256KeyPair {
    fn jws_alg(&self) -> &str {
        "RS256"
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        SigningKey::<Sha256>::new(self.0.clone())
            .sign(input)
            .to_bytes()
            .to_vec()
    }
}

impl KeyPair for Rs256KeyPair {
    fn key_type(&self) -> KeyType {
        KeyType::Rs256
    }

    fn public_jwk(&self) -> anyhow::Result<Jwk> {
        Ok(Jwk {
            crv: None,
            d: None,
            e: Some(uint_b64(self.0.e())),
            kty: "RSA".to_string(),
            n: Some(uint_b64(self.0.n())),
            p: None,
            q: None,
            x: None,
            y: None,
        })
    }

    // The CRT members are omitted; RFC 7518 permits the d-only private
    // representation and from_components rebuilds the key from the primes.
    fn private_jwk(&self) -> anyhow::Result<Jwk> {
        let mut jwk = self.public_jwk()?;
        jwk.d = Some(uint_b64(self.0.d()));
        match self.0.primes() {
            [p, q] => {
                jwk.p = Some(uint_b64(p));
                jwk.q = Some(uint_b64(q));
            }
            primes => anyhow::bail!("expected a two-prime RSA key, got {} primes", primes.len()),
        }
        Ok(jwk)
    }
}

#[cfg(test)]
pub mod tests {
    use once_cell::sync::Lazy;

    use super::*;

    pub static KEY: Lazy<Rs256KeyPair> = Lazy::new(Rs256KeyPair::generate);

    #[test]
    fn round_trip_jwk() {
        let jwk = KEY.private_jwk().unwrap();
        let restored = from_jwk(&jwk).unwrap();
        assert_eq!(restored.private_jwk().unwrap(), jwk);
    }

    #[test]
    fn sign_verifies() {
        use rsa::pkcs1v15::{Signature, VerifyingKey};
        use rsa::signature::Verifier;

        let sig = KEY.jws_sign(b"test");
        let verifier = VerifyingKey::<Sha256>::new(KEY.0.to_public_key());
        let sig = Signature::try_from(sig.as_slice()).unwrap();
        verifier.verify(b"test", &sig).unwrap();
    }

    #[test]
    fn public_jwk_shape() {
        let jwk = KEY.public_jwk().unwrap();
        assert_eq!(jwk.kty, "RSA");
        assert!(jwk.n.is_some() && jwk.e.is_some());
        assert!(!jwk.is_private());
    }
}

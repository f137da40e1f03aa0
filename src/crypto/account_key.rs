use std::fmt;

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use signature::rand_core::OsRng;
use zeroize::Zeroizing;

use crate::base64url;
use crate::error::{AcmeError, AcmeResult};

use super::{ed25519, es256, jwk::Jwk, jws::JwsSigner, rs256};

/// Supported account key algorithms. `Ec256` is the default because every
/// public ACME server accepts it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Ec256,
    Ed25519,
    Rs256,
}

impl Default for KeyType {
    fn default() -> Self {
        Self::Ec256
    }
}

pub trait KeyPair: JwsSigner + Send + Sync + fmt::Debug {
    fn key_type(&self) -> KeyType;
    fn public_jwk(&self) -> anyhow::Result<Jwk>;
    fn private_jwk(&self) -> anyhow::Result<Jwk>;
}

pub trait GenerateKeyPair: KeyPair + Sized {
    fn generate_rng(rng: impl CryptoRng + RngCore) -> Self;

    fn generate() -> Self {
        Self::generate_rng(OsRng)
    }
}

/// An ACME account key: a private key pair plus the account URL the server
/// bound it to (the `kid`).
///
/// Until a `kid` is assigned (account registration, the inner JWS of a key
/// rollover) the key signs with an embedded `jwk` protected header; once
/// [`update_kid`](AccountKey::update_kid) has run it signs with `kid`.
#[derive(Debug)]
pub struct AccountKey {
    pair: Box<dyn KeyPair>,
    kid: Option<String>,
}

impl AccountKey {
    /// Generate a fresh key of the given type, with no `kid`.
    pub fn generate(key_type: KeyType) -> Self {
        let pair: Box<dyn KeyPair> = match key_type {
            KeyType::Ec256 => Box::new(es256::Es256KeyPair::generate()),
            KeyType::Ed25519 => Box::new(ed25519::Ed25519KeyPair::generate()),
            KeyType::Rs256 => Box::new(rs256::Rs256KeyPair::generate()),
        };
        Self { pair, kid: None }
    }

    pub fn from_pair(pair: impl KeyPair + 'static) -> Self {
        Self::from_boxed(Box::new(pair))
    }

    pub(crate) fn from_boxed(pair: Box<dyn KeyPair>) -> Self {
        Self { pair, kid: None }
    }

    pub fn key_type(&self) -> KeyType {
        self.pair.key_type()
    }

    /// The account URL this key is bound to, if registered.
    pub fn kid(&self) -> Option<&str> {
        self.kid.as_deref()
    }

    /// This key bound to the given account URL. By-value: the unbound key
    /// ceases to exist.
    pub fn update_kid(self, kid: impl Into<String>) -> Self {
        Self {
            pair: self.pair,
            kid: Some(kid.into()),
        }
    }

    /// The canonical public JWK of this key.
    pub fn to_public(&self) -> AcmeResult<Jwk> {
        self.pair.public_jwk().map_err(AcmeError::CryptoError)
    }

    /// RFC 7638 thumbprint of the public key.
    pub fn thumbprint(&self) -> AcmeResult<String> {
        self.pair
            .public_jwk()
            .and_then(|jwk| jwk.thumbprint())
            .map_err(AcmeError::CryptoError)
    }

    /// The key authorization string for a challenge token,
    /// `"{token}.{thumbprint}"`.
    /// https://datatracker.ietf.org/doc/html/rfc8555#section-8.1
    pub fn key_authorization(&self, token: &str) -> AcmeResult<String> {
        Ok(format!("{}.{}", token, self.thumbprint()?))
    }

    /// The TXT record value answering a dns-01 challenge: the base64url
    /// encoded SHA-256 digest of the key authorization.
    /// https://datatracker.ietf.org/doc/html/rfc8555#section-8.4
    pub fn dns01_txt_value(&self, token: &str) -> AcmeResult<String> {
        let key_authorization = self.key_authorization(token)?;
        Ok(base64url::encode(Sha256::digest(
            key_authorization.as_bytes(),
        )))
    }

    /// Serialize the private key, algorithm tag, and kid. The output is
    /// zeroized on drop; persisting it is the caller's business.
    pub fn to_json(&self) -> AcmeResult<Zeroizing<String>> {
        let record = AccountKeyRecord {
            key: self.pair.private_jwk().map_err(AcmeError::CryptoError)?,
            kid: self.kid.clone(),
            type_: self.key_type(),
        };
        Ok(Zeroizing::new(serde_json::to_string(&record)?))
    }

    /// Restore a key serialized with [`to_json`](AccountKey::to_json).
    pub fn from_json(json: impl AsRef<str>) -> AcmeResult<Self> {
        let record: AccountKeyRecord = serde_json::from_str(json.as_ref())?;
        let pair = pair_from_jwk(record.type_, &record.key).map_err(AcmeError::CryptoError)?;
        Ok(Self {
            pair,
            kid: record.kid,
        })
    }
}

impl JwsSigner for AccountKey {
    fn jws_alg(&self) -> &str {
        self.pair.jws_alg()
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        self.pair.jws_sign(input)
    }
}

impl PartialEq for AccountKey {
    fn eq(&self, other: &Self) -> bool {
        self.kid == other.kid
            && self.key_type() == other.key_type()
            && match (self.pair.private_jwk(), other.pair.private_jwk()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
    }
}

pub(crate) fn pair_from_jwk(key_type: KeyType, jwk: &Jwk) -> anyhow::Result<Box<dyn KeyPair>> {
    Ok(match key_type {
        KeyType::Ec256 => Box::new(es256::from_jwk(jwk)?),
        KeyType::Ed25519 => Box::new(ed25519::from_jwk(jwk)?),
        KeyType::Rs256 => Box::new(rs256::from_jwk(jwk)?),
    })
}

#[derive(Serialize, Deserialize)]
struct AccountKeyRecord {
    key: Jwk,
    kid: Option<String>,
    #[serde(rename = "type")]
    type_: KeyType,
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn generated_key_has_no_kid() {
        let key = AccountKey::generate(KeyType::Ec256);
        assert_eq!(key.kid(), None);
        assert_eq!(key.jws_alg(), "ES256");
    }

    #[test]
    fn update_kid_binds_the_account_url() {
        let key = AccountKey::generate(KeyType::Ec256);
        let key = key.update_kid("https://example.com/acme/acct/1");
        assert_eq!(key.kid(), Some("https://example.com/acme/acct/1"));
    }

    #[test]
    fn json_round_trip_all_types() {
        for key_type in [KeyType::Ec256, KeyType::Ed25519, KeyType::Rs256] {
            let key = AccountKey::generate(key_type).update_kid("https://example.com/acme/acct/1");
            let restored = AccountKey::from_json(key.to_json().unwrap().as_str()).unwrap();
            assert_eq!(restored, key);
        }
    }

    #[test]
    fn json_form_carries_the_type_tag() {
        let key = AccountKey::generate(KeyType::Ed25519);
        let json: Value = serde_json::from_str(key.to_json().unwrap().as_str()).unwrap();
        assert_eq!(json["type"], "ed25519");
        assert_eq!(json["kid"], Value::Null);
        assert_eq!(json["key"]["kty"], "OKP");
    }

    #[test]
    fn key_authorization_and_txt_value() {
        let pair = es256::from_jwk(&serde_json::from_str(es256::tests::JWK).unwrap()).unwrap();
        let key = AccountKey::from_pair(pair);
        let thumbprint = key.thumbprint().unwrap();

        let authorization = key.key_authorization("DGyRejmCefe7v4NfDGDKfA").unwrap();
        assert_eq!(
            authorization,
            format!("DGyRejmCefe7v4NfDGDKfA.{}", thumbprint)
        );

        let expected = base64url::encode(Sha256::digest(authorization.as_bytes()));
        assert_eq!(
            key.dns01_txt_value("DGyRejmCefe7v4NfDGDKfA").unwrap(),
            expected
        );
        // 43 chars of base64url cover exactly 32 digest bytes
        assert_eq!(expected.len(), 43);
    }
}

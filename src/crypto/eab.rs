use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::base64url;
use crate::error::{AcmeError, AcmeResult};

use super::{
    jwk::Jwk,
    jws::{jws_flattened, Jws, JwsHeader, JwsSigner},
};

/// External account binding credentials as handed out by the CA: a key
/// identifier and a base64 encoded HMAC-SHA-256 key.
#[derive(Debug)]
pub struct EabCredentials {
    kid: String,
    hmac_key: Vec<u8>,
}

impl EabCredentials {
    /// `mac_key` may use the base64url or the standard alphabet, with or
    /// without padding; CAs are not consistent here.
    pub fn new(kid: impl Into<String>, mac_key: impl AsRef<str>) -> AcmeResult<Self> {
        let hmac_key = base64url::decode_any(mac_key.as_ref())
            .map_err(|err| AcmeError::CryptoError(anyhow::anyhow!("invalid EAB MAC key: {err}")))?;
        Ok(Self {
            kid: kid.into(),
            hmac_key,
        })
    }

    /// The `externalAccountBinding` JWS for a newAccount request: an HS256
    /// signature over the account key's public JWK, with the CA-assigned kid
    /// and the newAccount URL in the protected header.
    /// https://datatracker.ietf.org/doc/html/rfc8555#section-7.3.4
    pub(crate) fn sign(&self, account_jwk: &Jwk, new_account_url: &str) -> AcmeResult<Jws> {
        let signer = HmacSigner(&self.hmac_key);
        let header = JwsHeader {
            alg: signer.jws_alg(),
            nonce: None,
            url: new_account_url,
            jwk: None,
            kid: Some(&self.kid),
        };
        let payload = serde_json::to_vec(&account_jwk.public())?;
        jws_flattened(&signer, &header, &payload).map_err(AcmeError::CryptoError)
    }
}

impl Drop for EabCredentials {
    fn drop(&mut self) {
        self.hmac_key.zeroize();
    }
}

struct HmacSigner<'a>(&'a [u8]);

impl JwsSigner for HmacSigner<'_> {
    fn jws_alg(&self) -> &str {
        "HS256"
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.0).expect("HMAC accepts any key length");
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

use serde::{Deserialize, Serialize};

use crate::base64url;

use super::jwk::Jwk;

pub static CONTENT_TYPE: &str = "application/jose+json";

pub trait JwsSigner {
    fn jws_alg(&self) -> &str;
    fn jws_sign(&self, input: &[u8]) -> Vec<u8>;
}

pub fn jws_flattened(
    signer: &impl JwsSigner,
    header: &JwsHeader<'_>,
    payload: &[u8],
) -> anyhow::Result<Jws> {
    // https://tools.ietf.org/id/draft-ietf-jose-json-web-signature-01.html#rfc.section.5
    let header_json = serde_json::to_vec(header)?;
    let header_b64 = base64url::encode(header_json);
    let payload_b64 = base64url::encode(payload);
    let input = format!("{}.{}", header_b64, payload_b64);
    let signature = signer.jws_sign(input.as_bytes());
    let signature_b64 = base64url::encode(signature);
    Ok(Jws {
        protected: header_b64,
        payload: payload_b64,
        signature: signature_b64,
    })
}

/// A JWS in flattened JSON serialization.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Jws {
    pub protected: String,
    pub payload: String,
    pub signature: String,
}

/// Protected header of an ACME JWS. `nonce` is absent on the nested payload
/// of a key rollover and on the external account binding; every outer
/// request carries one. Exactly one of `jwk` and `kid` must be set.
#[derive(Serialize)]
pub struct JwsHeader<'a> {
    pub alg: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<&'a str>,

    pub url: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwk: Option<&'a Jwk>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    struct NullSigner;

    impl JwsSigner for NullSigner {
        fn jws_alg(&self) -> &str {
            "none"
        }

        fn jws_sign(&self, _input: &[u8]) -> Vec<u8> {
            vec![0; 4]
        }
    }

    #[test]
    fn empty_payload_signs_as_empty_string() {
        let header = JwsHeader {
            alg: "none",
            nonce: Some("abc"),
            url: "https://example.com/acme/new-account",
            jwk: None,
            kid: Some("https://example.com/acme/acct/1"),
        };
        let jws = jws_flattened(&NullSigner, &header, b"").unwrap();
        assert_eq!(jws.payload, "");

        let protected: Value =
            serde_json::from_slice(&base64url::decode(&jws.protected).unwrap()).unwrap();
        assert_eq!(protected["alg"], "none");
        assert_eq!(protected["nonce"], "abc");
        assert_eq!(protected["kid"], "https://example.com/acme/acct/1");
        assert!(protected.get("jwk").is_none());
    }

    #[test]
    fn nonce_is_omitted_when_absent() {
        let header = JwsHeader {
            alg: "none",
            nonce: None,
            url: "https://example.com/acme/key-change",
            jwk: None,
            kid: Some("https://example.com/acme/acct/1"),
        };
        let jws = jws_flattened(&NullSigner, &header, b"{}").unwrap();
        let protected: Value =
            serde_json::from_slice(&base64url::decode(&jws.protected).unwrap()).unwrap();
        assert!(protected.get("nonce").is_none());
    }
}

use serde::Serialize;

use crate::base64url;

/// Certificate revocation request body
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.6
#[derive(Serialize, Debug)]
pub struct RevokeCertResource {
    /// The certificate to be revoked, base64url encoded DER.
    pub certificate: String,

    /// An RFC 5280 CRLReason code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<u32>,
}

impl RevokeCertResource {
    pub fn new(certificate_der: impl AsRef<[u8]>, reason: Option<u32>) -> Self {
        Self {
            certificate: base64url::encode(certificate_der),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn wire_form() {
        assert_eq!(
            serde_json::to_value(RevokeCertResource::new(b"\x30\x03\x02\x01\x00", Some(1)))
                .unwrap(),
            json!({ "certificate": "MAMCAQA", "reason": 1 })
        );
    }

    #[test]
    fn reason_is_omitted_when_absent() {
        let value = serde_json::to_value(RevokeCertResource::new(b"\x30\x00", None)).unwrap();
        assert!(value.get("reason").is_none());
    }
}

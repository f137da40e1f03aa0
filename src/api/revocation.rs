use crate::error::{AcmeError, AcmeResult};
use crate::wire::revocation::RevokeCertResource;

/// RFC 5280 CRLReason values this client accepts by name. The integer codes
/// outside this set are refused up front; servers reject most of them
/// anyway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
}

impl RevocationReason {
    pub fn code(self) -> u32 {
        match self {
            Self::Unspecified => 0,
            Self::KeyCompromise => 1,
            Self::AffiliationChanged => 3,
            Self::Superseded => 4,
            Self::CessationOfOperation => 5,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Unspecified),
            1 => Some(Self::KeyCompromise),
            3 => Some(Self::AffiliationChanged),
            4 => Some(Self::Superseded),
            5 => Some(Self::CessationOfOperation),
            _ => None,
        }
    }
}

/// A certificate revocation request in the making: the DER certificate plus
/// an optional reason. PEM input is converted to DER at ingest so a bad
/// certificate fails before any network traffic.
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.6
#[derive(Clone, Debug)]
pub struct RevocationRequest {
    certificate_der: Vec<u8>,
    reason: Option<u32>,
}

impl RevocationRequest {
    pub fn from_der(certificate_der: impl Into<Vec<u8>>) -> Self {
        Self {
            certificate_der: certificate_der.into(),
            reason: None,
        }
    }

    #[cfg(feature = "x509")]
    pub fn from_pem(certificate_pem: &[u8]) -> AcmeResult<Self> {
        let cert = openssl::x509::X509::from_pem(certificate_pem)
            .map_err(|_| AcmeError::InvalidPem)?;
        Self::from_x509(&cert)
    }

    #[cfg(feature = "x509")]
    pub fn from_x509(certificate: &openssl::x509::X509) -> AcmeResult<Self> {
        Ok(Self::from_der(certificate.to_der()?))
    }

    pub fn reason(mut self, reason: RevocationReason) -> Self {
        self.reason = Some(reason.code());
        self
    }

    /// Set the reason by raw RFC 5280 code. Codes outside the
    /// [`RevocationReason`] set are refused with `InvalidReasonCode`.
    pub fn reason_code(mut self, code: u32) -> AcmeResult<Self> {
        match RevocationReason::from_code(code) {
            Some(reason) => {
                self.reason = Some(reason.code());
                Ok(self)
            }
            None => Err(AcmeError::InvalidReasonCode(code)),
        }
    }

    pub(crate) fn to_wire(&self) -> RevokeCertResource {
        RevokeCertResource::new(&self.certificate_der, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_reasons_map_to_their_codes() {
        let request = RevocationRequest::from_der(b"\x30\x00".to_vec())
            .reason(RevocationReason::KeyCompromise);
        assert_eq!(request.reason, Some(1));
        assert_eq!(request.to_wire().reason, Some(1));
    }

    #[test]
    fn integer_codes_are_validated() {
        let request = RevocationRequest::from_der(b"\x30\x00".to_vec());
        assert_eq!(request.clone().reason_code(5).unwrap().reason, Some(5));

        for bad in [2, 6, 7, 8, 99] {
            match request.clone().reason_code(bad) {
                Err(AcmeError::InvalidReasonCode(code)) => assert_eq!(code, bad),
                other => panic!("unexpected: {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn reason_defaults_to_absent() {
        let request = RevocationRequest::from_der(b"\x30\x00".to_vec());
        assert_eq!(request.to_wire().reason, None);
    }

    #[cfg(feature = "x509")]
    #[test]
    fn garbage_pem_is_invalid() {
        match RevocationRequest::from_pem(b"not a certificate") {
            Err(AcmeError::InvalidPem) => {}
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}

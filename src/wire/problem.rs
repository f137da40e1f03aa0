use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// ACME error document (RFC 7807 problem details)
/// https://datatracker.ietf.org/doc/html/rfc8555#section-6.7
///
/// Servers are free to add fields beyond the standard ones, so everything
/// unrecognized is preserved in `additional_fields`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AcmeProblem {
    /// A URN identifying the error type, e.g.
    /// `urn:ietf:params:acme:error:badNonce`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// A short, human-readable summary of the problem type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// A human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// The HTTP status code the server generated for this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Per-identifier errors of a failed newOrder request.
    /// https://datatracker.ietf.org/doc/html/rfc8555#section-6.7.1
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subproblems: Vec<AcmeProblem>,

    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl AcmeProblem {
    pub const CONTENT_TYPE: &'static str = "application/problem+json";

    pub fn has_type(&self, problem_type: AcmeProblemType) -> bool {
        self.type_.as_deref() == Some(problem_type.as_urn())
    }
}

impl fmt::Display for AcmeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_ = self.type_.as_deref().unwrap_or("about:blank");
        match self.detail.as_deref() {
            Some(detail) => write!(f, "{}: {}", type_, detail),
            None => f.write_str(type_),
        }
    }
}

/// The well-known ACME error URNs this client inspects or that callers
/// commonly match on.
/// https://datatracker.ietf.org/doc/html/rfc8555#section-6.7
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcmeProblemType {
    AccountDoesNotExist,
    AgreementRequired,
    AlreadyRevoked,
    BadNonce,
    BadRevocationReason,
    BadSignatureAlgorithm,
    ExternalAccountRequired,
    Malformed,
    OrderNotReady,
    RateLimited,
    RejectedIdentifier,
    Unauthorized,
    UserActionRequired,
}

impl AcmeProblemType {
    pub fn as_urn(&self) -> &'static str {
        match self {
            Self::AccountDoesNotExist => "urn:ietf:params:acme:error:accountDoesNotExist",
            Self::AgreementRequired => "urn:ietf:params:acme:error:agreementRequired",
            Self::AlreadyRevoked => "urn:ietf:params:acme:error:alreadyRevoked",
            Self::BadNonce => "urn:ietf:params:acme:error:badNonce",
            Self::BadRevocationReason => "urn:ietf:params:acme:error:badRevocationReason",
            Self::BadSignatureAlgorithm => "urn:ietf:params:acme:error:badSignatureAlgorithm",
            Self::ExternalAccountRequired => "urn:ietf:params:acme:error:externalAccountRequired",
            Self::Malformed => "urn:ietf:params:acme:error:malformed",
            Self::OrderNotReady => "urn:ietf:params:acme:error:orderNotReady",
            Self::RateLimited => "urn:ietf:params:acme:error:rateLimited",
            Self::RejectedIdentifier => "urn:ietf:params:acme:error:rejectedIdentifier",
            Self::Unauthorized => "urn:ietf:params:acme:error:unauthorized",
            Self::UserActionRequired => "urn:ietf:params:acme:error:userActionRequired",
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rfc8555_problem_example() {
        let problem = AcmeProblem::deserialize(json!({
            "type": "urn:ietf:params:acme:error:malformed",
            "detail": "Some of the identifiers requested were rejected",
            "subproblems": [
                {
                    "type": "urn:ietf:params:acme:error:malformed",
                    "detail": "Invalid underscore in DNS name \"_example.org\"",
                    "identifier": {
                        "type": "dns",
                        "value": "_example.org"
                    }
                }
            ]
        }))
        .unwrap();

        assert!(problem.has_type(AcmeProblemType::Malformed));
        assert_eq!(problem.subproblems.len(), 1);
        assert_eq!(
            problem.subproblems[0].additional_fields["identifier"]["value"],
            "_example.org"
        );
        assert_eq!(
            problem.to_string(),
            "urn:ietf:params:acme:error:malformed: Some of the identifiers requested were rejected"
        );
    }

    #[test]
    fn unknown_fields_are_preserved() {
        let problem = AcmeProblem::deserialize(json!({
            "type": "urn:ietf:params:acme:error:rateLimited",
            "status": 429,
            "algorithms": ["ES256"]
        }))
        .unwrap();

        assert!(problem.has_type(AcmeProblemType::RateLimited));
        assert_eq!(problem.status, Some(429));
        assert_eq!(problem.additional_fields["algorithms"][0], "ES256");
    }

    #[test]
    fn typeless_problem_displays_as_blank() {
        let problem = AcmeProblem::deserialize(json!({})).unwrap();
        assert!(!problem.has_type(AcmeProblemType::BadNonce));
        assert_eq!(problem.to_string(), "about:blank");
    }
}

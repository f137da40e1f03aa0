use serde::{Deserialize, Serialize};

pub static IDENTIFIER_TYPE_DNS: &str = "dns";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AcmeIdentifier {
    /// The type of identifier.
    #[serde(rename = "type")]
    pub type_: String,

    /// The identifier itself.
    pub value: String,
}

impl AcmeIdentifier {
    pub fn dns(name: impl Into<String>) -> Self {
        Self {
            type_: IDENTIFIER_TYPE_DNS.to_string(),
            value: name.into(),
        }
    }

    pub fn is_dns(&self) -> bool {
        self.type_ == IDENTIFIER_TYPE_DNS
    }

    pub fn dns_name(&self) -> Option<&str> {
        if self.is_dns() {
            Some(&self.value)
        } else {
            None
        }
    }

    /// Whether the value is a wildcard domain name. The server strips the
    /// `*.` prefix in authorization identifiers and sets the authorization's
    /// `wildcard` flag instead.
    pub fn is_wildcard(&self) -> bool {
        self.is_dns() && self.value.starts_with("*.")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn dns_identifier_wire_form() {
        assert_eq!(
            serde_json::to_value(AcmeIdentifier::dns("www.example.org")).unwrap(),
            json!({ "type": "dns", "value": "www.example.org" })
        );
    }

    #[test]
    fn wildcard_detection() {
        assert!(AcmeIdentifier::dns("*.example.org").is_wildcard());
        assert!(!AcmeIdentifier::dns("example.org").is_wildcard());
        let other = AcmeIdentifier {
            type_: "ip".to_string(),
            value: "*.odd".to_string(),
        };
        assert!(!other.is_wildcard());
        assert_eq!(other.dns_name(), None);
    }
}

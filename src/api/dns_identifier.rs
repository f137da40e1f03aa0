use crate::wire::identifier::AcmeIdentifier;

/// A DNS name as the caller thinks of it: wildcard prefix included. The wire
/// form strips the prefix from authorization identifiers and flags them
/// instead; this type folds the two back together.
#[derive(Debug)]
pub struct DnsIdentifier(String);

impl DnsIdentifier {
    pub fn from_acme_identifier(acme_ident: &AcmeIdentifier, add_wildcard: bool) -> Option<Self> {
        acme_ident.dns_name().map(|name| {
            if add_wildcard {
                Self("*.".to_string() + name)
            } else {
                Self(name.to_string())
            }
        })
    }

    pub fn find_acme_identifier<'a>(
        iter: impl IntoIterator<Item = &'a AcmeIdentifier>,
        add_wildcard: bool,
    ) -> Option<Self> {
        iter.into_iter()
            .find(|acme_ident| acme_ident.is_dns())
            .and_then(|acme_ident| DnsIdentifier::from_acme_identifier(acme_ident, add_wildcard))
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.starts_with("*.")
    }

    pub fn without_wildcard(&self) -> &str {
        if self.is_wildcard() {
            &self.0[2..]
        } else {
            &self.0
        }
    }
}

impl AsRef<str> for DnsIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<DnsIdentifier> for String {
    fn from(ident: DnsIdentifier) -> Self {
        ident.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_prefix_is_restored_from_the_flag() {
        let ident =
            DnsIdentifier::from_acme_identifier(&AcmeIdentifier::dns("example.org"), true).unwrap();
        assert!(ident.is_wildcard());
        assert_eq!(ident.as_ref(), "*.example.org");
        assert_eq!(ident.without_wildcard(), "example.org");
    }

    #[test]
    fn non_dns_identifiers_are_skipped() {
        let ip = AcmeIdentifier {
            type_: "ip".to_string(),
            value: "192.0.2.1".to_string(),
        };
        assert!(DnsIdentifier::from_acme_identifier(&ip, false).is_none());
        let found =
            DnsIdentifier::find_acme_identifier([&ip, &AcmeIdentifier::dns("example.org")], false)
                .unwrap();
        assert_eq!(found.as_ref(), "example.org");
    }
}

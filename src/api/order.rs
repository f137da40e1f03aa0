use std::{future::Future, sync::Arc};

use chrono::{DateTime, FixedOffset};

use crate::{
    base64url,
    error::{AcmeError, AcmeResult},
    wire::identifier::AcmeIdentifier,
    wire::order::{NewOrderResource, OrderResource, OrderStatus},
    wire::{
        common::{LocationResource, ResourceStatus},
        order::FinalizeOrder,
    },
};

use super::{
    account_context::AccountContext, authorization::Authorization, dns_identifier::DnsIdentifier,
};

/// Accumulates the fields of a newOrder request. Identifiers are kept in
/// insertion order and duplicates are preserved; deduplication is the
/// caller's concern.
#[derive(Clone, Debug, Default)]
pub struct OrderBuilder {
    identifiers: Vec<AcmeIdentifier>,
    profile: Option<String>,
    not_before: Option<DateTime<FixedOffset>>,
    not_after: Option<DateTime<FixedOffset>>,
}

impl OrderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dns_identifier(mut self, name: impl Into<String>) -> Self {
        self.identifiers.push(AcmeIdentifier::dns(name));
        self
    }

    pub fn add_dns_identifiers(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.identifiers
            .extend(names.into_iter().map(AcmeIdentifier::dns));
        self
    }

    /// Request a certificate profile advertised in the directory's
    /// `meta.profiles` map. The name is passed through unvalidated.
    pub fn profile(mut self, name: impl Into<String>) -> Self {
        self.profile = Some(name.into());
        self
    }

    pub fn not_before(mut self, not_before: DateTime<FixedOffset>) -> Self {
        self.not_before = Some(not_before);
        self
    }

    pub fn not_after(mut self, not_after: DateTime<FixedOffset>) -> Self {
        self.not_after = Some(not_after);
        self
    }

    /// Validate and produce the wire form. An order without identifiers is
    /// refused here, before any network traffic.
    pub fn to_wire(&self) -> AcmeResult<NewOrderResource> {
        if self.identifiers.is_empty() {
            return Err(AcmeError::NoIdentifiers);
        }
        Ok(NewOrderResource {
            identifiers: self.identifiers.clone(),
            profile: self.profile.clone(),
            not_before: self.not_before,
            not_after: self.not_after,
        })
    }
}

/// An order handle: the resource snapshot plus its canonical URL. The server
/// is the source of truth; call [`refresh`](Order::refresh) to update the
/// snapshot.
pub struct Order {
    context: Arc<AccountContext>,
    resource: OrderResource,
    url: String,
}

impl Order {
    pub(crate) fn from_resource(
        context: Arc<AccountContext>,
        mut resource: OrderResource,
    ) -> AcmeResult<Self> {
        let url = resource.take_location()?;
        Ok(Self {
            context,
            resource,
            url,
        })
    }

    pub fn resource(&self) -> &OrderResource {
        &self.resource
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> OrderStatus {
        self.resource.status
    }

    pub fn status_result(&self) -> AcmeResult<OrderStatus> {
        if let Some(ref problem) = self.resource.error {
            Err(AcmeError::AcmeProblem(problem.clone()))
        } else {
            self.status().as_result()
        }
    }

    pub fn state(&mut self) -> OrderState<'_> {
        use OrderStatus::*;
        match self.resource.status {
            Pending => OrderState::Pending(OrderStatePending(self)),
            Ready => OrderState::Ready(OrderStateReady(self)),
            Processing => OrderState::Processing,
            Valid => OrderState::Valid(OrderStateValid(self)),
            Invalid => OrderState::Invalid,
        }
    }

    pub fn state_result(&mut self) -> AcmeResult<OrderState<'_>> {
        self.status_result()?;
        Ok(self.state())
    }

    pub fn dns_name(&self) -> Option<DnsIdentifier> {
        DnsIdentifier::find_acme_identifier(&self.resource.identifiers, false)
    }

    /// Every DNS name in the order, in order. These are the names a CSR must
    /// cover.
    pub fn dns_names(&self) -> Vec<&str> {
        self.resource
            .identifiers
            .iter()
            .filter_map(AcmeIdentifier::dns_name)
            .collect()
    }

    /// Re-fetch the order from its canonical URL.
    pub async fn refresh(&mut self) -> AcmeResult<OrderStatus> {
        let mut resource: OrderResource =
            context_client_request!(self.context, get_resource, self.url()).await?;
        resource.location = Some(self.url.clone());
        self.resource = resource;
        Ok(self.status())
    }

    /// Poll until the status changes, sleeping between polls with the
    /// caller-supplied future. The client itself never sleeps; pacing is the
    /// caller's policy.
    pub async fn status_changed<AsyncSleep, SleepFuture>(
        &mut self,
        mut polling_sleep: AsyncSleep,
    ) -> AcmeResult<OrderStatus>
    where
        AsyncSleep: FnMut() -> SleepFuture + Send,
        SleepFuture: Future<Output = ()> + Send,
    {
        let status = self.status();
        while self.refresh().await? == status {
            polling_sleep().await;
        }
        Ok(self.status())
    }
}

pub enum OrderState<'a> {
    Pending(OrderStatePending<'a>),
    Ready(OrderStateReady<'a>),
    Processing,
    Valid(OrderStateValid<'a>),
    Invalid,
}

pub struct OrderStatePending<'a>(&'a Order);

impl<'a> OrderStatePending<'a> {
    pub fn authorization_urls(&self) -> std::slice::Iter<'a, String> {
        self.0.resource.authorizations.iter()
    }

    pub fn only_authorization_url(&self) -> AcmeResult<&'a str> {
        let authzs = &self.0.resource.authorizations;
        if authzs.len() == 1 {
            Ok(&authzs[0])
        } else {
            Err(AcmeError::InvalidState(format!(
                "expected 1 item in authorizations list; got {}",
                authzs.len()
            )))
        }
    }

    pub fn get_authorizations(
        &self,
    ) -> impl Iterator<Item = impl Future<Output = AcmeResult<Authorization>> + 'a> + 'a {
        self.authorization_urls()
            .map(|authorization_url| Authorization::get(self.0.context.clone(), authorization_url))
    }

    pub async fn get_only_authorization(&self) -> AcmeResult<Authorization> {
        let authorization_url = self.only_authorization_url()?;
        Authorization::get(self.0.context.clone(), authorization_url).await
    }
}

pub struct OrderStateReady<'a>(&'a mut Order);

impl<'a> OrderStateReady<'a> {
    /// Submit the DER-encoded CSR to the order's finalize URL. The CSR must
    /// cover every identifier in the order.
    pub async fn finalize(&mut self, csr_der: impl AsRef<[u8]>) -> AcmeResult<OrderState<'_>> {
        let finalize_order = &FinalizeOrder {
            csr: base64url::encode(csr_der),
        };
        let finalize_url = self
            .0
            .resource
            .finalize
            .as_deref()
            .ok_or(AcmeError::MissingExpectedField("finalize"))?;
        let mut resource =
            context_client_request!(self.0.context, finalize_order, finalize_url, finalize_order)
                .await?;
        // the order URL stays canonical even if the finalize response
        // carries a Location header
        resource.location = Some(self.0.url.clone());
        self.0.resource = resource;
        Ok(self.0.state())
    }

    #[cfg(feature = "x509")]
    // Returns PEM-encoded private key
    pub async fn finalize_with_generated_key(&mut self) -> AcmeResult<String> {
        let names: Vec<String> = self
            .0
            .dns_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            return Err(AcmeError::InvalidState("not a DNS order".to_string()));
        }

        let (key_pem, csr_der) = crate::x509::generate_key_and_csr(&names)?;

        self.finalize(csr_der).await?;

        Ok(key_pem)
    }
}

pub struct OrderStateValid<'a>(&'a Order);

impl<'a> OrderStateValid<'a> {
    pub async fn get_certificate_chain(&self) -> AcmeResult<String> {
        let certificate_url = self
            .0
            .resource
            .certificate
            .as_deref()
            .ok_or(AcmeError::MissingExpectedField("certificate"))?;
        context_client_request!(self.0.context, get_certificate_chain, certificate_url).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_order_is_refused() {
        match OrderBuilder::new().to_wire() {
            Err(AcmeError::NoIdentifiers) => {}
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn duplicate_identifiers_are_preserved() {
        let wire = OrderBuilder::new()
            .add_dns_identifier("example.org")
            .add_dns_identifier("example.org")
            .to_wire()
            .unwrap();
        assert_eq!(wire.identifiers.len(), 2);
    }

    #[test]
    fn identifier_sequences_extend_in_order() {
        let wire = OrderBuilder::new()
            .add_dns_identifier("example.org")
            .add_dns_identifiers(["a.example.org", "b.example.org"])
            .to_wire()
            .unwrap();
        assert_eq!(
            wire.identifiers,
            [
                AcmeIdentifier::dns("example.org"),
                AcmeIdentifier::dns("a.example.org"),
                AcmeIdentifier::dns("b.example.org"),
            ]
        );
    }

    #[test]
    fn wire_form_uses_camel_case_and_omits_nil_fields() {
        let not_before = DateTime::parse_from_rfc3339("2024-03-01T00:00:00Z").unwrap();
        let wire = OrderBuilder::new()
            .add_dns_identifier("*.example.org")
            .profile("tlsserver")
            .not_before(not_before)
            .to_wire()
            .unwrap();
        assert_eq!(
            serde_json::to_value(wire).unwrap(),
            json!({
                "identifiers": [{ "type": "dns", "value": "*.example.org" }],
                "profile": "tlsserver",
                "notBefore": "2024-03-01T00:00:00+00:00"
            })
        );
    }
}

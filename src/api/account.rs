use std::sync::Arc;

use crate::{
    crypto::account_key::{AccountKey, KeyType},
    error::AcmeResult,
    wire::{
        account::{AccountResource, AccountStatus, UpdateAccountResource},
        challenge::ChallengeResource,
        client::AcmeClient,
        common::LocationResource,
        order::OrderResource,
    },
};

use super::{
    account_context::AccountContext,
    authorization::Authorization,
    challenge::Challenge,
    order::{Order, OrderBuilder},
    revocation::RevocationRequest,
};

/// A registered ACME account: the server-side resource snapshot plus the
/// context (key + account URL) every account-scoped request signs with.
pub struct Account {
    context: Arc<AccountContext>,
    resource: AccountResource,
}

impl Account {
    pub(crate) fn from_resource(
        client: Arc<AcmeClient>,
        account_key: AccountKey,
        mut resource: AccountResource,
    ) -> AcmeResult<Self> {
        let account_url = resource.take_location()?;
        let context = AccountContext {
            client,
            account_key: account_key.update_kid(account_url.clone()),
            account_url,
        };
        Ok(Self {
            context: Arc::new(context),
            resource,
        })
    }

    pub fn client(&self) -> &AcmeClient {
        &self.context.client
    }

    /// The account key, bound to this account's URL. Serialize it with
    /// [`AccountKey::to_json`] to reuse the account later.
    pub fn key(&self) -> &AccountKey {
        &self.context.account_key
    }

    pub fn resource(&self) -> &AccountResource {
        &self.resource
    }

    pub fn url(&self) -> &str {
        &self.context.account_url
    }

    pub fn status(&self) -> AccountStatus {
        self.resource.status
    }

    /// Refresh the snapshot with a POST-as-GET of the account URL.
    pub async fn fetch(&mut self) -> AcmeResult<AccountStatus> {
        self.resource =
            context_client_request!(self.context, get_resource, &self.context.account_url).await?;
        Ok(self.status())
    }

    /// Submit a new order.
    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.4
    pub async fn new_order(&self, order: &OrderBuilder) -> AcmeResult<Order> {
        let new_order = order.to_wire()?;
        let resource = context_client_request!(self.context, new_order, &new_order).await?;
        Order::from_resource(self.context.clone(), resource)
    }

    /// Order a certificate for a single DNS name.
    pub async fn new_dns_order(&self, dns_name: impl Into<String>) -> AcmeResult<Order> {
        self.new_order(&OrderBuilder::new().add_dns_identifier(dns_name))
            .await
    }

    /// Fetch a previously created order by URL.
    pub async fn get_order(&self, order_url: impl AsRef<str>) -> AcmeResult<Order> {
        let mut resource: OrderResource =
            context_client_request!(self.context, get_resource, order_url.as_ref()).await?;
        resource.location = Some(order_url.as_ref().to_string());
        Order::from_resource(self.context.clone(), resource)
    }

    /// Fetch an authorization by URL.
    pub async fn get_authorization(
        &self,
        authorization_url: impl AsRef<str>,
    ) -> AcmeResult<Authorization> {
        Authorization::get(self.context.clone(), authorization_url.as_ref()).await
    }

    /// Fetch a single challenge by URL.
    pub async fn get_challenge(&self, challenge_url: impl AsRef<str>) -> AcmeResult<Challenge> {
        let resource: ChallengeResource =
            context_client_request!(self.context, get_resource, challenge_url.as_ref()).await?;
        Ok(Challenge::new(self.context.clone(), Arc::new(resource)))
    }

    /// Replace the account's contact list.
    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3.2
    pub async fn update_contact(&mut self, contacts: Vec<Contact>) -> AcmeResult<()> {
        let update = UpdateAccountResource {
            contact: contacts.into_iter().map(Contact::uri).collect(),
        };
        self.resource = context_client_request!(self.context, update_account, &update).await?;
        Ok(())
    }

    /// Deactivate the account. Irreversible; the server refuses all further
    /// requests authorized by this account.
    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3.6
    pub async fn deactivate(&mut self) -> AcmeResult<()> {
        self.resource = context_client_request!(self.context, account_deactivate).await?;
        Ok(())
    }

    /// Roll the account over to a freshly generated key of the default type.
    pub async fn rotate_key(&mut self) -> AcmeResult<()> {
        self.rotate_key_to(AccountKey::generate(KeyType::default()))
            .await
    }

    /// Roll the account over to `new_key`.
    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3.5
    ///
    /// On success this account signs with the new key. Order, authorization,
    /// and challenge handles created before the rotation still hold the old
    /// key and must be re-fetched.
    pub async fn rotate_key_to(&mut self, new_key: AccountKey) -> AcmeResult<()> {
        context_client_request!(self.context, key_change, &new_key).await?;
        self.context = Arc::new(AccountContext {
            client: self.context.client.clone(),
            account_key: new_key.update_kid(self.context.account_url.clone()),
            account_url: self.context.account_url.clone(),
        });
        Ok(())
    }

    /// Revoke a certificate with this account's authority.
    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.6
    pub async fn revoke_certificate(&self, revocation: &RevocationRequest) -> AcmeResult<()> {
        self.context
            .client
            .revoke_certificate(&self.context.account_key, &revocation.to_wire())
            .await
    }
}

pub enum Contact {
    Email(String),
    Uri(String),
}

impl Contact {
    pub(crate) fn uri(self) -> String {
        match self {
            Self::Email(email) if !email.starts_with("mailto:") => format!("mailto:{}", email),
            Self::Email(email) => email,
            Self::Uri(uri) => uri,
        }
    }
}

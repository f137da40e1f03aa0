use std::collections::HashMap;
use std::sync::Arc;

use http_client::HttpClient;

use crate::crypto::account_key::AccountKey;
use crate::crypto::eab::EabCredentials;
use crate::crypto::generate_account_key;
use crate::error::AcmeResult;
use crate::resolve_directory_url;
use crate::wire::account::NewAccountResource;
use crate::wire::client::{user_agent, AcmeClient};
use crate::wire::directory::{DirectoryMetadata, DirectoryResource};

use super::account::{Account, Contact};
use super::revocation::RevocationRequest;

/// Entry point of the crate: fetches the directory once and hands out
/// account handles. Cheap to share; all accounts created from one client
/// reuse its transport and nonce cache.
pub struct Client {
    inner: Arc<AcmeClient>,
}

/// Client configuration.
///
/// `directory_url` is either a full URL or one of the aliases
/// `lets_encrypt`, `lets_encrypt_staging`, `zerossl`. `user_agent` is an
/// optional prefix put in front of the crate's own product token.
pub struct ClientConfig {
    pub directory_url: String,
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn new(directory_url: impl Into<String>) -> Self {
        Self {
            directory_url: directory_url.into(),
            user_agent: None,
        }
    }

    pub fn user_agent(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent = Some(prefix.into());
        self
    }
}

impl Client {
    pub fn new(http: impl Into<Arc<dyn HttpClient>>, directory: DirectoryResource) -> Self {
        Self {
            inner: Arc::new(AcmeClient::new(http, directory)),
        }
    }

    pub async fn for_directory_url(
        http: impl Into<Arc<dyn HttpClient>>,
        directory_url: impl AsRef<str>,
    ) -> AcmeResult<Self> {
        Self::with_config(http, ClientConfig::new(directory_url.as_ref())).await
    }

    /// Bootstrap: resolve the directory alias, fetch and parse the
    /// directory. Any failure here is fatal; no client is produced.
    pub async fn with_config(
        http: impl Into<Arc<dyn HttpClient>>,
        config: ClientConfig,
    ) -> AcmeResult<Self> {
        let http_arc = http.into();
        let directory_url = resolve_directory_url(&config.directory_url);
        let agent = user_agent(config.user_agent.as_deref());
        let directory = AcmeClient::get_directory(http_arc.as_ref(), directory_url, &agent).await?;
        let mut inner = AcmeClient::new(http_arc, directory);
        if let Some(prefix) = &config.user_agent {
            inner = inner.with_user_agent(prefix);
        }
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn directory(&self) -> &DirectoryResource {
        self.inner.directory()
    }

    pub fn metadata(&self) -> &DirectoryMetadata {
        &self.directory().meta
    }

    pub fn terms_of_service_uri(&self) -> Option<&str> {
        self.metadata().terms_of_service.as_deref()
    }

    /// The certificate profiles the server advertises, name to description.
    pub fn profiles(&self) -> &HashMap<String, String> {
        &self.metadata().profiles
    }

    /// Whether registration requires external account binding credentials.
    pub fn external_account_required(&self) -> bool {
        self.metadata().external_account_required.unwrap_or(false)
    }

    /// Register an account (or fetch an existing one, if the registration
    /// says `only_return_existing`).
    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3
    pub async fn register_account(
        &self,
        registration: AccountRegistration,
    ) -> AcmeResult<Account> {
        let account_key = registration
            .account_key
            .unwrap_or_else(generate_account_key);
        let public_jwk = account_key.to_public()?;
        let external_account_binding = registration
            .eab
            .map(|eab| eab.sign(&public_jwk, &self.directory().new_account))
            .transpose()?;

        let req = NewAccountResource {
            contact: registration.contact,
            terms_of_service_agreed: registration.terms_of_service_agreed,
            only_return_existing: registration.only_return_existing,
            external_account_binding,
        };
        let resource = self.inner.new_account(&account_key, &public_jwk, &req).await?;
        Account::from_resource(self.inner.clone(), account_key, resource)
    }

    /// Look up the account registered for `account_key` without creating
    /// one.
    pub async fn find_account(&self, account_key: AccountKey) -> AcmeResult<Account> {
        let public_jwk = account_key.to_public()?;
        let req = NewAccountResource {
            only_return_existing: true,
            ..Default::default()
        };
        let resource = self.inner.new_account(&account_key, &public_jwk, &req).await?;
        Account::from_resource(self.inner.clone(), account_key, resource)
    }

    /// Revoke a certificate signing with the certificate's own key (or any
    /// unregistered key the server will accept). Account-authorized
    /// revocation lives on [`Account::revoke_certificate`].
    pub async fn revoke_certificate(
        &self,
        revocation: &RevocationRequest,
        key: &AccountKey,
    ) -> AcmeResult<()> {
        self.inner.revoke_certificate(key, &revocation.to_wire()).await
    }
}

/// Accumulates the fields of a newAccount request.
/// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3
#[derive(Default)]
pub struct AccountRegistration {
    account_key: Option<AccountKey>,
    contact: Vec<String>,
    terms_of_service_agreed: bool,
    only_return_existing: bool,
    eab: Option<EabCredentials>,
}

impl AccountRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register with this key instead of a freshly generated ES256 key.
    pub fn account_key(mut self, key: AccountKey) -> Self {
        self.account_key = Some(key);
        self
    }

    /// Append a contact.
    pub fn contact(mut self, contact: Contact) -> Self {
        self.contact.push(contact.uri());
        self
    }

    /// Append an email address to the contact list.
    pub fn email(self, email: impl Into<String>) -> Self {
        self.contact(Contact::Email(email.into()))
    }

    /// Agree to the terms of service linked from the directory metadata.
    /// Idempotent.
    pub fn agree_to_terms(mut self) -> Self {
        self.terms_of_service_agreed = true;
        self
    }

    /// Only look up an existing account; never create one.
    pub fn only_return_existing(mut self) -> Self {
        self.only_return_existing = true;
        self
    }

    /// Attach external account binding credentials as issued by the CA.
    pub fn eab_credentials(
        mut self,
        kid: impl Into<String>,
        mac_key: impl AsRef<str>,
    ) -> AcmeResult<Self> {
        self.eab = Some(EabCredentials::new(kid, mac_key)?);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agree_to_terms_is_idempotent() {
        let registration = AccountRegistration::new().agree_to_terms().agree_to_terms();
        assert!(registration.terms_of_service_agreed);
    }

    #[test]
    fn email_contacts_get_the_mailto_scheme() {
        let registration = AccountRegistration::new()
            .email("admin@example.com")
            .contact(Contact::Uri("tel:+15551234".to_string()));
        assert_eq!(
            registration.contact,
            ["mailto:admin@example.com", "tel:+15551234"]
        );
    }

    #[test]
    fn defaults_are_conservative() {
        let registration = AccountRegistration::new();
        assert!(!registration.terms_of_service_agreed);
        assert!(!registration.only_return_existing);
        assert!(registration.contact.is_empty());
        assert!(registration.account_key.is_none());
    }
}

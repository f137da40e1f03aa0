/// Dispatch an account-scoped call on the shared transport client, signing
/// with the context's key and authorizing by its account URL.
macro_rules! context_client_request {
    ($ctx:expr, $method:ident, $($arg:expr),+) => ($ctx.client.$method(&$ctx.account_key, &$ctx.account_url, $($arg),+));
    ($ctx:expr, $method:ident) => ($ctx.client.$method(&$ctx.account_key, &$ctx.account_url))
}

pub mod api {
    pub mod account;
    pub mod account_context;
    pub mod authorization;
    pub mod challenge;
    pub mod client;
    pub mod dns_identifier;
    pub mod order;
    pub mod revocation;
}

pub mod crypto;
pub mod error;
pub mod retry_after;
pub mod wire;

#[cfg(feature = "x509")]
pub mod x509;

pub(crate) mod base64url;

use std::sync::Arc;

pub use api::account::{Account, Contact};
pub use api::client::{AccountRegistration, Client, ClientConfig};
pub use api::order::{Order, OrderBuilder};
pub use api::revocation::{RevocationReason, RevocationRequest};
pub use crypto::account_key::{AccountKey, KeyType};
pub use error::{AcmeError, AcmeResult};

pub static LETS_ENCRYPT_DIRECTORY_URL: &str = "https://acme-v02.api.letsencrypt.org/directory";
pub async fn lets_encrypt_client(
    http: impl Into<Arc<dyn http_client::HttpClient>>,
) -> AcmeResult<Client> {
    Client::for_directory_url(http, LETS_ENCRYPT_DIRECTORY_URL).await
}

pub static LETS_ENCRYPT_STAGING_DIRECTORY_URL: &str =
    "https://acme-staging-v02.api.letsencrypt.org/directory";
pub async fn lets_encrypt_staging_client(
    http: impl Into<Arc<dyn http_client::HttpClient>>,
) -> AcmeResult<Client> {
    Client::for_directory_url(http, LETS_ENCRYPT_STAGING_DIRECTORY_URL).await
}

pub static ZEROSSL_DIRECTORY_URL: &str = "https://acme.zerossl.com/v2/DV90";
pub async fn zerossl_client(
    http: impl Into<Arc<dyn http_client::HttpClient>>,
) -> AcmeResult<Client> {
    Client::for_directory_url(http, ZEROSSL_DIRECTORY_URL).await
}

/// Expand a well-known directory alias; anything else is taken as a literal
/// URL.
pub fn resolve_directory_url(name_or_url: &str) -> &str {
    match name_or_url {
        "lets_encrypt" => LETS_ENCRYPT_DIRECTORY_URL,
        "lets_encrypt_staging" => LETS_ENCRYPT_STAGING_DIRECTORY_URL,
        "zerossl" => ZEROSSL_DIRECTORY_URL,
        url => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_aliases_expand_to_fixed_urls() {
        assert_eq!(
            resolve_directory_url("lets_encrypt"),
            "https://acme-v02.api.letsencrypt.org/directory"
        );
        assert_eq!(
            resolve_directory_url("lets_encrypt_staging"),
            "https://acme-staging-v02.api.letsencrypt.org/directory"
        );
        assert_eq!(
            resolve_directory_url("zerossl"),
            "https://acme.zerossl.com/v2/DV90"
        );
    }

    #[test]
    fn literal_urls_pass_through() {
        assert_eq!(
            resolve_directory_url("https://pebble.test:14000/dir"),
            "https://pebble.test:14000/dir"
        );
    }
}

use std::sync::Arc;

use crate::{crypto::account_key::AccountKey, wire::client::AcmeClient};

/// Everything an account-scoped operation needs: the shared transport client
/// and the key (whose kid is the account URL). Shared by the `Account` and
/// every `Order`/`Authorization`/`Challenge` handle derived from it.
pub(crate) struct AccountContext {
    pub client: Arc<AcmeClient>,
    pub account_key: AccountKey,
    pub account_url: String,
}

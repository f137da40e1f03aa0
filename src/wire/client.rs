use std::sync::{Arc, Mutex};

use http_client::{Body, HttpClient, Request, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use super::{
    account::{
        AccountResource, AccountStatus, KeyChangeResource, NewAccountResource,
        UpdateAccountResource,
    },
    authorization::AuthorizationResource,
    challenge::ChallengeResource,
    common::LocationResource,
    directory::DirectoryResource,
    order::{FinalizeOrder, NewOrderResource, OrderResource},
    problem::{AcmeProblem, AcmeProblemType},
    revocation::RevokeCertResource,
};
use crate::{
    crypto::{
        account_key::AccountKey,
        jwk::Jwk,
        jws::{self, jws_flattened, Jws, JwsHeader, JwsSigner},
    },
    error::{AcmeError, AcmeResult},
    retry_after,
};

/// The transport-facing ACME client: the directory, the HTTP handle, and the
/// replay-nonce cache. Every operation in the crate funnels through
/// [`request`](AcmeClient::request).
///
/// Safe to share between tasks; the nonce slot is the only mutable state and
/// its lock is never held across I/O.
pub struct AcmeClient {
    http: Arc<dyn HttpClient>,
    directory: DirectoryResource,
    nonce: Mutex<Option<String>>,
    user_agent: String,
}

pub static NO_PAYLOAD: Option<()> = None;

pub fn user_agent(prefix: Option<&str>) -> String {
    let base = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
    match prefix {
        Some(prefix) => format!("{} {}", prefix, base),
        None => base.to_string(),
    }
}

impl AcmeClient {
    pub fn new(http: impl Into<Arc<dyn HttpClient>>, directory: DirectoryResource) -> Self {
        Self {
            http: http.into(),
            directory,
            nonce: Mutex::new(None),
            user_agent: user_agent(None),
        }
    }

    pub fn with_user_agent(mut self, prefix: &str) -> Self {
        self.user_agent = user_agent(Some(prefix));
        self
    }

    pub async fn for_directory_url(
        http: impl Into<Arc<dyn HttpClient>>,
        directory_url: &str,
    ) -> AcmeResult<AcmeClient> {
        let http_arc = http.into();
        let directory =
            Self::get_directory(http_arc.as_ref(), directory_url, &user_agent(None)).await?;
        Ok(Self::new(http_arc, directory))
    }

    pub async fn get_directory(
        http: &(impl HttpClient + ?Sized),
        directory_url: impl AsRef<str>,
        user_agent: &str,
    ) -> AcmeResult<DirectoryResource> {
        let mut req = Request::get(directory_url.as_ref());
        req.insert_header("User-Agent", user_agent);
        let mut resp = http.send(req).await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AcmeError::HttpStatus(status as u16));
        }
        Ok(resp.body_json().await?)
    }

    pub fn directory(&self) -> &DirectoryResource {
        &self.directory
    }

    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3
    pub async fn new_account(
        &self,
        signer: &impl JwsSigner,
        public_jwk: &Jwk,
        new_account: &NewAccountResource,
    ) -> AcmeResult<AccountResource> {
        self.request_resource(
            signer,
            &self.directory.new_account,
            Auth::Jwk(public_jwk),
            &Some(new_account),
        )
        .await
    }

    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3.2
    pub async fn update_account(
        &self,
        signer: &impl JwsSigner,
        account_url: &str,
        update: &UpdateAccountResource,
    ) -> AcmeResult<AccountResource> {
        let mut resp = self
            .request(signer, account_url, Auth::Kid(account_url), &Some(update))
            .await?;
        Ok(resp.body_json().await?)
    }

    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3.6
    pub async fn account_deactivate(
        &self,
        signer: &impl JwsSigner,
        account_url: &str,
    ) -> AcmeResult<AccountResource> {
        let deactivate = AccountResource {
            status: AccountStatus::Deactivated,
            ..Default::default()
        };
        let mut resp = self
            .request(
                signer,
                account_url,
                Auth::Kid(account_url),
                &Some(deactivate),
            )
            .await?;
        Ok(resp.body_json().await?)
    }

    /// Account key rollover: an inner JWS signed by the replacement key
    /// (embedded `jwk`, no nonce) becomes the payload of an outer JWS signed
    /// by the current key. Proves simultaneous possession of both keys.
    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.3.5
    pub async fn key_change(
        &self,
        old_key: &AccountKey,
        account_url: &str,
        new_key: &AccountKey,
    ) -> AcmeResult<()> {
        let url = &self.directory.key_change;
        let new_jwk = new_key.to_public()?;
        let inner_header = JwsHeader {
            alg: new_key.jws_alg(),
            nonce: None,
            url,
            jwk: Some(&new_jwk),
            kid: None,
        };
        let inner_payload = serde_json::to_vec(&KeyChangeResource {
            account: account_url.to_string(),
            old_key: old_key.to_public()?,
        })?;
        let inner = jws_flattened(new_key, &inner_header, &inner_payload)
            .map_err(AcmeError::CryptoError)?;

        self.request(old_key, url, Auth::Kid(account_url), &Some(inner))
            .await?;
        Ok(())
    }

    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.4
    pub async fn new_order(
        &self,
        signer: &impl JwsSigner,
        account_url: &str,
        new_order: &NewOrderResource,
    ) -> AcmeResult<OrderResource> {
        self.request_resource(
            signer,
            &self.directory.new_order,
            Auth::Kid(account_url),
            &Some(new_order),
        )
        .await
    }

    pub async fn finalize_order(
        &self,
        signer: &impl JwsSigner,
        account_url: &str,
        finalize_url: &str,
        finalize_order: &FinalizeOrder,
    ) -> AcmeResult<OrderResource> {
        let mut resp = self
            .request(
                signer,
                finalize_url,
                Auth::Kid(account_url),
                &Some(finalize_order),
            )
            .await?;
        Ok(resp.body_json().await?)
    }

    pub async fn get_certificate_chain(
        &self,
        signer: &impl JwsSigner,
        account_url: &str,
        certificate_url: &str,
    ) -> AcmeResult<String> {
        let mut resp = self
            .request(signer, certificate_url, Auth::Kid(account_url), &NO_PAYLOAD)
            .await?;
        Ok(resp.body_string().await?)
    }

    pub async fn get_authorization(
        &self,
        signer: &impl JwsSigner,
        account_url: &str,
        authorization_url: &str,
    ) -> AcmeResult<AuthorizationResource> {
        self.get_resource(signer, account_url, authorization_url)
            .await
    }

    pub async fn respond_challenge(
        &self,
        signer: &impl JwsSigner,
        account_url: &str,
        challenge_url: &str,
        response: Option<Map<String, Value>>,
    ) -> AcmeResult<ChallengeResource> {
        // An empty JSON object, not POST-as-GET: the POST is what arms the
        // validation.
        let payload = response.unwrap_or_default();
        let mut resp = self
            .request(signer, challenge_url, Auth::Kid(account_url), &Some(payload))
            .await?;
        Ok(resp.body_json().await?)
    }

    /// https://www.rfc-editor.org/rfc/rfc8555.html#section-7.6
    ///
    /// The signer is either a registered account key (signs with `kid`) or
    /// the certificate's own key (no kid, signs with an embedded `jwk`).
    pub async fn revoke_certificate(
        &self,
        signer: &AccountKey,
        revocation: &RevokeCertResource,
    ) -> AcmeResult<()> {
        let url = &self.directory.revoke_cert;
        let public_jwk;
        let auth = match signer.kid() {
            Some(kid) => Auth::Kid(kid),
            None => {
                public_jwk = signer.to_public()?;
                Auth::Jwk(&public_jwk)
            }
        };
        self.request(signer, url, auth, &Some(revocation)).await?;
        Ok(())
    }

    /// POST-as-GET for any resource with a JSON body.
    pub async fn get_resource<R: DeserializeOwned>(
        &self,
        signer: &impl JwsSigner,
        account_url: &str,
        resource_url: &str,
    ) -> AcmeResult<R> {
        let mut resp = self
            .request(signer, resource_url, Auth::Kid(account_url), &NO_PAYLOAD)
            .await?;
        Ok(resp.body_json().await?)
    }

    async fn request_resource<R: LocationResource>(
        &self,
        signer: &impl JwsSigner,
        url: &str,
        auth: Auth<'_>,
        payload: &Option<impl Serialize>,
    ) -> AcmeResult<R> {
        R::from_response(self.request(signer, url, auth, payload).await?).await
    }

    pub(crate) async fn request(
        &self,
        signer: &impl JwsSigner,
        url: &str,
        auth: Auth<'_>,
        payload: &Option<impl Serialize>,
    ) -> AcmeResult<Response> {
        let mut res = self.request_once(signer, url, &auth, payload).await;
        if let Err(AcmeError::AcmeProblem(ref problem)) = res {
            // Like certbot, retry exactly once on badNonce error; the failed
            // response already refreshed the nonce slot.
            if problem.has_type(AcmeProblemType::BadNonce) {
                res = self.request_once(signer, url, &auth, payload).await
            }
        }
        res
    }

    async fn request_once(
        &self,
        signer: &impl JwsSigner,
        url: &str,
        auth: &Auth<'_>,
        payload: &Option<impl Serialize>,
    ) -> AcmeResult<Response> {
        let jws = self.build_request_body(signer, url, auth, payload).await?;

        let mut req = Request::post(url);
        req.set_body(&jws);
        req.insert_header("User-Agent", self.user_agent.as_str());

        let mut resp = self.http.send(req).await?;
        self.handle_response(&mut resp).await?;
        Ok(resp)
    }

    pub async fn build_request_body(
        &self,
        signer: &impl JwsSigner,
        url: &str,
        auth: &Auth<'_>,
        payload: &Option<impl Serialize>,
    ) -> AcmeResult<Jws> {
        let nonce = self.current_nonce().await?;
        let (jwk, kid) = match auth {
            Auth::Jwk(jwk) => (Some(*jwk), None),
            Auth::Kid(kid) => (None, Some(*kid)),
        };
        let jws_header = JwsHeader {
            alg: signer.jws_alg(),
            nonce: Some(&nonce),
            url,
            jwk,
            kid,
        };

        let payload_bytes = if let Some(p) = payload {
            serde_json::to_vec(&p)?
        } else {
            // POST-as-GET: the payload is the empty octet string.
            Vec::new()
        };

        jws_flattened(signer, &jws_header, &payload_bytes).map_err(AcmeError::CryptoError)
    }

    /// Take the cached nonce, or HEAD newNonce for a fresh one. Each cached
    /// nonce is handed out exactly once.
    async fn current_nonce(&self) -> AcmeResult<String> {
        if let Some(nonce) = self.nonce.lock().unwrap().take() {
            return Ok(nonce);
        }

        let mut req = Request::head(self.directory.new_nonce.as_str());
        req.insert_header("User-Agent", self.user_agent.as_str());
        let resp = self
            .http
            .send(req)
            .await
            .map_err(|_| AcmeError::NonceUnavailable)?;
        if !resp.status().is_success() {
            return Err(AcmeError::NonceUnavailable);
        }
        get_replay_nonce(&resp).ok_or(AcmeError::NonceUnavailable)
    }

    /// Capture the replay nonce (success or error) and classify non-2xx
    /// responses.
    async fn handle_response(&self, resp: &mut Response) -> Result<(), AcmeError> {
        if let Some(nonce) = get_replay_nonce(resp) {
            *self.nonce.lock().unwrap() = Some(nonce);
        }

        let status = resp.status();
        if status.is_success() || status.is_informational() {
            return Ok(());
        }

        let problem: Option<AcmeProblem> = if has_json_content_type(resp) {
            resp.body_json().await.ok()
        } else {
            None
        };

        // badNonce outranks everything so the retry in `request` can fire;
        // a parseable Retry-After outranks the rest of the problem body.
        if let Some(problem) = problem {
            if problem.has_type(AcmeProblemType::BadNonce) {
                return Err(AcmeError::AcmeProblem(problem));
            }
            if let Some(seconds) = retry_after_header(resp) {
                return Err(AcmeError::RetryAfter { seconds });
            }
            return Err(AcmeError::AcmeProblem(problem));
        }

        if let Some(seconds) = retry_after_header(resp) {
            return Err(AcmeError::RetryAfter { seconds });
        }

        Err(AcmeError::HttpStatus(status as u16))
    }
}

/// How a request authenticates itself: an embedded public JWK (registration,
/// certificate-key revocation) or the account URL the server knows the key
/// by.
pub enum Auth<'a> {
    Jwk(&'a Jwk),
    Kid(&'a str),
}

fn get_replay_nonce(resp: &Response) -> Option<String> {
    Some(resp.header("Replay-Nonce")?.last().as_str().to_owned())
}

fn retry_after_header(resp: &Response) -> Option<u64> {
    retry_after::parse(resp.header("Retry-After")?.last().as_str())
}

fn has_json_content_type(resp: &Response) -> bool {
    resp.content_type()
        .map(|ct| {
            let essence = ct.essence().to_string();
            essence == AcmeProblem::CONTENT_TYPE || essence == "application/json"
        })
        .unwrap_or(false)
}

impl From<&Jws> for Body {
    fn from(jws: &Jws) -> Self {
        let mut body = Body::from_json(jws).unwrap();
        body.set_mime(jws::CONTENT_TYPE);
        body
    }
}

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::base64url;

/// A JSON Web Key (RFC 7517) covering the EC, OKP, and RSA key types this
/// crate signs with. All members are base64url-no-pad strings.
///
/// Fields are declared in lexicographic order so that serializing the
/// [`public`](Jwk::public) form yields exactly the canonical RFC 7638
/// thumbprint input.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Jwk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    pub kty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Jwk {
    /// The key with all private members stripped.
    pub fn public(&self) -> Jwk {
        Jwk {
            crv: self.crv.clone(),
            d: None,
            e: self.e.clone(),
            kty: self.kty.clone(),
            n: self.n.clone(),
            p: None,
            q: None,
            x: self.x.clone(),
            y: self.y.clone(),
        }
    }

    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// RFC 7638 JWK thumbprint: SHA-256 over the canonical JSON of the
    /// required public members, base64url without padding.
    pub fn thumbprint(&self) -> anyhow::Result<String> {
        let canonical = match self.kty.as_str() {
            "EC" => serde_json::to_vec(&EcThumbprint {
                crv: self.require("crv", &self.crv)?,
                kty: &self.kty,
                x: self.require("x", &self.x)?,
                y: self.require("y", &self.y)?,
            })?,
            "OKP" => serde_json::to_vec(&OkpThumbprint {
                crv: self.require("crv", &self.crv)?,
                kty: &self.kty,
                x: self.require("x", &self.x)?,
            })?,
            "RSA" => serde_json::to_vec(&RsaThumbprint {
                e: self.require("e", &self.e)?,
                kty: &self.kty,
                n: self.require("n", &self.n)?,
            })?,
            other => anyhow::bail!("unsupported JWK key type {:?}", other),
        };
        Ok(base64url::encode(Sha256::digest(&canonical)))
    }

    fn require<'a>(
        &self,
        name: &'static str,
        member: &'a Option<String>,
    ) -> anyhow::Result<&'a str> {
        member
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("JWK of type {:?} is missing {:?}", self.kty, name))
    }
}

impl Drop for Jwk {
    fn drop(&mut self) {
        for member in [&mut self.d, &mut self.p, &mut self.q] {
            if let Some(value) = member {
                value.zeroize();
            }
        }
    }
}

// Required members of each key type in lexicographic order, per RFC 7638
// section 3.2.
#[derive(Serialize)]
struct EcThumbprint<'a> {
    crv: &'a str,
    kty: &'a str,
    x: &'a str,
    y: &'a str,
}

#[derive(Serialize)]
struct OkpThumbprint<'a> {
    crv: &'a str,
    kty: &'a str,
    x: &'a str,
}

#[derive(Serialize)]
struct RsaThumbprint<'a> {
    e: &'a str,
    kty: &'a str,
    n: &'a str,
}

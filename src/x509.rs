use openssl::{
    ec::{EcGroup, EcKey},
    error::ErrorStack,
    hash::MessageDigest,
    nid::Nid,
    pkey::{HasPrivate, PKey, PKeyRef},
    stack::Stack,
    x509::{extension::SubjectAlternativeName, X509NameBuilder, X509ReqBuilder},
};

use crate::{AcmeError, AcmeResult};

/// Build a DER-encoded CSR for the given DNS names: CN is the first name,
/// the SAN extension covers all of them.
pub fn build_csr<P: HasPrivate>(
    key: &PKeyRef<P>,
    names: &[impl AsRef<str>],
) -> AcmeResult<Vec<u8>> {
    let common_name = names
        .first()
        .ok_or_else(|| AcmeError::InvalidState("CSR needs at least one name".to_string()))?;

    let mut csr = X509ReqBuilder::new()?;
    csr.set_pubkey(key)?;

    let mut subject = X509NameBuilder::new()?;
    subject.append_entry_by_nid(Nid::COMMONNAME, common_name.as_ref())?;
    csr.set_subject_name(&subject.build())?;

    let mut san = SubjectAlternativeName::new();
    for name in names {
        san.dns(name.as_ref());
    }
    let mut extensions = Stack::new()?;
    extensions.push(san.build(&csr.x509v3_context(None))?)?;
    csr.add_extensions(extensions.as_ref())?;

    csr.sign(key, MessageDigest::sha256())?;
    Ok(csr.build().to_der()?)
}

/// Generate a fresh P-256 key and a CSR over it. Returns the PKCS#8 PEM of
/// the private key and the DER CSR.
pub fn generate_key_and_csr(names: &[impl AsRef<str>]) -> AcmeResult<(String, Vec<u8>)> {
    let ec_group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
    let key = PKey::from_ec_key(EcKey::generate(ec_group.as_ref())?)?;
    let key_pem = String::from_utf8(key.private_key_to_pem_pkcs8()?)
        .map_err(|err| AcmeError::CryptoError(err.into()))?;

    let csr_der = build_csr(key.as_ref(), names)?;

    Ok((key_pem, csr_der))
}

impl From<ErrorStack> for AcmeError {
    fn from(err: ErrorStack) -> Self {
        AcmeError::CryptoError(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_carries_cn_and_all_sans() {
        let (_, csr_der) = generate_key_and_csr(&["example.com", "*.example.com"]).unwrap();
        let csr = openssl::x509::X509Req::from_der(&csr_der).unwrap();

        let cn = csr
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .unwrap();
        assert_eq!(cn.data().as_slice(), b"example.com");

        csr.public_key().unwrap();
    }

    #[test]
    fn empty_name_list_is_refused() {
        let names: [&str; 0] = [];
        generate_key_and_csr(&names).unwrap_err();
    }
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Caroot Authors

use log::*;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::extension::{
    BasicConstraints, KeyUsage, SubjectKeyIdentifier,
};
use openssl::x509::{X509Builder, X509Crl, X509NameBuilder, X509};
use thiserror::Error;

pub static DEFAULT_KEY_BITS: u32 = 4096;

#[derive(Error, Debug)]
pub enum X509Error {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("Generated PEM is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Validates and holds a CA bundle loaded from PEM input: one or more
/// certificates, the CA private key, and a CRL chain.
///
/// Problems do not abort loading; they are accumulated into `errors` in
/// the order they were found, and the caller decides whether to proceed.
/// The checks are deliberately narrow: the bundle must be non-empty, the
/// key must match the leaf (first) certificate, and the leaf CRL must have
/// been issued by the leaf certificate. Full chain validation is out of
/// scope.
pub struct X509Loader {
    pub certs: Vec<X509>,
    pub key: Option<PKey<Private>>,
    pub crls: Vec<X509Crl>,
    pub errors: Vec<String>,
}

impl X509Loader {
    pub fn load(bundle_pem: &str, key_pem: &str, crl_pem: &str) -> Self {
        let mut errors = Vec::new();

        let certs = match X509::stack_from_pem(bundle_pem.as_bytes()) {
            Ok(certs) => {
                if certs.is_empty() {
                    errors.push(
                        "Could not detect any certificates in the \
                         certificate bundle"
                            .to_string(),
                    );
                }
                certs
            }
            Err(e) => {
                errors.push(format!(
                    "Could not parse the certificate bundle: {e}"
                ));
                Vec::new()
            }
        };

        let key = match PKey::private_key_from_pem(key_pem.as_bytes()) {
            Ok(key) => Some(key),
            Err(e) => {
                errors.push(format!("Could not parse the private key: {e}"));
                None
            }
        };

        let mut crls = Vec::new();
        let blocks = pem_blocks(crl_pem);
        if blocks.is_empty() {
            errors.push(
                "Could not detect any CRLs in the CRL chain".to_string(),
            );
        }
        for block in blocks {
            match X509Crl::from_pem(block.as_bytes()) {
                Ok(crl) => crls.push(crl),
                Err(e) => errors.push(format!("Could not parse a CRL: {e}")),
            }
        }

        if let (Some(cert), Some(key)) = (certs.first(), key.as_ref()) {
            match cert.public_key() {
                Ok(cert_key) => {
                    if !key.public_eq(&cert_key) {
                        errors.push(
                            "Private key does not match the leaf \
                             certificate"
                                .to_string(),
                        );
                    }
                    if let Some(crl) = crls.first() {
                        if !matches!(crl.verify(&cert_key), Ok(true)) {
                            errors.push(
                                "Leaf CRL was not issued by the leaf \
                                 certificate"
                                    .to_string(),
                            );
                        }
                    }
                }
                Err(e) => errors.push(format!(
                    "Could not extract the leaf certificate public key: {e}"
                )),
            }
        }

        X509Loader {
            certs,
            key,
            crls,
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Generates a fresh self-signed CA: an RSA key and a certificate with CA
/// basic constraints and certificate/CRL signing key usage. Returns the
/// certificate and key as PEM strings.
pub fn generate_ca(
    common_name: &str,
    ttl_seconds: u64,
) -> Result<(String, String), X509Error> {
    info!("Generating a new {DEFAULT_KEY_BITS} bit CA key for {common_name}");
    let rsa = Rsa::generate(DEFAULT_KEY_BITS)?;
    let key = PKey::from_rsa(rsa)?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_text("CN", &format!("Puppet CA: {common_name}"))?;
    let name = name.build();

    let mut builder = X509Builder::new()?;
    builder.set_version(2)?;
    let serial = BigNum::from_u32(1)?.to_asn1_integer()?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(&key)?;

    let not_before = Asn1Time::days_from_now(0)?;
    builder.set_not_before(&not_before)?;
    // Certificate validity is whole days, floored at one.
    let days = (ttl_seconds / 86_400).clamp(1, 36_500) as u32;
    let not_after = Asn1Time::days_from_now(days)?;
    builder.set_not_after(&not_after)?;

    builder.append_extension(
        BasicConstraints::new().critical().ca().build()?,
    )?;
    builder.append_extension(
        KeyUsage::new().critical().key_cert_sign().crl_sign().build()?,
    )?;
    let skid = SubjectKeyIdentifier::new()
        .build(&builder.x509v3_context(None, None))?;
    builder.append_extension(skid)?;

    builder.sign(&key, MessageDigest::sha256())?;
    let cert = builder.build();

    let cert_pem = String::from_utf8(cert.to_pem()?)?;
    let key_pem = String::from_utf8(key.private_key_to_pem_pkcs8()?)?;
    Ok((cert_pem, key_pem))
}

/// Splits concatenated PEM text into its `-----BEGIN/END-----` blocks.
fn pem_blocks(pem: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<String> = None;
    for line in pem.lines() {
        let line = line.trim();
        if line.starts_with("-----BEGIN ") {
            current = Some(String::new());
        }
        if let Some(block) = current.as_mut() {
            block.push_str(line);
            block.push('\n');
        }
        if line.starts_with("-----END ") {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIXTURE_CERT: &str =
        include_str!("../tests/fixtures/ca_crt.pem");
    static FIXTURE_KEY: &str = include_str!("../tests/fixtures/ca_key.pem");
    static FIXTURE_CRL: &str = include_str!("../tests/fixtures/ca_crl.pem");

    #[test]
    fn test_load_valid_bundle() {
        let loader = X509Loader::load(FIXTURE_CERT, FIXTURE_KEY, FIXTURE_CRL);
        assert!(loader.is_valid(), "unexpected errors: {:?}", loader.errors);
        assert_eq!(loader.certs.len(), 1);
        assert_eq!(loader.crls.len(), 1);
        assert!(loader.key.is_some());
    }

    #[test]
    fn test_load_garbage_accumulates_errors() {
        let loader = X509Loader::load("not pem", "also not pem", "");
        assert!(!loader.is_valid());
        assert!(loader.errors.len() >= 2);
        assert!(loader.certs.is_empty());
        assert!(loader.key.is_none());
    }

    #[test]
    fn test_load_mismatched_key() {
        let (_, other_key) =
            generate_ca("other.example.com", 86_400).unwrap(); //#[allow_ci]
        let loader = X509Loader::load(FIXTURE_CERT, &other_key, FIXTURE_CRL);
        assert!(!loader.is_valid());
        assert!(loader
            .errors
            .iter()
            .any(|e| e.contains("does not match")));
    }

    #[test]
    fn test_load_missing_crl() {
        let loader = X509Loader::load(FIXTURE_CERT, FIXTURE_KEY, "");
        assert!(!loader.is_valid());
        assert_eq!(loader.errors.len(), 1);
        assert!(loader.errors[0].contains("CRL"));
    }

    #[test]
    fn test_generate_ca_roundtrips_through_loader() {
        let (cert_pem, key_pem) =
            generate_ca("ca01.example.com", 5 * 365 * 86_400).unwrap(); //#[allow_ci]
        let loader = X509Loader::load(&cert_pem, &key_pem, FIXTURE_CRL);
        // The fixture CRL belongs to another CA, everything else checks
        // out.
        assert_eq!(loader.errors.len(), 1);
        assert!(loader.errors[0].contains("CRL"));
        let cn = loader.certs[0]
            .subject_name()
            .entries()
            .next()
            .unwrap() //#[allow_ci]
            .data()
            .as_utf8()
            .unwrap() //#[allow_ci]
            .to_string();
        assert!(cn.contains("ca01.example.com"), "{cn}");
    }

    #[test]
    fn test_pem_blocks_splits_concatenated_pem() {
        let two = format!("{FIXTURE_CRL}{FIXTURE_CRL}");
        assert_eq!(pem_blocks(&two).len(), 2);
        assert!(pem_blocks("no pem here").is_empty());
    }
}

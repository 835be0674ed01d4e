//! Certificate naming.
//!
//! Stored certificates are opaque DER blobs. The certificate delete cascade
//! needs to know which trusted roots were issued by which certificates, so
//! that knowledge is supplied from outside through [`CertificateInspector`].

use std::collections::HashMap;

use dirconf_types::{Certificate, Fingerprint};

/// Reads subject and issuer names out of a certificate.
pub trait CertificateInspector: Send + Sync {
    fn subject(&self, cert: &Certificate) -> Option<String>;

    fn issuer(&self, cert: &Certificate) -> Option<String>;

    /// Whether `cert` names `candidate` as its issuer. Names compare ASCII
    /// case-insensitively; an unknown name never matches.
    fn is_issued_by(&self, cert: &Certificate, candidate: &Certificate) -> bool {
        match (self.issuer(cert), self.subject(candidate)) {
            (Some(issuer), Some(subject)) => issuer.eq_ignore_ascii_case(&subject),
            _ => false,
        }
    }
}

/// Knows nothing about any certificate.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpaqueCertificates;

impl CertificateInspector for OpaqueCertificates {
    fn subject(&self, _cert: &Certificate) -> Option<String> {
        None
    }

    fn issuer(&self, _cert: &Certificate) -> Option<String> {
        None
    }
}

/// Subject and issuer names registered per certificate fingerprint.
#[derive(Clone, Debug, Default)]
pub struct KnownCertificates {
    names: HashMap<Fingerprint, (String, String)>,
}

impl KnownCertificates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, cert: &Certificate, subject: &str, issuer: &str) -> Self {
        self.insert(cert, subject, issuer);
        self
    }

    pub fn insert(&mut self, cert: &Certificate, subject: &str, issuer: &str) {
        self.names
            .insert(cert.fingerprint(), (subject.to_string(), issuer.to_string()));
    }
}

impl CertificateInspector for KnownCertificates {
    fn subject(&self, cert: &Certificate) -> Option<String> {
        self.names.get(&cert.fingerprint()).map(|(s, _)| s.clone())
    }

    fn issuer(&self, cert: &Certificate) -> Option<String> {
        self.names.get(&cert.fingerprint()).map(|(_, i)| i.clone())
    }
}

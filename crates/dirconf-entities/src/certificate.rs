use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use dirconf_mapper::{AttributeMapping, AttributeValue, Descriptor};
use dirconf_types::{Certificate, CN};

use crate::value::string_enum;

pub const IDM_CERTIFICATE_OBJECT_CLASS: &str = "vmwSTSCertificate";

pub mod attr {
    pub const FINGERPRINT: &str = "vmwSTSFingerprint";
    pub const CERTIFICATE: &str = "userCertificate";
    pub const CERT_TYPE: &str = "vmwSTSCertificateType";
}

string_enum! {
    /// What a stored certificate is trusted for.
    pub enum CertificateType {
        /// Token signing trust (STS).
        StsTrustCert => "STS_TRUST_CERT",
        /// Trust anchor for LDAPS connections to identity providers.
        LdapTrustedCert => "LDAP_TRUSTED_CERT",
    }
}

/// A certificate in a tenant's `IdmCertificates` store, named by its
/// fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdmCertificate {
    pub certificate: Certificate,
    pub cert_type: CertificateType,
}

impl IdmCertificate {
    pub fn new(certificate: Certificate, cert_type: CertificateType) -> Self {
        Self {
            certificate,
            cert_type,
        }
    }

    pub fn fingerprint(&self) -> String {
        self.certificate.fingerprint().to_hex()
    }
}

pub fn idm_certificate_descriptor() -> &'static Descriptor<IdmCertificate> {
    static DESCRIPTOR: OnceLock<Descriptor<IdmCertificate>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::direct(
            IDM_CERTIFICATE_OBJECT_CLASS,
            vec![
                // Derived from the certificate; nothing to apply on read.
                AttributeMapping::new(CN, |c: &IdmCertificate| c.fingerprint().encode())
                    .create_only()
                    .setter(|_, _| Ok(())),
                AttributeMapping::new(attr::FINGERPRINT, |c: &IdmCertificate| {
                    c.fingerprint().encode()
                })
                .setter(|_, _| Ok(())),
                AttributeMapping::new(attr::CERTIFICATE, |c: &IdmCertificate| {
                    c.certificate.encode()
                })
                .ctor(0),
                AttributeMapping::new(attr::CERT_TYPE, |c: &IdmCertificate| c.cert_type.encode())
                    .ctor(1),
            ],
            |args| Ok(IdmCertificate::new(args.get(0)?, args.get(1)?)),
        )
        .expect("certificate descriptor table is well-formed")
    })
}

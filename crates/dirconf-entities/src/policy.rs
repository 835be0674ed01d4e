use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use dirconf_mapper::{AttributeMapping, AttributeValue, Descriptor};
use dirconf_types::{Certificate, CN};

pub const CLIENT_CERT_POLICY_OBJECT_CLASS: &str = "vmwSTSTenantClientCertificatePolicy";

/// Name of the single policy object a tenant carries.
pub const DEFAULT_POLICY_NAME: &str = "Default";

pub const DEFAULT_CRL_CACHE_SIZE: i32 = 512;

pub mod attr {
    pub const REVOCATION_CHECK_ENABLED: &str = "vmwSTSClientCertRevocationCheckEnabled";
    pub const OCSP_ENABLED: &str = "vmwSTSClientCertOCSPEnabled";
    pub const USE_CRL_AS_FAIL_OVER: &str = "vmwSTSClientCertUseCRLAsFailOver";
    pub const SEND_OCSP_NONCE: &str = "vmwSTSClientCertSendOCSPNounce";
    pub const OCSP_URL: &str = "vmwSTSClientCertOCSPUrl";
    pub const OCSP_SIGNING_CERTIFICATE: &str = "userCertificate";
    pub const USE_CERT_CRL: &str = "vmwSTSClientCertUseCertCRL";
    pub const CRL_URL: &str = "vmwSTSClientCertCRLUrl";
    pub const CRL_CACHE_SIZE: &str = "vmwSTSClientCertCRLCacheSize";
    pub const CERT_POLICY_OIDS: &str = "vmwSTSClientCertCustomCertPolicyOid";
    pub const ENABLE_USER_NAME_HINT: &str = "vmwSTSClientCertEnableUserNameHint";
}

/// Client (smart card) certificate authentication policy of a tenant.
///
/// Absent attributes read back as the defaults below.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientCertPolicy {
    pub name: String,
    pub revocation_check_enabled: bool,
    pub use_ocsp: bool,
    pub use_crl_as_fail_over: bool,
    pub send_ocsp_nonce: bool,
    pub ocsp_url: Option<String>,
    pub ocsp_signing_certificate: Option<Certificate>,
    pub use_cert_crl: bool,
    pub crl_url: Option<String>,
    pub crl_cache_size: i32,
    /// Certificate policy OIDs a client certificate must carry.
    pub oids: Vec<String>,
    pub enable_user_name_hint: bool,
}

impl Default for ClientCertPolicy {
    fn default() -> Self {
        Self {
            name: DEFAULT_POLICY_NAME.to_string(),
            revocation_check_enabled: true,
            use_ocsp: false,
            use_crl_as_fail_over: false,
            send_ocsp_nonce: false,
            ocsp_url: None,
            ocsp_signing_certificate: None,
            use_cert_crl: true,
            crl_url: None,
            crl_cache_size: DEFAULT_CRL_CACHE_SIZE,
            oids: Vec::new(),
            enable_user_name_hint: false,
        }
    }
}

type PolicyMapping = AttributeMapping<ClientCertPolicy, ClientCertPolicy>;

/// A boolean switch; absent means `default`.
fn flag(
    name: &'static str,
    get: fn(&ClientCertPolicy) -> bool,
    field: fn(&mut ClientCertPolicy) -> &mut bool,
    default: bool,
) -> PolicyMapping {
    AttributeMapping::new(name, move |p: &ClientCertPolicy| get(p).encode())
        .set_with(move |p: &mut ClientCertPolicy, v: Option<bool>| {
            *field(p) = v.unwrap_or(default)
        })
}

pub fn client_cert_policy_descriptor() -> &'static Descriptor<ClientCertPolicy> {
    static DESCRIPTOR: OnceLock<Descriptor<ClientCertPolicy>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        let defaults = ClientCertPolicy::default();
        Descriptor::direct(
            CLIENT_CERT_POLICY_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |p: &ClientCertPolicy| p.name.encode())
                    .ctor(0)
                    .create_only(),
                flag(
                    attr::REVOCATION_CHECK_ENABLED,
                    |p| p.revocation_check_enabled,
                    |p| &mut p.revocation_check_enabled,
                    defaults.revocation_check_enabled,
                ),
                flag(attr::OCSP_ENABLED, |p| p.use_ocsp, |p| &mut p.use_ocsp, defaults.use_ocsp),
                flag(
                    attr::USE_CRL_AS_FAIL_OVER,
                    |p| p.use_crl_as_fail_over,
                    |p| &mut p.use_crl_as_fail_over,
                    defaults.use_crl_as_fail_over,
                ),
                flag(
                    attr::SEND_OCSP_NONCE,
                    |p| p.send_ocsp_nonce,
                    |p| &mut p.send_ocsp_nonce,
                    defaults.send_ocsp_nonce,
                ),
                AttributeMapping::new(attr::OCSP_URL, |p: &ClientCertPolicy| p.ocsp_url.encode())
                    .set_with(|p: &mut ClientCertPolicy, v: Option<String>| p.ocsp_url = v),
                AttributeMapping::new(attr::OCSP_SIGNING_CERTIFICATE, |p: &ClientCertPolicy| {
                    p.ocsp_signing_certificate.encode()
                })
                .set_with(|p: &mut ClientCertPolicy, v: Option<Certificate>| {
                    p.ocsp_signing_certificate = v
                }),
                flag(
                    attr::USE_CERT_CRL,
                    |p| p.use_cert_crl,
                    |p| &mut p.use_cert_crl,
                    defaults.use_cert_crl,
                ),
                AttributeMapping::new(attr::CRL_URL, |p: &ClientCertPolicy| p.crl_url.encode())
                    .set_with(|p: &mut ClientCertPolicy, v: Option<String>| p.crl_url = v),
                AttributeMapping::new(attr::CRL_CACHE_SIZE, |p: &ClientCertPolicy| {
                    p.crl_cache_size.encode()
                })
                .set_with(|p: &mut ClientCertPolicy, v: Option<i32>| {
                    p.crl_cache_size = v.unwrap_or(DEFAULT_CRL_CACHE_SIZE)
                }),
                AttributeMapping::new(attr::CERT_POLICY_OIDS, |p: &ClientCertPolicy| p.oids.encode())
                    .set_with(|p: &mut ClientCertPolicy, v: Vec<String>| p.oids = v),
                flag(
                    attr::ENABLE_USER_NAME_HINT,
                    |p| p.enable_user_name_hint,
                    |p| &mut p.enable_user_name_hint,
                    defaults.enable_user_name_hint,
                ),
            ],
            |args| {
                Ok(ClientCertPolicy {
                    name: args.get(0)?,
                    ..ClientCertPolicy::default()
                })
            },
        )
        .expect("client certificate policy descriptor table is well-formed")
    })
}

//! OpenID Connect clients.
//!
//! Clients are immutable once built; the descriptor materializes them
//! through [`OidcClientBuilder`].

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use dirconf_mapper::{AttributeMapping, AttributeValue, CodecError, Descriptor};
use dirconf_types::CN;

pub const OIDC_CLIENT_OBJECT_CLASS: &str = "vmwOidcRelyingParty";

/// Stored in place of an empty redirect URI list.
pub const NO_REDIRECT_URI: &str = "N/A";

pub mod attr {
    pub const CLIENT_ID: &str = "vmwOidcClientID";
    pub const REDIRECT_URIS: &str = "vmwOidcRedirectURIs";
    pub const TOKEN_ENDPOINT_AUTH_METHOD: &str = "vmwOidcTokenEndpointAuthMethod";
    pub const TOKEN_ENDPOINT_AUTH_SIGNING_ALG: &str = "vmwOidcTokenEndpointJWSAlg";
    pub const ID_TOKEN_SIGNED_RESPONSE_ALG: &str = "vmwOidcIDTokenJWSAlg";
    pub const POST_LOGOUT_REDIRECT_URIS: &str = "vmwOidcPostLogoutRedirectURI";
    pub const LOGOUT_URI: &str = "vmwOidcLogoutURI";
    pub const CERT_SUBJECT_DN: &str = "vmwOidcCertSubDN";
    pub const CLIENT_ASSERTION_LIFETIME_MS: &str = "vmwOidcAuthnRequestClientAssertionLifetimeMS";
    pub const CLIENT_SECRET: &str = "vmwOidcClientSecret";
    pub const AUTHORITIES: &str = "vmwOidcClientAuthorities";
    pub const RESOURCE_IDS: &str = "vmwOidcResourceIds";
    pub const SCOPES: &str = "vmwOidcScopes";
    pub const AUTO_APPROVE_SCOPES: &str = "vmwOidcAutoApproveScopes";
    pub const AUTHORIZED_GRANT_TYPES: &str = "vmwOidcAuthorizedGrantTypes";
    pub const ADDITIONAL_INFORMATION: &str = "vmwOidcAdditionalInformation";
}

/// A registered OIDC client of a tenant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcClient {
    pub client_id: String,
    pub redirect_uris: Vec<String>,
    pub token_endpoint_auth_method: Option<String>,
    pub token_endpoint_auth_signing_alg: Option<String>,
    pub id_token_signed_response_alg: Option<String>,
    pub post_logout_redirect_uris: Vec<String>,
    pub logout_uri: Option<String>,
    pub cert_subject_dn: Option<String>,
    pub client_assertion_lifetime_ms: i64,
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,
    pub authorities: Vec<String>,
    pub resource_ids: Vec<String>,
    pub scopes: Vec<String>,
    pub auto_approve_scopes: Vec<String>,
    pub authorized_grant_types: Vec<String>,
    pub additional_information: BTreeMap<String, String>,
}

impl OidcClient {
    pub fn builder(client_id: impl Into<String>) -> OidcClientBuilder {
        OidcClientBuilder::new(client_id)
    }
}

/// Incrementally assembles an [`OidcClient`].
#[derive(Clone, Debug)]
pub struct OidcClientBuilder {
    client: OidcClient,
}

impl OidcClientBuilder {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client: OidcClient {
                client_id: client_id.into(),
                redirect_uris: Vec::new(),
                token_endpoint_auth_method: None,
                token_endpoint_auth_signing_alg: None,
                id_token_signed_response_alg: None,
                post_logout_redirect_uris: Vec::new(),
                logout_uri: None,
                cert_subject_dn: None,
                client_assertion_lifetime_ms: 0,
                client_secret: None,
                authorities: Vec::new(),
                resource_ids: Vec::new(),
                scopes: Vec::new(),
                auto_approve_scopes: Vec::new(),
                authorized_grant_types: Vec::new(),
                additional_information: BTreeMap::new(),
            },
        }
    }

    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.client.redirect_uris.push(uri.into());
        self
    }

    pub fn with_post_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.client.post_logout_redirect_uris.push(uri.into());
        self
    }

    pub fn with_token_endpoint_auth_method(mut self, method: impl Into<String>) -> Self {
        self.client.token_endpoint_auth_method = Some(method.into());
        self
    }

    pub fn with_token_endpoint_auth_signing_alg(mut self, alg: impl Into<String>) -> Self {
        self.client.token_endpoint_auth_signing_alg = Some(alg.into());
        self
    }

    pub fn with_id_token_signed_response_alg(mut self, alg: impl Into<String>) -> Self {
        self.client.id_token_signed_response_alg = Some(alg.into());
        self
    }

    pub fn with_logout_uri(mut self, uri: impl Into<String>) -> Self {
        self.client.logout_uri = Some(uri.into());
        self
    }

    pub fn with_cert_subject_dn(mut self, dn: impl Into<String>) -> Self {
        self.client.cert_subject_dn = Some(dn.into());
        self
    }

    pub fn with_client_assertion_lifetime_ms(mut self, lifetime: i64) -> Self {
        self.client.client_assertion_lifetime_ms = lifetime;
        self
    }

    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client.client_secret = Some(secret.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.client.scopes.push(scope.into());
        self
    }

    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.client.authorized_grant_types.push(grant_type.into());
        self
    }

    pub fn with_additional_information(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.client.additional_information.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> OidcClient {
        self.client
    }
}

type ClientMapping = AttributeMapping<OidcClient, OidcClientBuilder>;

fn optional_text(
    name: &'static str,
    get: fn(&OidcClient) -> &Option<String>,
    field: fn(&mut OidcClient) -> &mut Option<String>,
) -> ClientMapping {
    AttributeMapping::new(name, move |c: &OidcClient| get(c).encode())
        .set_with(move |b: &mut OidcClientBuilder, v: Option<String>| *field(&mut b.client) = v)
}

fn text_list(
    name: &'static str,
    get: fn(&OidcClient) -> &Vec<String>,
    field: fn(&mut OidcClient) -> &mut Vec<String>,
) -> ClientMapping {
    AttributeMapping::new(name, move |c: &OidcClient| get(c).encode())
        .set_with(move |b: &mut OidcClientBuilder, v: Vec<String>| *field(&mut b.client) = v)
}

fn encode_redirect_uris(uris: &[String]) -> Vec<String> {
    if uris.is_empty() {
        vec![NO_REDIRECT_URI.to_string()]
    } else {
        uris.to_vec()
    }
}

fn decode_redirect_uris(stored: Vec<String>) -> Vec<String> {
    stored.into_iter().filter(|uri| uri != NO_REDIRECT_URI).collect()
}

pub fn oidc_client_descriptor() -> &'static Descriptor<OidcClient, OidcClientBuilder> {
    static DESCRIPTOR: OnceLock<Descriptor<OidcClient, OidcClientBuilder>> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        Descriptor::new(
            OIDC_CLIENT_OBJECT_CLASS,
            vec![
                AttributeMapping::new(CN, |c: &OidcClient| c.client_id.encode())
                    .ctor(0)
                    .create_only(),
                AttributeMapping::new(attr::CLIENT_ID, |c: &OidcClient| c.client_id.encode())
                    .create_only()
                    .setter(|b: &mut OidcClientBuilder, raw| {
                        match Option::<String>::decode(raw)? {
                            Some(id) if id != b.client.client_id => Err(CodecError::new(format!(
                                "client ID {id} does not match entry name {}",
                                b.client.client_id
                            ))),
                            _ => Ok(()),
                        }
                    }),
                AttributeMapping::new(attr::REDIRECT_URIS, |c: &OidcClient| {
                    encode_redirect_uris(&c.redirect_uris).encode()
                })
                .set_with(|b: &mut OidcClientBuilder, v: Vec<String>| {
                    b.client.redirect_uris = decode_redirect_uris(v)
                }),
                optional_text(
                    attr::TOKEN_ENDPOINT_AUTH_METHOD,
                    |c| &c.token_endpoint_auth_method,
                    |c| &mut c.token_endpoint_auth_method,
                ),
                optional_text(
                    attr::TOKEN_ENDPOINT_AUTH_SIGNING_ALG,
                    |c| &c.token_endpoint_auth_signing_alg,
                    |c| &mut c.token_endpoint_auth_signing_alg,
                ),
                optional_text(
                    attr::ID_TOKEN_SIGNED_RESPONSE_ALG,
                    |c| &c.id_token_signed_response_alg,
                    |c| &mut c.id_token_signed_response_alg,
                ),
                text_list(
                    attr::POST_LOGOUT_REDIRECT_URIS,
                    |c| &c.post_logout_redirect_uris,
                    |c| &mut c.post_logout_redirect_uris,
                ),
                optional_text(attr::LOGOUT_URI, |c| &c.logout_uri, |c| &mut c.logout_uri),
                optional_text(attr::CERT_SUBJECT_DN, |c| &c.cert_subject_dn, |c| &mut c.cert_subject_dn),
                AttributeMapping::new(attr::CLIENT_ASSERTION_LIFETIME_MS, |c: &OidcClient| {
                    c.client_assertion_lifetime_ms.encode()
                })
                .set_with(|b: &mut OidcClientBuilder, v: Option<i64>| {
                    b.client.client_assertion_lifetime_ms = v.unwrap_or(0)
                }),
                optional_text(attr::CLIENT_SECRET, |c| &c.client_secret, |c| &mut c.client_secret),
                text_list(attr::AUTHORITIES, |c| &c.authorities, |c| &mut c.authorities),
                text_list(attr::RESOURCE_IDS, |c| &c.resource_ids, |c| &mut c.resource_ids),
                text_list(attr::SCOPES, |c| &c.scopes, |c| &mut c.scopes),
                text_list(
                    attr::AUTO_APPROVE_SCOPES,
                    |c| &c.auto_approve_scopes,
                    |c| &mut c.auto_approve_scopes,
                ),
                text_list(
                    attr::AUTHORIZED_GRANT_TYPES,
                    |c| &c.authorized_grant_types,
                    |c| &mut c.authorized_grant_types,
                ),
                AttributeMapping::new(attr::ADDITIONAL_INFORMATION, |c: &OidcClient| {
                    if c.additional_information.is_empty() {
                        dirconf_types::RawValue::empty()
                    } else {
                        c.additional_information.encode()
                    }
                })
                .set_with(|b: &mut OidcClientBuilder, v: Option<BTreeMap<String, String>>| {
                    b.client.additional_information = v.unwrap_or_default()
                }),
            ],
            |args| Ok(OidcClientBuilder::new(args.get::<String>(0)?)),
            |b| Ok(b.build()),
        )
        .expect("OIDC client descriptor table is well-formed")
    })
}

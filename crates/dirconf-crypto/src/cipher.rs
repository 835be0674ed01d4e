use crate::error::{CipherError, CipherResult};

/// Version prefix of the ciphertext encoding.
const ENCODING_PREFIX: &str = "v1:";
const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 32;

const ENCRYPTION_CONTEXT: &str = "dirconf 2024 tenant secret encryption v1";
const AUTHENTICATION_CONTEXT: &str = "dirconf 2024 tenant secret authentication v1";

/// Symmetric cipher for secrets stored under a tenant (identity-provider
/// bind passwords). Keyed by the tenant's key string.
///
/// The mapping layer never calls this itself: the façade encrypts before a
/// value is handed to the codec and decrypts after it comes back.
pub trait TenantSecretCipher: Send + Sync {
    /// Encrypt `plaintext` into a printable encoding.
    fn encrypt(&self, tenant_key: &str, plaintext: &str) -> CipherResult<String>;

    /// Reverse [`encrypt`](Self::encrypt).
    fn decrypt(&self, tenant_key: &str, ciphertext: &str) -> CipherResult<String>;
}

/// Encrypt-then-MAC cipher built from keyed BLAKE3.
///
/// Keys for encryption and authentication are derived separately from the
/// tenant key. The keystream is the keyed BLAKE3 XOF over a random nonce.
/// Encoding: `v1:` followed by hex of `nonce || ciphertext || tag`.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeystreamCipher;

impl KeystreamCipher {
    pub fn new() -> Self {
        Self
    }

    fn keys(tenant_key: &str) -> CipherResult<([u8; 32], [u8; 32])> {
        if tenant_key.is_empty() {
            return Err(CipherError::EmptyKey);
        }
        let enc = blake3::derive_key(ENCRYPTION_CONTEXT, tenant_key.as_bytes());
        let mac = blake3::derive_key(AUTHENTICATION_CONTEXT, tenant_key.as_bytes());
        Ok((enc, mac))
    }

    fn apply_keystream(enc_key: &[u8; 32], nonce: &[u8], data: &mut [u8]) {
        let mut keystream = vec![0u8; data.len()];
        let mut hasher = blake3::Hasher::new_keyed(enc_key);
        hasher.update(nonce);
        hasher.finalize_xof().fill(&mut keystream);
        for (byte, k) in data.iter_mut().zip(keystream) {
            *byte ^= k;
        }
    }

    fn tag(mac_key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new_keyed(mac_key);
        hasher.update(nonce);
        hasher.update(ciphertext);
        hasher.finalize()
    }
}

impl TenantSecretCipher for KeystreamCipher {
    fn encrypt(&self, tenant_key: &str, plaintext: &str) -> CipherResult<String> {
        let (enc_key, mac_key) = Self::keys(tenant_key)?;
        let nonce: [u8; NONCE_LEN] = rand::random();

        let mut body = plaintext.as_bytes().to_vec();
        Self::apply_keystream(&enc_key, &nonce, &mut body);
        let tag = Self::tag(&mac_key, &nonce, &body);

        let mut out = Vec::with_capacity(NONCE_LEN + body.len() + TAG_LEN);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&body);
        out.extend_from_slice(tag.as_bytes());
        Ok(format!("{ENCODING_PREFIX}{}", hex::encode(out)))
    }

    fn decrypt(&self, tenant_key: &str, ciphertext: &str) -> CipherResult<String> {
        let (enc_key, mac_key) = Self::keys(tenant_key)?;
        let digits = ciphertext
            .strip_prefix(ENCODING_PREFIX)
            .ok_or_else(|| CipherError::Malformed("missing version prefix".into()))?;
        let raw = hex::decode(digits).map_err(|e| CipherError::Malformed(e.to_string()))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::Malformed(format!(
                "encoding is {} bytes, shorter than nonce and tag",
                raw.len()
            )));
        }

        let (nonce, rest) = raw.split_at(NONCE_LEN);
        let (body, tag) = rest.split_at(rest.len() - TAG_LEN);
        let mut tag_bytes = [0u8; TAG_LEN];
        tag_bytes.copy_from_slice(tag);

        // blake3::Hash equality is constant-time.
        if Self::tag(&mac_key, nonce, body) != blake3::Hash::from(tag_bytes) {
            return Err(CipherError::AuthenticationFailed);
        }

        let mut plain = body.to_vec();
        Self::apply_keystream(&enc_key, nonce, &mut plain);
        String::from_utf8(plain).map_err(|_| CipherError::InvalidUtf8)
    }
}

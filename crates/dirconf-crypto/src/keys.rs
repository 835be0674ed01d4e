use rand::Rng;

/// Default length of a generated tenant key.
pub const DEFAULT_TENANT_KEY_LEN: usize = 16;

/// Generate a tenant key of `len` random printable ASCII characters
/// (`0x20..=0x7e`).
pub fn generate_tenant_key(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(rng.gen_range(0x20u8..0x7f)))
        .collect()
}

//! Short random identities for clients and rooms.
//!
//! Identities are typed by hand by players sharing a room code, so they
//! are short and drawn from an alphabet without look-alike characters
//! (no `0/O`, `1/l/I`, `5/S`, ...).

use rand::Rng;

/// Characters identities are drawn from.
pub const IDENTITY_ALPHABET: &[u8] = b"6789BCDFGHJKLMNPQRTWbcdfghjkmnpqrtwz";

/// Length of every generated identity.
pub const IDENTITY_LEN: usize = 6;

/// Generates a random identity for which `taken` returns `false`.
///
/// With 36^6 possibilities a retry is rare; the loop only guards the
/// uniqueness guarantee.
pub fn generate_identity(taken: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::rng();
    loop {
        let id: String = (0..IDENTITY_LEN)
            .map(|_| IDENTITY_ALPHABET[rng.random_range(0..IDENTITY_ALPHABET.len())] as char)
            .collect();
        if !taken(&id) {
            return id;
        }
    }
}

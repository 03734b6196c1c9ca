//! Join and team code generation.

use rand::Rng;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random code of uppercase letters and digits.
pub fn random_code<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Draw codes until one is not `taken`.
pub fn unique_code<R: Rng + ?Sized>(
    rng: &mut R,
    len: usize,
    mut taken: impl FnMut(&str) -> bool,
) -> String {
    loop {
        let code = random_code(rng, len);
        if !taken(&code) {
            return code;
        }
    }
}

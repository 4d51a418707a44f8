//! Random password generation.

use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Letters, without the easily confused `i`, `l` and the tail of the alphabet.
pub const CHARS: &str = "abcdefghjkmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVW";
pub const NUMBERS: &str = "0123456789";
pub const SPECIAL: &str = "!@#$%^&*()_+-=[]{}|;':,./<>?";

/// Generates a password of `total` characters, exactly `special` of which
/// come from [`SPECIAL`]; the rest come from [`CHARS`] and [`NUMBERS`].
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `special > total`.
pub fn generate_password<R: Rng + ?Sized>(special: usize, total: usize, rng: &mut R) -> Result<String> {
    if special > total {
        return Err(Error::input(
            "number of special characters must be less or equal than total characters",
        ));
    }

    let specials = SPECIAL.as_bytes();
    let scope: Vec<u8> = CHARS.bytes().chain(NUMBERS.bytes()).collect();

    let mut password: Vec<u8> = Vec::with_capacity(total);
    for _ in 0..special {
        password.extend(specials.choose(rng));
    }
    for _ in special..total {
        password.extend(scope.choose(rng));
    }
    password.shuffle(rng);

    Ok(password.into_iter().map(char::from).collect())
}

//! Small standalone utilities.

pub mod lotto;
pub mod organize;
pub mod password;
pub mod rename;
pub mod web2bin;

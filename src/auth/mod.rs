//! Authentication Module
//!
//! Password credential creation and verification.

mod credential;

pub use credential::{PasswordCredential, KEY_LEN, SALT_LEN};

pub mod envelope;
pub mod keyring;
pub mod keys;

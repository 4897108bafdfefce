// Prints a fresh field encryption key for FIELD_ENCRYPTION_KEY.
//
// usage: keygen [aesgcm256|chacha20poly1305]

use sealed_users::crypto::keys::{Algorithm, FieldKey};
use std::env;
use std::process;

fn main() {
    let algorithm = match env::args().nth(1) {
        Some(name) => match Algorithm::from_identifier(&name) {
            Ok(algorithm) => algorithm,
            Err(e) => {
                eprintln!("{}", e);
                eprintln!("usage: keygen [aesgcm256|chacha20poly1305]");
                process::exit(2);
            }
        },
        None => Algorithm::Aes256Gcm,
    };

    let key = FieldKey::generate(algorithm);
    eprintln!("fingerprint: {}", key.fingerprint());
    println!("{}", key.to_key_string());
}

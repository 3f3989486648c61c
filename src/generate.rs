//! Random password generation.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::secure_random;
use crate::error::VaultError;

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Character classes and length for a generated password.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub length: usize,
    pub uppercase: bool,
    pub lowercase: bool,
    pub digits: bool,
    pub symbols: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            length: 16,
            uppercase: true,
            lowercase: true,
            digits: true,
            symbols: true,
        }
    }
}

/// Generate a random password from the enabled character classes.
///
/// Draws from the OS CSPRNG; bytes that would wrap unevenly over the
/// charset are discarded so every character is equally likely.
pub fn generate(options: GenerateOptions) -> Result<Zeroizing<String>, VaultError> {
    let mut charset = String::new();
    if options.uppercase {
        charset.push_str(UPPERCASE);
    }
    if options.lowercase {
        charset.push_str(LOWERCASE);
    }
    if options.digits {
        charset.push_str(DIGITS);
    }
    if options.symbols {
        charset.push_str(SYMBOLS);
    }

    if charset.is_empty() {
        return Err(VaultError::MalformedInput("no character classes enabled"));
    }
    let charset = charset.as_bytes();
    let limit = 256 - (256 % charset.len());

    let mut password = Zeroizing::new(String::with_capacity(options.length));
    let mut buf = Zeroizing::new([0u8; 64]);
    while password.len() < options.length {
        secure_random(&mut *buf)?;
        for &byte in buf.iter() {
            if (byte as usize) < limit {
                password.push(charset[byte as usize % charset.len()] as char);
                if password.len() == options.length {
                    break;
                }
            }
        }
    }

    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_length_and_classes() {
        let options = GenerateOptions {
            length: 24,
            uppercase: false,
            lowercase: true,
            digits: true,
            symbols: false,
        };
        let password = generate(options).unwrap();

        assert_eq!(password.len(), 24);
        assert!(
            password
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn successive_passwords_differ() {
        let a = generate(GenerateOptions::default()).unwrap();
        let b = generate(GenerateOptions::default()).unwrap();
        assert_ne!(*a, *b);
    }

    #[test]
    fn empty_charset_is_rejected() {
        let options = GenerateOptions {
            length: 16,
            uppercase: false,
            lowercase: false,
            digits: false,
            symbols: false,
        };
        assert!(matches!(
            generate(options),
            Err(VaultError::MalformedInput(_))
        ));
    }
}

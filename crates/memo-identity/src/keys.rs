//! Key layout inside the mapping store.
//!
//! ```text
//! memoreee:anonymous_id                      anonymous mapping for this scope
//! memoreee:mapping:<method>:<external id>    one mapping per external id
//! memoreee:token:<token>                     reverse index, token -> mapping
//! memoreee:redirect:<token>                  superseded token -> canonical token
//! ```

use memo_core::{AuthMethod, IdentityToken};

/// Every key this crate writes starts with this prefix.
pub const ROOT_PREFIX: &str = "memoreee:";
pub const ANONYMOUS_KEY: &str = "memoreee:anonymous_id";
pub const MAPPING_PREFIX: &str = "memoreee:mapping:";

#[must_use]
pub fn mapping(method: AuthMethod, external_id: &str) -> String {
    format!("{MAPPING_PREFIX}{method}:{external_id}")
}

#[must_use]
pub fn token_index(token: &IdentityToken) -> String {
    format!("{ROOT_PREFIX}token:{token}")
}

#[must_use]
pub fn redirect(token: &IdentityToken) -> String {
    format!("{ROOT_PREFIX}redirect:{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_keys_are_scoped_by_method() {
        assert_eq!(
            mapping(AuthMethod::Email, "u1"),
            "memoreee:mapping:email:u1"
        );
        assert_ne!(
            mapping(AuthMethod::Email, "abc"),
            mapping(AuthMethod::Wallet, "abc")
        );
    }

    #[test]
    fn every_key_shares_the_root_prefix() {
        let token = IdentityToken::new("t").unwrap();
        for key in [
            ANONYMOUS_KEY.to_string(),
            mapping(AuthMethod::Wallet, "w"),
            token_index(&token),
            redirect(&token),
        ] {
            assert!(key.starts_with(ROOT_PREFIX), "{key}");
        }
    }
}

//! Serde roundtrip and JsonSchema validation for the types that cross crate
//! and process boundaries.

use chrono::Utc;
use memo_core::{
    AuthMethod, IdentityMapping, IdentityToken, Session, SessionState, Tier,
};
use pretty_assertions::assert_eq;
use schemars::schema_for;

fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

#[test]
fn session_roundtrips_and_matches_schema() {
    for state in [
        SessionState::Uninitialized,
        SessionState::Anonymous,
        SessionState::EmailActive,
        SessionState::WalletActive,
    ] {
        let token = (state != SessionState::Uninitialized)
            .then(|| IdentityToken::new("3f1c2d4e-0000-4000-8000-000000000001").unwrap());
        let session = Session::new(state, token, Some("external".into()), 7);

        let json = serde_json::to_string_pretty(&session).unwrap();
        let recovered: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, session);

        let schema = serde_json::to_value(schema_for!(Session)).unwrap();
        let instance = serde_json::to_value(&session).unwrap();
        let errors = validate_against_schema(&schema, &instance);
        assert!(errors.is_empty(), "{state}: {errors:?}");
    }
}

#[test]
fn mapping_roundtrips_and_matches_schema() {
    let mapping = IdentityMapping {
        token: IdentityToken::new("3f1c2d4e-0000-4000-8000-000000000002").unwrap(),
        auth_method: AuthMethod::Email,
        external_id: Some("user-42".into()),
        created_at: Utc::now(),
    };

    let json = serde_json::to_string(&mapping).unwrap();
    let recovered: IdentityMapping = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, mapping);

    let schema = serde_json::to_value(schema_for!(IdentityMapping)).unwrap();
    let errors = validate_against_schema(&schema, &serde_json::to_value(&mapping).unwrap());
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn session_json_uses_snake_case_tier() {
    let session = Session::new(SessionState::WalletActive, None, None, 1);
    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["tier"], serde_json::json!(Tier::Wallet.as_str()));
    assert_eq!(json["capabilities"]["can_mint_rewards"], true);
}

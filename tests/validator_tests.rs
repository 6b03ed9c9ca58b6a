use cim_cli::validation::{PatternKind, PatternValidator, Record, Rule};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_valid_email_record_is_returned_unchanged() {
    let validator = PatternValidator::from_named([("email", "email")]).unwrap();
    let input = record(&[("email", "a@b.com")]);

    assert_eq!(validator.validate_dict(&input).unwrap(), input);
}

#[test]
fn test_invalid_email_record_names_the_field() {
    let validator = PatternValidator::from_named([("email", "email")]).unwrap();

    let err = validator
        .validate_dict(&record(&[("email", "not-an-email")]))
        .unwrap_err();

    assert!(err.is_validation_error());
    assert!(err.to_string().contains("email"), "{err}");
}

#[test]
fn test_empty_validator_accepts_anything() {
    let validator = PatternValidator::new();
    let input = record(&[("email", "not-an-email"), ("port", "-1")]);

    assert_eq!(validator.validate_dict(&input).unwrap(), input);
}

#[test_case("port", "port", "443", true ; "port ok")]
#[test_case("port", "port", "99999", false ; "port out of range")]
#[test_case("host", "ipv4", "10.0.0.1", true ; "ipv4 ok")]
#[test_case("host", "ipv4", "10.0.0", false ; "ipv4 short")]
#[test_case("id", "uuid", "67e55044-10b1-426f-9247-bb680e5fe0c8", true ; "uuid ok")]
#[test_case("count", "integer", "12a", false ; "integer with letters")]
#[test_case("code", "alphanumeric", "A1b2", true ; "alphanumeric ok")]
fn test_named_patterns(field: &str, pattern: &str, value: &str, accepted: bool) {
    let validator = PatternValidator::from_named([(field, pattern)]).unwrap();
    assert_eq!(validator.validate(field, value).is_ok(), accepted);
}

#[test]
fn test_existing_file_rule() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("deploy.sh");
    std::fs::write(&script, "#!/bin/sh\n").unwrap();

    let mut validator = PatternValidator::new();
    validator
        .add_validation("script", Rule::existing(PatternKind::File))
        .unwrap()
        .add_validation("workdir", Rule::existing(PatternKind::Dir))
        .unwrap();

    let good = record(&[
        ("script", script.to_str().unwrap()),
        ("workdir", dir.path().to_str().unwrap()),
    ]);
    assert_eq!(validator.validate_dict(&good).unwrap(), good);

    let missing = dir.path().join("gone.sh");
    let err = validator
        .validate("script", missing.to_str().unwrap())
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"), "{err}");
}

#[test]
fn test_security_preset_with_required_fields() {
    let validator = PatternValidator::security()
        .unwrap()
        .with_required(["username", "password"]);

    let err = validator
        .validate_dict(&record(&[("username", "ops")]))
        .unwrap_err();
    assert!(err.to_string().contains("field 'password' required"), "{err}");

    let ok = record(&[("username", "ops"), ("password", "Hunter22x")]);
    assert_eq!(validator.validate_dict(&ok).unwrap(), ok);
}

#[test]
fn test_web_preset_normalizes_email_in_records() {
    let validator = PatternValidator::web().unwrap();
    let input = record(&[("email", "Ops@Example.COM"), ("url", "https://example.com")]);

    let output = validator.validate_dict(&input).unwrap();

    assert_eq!(output["email"], "ops@example.com");
    assert_eq!(output["url"], "https://example.com");
}

#[test]
fn test_custom_rule_registered_by_name() {
    let validator = PatternValidator::new()
        .with_rule(
            "branch",
            Rule::custom("branch", |v| !v.is_empty() && !v.contains(' ')),
        )
        .unwrap();

    assert!(validator.validate("branch", "main").is_ok());
    let err = validator.validate("branch", "my branch").unwrap_err();
    assert!(err.to_string().contains("field 'branch' failed rule 'branch'"));
    assert_eq!(validator.rule("branch").map(Rule::name), Some("branch"));
}

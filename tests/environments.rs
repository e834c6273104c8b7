use ragchat::environment::{resolve_active, Environment, EnvironmentError};

fn env(id: &str, endpoint: &str) -> Environment {
    Environment {
        id: id.to_string(),
        name: id.to_uppercase(),
        orchestrator_endpoint: endpoint.to_string(),
    }
}

#[test]
fn selection_picks_the_named_environment() {
    let environments = vec![env("dev", "http://dev:8000"), env("prod", "http://prod:8000")];

    let active = resolve_active(&environments, Some("prod")).unwrap();

    assert_eq!(active.id, "prod");
}

#[test]
fn unknown_selection_is_an_error() {
    let environments = vec![env("dev", "http://dev:8000")];

    let error = resolve_active(&environments, Some("staging")).unwrap_err();

    assert!(matches!(error, EnvironmentError::Unknown(id) if id == "staging"));
}

#[test]
fn sole_environment_is_implicitly_active() {
    let environments = vec![env("dev", "http://dev:8000")];

    let active = resolve_active(&environments, None).unwrap();

    assert_eq!(active.id, "dev");
}

#[test]
fn multiple_environments_require_a_selection() {
    let environments = vec![env("dev", "http://dev:8000"), env("prod", "http://prod:8000")];

    let error = resolve_active(&environments, None).unwrap_err();

    assert!(matches!(error, EnvironmentError::NoneActive));
}

#[test]
fn no_environments_is_an_error() {
    let error = resolve_active(&[], None).unwrap_err();

    assert!(matches!(error, EnvironmentError::NoneConfigured));
}

#[test]
fn endpoint_normalizes_whitespace_and_trailing_slash() {
    let environment = env("dev", " http://dev:8000/ ");

    assert_eq!(environment.endpoint().unwrap(), "http://dev:8000");
}

#[test]
fn blank_endpoint_fails_closed() {
    let environment = env("dev", "   ");

    let error = environment.endpoint().unwrap_err();

    assert!(matches!(error, EnvironmentError::MissingEndpoint(id) if id == "dev"));
}

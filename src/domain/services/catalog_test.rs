use anyhow::Result;

use super::ProviderCatalog;

fn fixture() -> Vec<(String, Vec<String>)> {
    return vec![
        (
            "openai".to_string(),
            vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()],
        ),
        (
            "anthropic".to_string(),
            vec!["claude-3-5-sonnet".to_string()],
        ),
    ];
}

#[test]
fn it_defaults_to_the_first_provider_and_model() {
    let mut catalog = ProviderCatalog::default();
    catalog.load(fixture());

    assert_eq!(catalog.provider(), Some("openai"));
    assert_eq!(catalog.model(), Some("gpt-4o"));
}

#[test]
fn it_rederives_the_model_when_the_provider_changes() -> Result<()> {
    let mut catalog = ProviderCatalog::default();
    catalog.load(fixture());

    catalog.select_provider("anthropic")?;
    assert_eq!(catalog.provider(), Some("anthropic"));
    assert_eq!(catalog.model(), Some("claude-3-5-sonnet"));

    return Ok(());
}

#[test]
fn it_rejects_unknown_providers() {
    let mut catalog = ProviderCatalog::default();
    catalog.load(fixture());

    assert!(catalog.select_provider("mistral").is_err());
    // Selection is untouched on failure.
    assert_eq!(catalog.provider(), Some("openai"));
    assert_eq!(catalog.model(), Some("gpt-4o"));
}

#[test]
fn it_validates_model_membership() -> Result<()> {
    let mut catalog = ProviderCatalog::default();
    catalog.load(fixture());

    catalog.select_model("gpt-4o-mini")?;
    assert_eq!(catalog.model(), Some("gpt-4o-mini"));

    assert!(catalog.select_model("claude-3-5-sonnet").is_err());
    assert_eq!(catalog.model(), Some("gpt-4o-mini"));

    return Ok(());
}

#[test]
fn it_handles_an_empty_catalog() {
    let mut catalog = ProviderCatalog::default();
    catalog.load(vec![]);

    assert_eq!(catalog.provider(), None);
    assert_eq!(catalog.model(), None);
    assert!(catalog.select_model("gpt-4o").is_err());
}

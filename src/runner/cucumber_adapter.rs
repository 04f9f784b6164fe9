//! Bridges cucumber's scenario events into the lifecycle hooks

use super::capture::ScenarioOutcome;
use super::lifecycle::ScenarioInfo;
use anyhow::Result;
use cucumber::event::ScenarioFinished;
use cucumber::gherkin;
use cucumber::event::StepError;
use std::any::Any;

impl ScenarioOutcome for ScenarioFinished {
    fn is_failed(&self) -> bool {
        matches!(
            self,
            ScenarioFinished::BeforeHookFailed(_) | ScenarioFinished::StepFailed(..)
        )
    }

    fn causal_error(&self) -> Result<Option<String>> {
        match self {
            ScenarioFinished::BeforeHookFailed(info) => {
                panic_message(info.as_ref()).map(|m| Some(format!("Before hook failed: {}", m)))
            }
            ScenarioFinished::StepFailed(.., error) => step_error_message(error).map(Some),
            _ => Ok(None),
        }
    }
}

/// Human readable message of a failed step
pub fn step_error_message(error: &StepError) -> Result<String> {
    match error {
        StepError::Panic(info) => panic_message(info.as_ref()),
        other => Ok(other.to_string()),
    }
}

/// Text of a panic payload. Only `String` and `&str` payloads are readable.
pub fn panic_message(payload: &(dyn Any + Send)) -> Result<String> {
    if let Some(message) = payload.downcast_ref::<String>() {
        Ok(message.clone())
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        Ok(message.to_string())
    } else {
        anyhow::bail!("panic payload is neither String nor &str")
    }
}

impl ScenarioInfo {
    pub fn from_gherkin(
        feature: &gherkin::Feature,
        rule: Option<&gherkin::Rule>,
        scenario: &gherkin::Scenario,
    ) -> Self {
        let tags = feature
            .tags
            .iter()
            .chain(rule.into_iter().flat_map(|r| r.tags.iter()))
            .chain(scenario.tags.iter())
            .cloned()
            .collect();

        Self {
            name: scenario.name.clone(),
            id: format!("{};{}", slug(&feature.name), slug(&scenario.name)),
            tags,
            uri: feature.path.clone(),
            line: scenario.position.line,
        }
    }
}

/// Whether the scenario, its rule or its feature carries `tag` (with or
/// without the leading `@`)
pub fn has_tag(
    tag: &str,
    feature: &gherkin::Feature,
    rule: Option<&gherkin::Rule>,
    scenario: &gherkin::Scenario,
) -> bool {
    let tag = tag.trim_start_matches('@');
    feature
        .tags
        .iter()
        .chain(rule.into_iter().flat_map(|r| r.tags.iter()))
        .chain(scenario.tags.iter())
        .any(|t| t.trim_start_matches('@') == tag)
}

/// Lowercase, dash separated
fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_panic_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("assertion failed: cart"));
        assert_eq!(panic_message(owned.as_ref()).unwrap(), "assertion failed: cart");

        let borrowed: Box<dyn Any + Send> = Box::new("explicit panic");
        assert_eq!(panic_message(borrowed.as_ref()).unwrap(), "explicit panic");

        let opaque: Box<dyn Any + Send> = Box::new(42_u32);
        assert!(panic_message(opaque.as_ref()).is_err());
    }

    #[test]
    fn test_step_panic_is_unwrapped() {
        let error = StepError::Panic(Arc::new(String::from("produto não encontrado")));
        assert_eq!(step_error_message(&error).unwrap(), "produto não encontrado");
    }

    #[test]
    fn test_finished_outcomes() {
        assert!(!ScenarioFinished::StepPassed.is_failed());
        assert_eq!(ScenarioFinished::StepPassed.causal_error().unwrap(), None);

        let hook = ScenarioFinished::BeforeHookFailed(Arc::new("browser did not start"));
        assert!(hook.is_failed());
        assert_eq!(
            hook.causal_error().unwrap().as_deref(),
            Some("Before hook failed: browser did not start")
        );
    }

    const FEATURE: &str = "@loja\nFeature: Compra de produto\n\n  @test\n  Scenario: Adicionar ao carrinho\n    Given a step\n\n  Scenario: Sem tag\n    Given a step\n";

    fn parse() -> gherkin::Feature {
        gherkin::Feature::parse(FEATURE, gherkin::GherkinEnv::default()).unwrap()
    }

    #[test]
    fn test_scenario_info_from_gherkin() {
        let feature = parse();
        let scenario = &feature.scenarios[0];
        let info = ScenarioInfo::from_gherkin(&feature, None, scenario);

        assert_eq!(info.name, "Adicionar ao carrinho");
        assert_eq!(info.id, "compra-de-produto;adicionar-ao-carrinho");
        assert_eq!(info.tags, vec!["loja".to_string(), "test".to_string()]);
        assert_eq!(info.line, scenario.position.line);
        assert_eq!(info.feature_category(), "feature:compra-de-produto");
    }

    #[test]
    fn test_tag_filter_sees_feature_tags() {
        let feature = parse();
        assert!(has_tag("test", &feature, None, &feature.scenarios[0]));
        assert!(has_tag("@test", &feature, None, &feature.scenarios[0]));
        assert!(!has_tag("test", &feature, None, &feature.scenarios[1]));
        assert!(has_tag("loja", &feature, None, &feature.scenarios[1]));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Compra de  Produto"), "compra-de-produto");
    }
}

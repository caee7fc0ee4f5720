//! DomainRegistry - immutable table of enrichment domains
//!
//! Built once at startup with [`DomainRegistryBuilder`], then shared behind
//! an `Arc`. Lookups are by [`DomainId`]; nothing is added afterwards.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::enrichment::{DomainDefinition, DomainExtractor, SuggestionStrategy};
use crate::domain::foundation::DomainId;

/// Errors raised while assembling the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Domain '{0}' is registered twice")]
    Duplicate(DomainId),

    #[error("Strategy registered for unknown domain '{0}'")]
    UnknownDomain(DomainId),

    #[error("Failed to read domain file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse domain file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// One registered domain: its definition and plugins
#[derive(Clone)]
pub struct DomainPlugin {
    pub definition: DomainDefinition,
    pub extractor: Arc<dyn DomainExtractor>,
    pub strategies: Vec<Arc<dyn SuggestionStrategy>>,
}

/// Immutable lookup table of enrichment domains
#[derive(Clone, Default)]
pub struct DomainRegistry {
    domains: BTreeMap<DomainId, DomainPlugin>,
    definitions: Vec<DomainDefinition>,
}

impl DomainRegistry {
    pub fn builder() -> DomainRegistryBuilder {
        DomainRegistryBuilder::default()
    }

    /// A registry with no domains; enrichment becomes a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &DomainId) -> Option<&DomainPlugin> {
        self.domains.get(id)
    }

    /// Every definition, enabled or not, ordered by id
    pub fn definitions(&self) -> &[DomainDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

/// YAML layout of a domain file
#[derive(Debug, Deserialize)]
struct DomainFile {
    #[serde(default)]
    domains: Vec<DomainDefinition>,
}

/// Parses domain definitions from YAML text.
///
/// ```yaml
/// domains:
///   - id: goals
///     name: Goals
///     keywords: [goal, habit]
///     confidence_threshold: 0.7
/// ```
pub fn parse_definitions(yaml: &str) -> Result<Vec<DomainDefinition>, RegistryError> {
    let file: DomainFile = serde_yaml::from_str(yaml)?;
    Ok(file.domains)
}

/// Reads domain definitions from a YAML file.
pub fn load_definitions(path: &Path) -> Result<Vec<DomainDefinition>, RegistryError> {
    let yaml = std::fs::read_to_string(path)?;
    parse_definitions(&yaml)
}

/// Collects domains before freezing them into a [`DomainRegistry`]
#[derive(Default)]
pub struct DomainRegistryBuilder {
    domains: BTreeMap<DomainId, DomainPlugin>,
    pending_strategies: Vec<(DomainId, Arc<dyn SuggestionStrategy>)>,
    overrides: Vec<DomainDefinition>,
}

impl DomainRegistryBuilder {
    /// Registers a domain with its extractor.
    pub fn register(
        mut self,
        definition: DomainDefinition,
        extractor: Arc<dyn DomainExtractor>,
    ) -> Result<Self, RegistryError> {
        if self.domains.contains_key(&definition.id) {
            return Err(RegistryError::Duplicate(definition.id));
        }
        self.domains.insert(
            definition.id.clone(),
            DomainPlugin {
                definition,
                extractor,
                strategies: Vec::new(),
            },
        );
        Ok(self)
    }

    /// Adds a suggestion strategy to a domain registered before `build`.
    pub fn with_strategy(mut self, domain_id: DomainId, strategy: Arc<dyn SuggestionStrategy>) -> Self {
        self.pending_strategies.push((domain_id, strategy));
        self
    }

    /// Replaces definitions of registered domains (keywords, thresholds,
    /// enablement). Definitions for domains without an extractor are
    /// skipped with a warning.
    pub fn with_definition_overrides(mut self, definitions: Vec<DomainDefinition>) -> Self {
        self.overrides.extend(definitions);
        self
    }

    pub fn build(mut self) -> Result<DomainRegistry, RegistryError> {
        for (domain_id, strategy) in self.pending_strategies {
            match self.domains.get_mut(&domain_id) {
                Some(plugin) => plugin.strategies.push(strategy),
                None => return Err(RegistryError::UnknownDomain(domain_id)),
            }
        }

        for definition in self.overrides {
            match self.domains.get_mut(&definition.id) {
                Some(plugin) => plugin.definition = definition,
                None => warn!(domain = %definition.id, "No extractor for configured domain, skipping"),
            }
        }

        let definitions: Vec<DomainDefinition> =
            self.domains.values().map(|p| p.definition.clone()).collect();
        info!(domains = definitions.len(), "Domain registry built");

        Ok(DomainRegistry {
            domains: self.domains,
            definitions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enrichment::{
        ExtractionContext, ExtractionError, ExtractionOutcome, StrategyError, Suggestion,
        SuggestionContext,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::io::Write;

    struct NoopExtractor;

    #[async_trait]
    impl DomainExtractor for NoopExtractor {
        async fn extract(
            &self,
            _context: &ExtractionContext<'_>,
        ) -> Result<ExtractionOutcome, ExtractionError> {
            Ok(ExtractionOutcome::new(json!({}), 0.0))
        }
    }

    struct NoopStrategy;

    #[async_trait]
    impl SuggestionStrategy for NoopStrategy {
        fn name(&self) -> &str {
            "noop"
        }

        async fn suggest(
            &self,
            _context: &SuggestionContext<'_>,
        ) -> Result<Vec<Suggestion>, StrategyError> {
            Ok(Vec::new())
        }
    }

    fn domain(id: &str) -> DomainDefinition {
        DomainDefinition::new(DomainId::new(id).unwrap(), id)
    }

    #[test]
    fn builder_attaches_strategies() {
        let registry = DomainRegistry::builder()
            .register(domain("goals"), Arc::new(NoopExtractor))
            .unwrap()
            .with_strategy(DomainId::new("goals").unwrap(), Arc::new(NoopStrategy))
            .build()
            .unwrap();

        let plugin = registry.get(&DomainId::new("goals").unwrap()).unwrap();
        assert_eq!(plugin.strategies.len(), 1);
        assert_eq!(registry.definitions().len(), 1);
    }

    #[test]
    fn duplicate_domain_is_rejected() {
        let result = DomainRegistry::builder()
            .register(domain("goals"), Arc::new(NoopExtractor))
            .unwrap()
            .register(domain("goals"), Arc::new(NoopExtractor));
        assert!(matches!(result, Err(RegistryError::Duplicate(_))));
    }

    #[test]
    fn strategy_for_unknown_domain_is_rejected() {
        let result = DomainRegistry::builder()
            .with_strategy(DomainId::new("sleep").unwrap(), Arc::new(NoopStrategy))
            .build();
        assert!(matches!(result, Err(RegistryError::UnknownDomain(_))));
    }

    #[test]
    fn overrides_replace_registered_definitions_only() {
        let overrides = parse_definitions(
            r#"
domains:
  - id: goals
    name: Goals
    keywords: [goal, habit]
    confidence_threshold: 0.8
  - id: sleep
    name: Sleep
"#,
        )
        .unwrap();

        let registry = DomainRegistry::builder()
            .register(domain("goals"), Arc::new(NoopExtractor))
            .unwrap()
            .with_definition_overrides(overrides)
            .build()
            .unwrap();

        assert_eq!(registry.len(), 1);
        let goals = &registry.definitions()[0];
        assert_eq!(goals.confidence_threshold, 0.8);
        assert_eq!(goals.keywords, vec!["goal".to_string(), "habit".to_string()]);
    }

    #[test]
    fn definitions_load_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "domains:\n  - id: Goals\n    name: Goals\n    enabled: false"
        )
        .unwrap();

        let definitions = load_definitions(file.path()).unwrap();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].id.as_str(), "goals");
        assert!(!definitions[0].enabled);
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let result = parse_definitions("domains: [ {id: }");
        assert!(matches!(result, Err(RegistryError::Parse(_))));
    }
}

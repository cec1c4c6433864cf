use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use moka::sync::Cache;
use tracing::debug;

use super::model::Rule;
use crate::audit::sha256_hex;
use crate::expression::is_identifier;

/// Backing storage for ruleset documents, keyed by an opaque ruleset id.
///
/// Sources hand back the raw JSON document so the store can fingerprint it
/// before validation; `Ok(None)` means no definition exists for the id.
pub trait RuleSource: Send + Sync {
    fn fetch(&self, ruleset_id: &str) -> Result<Option<String>, SourceError>;

    /// Key of the document `ruleset_id` resolves to. Ids naming the same
    /// document share a key; `None` means the id can never resolve.
    fn document_key(&self, ruleset_id: &str) -> Option<String> {
        Some(ruleset_id.to_string())
    }
}

/// Parsed rulesets a store keeps unless configured otherwise.
pub const DEFAULT_RULESET_CACHE_CAPACITY: u64 = 10;

/// Failure reaching the backing storage itself.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("rule source io failure: {0}")]
    Io(#[from] io::Error),
    #[error("rule source unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced when a ruleset cannot be produced for an id.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("ruleset '{ruleset_id}' not found")]
    RulesetNotFound { ruleset_id: String },
    #[error("ruleset '{ruleset_id}' is invalid: {reason}")]
    RulesetInvalid { ruleset_id: String, reason: String },
    #[error("ruleset '{ruleset_id}' could not be read: {source}")]
    Source {
        ruleset_id: String,
        #[source]
        source: SourceError,
    },
}

/// Reads `<root>/<ruleset_id>.json` documents from disk.
#[derive(Debug, Clone)]
pub struct DirectoryRuleSource {
    root: PathBuf,
}

impl DirectoryRuleSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Only the final component is honoured so ids cannot walk out of the root.
    fn document_name(ruleset_id: &str) -> Option<&str> {
        let name = Path::new(ruleset_id).file_name()?.to_str()?;
        if name.is_empty() || name == ".." {
            return None;
        }
        Some(name)
    }

    fn document_path(&self, ruleset_id: &str) -> Option<PathBuf> {
        let name = Self::document_name(ruleset_id)?;
        Some(self.root.join(format!("{name}.json")))
    }
}

impl RuleSource for DirectoryRuleSource {
    fn document_key(&self, ruleset_id: &str) -> Option<String> {
        Self::document_name(ruleset_id).map(str::to_string)
    }

    fn fetch(&self, ruleset_id: &str) -> Result<Option<String>, SourceError> {
        let Some(path) = self.document_path(ruleset_id) else {
            return Ok(None);
        };

        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SourceError::Io(err)),
        }
    }
}

/// Ruleset documents held in memory; used by tests and embedded deployments.
#[derive(Debug, Default)]
pub struct InMemoryRuleSource {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, ruleset_id: impl Into<String>, document: impl Into<String>) -> Self {
        self.insert(ruleset_id, document);
        self
    }

    /// Adds or replaces the document backing `ruleset_id`.
    pub fn insert(&self, ruleset_id: impl Into<String>, document: impl Into<String>) {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ruleset_id.into(), document.into());
    }
}

impl RuleSource for InMemoryRuleSource {
    fn fetch(&self, ruleset_id: &str) -> Result<Option<String>, SourceError> {
        Ok(self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ruleset_id)
            .cloned())
    }
}

/// A validated ruleset together with the fingerprint of the document it came from.
///
/// `id` is the source's document key, so aliases of one document report the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRuleset {
    pub id: String,
    pub fingerprint: String,
    pub rules: Vec<Rule>,
}

/// Validating, read-through cache in front of a [`RuleSource`].
///
/// Entries are keyed by document key and bounded; the least useful entry is
/// evicted once the capacity is reached.
pub struct RuleStore<S> {
    source: Arc<S>,
    cache: Cache<String, Arc<LoadedRuleset>>,
}

impl<S> RuleStore<S>
where
    S: RuleSource,
{
    pub fn new(source: Arc<S>) -> Self {
        Self::with_capacity(source, DEFAULT_RULESET_CACHE_CAPACITY)
    }

    pub fn with_capacity(source: Arc<S>, capacity: u64) -> Self {
        Self {
            source,
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Number of parsed rulesets currently held.
    pub fn cached_rulesets(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Loads the ruleset for `ruleset_id`, reusing the cached parse only when
    /// the backing document is byte-for-byte unchanged.
    pub fn load(&self, ruleset_id: &str) -> Result<Arc<LoadedRuleset>, LoadError> {
        let not_found = || LoadError::RulesetNotFound {
            ruleset_id: ruleset_id.to_string(),
        };

        let key = self.source.document_key(ruleset_id).ok_or_else(not_found)?;
        let raw = self
            .source
            .fetch(ruleset_id)
            .map_err(|source| LoadError::Source {
                ruleset_id: ruleset_id.to_string(),
                source,
            })?
            .ok_or_else(not_found)?;

        let fingerprint = sha256_hex(raw.as_bytes());

        if let Some(cached) = self.cache.get(&key) {
            if cached.fingerprint == fingerprint {
                debug!(ruleset_id, document = %key, "ruleset served from cache");
                return Ok(cached);
            }
        }

        let rules = parse_ruleset(ruleset_id, &raw)?;
        let loaded = Arc::new(LoadedRuleset {
            id: key.clone(),
            fingerprint,
            rules,
        });

        debug!(
            ruleset_id,
            document = %key,
            rules = loaded.rules.len(),
            "ruleset loaded and validated"
        );

        self.cache.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }
}

/// Parses and validates a ruleset document.
pub fn parse_ruleset(ruleset_id: &str, raw: &str) -> Result<Vec<Rule>, LoadError> {
    let invalid = |reason: String| LoadError::RulesetInvalid {
        ruleset_id: ruleset_id.to_string(),
        reason,
    };

    let rules: Vec<Rule> = serde_json::from_str(raw).map_err(|err| invalid(err.to_string()))?;
    validate_rules(&rules).map_err(invalid)?;
    Ok(rules)
}

fn validate_rules(rules: &[Rule]) -> Result<(), String> {
    let mut seen = HashSet::new();

    for (index, rule) in rules.iter().enumerate() {
        if rule.id.trim().is_empty() {
            return Err(format!("rule #{index} has an empty id"));
        }
        if !seen.insert(rule.id.as_str()) {
            return Err(format!("duplicate rule id '{}'", rule.id));
        }
        if rule.name.trim().is_empty() {
            return Err(format!("rule '{}' has an empty name", rule.id));
        }

        let reference = &rule.document_reference;
        if reference.doc_id.trim().is_empty() {
            return Err(format!(
                "rule '{}' has a document reference without doc_id",
                rule.id
            ));
        }
        if reference.page == 0 {
            return Err(format!(
                "rule '{}' references page 0 of '{}'; pages start at 1",
                rule.id, reference.doc_id
            ));
        }

        if let Some(variable) = rule
            .variables_required
            .iter()
            .find(|variable| !is_identifier(variable))
        {
            return Err(format!(
                "rule '{}' requires '{}', which is not a valid variable name",
                rule.id, variable
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn rule_json(id: &str, page: u32) -> String {
        format!(
            r#"{{
                "id": "{id}",
                "name": "Income Limit",
                "condition_expression": "income <= 800000",
                "variables_required": ["income"],
                "outcome_effect": {{ "eligible": true, "score_delta": 40 }},
                "priority": "high",
                "mandatory": true,
                "document_reference": {{ "doc_id": "scheme-2024", "page": {page}, "section": "3.1" }},
                "human_description": "Annual household income must not exceed 800000"
            }}"#
        )
    }

    fn ruleset(rules: &[String]) -> String {
        format!("[{}]", rules.join(","))
    }

    #[test]
    fn loads_valid_ruleset_in_order() {
        let source = InMemoryRuleSource::new().with_document(
            "scheme",
            ruleset(&[rule_json("R1", 4), rule_json("R2", 5)]),
        );
        let store = RuleStore::new(Arc::new(source));

        let loaded = store.load("scheme").expect("ruleset loads");

        let ids: Vec<_> = loaded.rules.iter().map(|rule| rule.id.as_str()).collect();
        assert_eq!(ids, ["R1", "R2"]);
        assert_eq!(loaded.rules[0].document_reference.page, 4);
    }

    #[test]
    fn unknown_ruleset_is_not_found() {
        let store = RuleStore::new(Arc::new(InMemoryRuleSource::new()));

        let err = store.load("missing").expect_err("no definition");

        assert!(matches!(err, LoadError::RulesetNotFound { ruleset_id } if ruleset_id == "missing"));
    }

    #[test]
    fn duplicate_ids_are_invalid() {
        let source = InMemoryRuleSource::new()
            .with_document("dup", ruleset(&[rule_json("R1", 1), rule_json("R1", 2)]));
        let store = RuleStore::new(Arc::new(source));

        match store.load("dup") {
            Err(LoadError::RulesetInvalid { reason, .. }) => {
                assert!(reason.contains("duplicate rule id 'R1'"));
            }
            other => panic!("expected invalid ruleset, got {other:?}"),
        }
    }

    #[test]
    fn malformed_document_reference_is_invalid() {
        let source =
            InMemoryRuleSource::new().with_document("page-zero", ruleset(&[rule_json("R1", 0)]));
        let store = RuleStore::new(Arc::new(source));

        assert!(matches!(
            store.load("page-zero"),
            Err(LoadError::RulesetInvalid { .. })
        ));
    }

    #[test]
    fn missing_field_is_invalid() {
        let raw = r#"[{ "id": "R1", "name": "Age" }]"#;
        let source = InMemoryRuleSource::new().with_document("partial", raw);
        let store = RuleStore::new(Arc::new(source));

        match store.load("partial") {
            Err(LoadError::RulesetInvalid { reason, .. }) => {
                assert!(reason.contains("missing field"));
            }
            other => panic!("expected invalid ruleset, got {other:?}"),
        }
    }

    #[test]
    fn wrong_type_is_invalid() {
        let raw = rule_json("R1", 1).replace("\"mandatory\": true", "\"mandatory\": \"yes\"");
        let source = InMemoryRuleSource::new().with_document("typed", ruleset(&[raw]));
        let store = RuleStore::new(Arc::new(source));

        assert!(matches!(
            store.load("typed"),
            Err(LoadError::RulesetInvalid { .. })
        ));
    }

    #[test]
    fn empty_ruleset_is_valid() {
        let source = InMemoryRuleSource::new().with_document("empty", "[]");
        let store = RuleStore::new(Arc::new(source));

        let loaded = store.load("empty").expect("empty ruleset loads");

        assert!(loaded.rules.is_empty());
    }

    #[test]
    fn cache_reuses_identical_content() {
        let source = InMemoryRuleSource::new().with_document("scheme", ruleset(&[rule_json("R1", 1)]));
        let store = RuleStore::new(Arc::new(source));

        let first = store.load("scheme").expect("first load");
        let second = store.load("scheme").expect("second load");

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn cache_is_invalidated_when_content_changes() {
        let source = Arc::new(
            InMemoryRuleSource::new().with_document("scheme", ruleset(&[rule_json("R1", 1)])),
        );
        let store = RuleStore::new(Arc::clone(&source));

        let first = store.load("scheme").expect("first load");
        source.insert("scheme", ruleset(&[rule_json("R1", 1), rule_json("R2", 2)]));
        let second = store.load("scheme").expect("reload");

        assert_ne!(first.fingerprint, second.fingerprint);
        assert_eq!(second.rules.len(), 2);
    }

    #[test]
    fn directory_source_reads_json_and_confines_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("housing.json"), ruleset(&[rule_json("R1", 1)]))
            .expect("write ruleset");
        let store = RuleStore::new(Arc::new(DirectoryRuleSource::new(dir.path())));

        let loaded = store.load("housing").expect("loads from disk");
        assert_eq!(loaded.rules.len(), 1);

        let nested = store.load("../../housing").expect("final component is used");
        assert_eq!(nested.fingerprint, loaded.fingerprint);
        assert_eq!(nested.id, "housing");

        assert!(matches!(
            store.load(".."),
            Err(LoadError::RulesetNotFound { .. })
        ));
        assert!(matches!(
            store.load("absent"),
            Err(LoadError::RulesetNotFound { .. })
        ));
    }

    #[test]
    fn aliases_of_one_document_share_a_cache_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("housing.json"), ruleset(&[rule_json("R1", 1)]))
            .expect("write ruleset");
        let store = RuleStore::new(Arc::new(DirectoryRuleSource::new(dir.path())));

        let first = store.load("housing").expect("loads");
        for i in 0..5_000 {
            let alias = store.load(&format!("x{i}/housing")).expect("alias loads");
            assert!(Arc::ptr_eq(&first, &alias));
        }

        assert_eq!(store.cached_rulesets(), 1);
    }

    #[test]
    fn cache_holds_at_most_its_capacity() {
        let source = InMemoryRuleSource::new();
        for i in 0..200 {
            source.insert(format!("scheme-{i}"), ruleset(&[rule_json("R1", 1)]));
        }
        let store = RuleStore::with_capacity(Arc::new(source), 8);

        for i in 0..200 {
            store.load(&format!("scheme-{i}")).expect("loads");
        }

        assert!(store.cached_rulesets() <= 8);
    }
}

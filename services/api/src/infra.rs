use eligibility_engine::audit::JsonLinesAuditSink;
use eligibility_engine::config::EngineConfig;
use eligibility_engine::decision::{providers_from_config, DecisionService, DecisionSettings};
use eligibility_engine::rules::DirectoryRuleSource;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type FileDecisionService = DecisionService<DirectoryRuleSource, JsonLinesAuditSink>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Decision service reading rulesets from disk and auditing to a JSON-lines file.
pub(crate) fn build_decision_service(config: &EngineConfig) -> FileDecisionService {
    let source = Arc::new(DirectoryRuleSource::new(config.rules_dir.clone()));
    let audit = Arc::new(JsonLinesAuditSink::new(config.audit_log_path.clone()));
    let settings = DecisionSettings {
        top_k: config.retrieval_top_k,
        cache_capacity: config.cache_capacity,
        ..DecisionSettings::default()
    };

    DecisionService::with_providers(source, audit, providers_from_config(config))
        .with_settings(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eligibility_engine::config::EmbeddingBackend;
    use std::path::PathBuf;

    #[test]
    fn service_uses_configured_locations() {
        let config = EngineConfig {
            rules_dir: PathBuf::from("/srv/rules"),
            audit_log_path: PathBuf::from("/var/log/decisions.jsonl"),
            retrieval_top_k: 5,
            embedding_dimensions: 128,
            cache_capacity: 16,
            ..EngineConfig::default()
        };

        let service = build_decision_service(&config);

        assert_eq!(service.settings().top_k, 5);
        assert_eq!(service.settings().cache_capacity, 16);
        assert_eq!(service.providers().primary_name(), "all-minilm");
        assert_eq!(service.providers().providers().len(), 2);
        assert_eq!(
            service.store().source().root(),
            PathBuf::from("/srv/rules").as_path()
        );
        assert_eq!(
            service.audit().path(),
            PathBuf::from("/var/log/decisions.jsonl").as_path()
        );
    }

    #[test]
    fn hashed_backend_has_no_fallback() {
        let config = EngineConfig {
            embedding_provider: EmbeddingBackend::Hashed,
            ..EngineConfig::default()
        };

        let service = build_decision_service(&config);

        assert_eq!(service.providers().primary_name(), "hashed-term");
        assert_eq!(service.providers().providers().len(), 1);
    }
}

use crate::infra::build_decision_service;
use clap::Args;
use eligibility_engine::config::{AppConfig, EngineConfig};
use eligibility_engine::error::AppError;
use eligibility_engine::rules::{DirectoryRuleSource, LoadedRuleset, RuleStore};
use eligibility_engine::{Decision, EvaluationContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Ruleset id (file stem under the rules directory)
    #[arg(long)]
    pub(crate) ruleset: String,
    /// JSON file holding the applicant's input values
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Override the configured rules directory
    #[arg(long)]
    pub(crate) rules_dir: Option<PathBuf>,
    /// Print the full decision as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RulesShowArgs {
    /// Ruleset id (file stem under the rules directory)
    pub(crate) ruleset: String,
    /// Override the configured rules directory
    #[arg(long)]
    pub(crate) rules_dir: Option<PathBuf>,
}

fn engine_config(rules_dir: Option<PathBuf>) -> Result<EngineConfig, AppError> {
    let mut engine = AppConfig::load()?.engine;
    if let Some(dir) = rules_dir {
        engine.rules_dir = dir;
    }
    Ok(engine)
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        ruleset,
        input,
        rules_dir,
        json,
    } = args;

    let engine = engine_config(rules_dir)?;
    let context = read_context(&input)?;

    let service = build_decision_service(&engine);
    let decision = service.evaluate_ruleset(&ruleset, &context)?;

    if json {
        let rendered = serde_json::to_string_pretty(&decision).map_err(AppError::Render)?;
        println!("{rendered}");
    } else {
        println!("{}", render_decision(&ruleset, &decision));
    }
    Ok(())
}

fn read_context(path: &Path) -> Result<EvaluationContext, AppError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| AppError::Input {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn run_rules_show(args: RulesShowArgs) -> Result<(), AppError> {
    let engine = engine_config(args.rules_dir)?;
    let store = RuleStore::new(Arc::new(DirectoryRuleSource::new(engine.rules_dir)));
    let ruleset = store.load(&args.ruleset)?;
    println!("{}", render_ruleset(&ruleset));
    Ok(())
}

pub(crate) fn render_decision(ruleset_id: &str, decision: &Decision) -> String {
    let mut lines = vec![format!("Ruleset: {ruleset_id}")];
    if decision.was_overridden() {
        lines.push(format!(
            "Governance override: {} -> {}",
            decision.deterministic_label, decision.decision_label
        ));
    }
    lines.push(String::new());
    lines.push(decision.explanation.clone());
    lines.join("\n")
}

pub(crate) fn render_ruleset(ruleset: &LoadedRuleset) -> String {
    let mut lines = vec![
        format!("Ruleset: {} ({} rules)", ruleset.id, ruleset.rules.len()),
        format!("Fingerprint: {}", ruleset.fingerprint),
    ];

    for rule in &ruleset.rules {
        let reference = &rule.document_reference;
        lines.push(String::new());
        lines.push(format!(
            "{} | {} | priority {}{}",
            rule.id,
            rule.name,
            rule.priority.label(),
            if rule.mandatory { " | mandatory" } else { "" }
        ));
        lines.push(format!("  when: {}", rule.condition_expression));
        lines.push(format!(
            "  score: {:+} | inputs: {}",
            rule.outcome_effect.score_delta,
            rule.variables_required.join(", ")
        ));
        lines.push(format!(
            "  source: {} p.{} s.{}",
            reference.doc_id, reference.page, reference.section
        ));
    }

    lines.join("\n")
}

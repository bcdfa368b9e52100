//! Checks for LLM-integrated and AI-generated code (`ai-*`)

use super::base::{
    is_test_path, static_regex, summarize_hits, Check, CheckContext, CheckOutcome,
    SOURCE_EXTENSIONS,
};
use crate::context::PackageCategory;
use crate::models::{Category, Severity};
use std::path::Path;

static_regex!(
    prompt_injection_pattern,
    r#"(?i)(prompt|content|messages?|system|instruction)\w*['"]?\s*[:=+].*(\$\{\s*(req|request|ctx\.request)\.(body|query|params)|\+\s*(req|request)\.(body|query|params)|\{\s*request\.(form|args|json|data|GET|POST))"#
);
static_regex!(
    ai_key_pattern,
    r"\bsk-(ant-|proj-)?[A-Za-z0-9_-]{32,}|\bAIza[0-9A-Za-z_-]{35}\b|\bhf_[A-Za-z0-9]{34}\b|\bgsk_[A-Za-z0-9]{40,}"
);
static_regex!(
    ai_boilerplate_pattern,
    r"(?i)as an ai language model|here is the (updated|complete|full|revised) code|i hope this helps|\.\.\.\s*rest of (the )?(code|implementation)|(//|#)\s*(your|add your) (code|logic) here|(//|#)\s*implementation goes here"
);

pub(super) fn checks() -> Vec<Check> {
    let c = Category::AiSpecific;
    vec![
        Check::new("ai-001", "User input not spliced into prompts", c, Severity::Medium, prompt_injection),
        Check::new("ai-002", "No hardcoded AI provider keys", c, Severity::High, ai_keys),
        Check::new("ai-003", "No AI assistant residue", c, Severity::Low, ai_boilerplate),
    ]
}

pub(super) fn uses_ai_packages(ctx: &CheckContext<'_>) -> bool {
    ctx.repo
        .detected_packages
        .iter()
        .any(|p| p.category == PackageCategory::Ai)
}

fn prompt_injection(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !uses_ai_packages(ctx) {
        return Ok(CheckOutcome::not_applicable("no LLM SDK dependencies"));
    }
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    let hits = ctx.grep(&files, prompt_injection_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("Request data is not interpolated into prompts")
    } else {
        CheckOutcome::fail(format!(
            "Raw request data interpolated into prompts, separate it from instructions: {}",
            summarize_hits(&hits)
        ))
    })
}

fn ai_keys(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !uses_ai_packages(ctx) {
        return Ok(CheckOutcome::not_applicable("no LLM SDK dependencies"));
    }
    let mut exts = SOURCE_EXTENSIONS.to_vec();
    exts.extend_from_slice(&["json", "yml", "yaml", "toml", "ipynb"]);
    let files: Vec<&Path> = ctx
        .files_with_extensions(&exts)
        .into_iter()
        .filter(|p| !is_test_path(p))
        .collect();
    let hits = ctx.grep(&files, ai_key_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No AI provider keys in the source tree")
    } else {
        CheckOutcome::fail(format!(
            "AI provider API keys committed, revoke them: {}",
            summarize_hits(&hits)
        ))
    })
}

fn ai_boilerplate(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.grep(&files, ai_boilerplate_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No pasted assistant output")
    } else {
        CheckOutcome::fail(format!(
            "Assistant boilerplate left in code: {}",
            summarize_hits(&hits)
        ))
        .auto_fixable()
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_check;

    const OPENAI: &str = r#"{"dependencies":{"openai":"^4.0.0"}}"#;

    #[test]
    fn test_not_applicable_without_ai_packages() {
        for id in ["ai-001", "ai-002"] {
            let outcome = run_check(id, &[("src/a.js", "x")]);
            assert!(outcome.passed);
            assert!(outcome.message.starts_with("Not applicable"));
        }
    }

    #[test]
    fn test_prompt_injection() {
        let code = "const prompt = `Summarize: ${req.body.text}`;\n";
        assert!(!run_check("ai-001", &[("package.json", OPENAI), ("src/chat.js", code)]).passed);
        let safe = "const messages = [{ role: 'user', content: sanitize(text) }];\n";
        assert!(run_check("ai-001", &[("package.json", OPENAI), ("src/chat.js", safe)]).passed);
    }

    #[test]
    fn test_ai_keys() {
        let code = "const client = new OpenAI({ apiKey: 'sk-proj-abcdefghijklmnopqrstuvwxyz0123456789' });\n";
        assert!(!run_check("ai-002", &[("package.json", OPENAI), ("src/ai.js", code)]).passed);
        let env = "const client = new OpenAI({ apiKey: process.env.OPENAI_API_KEY });\n";
        assert!(run_check("ai-002", &[("package.json", OPENAI), ("src/ai.js", env)]).passed);
    }

    #[test]
    fn test_ai_boilerplate() {
        let residue = "// Here is the updated code with error handling\nexport const a = 1;\n";
        let outcome = run_check("ai-003", &[("src/a.ts", residue)]);
        assert!(!outcome.passed);
        assert_eq!(outcome.auto_fixable, Some(true));
    }
}

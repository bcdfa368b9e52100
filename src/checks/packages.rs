//! Checks contributed by detected niche packages
//!
//! None of these run for every repository: [`PACKAGE_RULES`] ties each one
//! to the packages that make it relevant, and the registry only adds a check
//! when one of its packages shows up in `RepoContext::detected_packages`.

use super::base::{
    file_name, has_extension, is_test_path, sample, static_regex, summarize_hits,
    summarize_paths, Check, CheckContext, CheckOutcome, SOURCE_EXTENSIONS,
};
use super::code_quality::pyproject_has_tool;
use crate::models::{Category, Severity};
use std::path::Path;

const LLM_SDKS: &[&str] = &[
    "openai",
    "@anthropic-ai/sdk",
    "anthropic",
    "@google/generative-ai",
    "cohere-ai",
    "cohere",
    "langchain",
    "@langchain/core",
    "llamaindex",
    "llama-index",
    "ai",
];
const JS_TEST_RUNNERS: &[&str] = &["jest", "mocha", "vitest", "cypress", "@playwright/test"];
const HEADLESS_BROWSERS: &[&str] = &["puppeteer", "playwright", "selenium", "selenium-webdriver"];
const PAYMENT_SDKS: &[&str] = &["stripe", "braintree"];
const REALTIME_SERVERS: &[&str] = &["socket.io", "channels"];
const WALLET_SDKS: &[&str] = &["web3", "ethers", "viem", "@solana/web3.js", "hardhat", "truffle"];
const ML_RUNTIMES: &[&str] = &[
    "tensorflow",
    "@tensorflow/tfjs",
    "@tensorflow/tfjs-node",
    "torch",
    "keras",
    "onnxruntime",
    "onnxruntime-node",
    "transformers",
    "@xenova/transformers",
];
const IAC_TOOLS: &[&str] = &["aws-cdk-lib", "@pulumi/pulumi", "pulumi"];

/// Check id → niche packages that enable it
pub(super) const PACKAGE_RULES: &[(&str, &[&str])] = &[
    ("ai-101", LLM_SDKS),
    ("ai-102", LLM_SDKS),
    ("test-101", JS_TEST_RUNNERS),
    ("test-102", &["jest", "mocha", "vitest", "pytest"]),
    ("test-103", &["pytest"]),
    ("sec-101", HEADLESS_BROWSERS),
    ("sec-102", PAYMENT_SDKS),
    ("sec-103", REALTIME_SERVERS),
    ("sec-104", WALLET_SDKS),
    ("perf-101", ML_RUNTIMES),
    ("ops-101", IAC_TOOLS),
];

const MODEL_WEIGHT_EXTENSIONS: &[&str] = &[
    "h5", "hdf5", "pt", "pth", "onnx", "pb", "safetensors", "ckpt", "tflite", "keras", "joblib", "pkl",
];

/// More skipped tests than this fails test-102
const MAX_SKIPPED_TESTS: usize = 3;

static_regex!(
    llm_client,
    r"\bnew\s+(OpenAI|Anthropic|CohereClient|GoogleGenerativeAI|ChatOpenAI|ChatAnthropic)\s*\(|\b(OpenAI|AsyncOpenAI|Anthropic|AsyncAnthropic|ChatOpenAI|ChatAnthropic)\s*\("
);
static_regex!(client_resilience, r"(?i)\b(timeout|max_?retries)\b");
static_regex!(
    llm_completion_call,
    r"\.(chat\.completions\.create|completions\.create|messages\.create|generateContent|generateText|streamText)\s*\("
);
static_regex!(token_limit, r"(?i)\b(max_?(output_?)?tokens|max_tokens_to_sample)\b");
static_regex!(focused_test, r"\b(it|test|describe|context)\.only\s*\(|\b(fit|fdescribe)\s*\(");
static_regex!(
    skipped_test,
    r"\b(it|test|describe)\.skip\s*\(|\b(xit|xdescribe|xtest)\s*\(|@pytest\.mark\.skip\b|@unittest\.skip\b"
);
static_regex!(sandbox_disabled, r"--no-sandbox|--disable-web-security");
static_regex!(webhook_mention, r"(?i)webhook");
static_regex!(
    webhook_verification,
    r"constructEvent|construct_event|verify_header|(?i:webhook_?notification)\.parse"
);
static_regex!(
    wildcard_cors,
    r#"(?i)\borigin\s*:\s*['"]\*['"]|cors_allowed_origins\s*=\s*['"]\*['"]"#
);
static_regex!(
    wallet_secret,
    r#"['"]0x[a-fA-F0-9]{64}['"]|(?i)(mnemonic|seed_?phrase)\w*['"]?\s*[:=]\s*['"]([a-z]+ ){11,23}[a-z]+['"]"#
);

pub(super) fn checks() -> Vec<Check> {
    vec![
        Check::new("ai-101", "LLM clients set timeouts and retries", Category::AiSpecific, Severity::Medium, llm_timeouts),
        Check::new("ai-102", "LLM calls cap output tokens", Category::AiSpecific, Severity::Low, llm_token_limits),
        Check::new("test-101", "No focused tests committed", Category::Testing, Severity::Medium, focused_tests),
        Check::new("test-102", "Few skipped tests", Category::Testing, Severity::Low, skipped_tests),
        Check::new("test-103", "pytest configured", Category::Testing, Severity::Low, pytest_config),
        Check::new("sec-101", "Browser sandbox kept enabled", Category::Security, Severity::High, browser_sandbox),
        Check::new("sec-102", "Payment webhooks verify signatures", Category::Security, Severity::High, webhook_signatures),
        Check::new("sec-103", "Realtime server restricts origins", Category::Security, Severity::Medium, realtime_cors),
        Check::new("sec-104", "No hardcoded wallet keys", Category::Security, Severity::High, wallet_keys),
        Check::new("perf-101", "Model weights stored with Git LFS", Category::Performance, Severity::Medium, model_weights_lfs),
        Check::new("ops-101", "Infrastructure state not committed", Category::Devops, Severity::High, iac_state),
    ]
}

/// Production sources containing `trigger` but not `required`
fn files_missing(
    ctx: &CheckContext<'_>,
    trigger: &regex::Regex,
    required: &regex::Regex,
) -> (usize, Vec<String>) {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    let mut triggered = 0;
    let mut missing = Vec::new();
    for path in sample(&files) {
        let Some(content) = ctx.read(path) else {
            continue;
        };
        if trigger.is_match(&content) {
            triggered += 1;
            if !required.is_match(&content) {
                missing.push(path.display().to_string());
            }
        }
    }
    (triggered, missing)
}

fn llm_timeouts(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let (clients, missing) = files_missing(ctx, llm_client(), client_resilience());
    if clients == 0 {
        return Ok(CheckOutcome::not_applicable("no LLM client construction found"));
    }
    Ok(if missing.is_empty() {
        CheckOutcome::pass("LLM clients configure timeout or retry behaviour")
    } else {
        CheckOutcome::fail(format!(
            "LLM clients built with default timeouts and retries in {}",
            missing.join(", ")
        ))
    })
}

fn llm_token_limits(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let (calls, missing) = files_missing(ctx, llm_completion_call(), token_limit());
    if calls == 0 {
        return Ok(CheckOutcome::not_applicable("no completion calls found"));
    }
    Ok(if missing.is_empty() {
        CheckOutcome::pass("Completion calls cap output tokens")
    } else {
        CheckOutcome::fail(format!(
            "Completion calls without a token limit in {}",
            missing.join(", ")
        ))
    })
}

fn focused_tests(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.test_files();
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no test files"));
    }
    let hits = ctx.grep(&files, focused_test());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No .only / fit / fdescribe in tests")
    } else {
        CheckOutcome::fail(format!(
            "Focused tests silently skip the rest of the suite: {}",
            summarize_hits(&hits)
        ))
        .auto_fixable()
    })
}

fn skipped_tests(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.test_files();
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no test files"));
    }
    let hits = ctx.grep(&files, skipped_test());
    Ok(if hits.len() <= MAX_SKIPPED_TESTS {
        CheckOutcome::pass(format!("{} skipped tests", hits.len()))
    } else {
        CheckOutcome::fail(format!(
            "{} skipped tests: {}",
            hits.len(),
            summarize_hits(&hits)
        ))
    })
}

fn pytest_config(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let section_in = |file: &str, section: &str| {
        ctx.read(file)
            .map(|c| c.contains(section))
            .unwrap_or(false)
    };
    let configured = ctx.exists("pytest.ini")
        || ctx.exists("conftest.py")
        || pyproject_has_tool(ctx, &["pytest"])
        || section_in("setup.cfg", "[tool:pytest]")
        || section_in("tox.ini", "[pytest]");
    Ok(CheckOutcome::from_bool(
        configured,
        "pytest configuration found",
        "pytest is a dependency but has no pytest.ini or [tool.pytest.ini_options]",
    ))
}

fn browser_sandbox(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    let hits = ctx.grep(&files, sandbox_disabled());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("Headless browsers launched with the sandbox on")
    } else {
        CheckOutcome::fail(format!(
            "Browser sandbox disabled: {}",
            summarize_hits(&hits)
        ))
    })
}

fn webhook_signatures(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if !ctx.any_content(&files, |c| webhook_mention().is_match(c)) {
        return Ok(CheckOutcome::not_applicable("no webhook handlers"));
    }
    Ok(CheckOutcome::from_bool(
        ctx.any_content(&files, |c| webhook_verification().is_match(c)),
        "Webhook payloads are verified",
        "Payment webhooks handled without signature verification",
    ))
}

fn realtime_cors(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    let hits = ctx.grep(&files, wildcard_cors());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No wildcard origins")
    } else {
        CheckOutcome::fail(format!(
            "Realtime server accepts any origin: {}",
            summarize_hits(&hits)
        ))
    })
}

fn wallet_keys(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let mut exts = SOURCE_EXTENSIONS.to_vec();
    exts.push("json");
    let files: Vec<&Path> = ctx
        .files_with_extensions(&exts)
        .into_iter()
        .filter(|p| !is_test_path(p))
        .collect();
    let hits = ctx.grep(&files, wallet_secret());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No private keys or mnemonics in the source tree")
    } else {
        CheckOutcome::fail(format!(
            "Private keys or seed phrases committed, move the funds and rotate: {}",
            summarize_hits(&hits)
        ))
    })
}

fn model_weights_lfs(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let weights = ctx.files_with_extensions(MODEL_WEIGHT_EXTENSIONS);
    if weights.is_empty() {
        return Ok(CheckOutcome::not_applicable("no model weight files"));
    }
    let lfs_patterns: Vec<String> = ctx
        .read(".gitattributes")
        .map(|content| {
            content
                .lines()
                .filter(|l| l.contains("filter=lfs"))
                .filter_map(|l| l.split_whitespace().next())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    let untracked: Vec<&Path> = weights
        .into_iter()
        .filter(|p| !lfs_patterns.iter().any(|pattern| lfs_covers(pattern, p)))
        .collect();
    Ok(if untracked.is_empty() {
        CheckOutcome::pass("Model weights tracked by Git LFS")
    } else {
        CheckOutcome::fail(format!(
            "Model weights committed outside Git LFS: {}",
            summarize_paths(&untracked)
        ))
        .auto_fixable()
    })
}

/// Rough `.gitattributes` pattern match: `*.ext`, exact names and directories
fn lfs_covers(pattern: &str, path: &Path) -> bool {
    let pattern = pattern.trim_start_matches('/');
    if let Some(ext) = pattern.strip_prefix("*.") {
        return has_extension(path, &[ext]);
    }
    let dir = pattern.trim_end_matches("**").trim_end_matches('*').trim_end_matches('/');
    if !dir.is_empty() && dir != pattern {
        return path.starts_with(dir);
    }
    path == Path::new(pattern) || file_name(path) == pattern
}

fn iac_state(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let committed: Vec<&Path> = ctx
        .repo
        .files
        .iter()
        .map(|p| p.as_path())
        .filter(|p| {
            let name = file_name(p);
            name.ends_with(".tfstate")
                || name.ends_with(".tfstate.backup")
                || p.starts_with("cdk.out")
                || p.starts_with(".pulumi")
        })
        .collect();
    Ok(if committed.is_empty() {
        CheckOutcome::pass("No state files or synthesized output committed")
    } else {
        CheckOutcome::fail(format!(
            "Infrastructure state committed, it can hold secrets: {}",
            summarize_paths(&committed)
        ))
        .auto_fixable()
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_check;
    use super::*;

    #[test]
    fn test_every_rule_names_a_package_check() {
        let ids: Vec<&str> = checks().iter().map(|c| c.id).collect();
        for (id, packages) in PACKAGE_RULES {
            assert!(ids.contains(id), "{id} has no check");
            assert!(!packages.is_empty());
        }
    }

    #[test]
    fn test_llm_timeouts() {
        let bare = "const client = new OpenAI({ apiKey: process.env.OPENAI_API_KEY });\n";
        assert!(!run_check("ai-101", &[("src/llm.js", bare)]).passed);
        let tuned = "const client = new OpenAI({ apiKey: key, timeout: 20000, maxRetries: 2 });\n";
        assert!(run_check("ai-101", &[("src/llm.js", tuned)]).passed);
        assert!(run_check("ai-101", &[("src/a.js", "x")]).message.starts_with("Not applicable"));
    }

    #[test]
    fn test_llm_token_limits() {
        let call = "resp = client.chat.completions.create(model=m, messages=msgs)\n";
        assert!(!run_check("ai-102", &[("app/llm.py", call)]).passed);
        let capped = "resp = client.chat.completions.create(model=m, messages=msgs, max_tokens=512)\n";
        assert!(run_check("ai-102", &[("app/llm.py", capped)]).passed);
    }

    #[test]
    fn test_focused_and_skipped_tests() {
        let focused = "describe.only('api', () => {});\n";
        let outcome = run_check("test-101", &[("tests/api.test.js", focused)]);
        assert!(!outcome.passed);
        assert_eq!(outcome.auto_fixable, Some(true));
        assert!(run_check("test-101", &[("tests/api.test.js", "it('works', () => {});\n")]).passed);

        let skipped = "it.skip('a')\nit.skip('b')\nxit('c')\ntest.skip('d')\n";
        assert!(!run_check("test-102", &[("tests/api.test.js", skipped)]).passed);
        assert!(run_check("test-102", &[("tests/api.test.js", "it.skip('a')\n")]).passed);
    }

    #[test]
    fn test_pytest_config() {
        assert!(!run_check("test-103", &[("requirements.txt", "pytest\n")]).passed);
        assert!(run_check(
            "test-103",
            &[("pyproject.toml", "[tool.pytest.ini_options]\naddopts = \"-q\"\n")]
        )
        .passed);
        assert!(run_check("test-103", &[("setup.cfg", "[tool:pytest]\n")]).passed);
    }

    #[test]
    fn test_browser_sandbox() {
        let launch = "await puppeteer.launch({ args: ['--no-sandbox'] });\n";
        assert!(!run_check("sec-101", &[("src/render.js", launch)]).passed);
        assert!(run_check("sec-101", &[("src/render.js", "await puppeteer.launch();\n")]).passed);
    }

    #[test]
    fn test_webhook_signatures() {
        let unverified = "app.post('/webhook', (req, res) => handle(JSON.parse(req.body)));\n";
        assert!(!run_check("sec-102", &[("src/billing.js", unverified)]).passed);
        let verified = "app.post('/webhook', (req, res) => {\n  const event = stripe.webhooks.constructEvent(req.body, sig, secret);\n});\n";
        assert!(run_check("sec-102", &[("src/billing.js", verified)]).passed);
        assert!(run_check("sec-102", &[("src/a.js", "x")]).message.starts_with("Not applicable"));
    }

    #[test]
    fn test_realtime_cors() {
        let open = "const io = new Server(server, { cors: { origin: '*' } });\n";
        assert!(!run_check("sec-103", &[("src/io.js", open)]).passed);
        let scoped = "const io = new Server(server, { cors: { origin: process.env.APP_URL } });\n";
        assert!(run_check("sec-103", &[("src/io.js", scoped)]).passed);
    }

    #[test]
    fn test_wallet_keys() {
        let key = format!("const wallet = new Wallet('0x{}');\n", "ab".repeat(32));
        assert!(!run_check("sec-104", &[("scripts/deploy.js", key.as_str())]).passed);
        let phrase = "const mnemonic = 'test test test test test test test test test test test junk';\n";
        assert!(!run_check("sec-104", &[("src/wallet.js", phrase)]).passed);
        assert!(run_check("sec-104", &[("src/wallet.js", "const pk = process.env.PRIVATE_KEY;\n")]).passed);
    }

    #[test]
    fn test_model_weights_lfs() {
        assert!(!run_check("perf-101", &[("models/model.pt", "weights")]).passed);
        assert!(run_check(
            "perf-101",
            &[("models/model.pt", "weights"), (".gitattributes", "*.pt filter=lfs diff=lfs merge=lfs -text\n")]
        )
        .passed);
        assert!(run_check(
            "perf-101",
            &[("models/model.onnx", "weights"), (".gitattributes", "models/** filter=lfs diff=lfs merge=lfs -text\n")]
        )
        .passed);
    }

    #[test]
    fn test_lfs_covers() {
        assert!(lfs_covers("*.h5", Path::new("a/b/model.h5")));
        assert!(lfs_covers("weights/*", Path::new("weights/model.bin")));
        assert!(lfs_covers("model.onnx", Path::new("model.onnx")));
        assert!(!lfs_covers("*.pt", Path::new("model.onnx")));
    }

    #[test]
    fn test_iac_state() {
        assert!(!run_check("ops-101", &[("infra/terraform.tfstate", "{}")]).passed);
        assert!(!run_check("ops-101", &[("cdk.out/manifest.json", "{}")]).passed);
        assert!(run_check("ops-101", &[("infra/main.tf", "x")]).passed);
    }
}

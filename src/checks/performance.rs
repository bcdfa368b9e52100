//! Performance checks (`perf-*`)

use super::base::{
    has_extension, is_comment_line, sample, static_regex, summarize_hits, summarize_paths, Check,
    CheckContext, CheckOutcome, Hit, JS_EXTENSIONS, SOURCE_EXTENSIONS,
};
use crate::models::{Category, Severity};
use std::path::Path;

/// Node server frameworks where blocking the event loop hurts every request
const NODE_SERVERS: &[&str] = &["express", "fastify", "koa", "nestjs", "hono"];

/// More synchronous filesystem calls than this fails perf-001
const MAX_SYNC_FS_CALLS: usize = 3;

const ASSET_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tiff", "psd", "svg", "webp", "mp4", "mov", "webm", "avi",
    "mp3", "wav", "ogg", "woff", "woff2", "ttf", "otf",
];

/// Assets larger than this are flagged by perf-003
const MAX_ASSET_BYTES: u64 = 1024 * 1024;

static_regex!(
    sync_fs_pattern,
    r"\bfs\.(readFileSync|writeFileSync|appendFileSync|existsSync|readdirSync|statSync|mkdirSync|copyFileSync)\s*\("
);
static_regex!(
    await_in_loop_js,
    r"(?s)\bfor\s*\((?:[^()]|\([^()]*\))*\)\s*\{[^}]*?\bawait\s+[\w.]*\.(find\w*|query|get|select|fetch|findOne|findUnique|findMany|count|aggregate)\s*\("
);
static_regex!(
    python_query_call,
    r"\.(objects\.(get|filter)|query|execute|filter_by)\("
);
static_regex!(select_star_pattern, r"(?i)\bSELECT\s+\*\s+FROM\b");

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Performance;
    vec![
        Check::new("perf-001", "No blocking filesystem calls in servers", c, Severity::Low, sync_fs_calls),
        Check::new("perf-002", "No queries inside loops", c, Severity::Medium, queries_in_loops),
        Check::new("perf-003", "No oversized static assets", c, Severity::Low, large_assets),
        Check::new("perf-004", "Queries select explicit columns", c, Severity::Low, select_star),
    ]
}

fn sync_fs_calls(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_any_framework(NODE_SERVERS) {
        return Ok(CheckOutcome::not_applicable("no Node.js server framework"));
    }
    let files = ctx.production_sources(JS_EXTENSIONS);
    let hits = ctx.scan_lines(&files, |line| {
        !is_comment_line(line) && sync_fs_pattern().is_match(line)
    });
    Ok(if hits.len() > MAX_SYNC_FS_CALLS {
        CheckOutcome::fail(format!(
            "{} synchronous fs calls block the event loop: {}",
            hits.len(),
            summarize_hits(&hits)
        ))
    } else {
        CheckOutcome::pass(format!("{} synchronous fs calls", hits.len()))
    })
}

fn queries_in_loops(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let js = ctx.production_sources(JS_EXTENSIONS);
    let py = ctx.production_sources(&["py"]);
    if js.is_empty() && py.is_empty() {
        return Ok(CheckOutcome::not_applicable("no JavaScript or Python sources"));
    }
    let mut hits = ctx.grep_content(&js, await_in_loop_js());
    for path in sample(&py) {
        let Some(content) = ctx.read(path) else {
            continue;
        };
        hits.extend(python_queries_in_loops(&content).into_iter().map(|line| Hit {
            path: path.to_path_buf(),
            line,
        }));
    }
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No per-iteration queries detected")
    } else {
        CheckOutcome::fail(format!(
            "Queries issued inside loops (N+1), batch them: {}",
            summarize_hits(&hits)
        ))
    })
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// 1-based lines of query calls nested in the body of a Python `for` loop
fn python_queries_in_loops(content: &str) -> Vec<usize> {
    let mut lines = Vec::new();
    // Indentation of the `for` statements enclosing the current line
    let mut loops: Vec<usize> = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = indent_of(line);
        while loops.last().map(|&l| indent <= l).unwrap_or(false) {
            loops.pop();
        }
        if !loops.is_empty() && python_query_call().is_match(trimmed) {
            lines.push(idx + 1);
        }
        if (trimmed.starts_with("for ") || trimmed.starts_with("async for ")) && trimmed.ends_with(':') {
            loops.push(indent);
        }
    }
    lines
}

fn large_assets(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let root = ctx.root();
    let oversized: Vec<&Path> = ctx
        .repo
        .files
        .iter()
        .map(|p| p.as_path())
        .filter(|p| has_extension(p, ASSET_EXTENSIONS))
        .filter(|p| {
            std::fs::metadata(root.join(p))
                .map(|m| m.len() > MAX_ASSET_BYTES)
                .unwrap_or(false)
        })
        .collect();
    Ok(if oversized.is_empty() {
        CheckOutcome::pass("No static asset exceeds 1 MiB")
    } else {
        CheckOutcome::fail(format!(
            "{} assets over 1 MiB, compress them or serve from a CDN: {}",
            oversized.len(),
            summarize_paths(&oversized)
        ))
    })
}

fn select_star(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let files = ctx.production_sources(SOURCE_EXTENSIONS);
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no source files"));
    }
    let hits = ctx.grep(&files, select_star_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No SELECT * queries")
    } else {
        CheckOutcome::fail(format!(
            "SELECT * fetches every column: {}",
            summarize_hits(&hits)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_check;
    use super::*;

    const EXPRESS: &str = r#"{"dependencies":{"express":"4"}}"#;

    #[test]
    fn test_sync_fs_calls() {
        let blocking = "fs.readFileSync(a);\n".repeat(4);
        assert!(!run_check("perf-001", &[("package.json", EXPRESS), ("src/a.js", blocking.as_str())]).passed);
        assert!(run_check("perf-001", &[("package.json", EXPRESS), ("src/a.js", "fs.readFileSync(cfg);\n")]).passed);
        assert!(run_check("perf-001", &[("src/a.js", blocking.as_str())]).message.starts_with("Not applicable"));
    }

    #[test]
    fn test_await_in_loop() {
        let n_plus_one = "for (const id of ids) {\n  const user = await db.user.findUnique({ where: { id } });\n}\n";
        assert!(!run_check("perf-002", &[("src/users.js", n_plus_one)]).passed);
        let batched = "const users = await db.user.findMany({ where: { id: { in: ids } } });\n";
        assert!(run_check("perf-002", &[("src/users.js", batched)]).passed);
    }

    #[test]
    fn test_python_query_in_loop() {
        let code = "for order in orders:\n    customer = Customer.objects.get(id=order.customer_id)\n";
        assert!(!run_check("perf-002", &[("shop/views.py", code)]).passed);
    }

    #[test]
    fn test_python_loop_tracking() {
        let code = "for a in xs:\n    total += a\nrow = db.query(q)\nfor b in ys:\n    if b:\n        cur.execute(sql)\n";
        assert_eq!(python_queries_in_loops(code), vec![6]);
    }

    #[test]
    fn test_large_assets() {
        let big = "x".repeat(1024 * 1024 + 1);
        assert!(!run_check("perf-003", &[("public/hero.svg", big.as_str())]).passed);
        assert!(run_check("perf-003", &[("public/logo.svg", "<svg/>")]).passed);
    }

    #[test]
    fn test_select_star() {
        assert!(!run_check("perf-004", &[("src/db.py", "cur.execute('SELECT * FROM orders')\n")]).passed);
        assert!(run_check("perf-004", &[("src/db.py", "cur.execute('SELECT id FROM orders')\n")]).passed);
    }
}

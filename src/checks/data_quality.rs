//! Data handling checks (`data-*`)

use super::base::{static_regex, summarize_hits, Check, CheckContext, CheckOutcome};
use crate::context::frameworks::SERVER_FRAMEWORKS;
use crate::models::{Category, Severity};
use std::path::{Component, Path};

/// Schema-managing ORMs and query builders that are expected to ship migrations
const ORM_DEPENDENCIES: &[&str] = &[
    "prisma",
    "@prisma/client",
    "typeorm",
    "sequelize",
    "knex",
    "drizzle-orm",
    "@mikro-orm/core",
    "objection",
    "sqlalchemy",
    "alembic",
    "peewee",
    "tortoise-orm",
];

const MIGRATION_DIRS: &[&str] = &["migrations", "migration", "migrate", "alembic", "drizzle"];

const VALIDATION_LIBRARIES: &[&str] = &[
    "zod",
    "joi",
    "yup",
    "express-validator",
    "class-validator",
    "ajv",
    "superstruct",
    "valibot",
    "@sinclair/typebox",
    "celebrate",
    "pydantic",
    "marshmallow",
    "cerberus",
    "djangorestframework",
];

/// Frameworks that validate request payloads on their own
const VALIDATING_FRAMEWORKS: &[&str] = &["fastapi", "django", "nestjs"];

const DATA_EXTENSIONS: &[&str] = &["json", "csv", "sql", "yml", "yaml", "tsv"];

static_regex!(
    pii_pattern,
    r"\b\d{3}-\d{2}-\d{4}\b|\b(4\d{3}|5[1-5]\d{2})[ -]?\d{4}[ -]?\d{4}[ -]?\d{4}\b"
);

pub(super) fn checks() -> Vec<Check> {
    let c = Category::DataQuality;
    vec![
        Check::new("data-001", "Database schema migrations", c, Severity::Medium, migrations),
        Check::new("data-002", "Request input validation", c, Severity::Medium, input_validation),
        Check::new("data-003", "No personal data in committed datasets", c, Severity::Low, pii_in_data),
    ]
}

fn migrations(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let orm = ctx.find_dependency(ORM_DEPENDENCIES);
    let django = ctx.repo.has_framework("django");
    if orm.is_none() && !django {
        return Ok(CheckOutcome::not_applicable("no ORM or query builder"));
    }
    let found = ctx.any_path(|p| {
        p.components().any(|c| match c {
            Component::Normal(s) => s
                .to_str()
                .map(|s| MIGRATION_DIRS.contains(&s.to_lowercase().as_str()))
                .unwrap_or(false),
            _ => false,
        })
    });
    let orm = orm.unwrap_or("django");
    Ok(CheckOutcome::from_bool(
        found,
        format!("Schema changes tracked as {orm} migrations"),
        format!("{orm} is used but no migrations are committed"),
    ))
}

fn input_validation(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_any_framework(SERVER_FRAMEWORKS) {
        return Ok(CheckOutcome::not_applicable("no server framework"));
    }
    if let Some(lib) = ctx.find_dependency(VALIDATION_LIBRARIES) {
        return Ok(CheckOutcome::pass(format!("Payloads validated with {lib}")));
    }
    if let Some(fw) = VALIDATING_FRAMEWORKS.iter().find(|f| ctx.repo.has_framework(f)) {
        return Ok(CheckOutcome::pass(format!("{fw} validates request payloads")));
    }
    Ok(CheckOutcome::fail(
        "Server without a schema validation library (zod, joi, pydantic, ...)",
    ))
}

fn pii_in_data(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    // Fixtures and seeds included
    let files: Vec<&Path> = ctx
        .files_with_extensions(DATA_EXTENSIONS)
        .into_iter()
        .filter(|p| !is_lockfile(p))
        .collect();
    if files.is_empty() {
        return Ok(CheckOutcome::not_applicable("no data files"));
    }
    let hits = ctx.grep(&files, pii_pattern());
    Ok(if hits.is_empty() {
        CheckOutcome::pass("No social security or card numbers in data files")
    } else {
        CheckOutcome::fail(format!(
            "Data files contain what look like SSNs or card numbers: {}",
            summarize_hits(&hits)
        ))
    })
}

fn is_lockfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with("-lock.json") || n.ends_with("-lock.yaml"))
        .unwrap_or(false)
}

//! Logging, error tracking and metrics checks (`obs-*`)

use super::base::{static_regex, Check, CheckContext, CheckOutcome};
use crate::context::frameworks::{FRONTEND_FRAMEWORKS, SERVER_FRAMEWORKS};
use crate::models::{Category, Severity};

const LOGGING_LIBRARIES: &[&str] = &[
    "winston",
    "pino",
    "bunyan",
    "log4js",
    "loglevel",
    "consola",
    "tslog",
    "@nestjs/common",
    "structlog",
    "loguru",
    "python-json-logger",
];

const ERROR_TRACKERS: &[&str] = &[
    "@sentry/*",
    "sentry-sdk",
    "@bugsnag/*",
    "bugsnag",
    "rollbar",
    "@honeybadger-io/*",
    "honeybadger",
    "raygun",
    "@airbrake/*",
    "newrelic",
    "dd-trace",
    "@datadog/*",
];

const METRICS_LIBRARIES: &[&str] = &[
    "prom-client",
    "express-prom-bundle",
    "@opentelemetry/*",
    "opentelemetry-*",
    "prometheus-client",
    "prometheus_client",
    "prometheus-fastapi-instrumentator",
    "django-prometheus",
    "statsd",
    "hot-shots",
    "dd-trace",
    "newrelic",
];

static_regex!(python_logging_import, r"(?m)^\s*(import logging\b|from logging\b)");

pub(super) fn checks() -> Vec<Check> {
    let c = Category::Observability;
    vec![
        Check::new("obs-001", "Logging library in use", c, Severity::Medium, logging_library),
        Check::new("obs-002", "Error tracking configured", c, Severity::Low, error_tracking),
        Check::new("obs-003", "Metrics or tracing instrumentation", c, Severity::Low, metrics),
    ]
}

fn logging_library(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let repo = ctx.repo;
    let js = repo.has_language("javascript") || repo.has_language("typescript");
    let python = repo.has_language("python");
    if !js && !python {
        return Ok(CheckOutcome::not_applicable("no JavaScript or Python sources"));
    }
    if let Some(lib) = ctx.find_dependency(LOGGING_LIBRARIES) {
        return Ok(CheckOutcome::pass(format!("Logging through {lib}")));
    }
    if python {
        let files = ctx.production_sources(&["py"]);
        if ctx.any_content(&files, |c| python_logging_import().is_match(c)) {
            return Ok(CheckOutcome::pass("Logging through the standard logging module"));
        }
    }
    Ok(CheckOutcome::fail(
        "No logging library, output goes through print/console statements",
    ))
}

fn error_tracking(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    let repo = ctx.repo;
    if !repo.has_any_framework(SERVER_FRAMEWORKS) && !repo.has_any_framework(FRONTEND_FRAMEWORKS) {
        return Ok(CheckOutcome::not_applicable("no application framework"));
    }
    Ok(match ctx.find_dependency(ERROR_TRACKERS) {
        Some(dep) => CheckOutcome::pass(format!("Errors reported through {dep}")),
        None => CheckOutcome::fail("No error tracking service (Sentry, Bugsnag, Rollbar, ...)"),
    })
}

fn metrics(ctx: &CheckContext<'_>) -> anyhow::Result<CheckOutcome> {
    if !ctx.repo.has_any_framework(SERVER_FRAMEWORKS) {
        return Ok(CheckOutcome::not_applicable("no server framework"));
    }
    Ok(match ctx.find_dependency(METRICS_LIBRARIES) {
        Some(dep) => CheckOutcome::pass(format!("Instrumented with {dep}")),
        None => CheckOutcome::fail("No metrics or tracing instrumentation"),
    })
}

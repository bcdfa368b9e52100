//! Repository fixtures shared by the integration tests

#![allow(dead_code)]

use std::path::Path;
use tempfile::TempDir;

pub const README: &str = "# greeter

Small greeting service used in production by the billing team.

## Installation

    npm ci

## Usage

    npm start

## Configuration

Set LOG_LEVEL to change verbosity.

## Development

    npm test

## License

MIT
";

pub const PACKAGE_JSON: &str = r#"{
  "name": "greeter",
  "version": "1.4.0",
  "license": "MIT",
  "main": "src/index.js",
  "scripts": {
    "start": "node src/index.js",
    "test": "jest --coverage",
    "lint": "eslint ."
  },
  "dependencies": {
    "pino": "^9.0.0"
  },
  "devDependencies": {
    "eslint": "^8.57.0",
    "jest": "^29.7.0"
  }
}
"#;

pub const DOCKERFILE: &str = "FROM node:20.11-alpine
WORKDIR /app
COPY package.json package-lock.json ./
RUN npm ci --omit=dev
COPY src ./src
USER node
HEALTHCHECK CMD node src/index.js --check
CMD [\"node\", \"src/index.js\"]
";

pub const CI_WORKFLOW: &str = "name: ci
on: [push, pull_request]
jobs:
  test:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
      - run: npm ci
      - run: npm test
";

pub const INDEX_JS: &str = "const pino = require('pino');
const { greet } = require('./greet');

const logger = pino({ level: process.env.LOG_LEVEL || 'info' });

logger.info(greet('world'));

module.exports = { greet };
";

pub const GREET_JS: &str = "function greet(name) {
  return `Hello, ${name}`;
}

module.exports = { greet };
";

pub const GREET_TEST_JS: &str = "const { greet } = require('../src/greet');

test('greets by name', () => {
  expect(greet('Ada')).toBe('Hello, Ada');
});
";

/// A small Node service with everything a release needs
pub fn exemplary_files() -> Vec<(&'static str, &'static str)> {
    vec![
        ("README.md", README),
        ("LICENSE", "MIT License\n"),
        ("CHANGELOG.md", "# Changelog\n\n## 1.4.0\n\n- Structured logging\n"),
        ("CONTRIBUTING.md", "# Contributing\n\nOpen a pull request.\n"),
        ("SECURITY.md", "# Security\n\nEmail security@greeter.dev.\n"),
        (".gitignore", "node_modules/\n.env\ncoverage/\n"),
        (".editorconfig", "root = true\n"),
        (".eslintrc.json", "{\"extends\": \"eslint:recommended\"}\n"),
        (".env.example", "LOG_LEVEL=info\n"),
        (".dockerignore", "node_modules\n.env\n"),
        ("Dockerfile", DOCKERFILE),
        ("package.json", PACKAGE_JSON),
        ("package-lock.json", "{\"name\": \"greeter\", \"lockfileVersion\": 3}\n"),
        (".github/workflows/ci.yml", CI_WORKFLOW),
        (".github/dependabot.yml", "version: 2\nupdates:\n  - package-ecosystem: npm\n    directory: /\n    schedule:\n      interval: weekly\n"),
        (".github/CODEOWNERS", "* @greeter/maintainers\n"),
        (".github/pull_request_template.md", "## Summary\n"),
        ("src/index.js", INDEX_JS),
        ("src/greet.js", GREET_JS),
        ("tests/greet.test.js", GREET_TEST_JS),
    ]
}

pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

pub fn repo_with(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), files);
    dir
}

pub fn exemplary_repo() -> TempDir {
    repo_with(&exemplary_files())
}

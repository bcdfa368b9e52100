//! Niche package classification
//!
//! A curated table of dependencies whose presence says something about the
//! risk profile of a codebase (ML runtimes, LLM SDKs, wallets, browsers).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageCategory {
    Ml,
    Ai,
    Blockchain,
    Infrastructure,
    Automation,
    Realtime,
    Payments,
    Testing,
    Database,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A dependency that matched the niche package table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPackage {
    pub name: String,
    pub category: PackageCategory,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

use PackageCategory as C;
use RiskLevel as R;

const NICHE_PACKAGES: &[(&str, PackageCategory, RiskLevel)] = &[
    // Machine learning runtimes
    ("tensorflow", C::Ml, R::High),
    ("@tensorflow/tfjs", C::Ml, R::High),
    ("@tensorflow/tfjs-node", C::Ml, R::High),
    ("torch", C::Ml, R::High),
    ("keras", C::Ml, R::High),
    ("onnxruntime", C::Ml, R::Medium),
    ("onnxruntime-node", C::Ml, R::Medium),
    ("scikit-learn", C::Ml, R::Medium),
    ("xgboost", C::Ml, R::Medium),
    ("transformers", C::Ml, R::Medium),
    ("@xenova/transformers", C::Ml, R::Medium),
    // LLM providers and orchestration
    ("openai", C::Ai, R::Medium),
    ("@anthropic-ai/sdk", C::Ai, R::Medium),
    ("anthropic", C::Ai, R::Medium),
    ("@google/generative-ai", C::Ai, R::Medium),
    ("cohere-ai", C::Ai, R::Medium),
    ("cohere", C::Ai, R::Medium),
    ("langchain", C::Ai, R::High),
    ("@langchain/core", C::Ai, R::High),
    ("llamaindex", C::Ai, R::High),
    ("llama-index", C::Ai, R::High),
    ("ai", C::Ai, R::Medium),
    // Blockchain
    ("web3", C::Blockchain, R::High),
    ("ethers", C::Blockchain, R::High),
    ("viem", C::Blockchain, R::High),
    ("@solana/web3.js", C::Blockchain, R::High),
    ("hardhat", C::Blockchain, R::Medium),
    ("truffle", C::Blockchain, R::Medium),
    // Infrastructure as code and cluster clients
    ("aws-cdk-lib", C::Infrastructure, R::Medium),
    ("@pulumi/pulumi", C::Infrastructure, R::Medium),
    ("pulumi", C::Infrastructure, R::Medium),
    ("@kubernetes/client-node", C::Infrastructure, R::Medium),
    ("kubernetes", C::Infrastructure, R::Medium),
    // Browser automation
    ("puppeteer", C::Automation, R::Medium),
    ("playwright", C::Automation, R::Low),
    ("selenium", C::Automation, R::Medium),
    ("selenium-webdriver", C::Automation, R::Medium),
    // Realtime
    ("socket.io", C::Realtime, R::Medium),
    ("ws", C::Realtime, R::Low),
    ("channels", C::Realtime, R::Medium),
    // Payments
    ("stripe", C::Payments, R::High),
    ("@stripe/stripe-js", C::Payments, R::High),
    ("braintree", C::Payments, R::High),
    // Test runners
    ("jest", C::Testing, R::Low),
    ("mocha", C::Testing, R::Low),
    ("vitest", C::Testing, R::Low),
    ("pytest", C::Testing, R::Low),
    ("cypress", C::Testing, R::Low),
    ("@playwright/test", C::Testing, R::Low),
    // Databases and ORMs
    ("prisma", C::Database, R::Low),
    ("@prisma/client", C::Database, R::Low),
    ("typeorm", C::Database, R::Low),
    ("sequelize", C::Database, R::Low),
    ("mongoose", C::Database, R::Low),
    ("knex", C::Database, R::Low),
    ("drizzle-orm", C::Database, R::Low),
    ("sqlalchemy", C::Database, R::Low),
    ("alembic", C::Database, R::Low),
];

/// Look a dependency name up in the niche package table
pub fn classify(name: &str) -> Option<(PackageCategory, RiskLevel)> {
    let lower = name.to_lowercase();
    NICHE_PACKAGES
        .iter()
        .find(|(pkg, _, _)| *pkg == lower)
        .map(|(_, category, risk)| (*category, *risk))
}

/// Classify `(name, version)` pairs in order; the first occurrence of a name wins
pub fn detect_packages<'a>(
    dependencies: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> Vec<DetectedPackage> {
    let mut detected: Vec<DetectedPackage> = Vec::new();
    for (name, version) in dependencies {
        let Some((category, risk_level)) = classify(name) else {
            continue;
        };
        let name = name.to_lowercase();
        if detected.iter().any(|d| d.name == name) {
            continue;
        }
        detected.push(DetectedPackage {
            name,
            category,
            risk_level,
            version: version.map(String::from),
        });
    }
    detected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_and_unknown() {
        assert_eq!(classify("openai"), Some((C::Ai, R::Medium)));
        assert_eq!(classify("TensorFlow"), Some((C::Ml, R::High)));
        assert_eq!(classify("left-pad"), None);
    }

    #[test]
    fn test_first_occurrence_wins() {
        let detected = detect_packages([
            ("stripe", Some("^12.0.0")),
            ("lodash", Some("4")),
            ("stripe", Some("==5.0")),
            ("jest", None),
        ]);
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].name, "stripe");
        assert_eq!(detected[0].version.as_deref(), Some("^12.0.0"));
        assert_eq!(detected[0].risk_level, R::High);
        assert_eq!(detected[1].name, "jest");
        assert!(detected[1].version.is_none());
    }

    #[test]
    fn test_detected_package_json_shape() {
        let pkg = DetectedPackage {
            name: "web3".into(),
            category: C::Blockchain,
            risk_level: R::High,
            version: None,
        };
        let json = serde_json::to_value(&pkg).unwrap();
        assert_eq!(json["riskLevel"], "high");
        assert_eq!(json["category"], "blockchain");
    }
}

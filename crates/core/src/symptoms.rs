//! Simulated symptom checker.
//!
//! No inference happens here: after a fixed delay every non-blank description receives the
//! same canned assessment. The delay is configurable so tests and the CLI need not wait.

use crate::{PortalError, PortalResult};
use serde::Serialize;
use std::time::Duration;

/// Languages the checker accepts descriptions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Kiswahili,
    Sheng,
}

impl Language {
    /// Prompt shown in the empty description box.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Language::English => "Describe your symptoms here...",
            Language::Kiswahili => "Eleza dalili zako hapa...",
            Language::Sheng => "Niambie vile unaskia...",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "kiswahili" | "swahili" | "sw" => Ok(Language::Kiswahili),
            "sheng" => Ok(Language::Sheng),
            _ => Err(PortalError::UnknownLanguage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PossibleCondition {
    pub name: String,
    /// Percentage, 0-100.
    pub probability: u8,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub conditions: Vec<PossibleCondition>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SymptomChecker {
    delay: Duration,
}

impl SymptomChecker {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Produces the simulated assessment for a description.
    ///
    /// # Errors
    ///
    /// Returns `PortalError::EmptySymptoms` for a blank description, without waiting.
    pub async fn analyze(&self, symptoms: &str, language: Language) -> PortalResult<Assessment> {
        if symptoms.trim().is_empty() {
            return Err(PortalError::EmptySymptoms);
        }
        tracing::info!(?language, "analysing symptoms");
        tokio::time::sleep(self.delay).await;
        Ok(simulated_assessment())
    }
}

fn simulated_assessment() -> Assessment {
    let condition = |name: &str, probability, severity| PossibleCondition {
        name: name.into(),
        probability,
        severity,
    };
    Assessment {
        conditions: vec![
            condition("Common Cold", 75, Severity::Low),
            condition("Flu (Influenza)", 45, Severity::Medium),
            condition("Malaria", 25, Severity::High),
        ],
        recommendations: [
            "Get plenty of rest and stay hydrated",
            "Take over-the-counter pain relievers if needed",
            "Consult a healthcare professional if symptoms worsen",
            "Consider getting tested for malaria if fever persists",
        ]
        .into_iter()
        .map(String::from)
        .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_analyze_waits_then_returns_assessment() {
        let checker = SymptomChecker::new(Duration::from_millis(3000));
        let started = tokio::time::Instant::now();

        let assessment = checker
            .analyze("homa na kichwa kuuma", Language::Kiswahili)
            .await
            .expect("analysis should succeed");

        assert!(started.elapsed() >= Duration::from_millis(3000));
        assert_eq!(assessment.conditions.len(), 3);
        assert_eq!(assessment.conditions[0].name, "Common Cold");
        assert_eq!(assessment.conditions[2].severity, Severity::High);
        assert_eq!(assessment.recommendations.len(), 4);
    }

    #[tokio::test]
    async fn test_blank_symptoms_are_rejected() {
        let checker = SymptomChecker::new(Duration::from_secs(60));
        let err = checker
            .analyze("   ", Language::English)
            .await
            .expect_err("blank input should fail");
        assert!(matches!(err, PortalError::EmptySymptoms));
    }

    #[test]
    fn test_language_parsing_and_placeholders() {
        assert_eq!("Sheng".parse::<Language>().unwrap(), Language::Sheng);
        assert_eq!("swahili".parse::<Language>().unwrap(), Language::Kiswahili);
        assert!("klingon".parse::<Language>().is_err());
        assert_eq!(Language::Sheng.placeholder(), "Niambie vile unaskia...");
    }
}

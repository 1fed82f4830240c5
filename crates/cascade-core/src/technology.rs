//! Built-in technology profile catalog and keyword matching.

use std::collections::BTreeMap;

use contracts::{
    AdoptionSpeed, AutomationLevel, LicenseTier, TaskClassification, TechnologyProfile,
};

/// Catalog of deployable technology profiles. Custom profiles supplied by
/// the caller shadow built-ins with the same name.
#[derive(Debug, Clone)]
pub struct TechnologyCatalog {
    profiles: BTreeMap<String, TechnologyProfile>,
}

impl Default for TechnologyCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TechnologyCatalog {
    pub fn builtin() -> Self {
        let mut profiles = BTreeMap::new();
        for profile in builtin_profiles() {
            profiles.insert(profile.name.clone(), profile);
        }
        Self { profiles }
    }

    pub fn with_custom(mut self, custom: &[TechnologyProfile]) -> Self {
        for profile in custom {
            self.profiles.insert(profile.name.clone(), profile.clone());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&TechnologyProfile> {
        self.profiles.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &TechnologyProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Whole-word keyword match over task text. Returns the fraction of the
/// profile's keywords found as whole words, in [0,1].
pub fn keyword_confidence(profile: &TechnologyProfile, text: &str) -> f64 {
    if profile.keywords.is_empty() {
        return 0.0;
    }
    let words = tokenize(text);
    let matched = profile
        .keywords
        .iter()
        .filter(|keyword| words.contains(keyword.to_lowercase().as_str()))
        .count();
    matched as f64 / profile.keywords.len() as f64
}

fn tokenize(text: &str) -> std::collections::BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .collect()
}

fn shift(
    pairs: &[(TaskClassification, AutomationLevel)],
) -> BTreeMap<TaskClassification, AutomationLevel> {
    pairs.iter().copied().collect()
}

fn builtin_profiles() -> Vec<TechnologyProfile> {
    vec![
        TechnologyProfile {
            name: "document_ai".to_string(),
            vendor: "Hyperscribe".to_string(),
            capabilities: vec![
                "document classification".to_string(),
                "data extraction".to_string(),
                "summarization".to_string(),
            ],
            keywords: vec![
                "document".to_string(),
                "form".to_string(),
                "extract".to_string(),
                "review".to_string(),
                "file".to_string(),
                "report".to_string(),
            ],
            classification_shift: shift(&[
                (TaskClassification::Directive, AutomationLevel::AiLed),
                (TaskClassification::TaskIteration, AutomationLevel::AiOnly),
                (TaskClassification::Validation, AutomationLevel::Shared),
            ]),
            license_tier: LicenseTier::Medium,
            adoption_speed: AdoptionSpeed::Moderate,
        },
        TechnologyProfile {
            name: "conversational_ai".to_string(),
            vendor: "DialogWorks".to_string(),
            capabilities: vec![
                "customer conversation".to_string(),
                "triage".to_string(),
                "drafting responses".to_string(),
            ],
            keywords: vec![
                "customer".to_string(),
                "respond".to_string(),
                "inquiry".to_string(),
                "chat".to_string(),
                "email".to_string(),
                "call".to_string(),
            ],
            classification_shift: shift(&[
                (TaskClassification::Directive, AutomationLevel::Shared),
                (TaskClassification::FeedbackLoop, AutomationLevel::AiLed),
                (TaskClassification::TaskIteration, AutomationLevel::AiLed),
            ]),
            license_tier: LicenseTier::Medium,
            adoption_speed: AdoptionSpeed::Fast,
        },
        TechnologyProfile {
            name: "code_assistant".to_string(),
            vendor: "Forgeline".to_string(),
            capabilities: vec![
                "code generation".to_string(),
                "test scaffolding".to_string(),
                "refactoring".to_string(),
            ],
            keywords: vec![
                "code".to_string(),
                "develop".to_string(),
                "test".to_string(),
                "debug".to_string(),
                "deploy".to_string(),
                "script".to_string(),
            ],
            classification_shift: shift(&[
                (TaskClassification::Directive, AutomationLevel::Shared),
                (TaskClassification::Learning, AutomationLevel::Shared),
                (TaskClassification::TaskIteration, AutomationLevel::AiLed),
            ]),
            license_tier: LicenseTier::High,
            adoption_speed: AdoptionSpeed::Fast,
        },
        TechnologyProfile {
            name: "workflow_rpa".to_string(),
            vendor: "Automatrix".to_string(),
            capabilities: vec![
                "rule-based process execution".to_string(),
                "system integration".to_string(),
            ],
            keywords: vec![
                "process".to_string(),
                "enter".to_string(),
                "update".to_string(),
                "transfer".to_string(),
                "reconcile".to_string(),
                "schedule".to_string(),
            ],
            classification_shift: shift(&[
                (TaskClassification::TaskIteration, AutomationLevel::AiOnly),
                (TaskClassification::Directive, AutomationLevel::AiLed),
            ]),
            license_tier: LicenseTier::Low,
            adoption_speed: AdoptionSpeed::Moderate,
        },
        TechnologyProfile {
            name: "predictive_analytics".to_string(),
            vendor: "Foresite".to_string(),
            capabilities: vec![
                "forecasting".to_string(),
                "anomaly detection".to_string(),
                "scoring".to_string(),
            ],
            keywords: vec![
                "forecast".to_string(),
                "analyze".to_string(),
                "predict".to_string(),
                "model".to_string(),
                "trend".to_string(),
                "risk".to_string(),
            ],
            classification_shift: shift(&[
                (TaskClassification::FeedbackLoop, AutomationLevel::AiLed),
                (TaskClassification::Learning, AutomationLevel::Shared),
                (TaskClassification::Validation, AutomationLevel::Shared),
            ]),
            license_tier: LicenseTier::High,
            adoption_speed: AdoptionSpeed::Slow,
        },
        TechnologyProfile {
            name: "knowledge_search".to_string(),
            vendor: "Lorekeep".to_string(),
            capabilities: vec![
                "semantic retrieval".to_string(),
                "answer synthesis".to_string(),
            ],
            keywords: vec![
                "search".to_string(),
                "research".to_string(),
                "lookup".to_string(),
                "knowledge".to_string(),
                "policy".to_string(),
                "answer".to_string(),
            ],
            classification_shift: shift(&[
                (TaskClassification::Learning, AutomationLevel::AiLed),
                (TaskClassification::Directive, AutomationLevel::Shared),
            ]),
            license_tier: LicenseTier::Medium,
            adoption_speed: AdoptionSpeed::Fast,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_at_least_six_profiles() {
        assert!(TechnologyCatalog::builtin().len() >= 6);
    }

    #[test]
    fn custom_profile_shadows_builtin_by_name() {
        let custom = TechnologyProfile {
            name: "document_ai".to_string(),
            vendor: "InHouse".to_string(),
            capabilities: Vec::new(),
            keywords: vec!["ledger".to_string()],
            classification_shift: shift(&[(
                TaskClassification::Directive,
                AutomationLevel::AiOnly,
            )]),
            license_tier: LicenseTier::Enterprise,
            adoption_speed: AdoptionSpeed::Slow,
        };
        let catalog = TechnologyCatalog::builtin().with_custom(std::slice::from_ref(&custom));
        let profile = catalog.get("document_ai").expect("profile present");
        assert_eq!(profile.vendor, "InHouse");
    }

    #[test]
    fn keyword_match_is_whole_word_not_substring() {
        let profile = TechnologyCatalog::builtin()
            .get("document_ai")
            .expect("builtin present")
            .clone();
        // "formulate" contains "form" but must not match it.
        assert_eq!(keyword_confidence(&profile, "Formulate strategy"), 0.0);
        let confidence = keyword_confidence(&profile, "Review the claim document");
        assert!(confidence > 0.0);
        // two of six keywords matched
        assert!((confidence - 2.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let profile = TechnologyCatalog::builtin()
            .get("knowledge_search")
            .expect("builtin present")
            .clone();
        assert!(keyword_confidence(&profile, "Search POLICY archives") > 0.0);
    }
}

use buildhook_core::{config::BuildConfig, models::BuildOutcome};

/// Derives a [`BuildOutcome`] from raw build output by looking for
/// tool-specific markers. Failure markers take precedence.
#[derive(Debug, Clone, Default)]
pub struct OutcomeClassifier {
    success_markers: Vec<String>,
    failure_markers: Vec<String>,
}

impl OutcomeClassifier {
    pub fn new(success_markers: Vec<String>, failure_markers: Vec<String>) -> Self {
        // An empty marker would match any output
        let clean = |markers: Vec<String>| {
            markers.into_iter().filter(|m| !m.is_empty()).collect::<Vec<_>>()
        };
        Self { success_markers: clean(success_markers), failure_markers: clean(failure_markers) }
    }

    pub fn from_config(config: &BuildConfig) -> Self {
        Self::new(config.success_markers.clone(), config.failure_markers.clone())
    }

    pub fn classify(&self, output: &str) -> BuildOutcome {
        let found = |markers: &[String]| markers.iter().any(|m| output.contains(m.as_str()));
        if found(&self.failure_markers) {
            BuildOutcome::Failure
        } else if found(&self.success_markers) {
            BuildOutcome::Success
        } else {
            BuildOutcome::Unknown
        }
    }
}

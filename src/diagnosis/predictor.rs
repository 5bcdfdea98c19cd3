//! Model-backed liver disease prediction with rule-based fallback.

use super::model::{build_features, ModelError, ModelKind, ModelSet, ReadyModels};
use super::rules::classify;
use super::types::{clamp_stage, staged_label, DiagnosisResult, LabPanel};

/// Wraps the optional staging models. Falls back to the rule cascade when a
/// model is missing or fails.
pub struct Predictor {
    models: ModelSet,
}

impl Predictor {
    pub fn new(models: ModelSet) -> Self {
        Self { models }
    }

    /// Predictor without models.
    pub fn rule_based() -> Self {
        Self::new(ModelSet::empty())
    }

    pub fn models_ready(&self) -> bool {
        self.models.is_ready()
    }

    pub fn models_loaded(&self) -> usize {
        self.models.loaded_count()
    }

    pub fn predict(&self, panel: &LabPanel) -> DiagnosisResult {
        let Some(models) = self.models.ready() else {
            tracing::debug!("Staging models unavailable, using rule cascade");
            return classify(panel);
        };

        match run_models(&models, panel) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Model prediction failed, using rule cascade");
                classify(panel).with_advice_suffix(&format!(" [DEBUG: ML prediction error: {e}]"))
            }
        }
    }
}

fn run_models(models: &ReadyModels<'_>, panel: &LabPanel) -> Result<DiagnosisResult, ModelError> {
    let global = models
        .global
        .predict(&build_features(ModelKind::Global, panel)?)?;
    tracing::debug!(prediction = global, "Global model");

    if global == 0 {
        return Ok(DiagnosisResult::new(
            "Low risk",
            85,
            "No significant liver disease detected. Continue routine monitoring.",
        ));
    }

    let hepatitis = models
        .hepatitis
        .predict(&build_features(ModelKind::Hepatitis, panel)?)?;
    let cirrhosis = models
        .cirrhosis
        .predict(&build_features(ModelKind::Cirrhosis, panel)?)?;
    tracing::debug!(hepatitis, cirrhosis, "Stage models");

    let result = if hepatitis > 0 {
        let stage = clamp_stage(hepatitis);
        DiagnosisResult::new(
            staged_label("Hepatitis C", stage),
            90,
            format!(
                "Hepatitis C detected at stage {stage}. Immediate specialist consultation required."
            ),
        )
    } else if cirrhosis > 0 {
        let stage = clamp_stage(cirrhosis);
        DiagnosisResult::new(
            staged_label("Liver Cirrhosis", stage),
            85,
            format!(
                "Liver cirrhosis detected at stage {stage}. Urgent hepatologist consultation needed."
            ),
        )
    } else {
        DiagnosisResult::new(
            "Liver Disease Detected",
            75,
            "Liver disease indicated but specific type unclear. Further diagnostic tests recommended.",
        )
    };

    Ok(result)
}

//! Optional statistical staging models.
//!
//! Three models are consulted by the predictor: a global disease/no-disease
//! model and two stage models (hepatitis, cirrhosis). Each one is opaque to
//! the rest of the crate: a fixed feature vector goes in, an integer class
//! comes out. Models are loaded once at startup and shared read-only.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::types::LabPanel;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("missing feature '{feature}' for {model} model")]
    MissingFeature { model: String, feature: String },
    #[error("feature '{feature}' has the wrong type (expected {expected})")]
    TypeMismatch { feature: String, expected: &'static str },
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("model produced a non-finite score")]
    NonFinite,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One of the three model slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Global,
    Hepatitis,
    Cirrhosis,
}

const GLOBAL_COLUMNS: [&str; 10] = [
    "Age", "Gender", "TB", "DB", "AlkPhos", "ALT", "AST", "TP", "ALB", "AGR",
];

const HEPATITIS_COLUMNS: [&str; 13] = [
    "ID", "Age", "Gender", "ALB", "AlkPhos", "ALT", "AST", "TB", "CHE", "Cholesterol",
    "Creatinine", "GGT", "TP",
];

const CIRRHOSIS_COLUMNS: [&str; 19] = [
    "ID", "N_Days", "Status", "Drug", "Age", "Gender", "Ascites", "Hepatomegaly", "Spiders",
    "Edema", "TB", "Cholesterol", "ALB", "Copper", "AlkPhos", "AST", "Tryglicerides",
    "Platelets", "Prothrombin",
];

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [Self::Global, Self::Hepatitis, Self::Cirrhosis];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Hepatitis => "hepatitis",
            Self::Cirrhosis => "cirrhosis",
        }
    }

    /// Column order expected by this model.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Self::Global => &GLOBAL_COLUMNS,
            Self::Hepatitis => &HEPATITIS_COLUMNS,
            Self::Cirrhosis => &CIRRHOSIS_COLUMNS,
        }
    }

    /// Artifact file name inside the models directory.
    pub fn artifact_file(&self) -> &'static str {
        match self {
            Self::Global => "model_global.json",
            Self::Hepatitis => "model_hepatitis.json",
            Self::Cirrhosis => "model_cirrhosis.json",
        }
    }

    /// The global model was trained with gender as a text category.
    fn categorical_gender(&self) -> bool {
        matches!(self, Self::Global)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

/// Named feature values in the column order of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Vec<(&'static str, FeatureValue)>,
}

impl FeatureVector {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns
            .iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Every numeric feature any model may ask for. Values the panel does not
/// carry are fixed clinical defaults.
fn base_record(panel: &LabPanel) -> HashMap<&'static str, f64> {
    HashMap::from([
        ("ID", 1.0),
        ("Age", panel.age),
        ("Gender", panel.gender.code()),
        ("ALT", panel.alt),
        ("AST", panel.ast),
        ("TB", panel.bilirubin),
        ("GGT", panel.ggt),
        ("DB", panel.bilirubin * 0.3),
        ("AlkPhos", panel.alk_phos),
        ("TP", panel.total_protein),
        ("ALB", panel.albumin),
        ("AGR", 1.2),
        ("N_Days", 1000.0),
        ("Status", 1.0),
        ("Drug", 1.0),
        ("Ascites", 0.0),
        ("Hepatomegaly", 0.0),
        ("Spiders", 0.0),
        ("Edema", 0.0),
        ("Cholesterol", 180.0),
        ("Copper", 100.0),
        ("Tryglicerides", 120.0),
        ("Platelets", 250_000.0),
        ("Prothrombin", 10.5),
        ("CHE", 8.0),
        ("Creatinine", 0.8),
    ])
}

/// Build the feature vector `kind` expects from a lab panel.
pub fn build_features(kind: ModelKind, panel: &LabPanel) -> Result<FeatureVector, ModelError> {
    let record = base_record(panel);
    let mut columns = Vec::with_capacity(kind.columns().len());

    for &name in kind.columns() {
        let value = if name == "Gender" && kind.categorical_gender() {
            FeatureValue::Category(panel.gender.as_str().to_string())
        } else {
            let number = record.get(name).ok_or_else(|| ModelError::MissingFeature {
                model: kind.name().to_string(),
                feature: name.to_string(),
            })?;
            FeatureValue::Number(*number)
        };
        columns.push((name, value));
    }

    Ok(FeatureVector { columns })
}

/// Capability interface for an opaque predictive model.
pub trait StagingModel: Send + Sync {
    /// Whether the model can serve predictions.
    fn available(&self) -> bool {
        true
    }

    /// Predict a class (0 = no disease, otherwise a stage number).
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError>;
}

// ═══════════════════════════════════════════════════════════
// JSON linear model artifacts
// ═══════════════════════════════════════════════════════════

/// On-disk layout of a linear multi-class model.
///
/// `features` are column names; a `Column=level` entry is a one-hot
/// indicator for a categorical column. `coefficients[i]` and `intercepts[i]`
/// score `classes[i]`; the highest score wins.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearArtifact {
    pub features: Vec<String>,
    pub classes: Vec<i64>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct LinearStagingModel {
    name: String,
    artifact: LinearArtifact,
}

impl LinearStagingModel {
    pub fn from_artifact(
        name: impl Into<String>,
        artifact: LinearArtifact,
    ) -> Result<Self, ModelError> {
        let n_classes = artifact.classes.len();
        if n_classes == 0 {
            return Err(ModelError::InvalidArtifact("no classes".into()));
        }
        if artifact.coefficients.len() != n_classes || artifact.intercepts.len() != n_classes {
            return Err(ModelError::InvalidArtifact(format!(
                "expected {n_classes} coefficient rows and intercepts, got {} and {}",
                artifact.coefficients.len(),
                artifact.intercepts.len()
            )));
        }
        if let Some(row) = artifact
            .coefficients
            .iter()
            .find(|row| row.len() != artifact.features.len())
        {
            return Err(ModelError::InvalidArtifact(format!(
                "coefficient row has {} entries for {} features",
                row.len(),
                artifact.features.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            artifact,
        })
    }

    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, ModelError> {
        let artifact: LinearArtifact = serde_json::from_str(json)?;
        Self::from_artifact(name, artifact)
    }

    pub fn load(name: impl Into<String>, path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(name, &json)
    }

    fn input(&self, features: &FeatureVector, key: &str) -> Result<f64, ModelError> {
        let missing = || ModelError::MissingFeature {
            model: self.name.clone(),
            feature: key.to_string(),
        };

        match key.split_once('=') {
            Some((column, level)) => match features.get(column).ok_or_else(missing)? {
                FeatureValue::Category(value) => Ok(if value == level { 1.0 } else { 0.0 }),
                FeatureValue::Number(_) => Err(ModelError::TypeMismatch {
                    feature: column.to_string(),
                    expected: "category",
                }),
            },
            None => match features.get(key).ok_or_else(missing)? {
                FeatureValue::Number(value) => Ok(*value),
                FeatureValue::Category(_) => Err(ModelError::TypeMismatch {
                    feature: key.to_string(),
                    expected: "number",
                }),
            },
        }
    }
}

impl StagingModel for LinearStagingModel {
    fn predict(&self, features: &FeatureVector) -> Result<i64, ModelError> {
        let inputs = self
            .artifact
            .features
            .iter()
            .map(|key| self.input(features, key))
            .collect::<Result<Vec<f64>, _>>()?;

        let mut best: Option<(usize, f64)> = None;
        for (idx, (row, intercept)) in self
            .artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .enumerate()
        {
            let score = intercept + row.iter().zip(&inputs).map(|(w, x)| w * x).sum::<f64>();
            if !score.is_finite() {
                return Err(ModelError::NonFinite);
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((idx, score));
            }
        }

        let (idx, _) = best.ok_or_else(|| ModelError::InvalidArtifact("no classes".into()))?;
        Ok(self.artifact.classes[idx])
    }
}

// ═══════════════════════════════════════════════════════════
// Model set
// ═══════════════════════════════════════════════════════════

fn usable(slot: &Option<Box<dyn StagingModel>>) -> Option<&dyn StagingModel> {
    slot.as_deref().filter(|model| model.available())
}

/// The three model slots. Any slot may be empty.
#[derive(Default)]
pub struct ModelSet {
    pub global: Option<Box<dyn StagingModel>>,
    pub hepatitis: Option<Box<dyn StagingModel>>,
    pub cirrhosis: Option<Box<dyn StagingModel>>,
}

/// Borrowed view of a model set whose three slots are all usable.
pub struct ReadyModels<'a> {
    pub global: &'a dyn StagingModel,
    pub hepatitis: &'a dyn StagingModel,
    pub cirrhosis: &'a dyn StagingModel,
}

impl ModelSet {
    /// No models: every prediction goes through the rule cascade.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(
        global: Box<dyn StagingModel>,
        hepatitis: Box<dyn StagingModel>,
        cirrhosis: Box<dyn StagingModel>,
    ) -> Self {
        Self {
            global: Some(global),
            hepatitis: Some(hepatitis),
            cirrhosis: Some(cirrhosis),
        }
    }

    /// Load `model_*.json` artifacts from `dir`. Missing or broken files
    /// leave their slot empty.
    pub fn load_dir(dir: &Path) -> Self {
        let mut set = Self::empty();
        for kind in ModelKind::ALL {
            let path = dir.join(kind.artifact_file());
            if !path.exists() {
                tracing::info!(model = kind.name(), path = %path.display(), "Model artifact not found");
                continue;
            }
            match LinearStagingModel::load(kind.name(), &path) {
                Ok(model) => {
                    tracing::info!(model = kind.name(), "Model loaded");
                    *set.slot_mut(kind) = Some(Box::new(model));
                }
                Err(e) => {
                    tracing::warn!(model = kind.name(), error = %e, "Model loading failed");
                }
            }
        }
        set
    }

    fn slot_mut(&mut self, kind: ModelKind) -> &mut Option<Box<dyn StagingModel>> {
        match kind {
            ModelKind::Global => &mut self.global,
            ModelKind::Hepatitis => &mut self.hepatitis,
            ModelKind::Cirrhosis => &mut self.cirrhosis,
        }
    }

    /// All three models, if every slot is loaded and available.
    pub fn ready(&self) -> Option<ReadyModels<'_>> {
        Some(ReadyModels {
            global: usable(&self.global)?,
            hepatitis: usable(&self.hepatitis)?,
            cirrhosis: usable(&self.cirrhosis)?,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready().is_some()
    }

    pub fn loaded_count(&self) -> usize {
        [&self.global, &self.hepatitis, &self.cirrhosis]
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::diagnosis::types::Gender;

    /// Global model: disease when ALT > 100 (score 0.01*ALT - 1.0).
    pub(crate) const GLOBAL_JSON: &str = r#"{
        "features": ["ALT"],
        "classes": [0, 1],
        "coefficients": [[0.0], [0.01]],
        "intercepts": [0.0, -1.0]
    }"#;

    #[test]
    fn feature_vectors_follow_schemas() {
        let panel = LabPanel::new(90.0, 50.0, 2.0, 70.0);
        for kind in ModelKind::ALL {
            let features = build_features(kind, &panel).unwrap();
            assert_eq!(features.len(), kind.columns().len());
            assert!(features.names().eq(kind.columns().iter().copied()));
        }
        assert_eq!(ModelKind::Global.columns().len(), 10);
        assert_eq!(ModelKind::Hepatitis.columns().len(), 13);
        assert_eq!(ModelKind::Cirrhosis.columns().len(), 19);
    }

    #[test]
    fn defaults_filled_for_unsupplied_features() {
        let panel = LabPanel::new(90.0, 50.0, 2.0, 70.0);
        let cirr = build_features(ModelKind::Cirrhosis, &panel).unwrap();
        assert_eq!(cirr.get("Platelets"), Some(&FeatureValue::Number(250_000.0)));
        assert_eq!(cirr.get("Prothrombin"), Some(&FeatureValue::Number(10.5)));
        assert_eq!(cirr.get("N_Days"), Some(&FeatureValue::Number(1000.0)));
        assert_eq!(cirr.get("Tryglicerides"), Some(&FeatureValue::Number(120.0)));

        let global = build_features(ModelKind::Global, &panel).unwrap();
        assert_eq!(global.get("AGR"), Some(&FeatureValue::Number(1.2)));
        match global.get("DB") {
            Some(FeatureValue::Number(db)) => assert!((db - 0.6).abs() < 1e-12),
            other => panic!("unexpected DB feature: {other:?}"),
        }

        let hep = build_features(ModelKind::Hepatitis, &panel).unwrap();
        assert_eq!(hep.get("CHE"), Some(&FeatureValue::Number(8.0)));
        assert_eq!(hep.get("Creatinine"), Some(&FeatureValue::Number(0.8)));
        assert_eq!(hep.get("GGT"), Some(&FeatureValue::Number(70.0)));
    }

    #[test]
    fn gender_encoding_differs_per_model() {
        let panel = LabPanel::new(30.0, 25.0, 0.8, 28.0).with_gender(Gender::Female);
        let global = build_features(ModelKind::Global, &panel).unwrap();
        assert_eq!(
            global.get("Gender"),
            Some(&FeatureValue::Category("female".into()))
        );
        let hep = build_features(ModelKind::Hepatitis, &panel).unwrap();
        assert_eq!(hep.get("Gender"), Some(&FeatureValue::Number(0.0)));
    }

    #[test]
    fn linear_model_argmax() {
        let model = LinearStagingModel::from_json("global", GLOBAL_JSON).unwrap();
        let high = build_features(ModelKind::Global, &LabPanel::new(150.0, 40.0, 1.0, 30.0)).unwrap();
        let low = build_features(ModelKind::Global, &LabPanel::new(30.0, 40.0, 1.0, 30.0)).unwrap();
        assert_eq!(model.predict(&high).unwrap(), 1);
        assert_eq!(model.predict(&low).unwrap(), 0);
    }

    #[test]
    fn linear_model_one_hot_category() {
        let json = r#"{
            "features": ["Gender=female"],
            "classes": [0, 1],
            "coefficients": [[0.0], [1.0]],
            "intercepts": [0.5, 0.0]
        }"#;
        let model = LinearStagingModel::from_json("global", json).unwrap();
        let female = LabPanel::new(30.0, 25.0, 0.8, 28.0).with_gender(Gender::Female);
        let male = LabPanel::new(30.0, 25.0, 0.8, 28.0);
        assert_eq!(model.predict(&build_features(ModelKind::Global, &female).unwrap()).unwrap(), 1);
        assert_eq!(model.predict(&build_features(ModelKind::Global, &male).unwrap()).unwrap(), 0);
    }

    #[test]
    fn missing_feature_is_an_error() {
        let json = r#"{
            "features": ["Ferritin"],
            "classes": [0, 1],
            "coefficients": [[0.0], [1.0]],
            "intercepts": [0.0, 0.0]
        }"#;
        let model = LinearStagingModel::from_json("global", json).unwrap();
        let features = build_features(ModelKind::Global, &LabPanel::new(1.0, 1.0, 1.0, 1.0)).unwrap();
        let err = model.predict(&features).unwrap_err();
        assert!(matches!(err, ModelError::MissingFeature { ref feature, .. } if feature == "Ferritin"));
    }

    #[test]
    fn numeric_key_on_category_is_type_mismatch() {
        let json = r#"{
            "features": ["Gender"],
            "classes": [0],
            "coefficients": [[1.0]],
            "intercepts": [0.0]
        }"#;
        let model = LinearStagingModel::from_json("global", json).unwrap();
        let features = build_features(ModelKind::Global, &LabPanel::new(1.0, 1.0, 1.0, 1.0)).unwrap();
        assert!(matches!(
            model.predict(&features),
            Err(ModelError::TypeMismatch { expected: "number", .. })
        ));
    }

    #[test]
    fn malformed_artifacts_rejected() {
        let mismatched = r#"{
            "features": ["ALT", "AST"],
            "classes": [0, 1],
            "coefficients": [[0.0, 1.0], [1.0]],
            "intercepts": [0.0, 0.0]
        }"#;
        assert!(matches!(
            LinearStagingModel::from_json("x", mismatched),
            Err(ModelError::InvalidArtifact(_))
        ));
        let no_classes = r#"{"features": [], "classes": [], "coefficients": [], "intercepts": []}"#;
        assert!(matches!(
            LinearStagingModel::from_json("x", no_classes),
            Err(ModelError::InvalidArtifact(_))
        ));
        assert!(matches!(
            LinearStagingModel::from_json("x", "not json"),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn empty_set_is_not_ready() {
        let set = ModelSet::empty();
        assert!(!set.is_ready());
        assert_eq!(set.loaded_count(), 0);
    }

    #[test]
    fn load_dir_without_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let set = ModelSet::load_dir(dir.path());
        assert!(!set.is_ready());
        assert_eq!(set.loaded_count(), 0);
    }

    #[test]
    fn load_dir_with_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        for kind in ModelKind::ALL {
            std::fs::write(dir.path().join(kind.artifact_file()), GLOBAL_JSON).unwrap();
        }
        let set = ModelSet::load_dir(dir.path());
        assert!(set.is_ready());
        assert_eq!(set.loaded_count(), 3);
    }

    #[test]
    fn load_dir_skips_broken_artifact() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model_global.json"), GLOBAL_JSON).unwrap();
        std::fs::write(dir.path().join("model_hepatitis.json"), "{ broken").unwrap();
        std::fs::write(dir.path().join("model_cirrhosis.json"), GLOBAL_JSON).unwrap();
        let set = ModelSet::load_dir(dir.path());
        assert!(!set.is_ready());
        assert_eq!(set.loaded_count(), 2);
        assert!(set.hepatitis.is_none());
    }
}

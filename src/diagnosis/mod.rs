//! Liver panel diagnosis: rule cascade, optional staging models, and the
//! predictor that combines them.

pub mod model;
pub mod predictor;
pub mod rules;
pub mod types;

pub use model::{ModelError, ModelKind, ModelSet, StagingModel};
pub use predictor::Predictor;
pub use rules::classify;
pub use types::{DiagnosisResult, Gender, LabPanel};

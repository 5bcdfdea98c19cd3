use serde::{Deserialize, Serialize};

/// Lowest and highest severity stage a staged diagnosis can carry.
pub const MIN_STAGE: u8 = 1;
pub const MAX_STAGE: u8 = 4;

/// Patient sex as used by the classifier and the model feature schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Numeric encoding used by the staging models (male = 1, female = 0).
    pub fn code(&self) -> f64 {
        match self {
            Self::Male => 1.0,
            Self::Female => 0.0,
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            other => Err(format!("unknown gender '{other}'")),
        }
    }
}

/// Laboratory values for one analysis request.
///
/// The four primary markers have no default. The remaining fields start at
/// a clinically normal baseline (see [`LabPanel::new`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabPanel {
    pub alt: f64,
    pub ast: f64,
    pub bilirubin: f64,
    pub ggt: f64,
    pub age: f64,
    pub gender: Gender,
    pub alk_phos: f64,
    pub total_protein: f64,
    pub albumin: f64,
}

impl LabPanel {
    pub const DEFAULT_AGE: f64 = 45.0;
    pub const DEFAULT_ALK_PHOS: f64 = 100.0;
    pub const DEFAULT_TOTAL_PROTEIN: f64 = 7.0;
    pub const DEFAULT_ALBUMIN: f64 = 4.0;

    pub fn new(alt: f64, ast: f64, bilirubin: f64, ggt: f64) -> Self {
        Self {
            alt,
            ast,
            bilirubin,
            ggt,
            age: Self::DEFAULT_AGE,
            gender: Gender::Male,
            alk_phos: Self::DEFAULT_ALK_PHOS,
            total_protein: Self::DEFAULT_TOTAL_PROTEIN,
            albumin: Self::DEFAULT_ALBUMIN,
        }
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = age;
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_alk_phos(mut self, alk_phos: f64) -> Self {
        self.alk_phos = alk_phos;
        self
    }

    pub fn with_total_protein(mut self, total_protein: f64) -> Self {
        self.total_protein = total_protein;
        self
    }

    pub fn with_albumin(mut self, albumin: f64) -> Self {
        self.albumin = albumin;
        self
    }

    /// ALT/AST ratio, 0 when AST is zero.
    pub fn alt_ast_ratio(&self) -> f64 {
        if self.ast > 0.0 {
            self.alt / self.ast
        } else {
            0.0
        }
    }
}

/// Outcome of one classification: label, confidence (0-100) and advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub diagnosis: String,
    pub confidence: u8,
    pub advice: String,
}

impl DiagnosisResult {
    pub fn new(diagnosis: impl Into<String>, confidence: u8, advice: impl Into<String>) -> Self {
        Self {
            diagnosis: diagnosis.into(),
            confidence: confidence.min(100),
            advice: advice.into(),
        }
    }

    /// Same result with `suffix` appended to the advice text.
    pub(crate) fn with_advice_suffix(self, suffix: &str) -> Self {
        Self {
            advice: format!("{}{}", self.advice, suffix),
            ..self
        }
    }
}

/// Clamp a raw stage value into `[MIN_STAGE, MAX_STAGE]`.
pub fn clamp_stage(raw: i64) -> u8 {
    raw.clamp(MIN_STAGE as i64, MAX_STAGE as i64) as u8
}

/// `"<name> (Stage <n>)"`
pub fn staged_label(name: &str, stage: u8) -> String {
    format!("{name} (Stage {stage})")
}

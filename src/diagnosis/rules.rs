//! Rule-based liver panel classifier.
//!
//! The rules form an ordered cascade: they are evaluated top to bottom and
//! the first matching rule produces the result. Several predicates overlap
//! (e.g. `ggt > 80` vs `ggt > 50`) and are only correct because of their
//! position in the table, so the order of `CASCADE` must not change.

use super::types::{clamp_stage, staged_label, DiagnosisResult, LabPanel};

/// Values the predicates look at, with the ALT/AST ratio precomputed.
#[derive(Debug, Clone, Copy)]
struct Markers {
    alt: f64,
    ast: f64,
    bilirubin: f64,
    ggt: f64,
    ratio: f64,
}

impl Markers {
    fn from_panel(panel: &LabPanel) -> Self {
        Self {
            alt: panel.alt,
            ast: panel.ast,
            bilirubin: panel.bilirubin,
            ggt: panel.ggt,
            ratio: panel.alt_ast_ratio(),
        }
    }
}

struct Rule {
    name: &'static str,
    matches: fn(&Markers) -> bool,
    build: fn(&Markers) -> DiagnosisResult,
}

const NORMAL_ADVICE: &str = "All liver function tests within normal ranges. \
Continue routine health monitoring and healthy lifestyle.";

static CASCADE: [Rule; 8] = [
    Rule {
        name: "hepatitis_c",
        matches: |m| m.alt > 80.0 && m.ast < 120.0 && m.ggt > 60.0 && m.ratio >= 1.5,
        build: |m| {
            let stage = clamp_stage(((m.alt - 80.0) / 40.0).floor() as i64 + 1);
            DiagnosisResult::new(
                staged_label("Hepatitis C", stage),
                88,
                format!(
                    "Hepatitis C detected at stage {stage}. Immediate specialist consultation \
                     required. Consider viral load testing and liver biopsy if indicated."
                ),
            )
        },
    },
    Rule {
        name: "cirrhosis",
        matches: |m| m.ast > m.alt && m.bilirubin > 2.0 && m.ratio < 0.8,
        build: |m| {
            let stage = clamp_stage((m.bilirubin / 0.8).floor() as i64);
            DiagnosisResult::new(
                staged_label("Liver Cirrhosis", stage),
                85,
                format!(
                    "Liver cirrhosis detected at stage {stage}. Urgent hepatologist consultation \
                     needed. Evaluate for varices, ascites, and hepatocellular carcinoma screening."
                ),
            )
        },
    },
    Rule {
        name: "cholestasis",
        matches: |m| m.ggt > 100.0 && m.bilirubin > 1.5,
        build: |_| {
            DiagnosisResult::new(
                "Cholestasis",
                82,
                "Evidence of bile duct obstruction or cholestasis. Further investigation \
                 required including abdominal ultrasound and liver biopsy if indicated.",
            )
        },
    },
    Rule {
        name: "acute_hepatitis",
        matches: |m| (m.alt > 200.0 || m.ast > 200.0) && m.bilirubin > 2.0,
        build: |_| {
            DiagnosisResult::new(
                "Acute Hepatitis",
                90,
                "Signs of acute hepatitis. Immediate medical attention required. Rule out \
                 viral hepatitis, drug-induced liver injury, and autoimmune hepatitis.",
            )
        },
    },
    Rule {
        name: "drug_induced_injury",
        matches: |m| m.alt > 150.0 && m.ast > 150.0 && m.ratio < 5.0,
        build: |_| {
            DiagnosisResult::new(
                "Drug-Induced Liver Injury",
                80,
                "Possible drug-induced liver injury. Review medications and consult \
                 hepatologist immediately.",
            )
        },
    },
    Rule {
        name: "nafld",
        matches: |m| m.ratio > 2.0 && m.alt < 150.0 && m.ast < 100.0 && m.ggt < 80.0,
        build: |_| {
            DiagnosisResult::new(
                "NAFLD",
                75,
                "Suspected non-alcoholic fatty liver disease. Lifestyle modification \
                 recommended including weight loss, exercise, and dietary changes.",
            )
        },
    },
    Rule {
        name: "liver_disease",
        matches: |m| m.alt > 100.0 || m.ast > 100.0 || m.bilirubin > 2.0 || m.ggt > 80.0,
        build: |_| {
            DiagnosisResult::new(
                "Liver Disease Detected",
                78,
                "Liver function abnormalities detected. Further evaluation required \
                 including detailed history, additional tests, and specialist consultation.",
            )
        },
    },
    Rule {
        name: "mild_elevation",
        matches: |m| m.alt > 40.0 || m.ast > 40.0 || m.bilirubin > 1.2 || m.ggt > 50.0,
        build: |_| {
            DiagnosisResult::new(
                "Mild Liver Enzyme Elevation",
                65,
                "Mild liver enzyme elevations detected. Monitor with repeat testing in \
                 2-4 weeks. Review medications and alcohol intake.",
            )
        },
    },
];

/// Classify a lab panel with the rule cascade.
///
/// Total over non-negative inputs: when no rule matches the panel is
/// reported as normal liver function. Age, gender and the secondary panel
/// values do not influence the outcome.
pub fn classify(panel: &LabPanel) -> DiagnosisResult {
    let markers = Markers::from_panel(panel);

    let matched = CASCADE.iter().find(|rule| (rule.matches)(&markers));

    tracing::debug!(
        alt = markers.alt,
        ast = markers.ast,
        bilirubin = markers.bilirubin,
        ggt = markers.ggt,
        ratio = markers.ratio,
        age = panel.age,
        gender = panel.gender.as_str(),
        rule = matched.map(|r| r.name).unwrap_or("normal"),
        "Rule cascade evaluated"
    );

    match matched {
        Some(rule) => (rule.build)(&markers),
        None => DiagnosisResult::new("Normal Liver Function", 95, NORMAL_ADVICE),
    }
}

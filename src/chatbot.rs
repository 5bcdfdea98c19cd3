//! Keyword-matching medical assistant.
//!
//! Answers are built from a snapshot of the most recent patients and
//! analyses. Matching is plain substring search on the lower-cased message,
//! checked in a fixed order; the first matching topic answers.

use std::fmt::Write as _;

use rusqlite::Connection;

use crate::db::{self, DatabaseError};
use crate::models::{Patient, ReportWithPatient};

/// How many patients and analyses the assistant looks at.
pub const CONTEXT_WINDOW: usize = 10;

pub const DISCLAIMER: &str = "\n\n*Please note: I am an AI assistant and not a substitute for \
professional medical advice. Always consult with qualified healthcare providers for medical \
decisions.*";

/// Sent when the context snapshot cannot be read.
pub const APOLOGY: &str = "I apologize for the technical issue. Our medical system is currently \
operational with patient management and AI analysis capabilities. For specific medical advice, \
please consult with a healthcare professional.";

const ANALYSIS_WORDS: &[&str] = &["analysis", "analyses", "diagnosis", "report", "results"];
const PATIENT_WORDS: &[&str] = &["patient", "patients", "who"];
const CAPABILITY_WORDS: &[&str] = &["system", "capabilities", "features", "what can you do", "help"];
const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "greetings"];
const HEALTH_WORDS: &[&str] = &["liver", "disease", "medical", "health"];

const LIVER_INFO: &str = "Regarding liver health and medical conditions:

• Our system specializes in AI-powered liver disease analysis
• We analyze liver function tests (ALT, AST, bilirubin, GGT) using machine learning models
• Recent analyses show we're helping patients with accurate diagnoses and treatment recommendations
• For specific medical advice, please consult with a healthcare professional

I can provide information about our system's capabilities and current patient data.";

/// Snapshot of recent records the assistant answers from.
#[derive(Debug, Clone, Default)]
pub struct ChatContext {
    /// Newest first.
    pub patients: Vec<Patient>,
    /// Newest first.
    pub analyses: Vec<ReportWithPatient>,
}

impl ChatContext {
    pub fn load(conn: &Connection) -> Result<Self, DatabaseError> {
        Ok(Self {
            patients: db::list_patients(conn, Some(CONTEXT_WINDOW))?,
            analyses: db::list_reports_with_patients(conn, Some(CONTEXT_WINDOW))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Topic {
    Analyses,
    Patients,
    Capabilities,
    Greeting,
    LiverHealth,
    Unknown,
}

fn mentions(message: &str, words: &[&str]) -> bool {
    words.iter().any(|w| message.contains(w))
}

fn topic_of(message: &str) -> Topic {
    if mentions(message, ANALYSIS_WORDS) {
        Topic::Analyses
    } else if mentions(message, PATIENT_WORDS) {
        Topic::Patients
    } else if mentions(message, CAPABILITY_WORDS) {
        Topic::Capabilities
    } else if mentions(message, GREETING_WORDS) {
        Topic::Greeting
    } else if mentions(message, HEALTH_WORDS) {
        Topic::LiverHealth
    } else {
        Topic::Unknown
    }
}

fn asks_count(message: &str) -> bool {
    message.contains("how many") || message.contains("count")
}

/// Produce the assistant's reply to `message`. The reply always ends with
/// [`DISCLAIMER`].
pub fn respond(message: &str, ctx: &ChatContext) -> String {
    let normalized = message.trim().to_lowercase();
    let topic = topic_of(&normalized);
    tracing::debug!(?topic, "Chatbot topic");

    let mut reply = match topic {
        Topic::Analyses => analyses_reply(&normalized, ctx),
        Topic::Patients => patients_reply(&normalized, ctx),
        Topic::Capabilities => capabilities_reply(ctx),
        Topic::Greeting => format!(
            "Hello! I'm your AI Medical Assistant. I have access to {} patients and {} medical \
             analyses in our healthcare system. How can I help you today?",
            ctx.patients.len(),
            ctx.analyses.len()
        ),
        Topic::LiverHealth => LIVER_INFO.to_string(),
        Topic::Unknown => format!(
            "I understand you're asking about: '{}'. As your AI Medical Assistant, I have access \
             to {} patients and {} medical analyses in our healthcare system. I can help you with \
             patient information, medical analyses, system capabilities, or general medical \
             questions. Could you please be more specific about what you'd like to know?",
            message,
            ctx.patients.len(),
            ctx.analyses.len()
        ),
    };

    reply.push_str(DISCLAIMER);
    reply
}

fn analyses_reply(message: &str, ctx: &ChatContext) -> String {
    let total = ctx.analyses.len();
    if asks_count(message) {
        return format!("We have performed {total} medical analysis(es) in our system.");
    }
    if message.contains("recent") || message.contains("latest") {
        return match ctx.analyses.first() {
            Some(latest) => {
                let name = latest
                    .patient
                    .as_ref()
                    .map_or("Unknown Patient", |p| p.name.as_str());
                format!(
                    "The most recent analysis was for {name} with a diagnosis of {} \
                     (confidence: {}%).",
                    latest.report.diagnosis,
                    confidence_text(latest.report.confidence)
                )
            }
            None => "No medical analyses have been performed yet.".to_string(),
        };
    }
    format!(
        "We have completed {total} medical analysis(es). Our system uses AI-powered liver \
         disease analysis to provide accurate diagnoses and treatment recommendations."
    )
}

/// Stored confidence as written, keeping one decimal on whole numbers
/// (`85.0`, `33.33`).
fn confidence_text(confidence: f64) -> String {
    if confidence.is_finite() && confidence.fract() == 0.0 {
        format!("{confidence:.1}")
    } else {
        confidence.to_string()
    }
}

fn patients_reply(message: &str, ctx: &ChatContext) -> String {
    let total = ctx.patients.len();
    if asks_count(message) {
        let mut reply = format!("We currently have {total} patient(s) in our system.");
        if !ctx.patients.is_empty() {
            let names: Vec<&str> = ctx.patients.iter().take(3).map(|p| p.name.as_str()).collect();
            let _ = write!(reply, " Recent patients include: {}", names.join(", "));
            if total > 3 {
                let _ = write!(reply, " and {} others.", total - 3);
            }
        }
        return reply;
    }
    if message.contains("list") || message.contains("show") {
        if ctx.patients.is_empty() {
            return "No patients are currently registered in the system.".to_string();
        }
        let mut reply = String::from("Here are our current patients:\n");
        for patient in ctx.patients.iter().take(5) {
            let _ = write!(reply, "• {} (ID: {})", patient.name, patient.patient_id);
            if let Some(department) = &patient.department {
                let _ = write!(reply, " - {department}");
            }
            if let Some(doctor) = &patient.doctor_name {
                let _ = write!(reply, " - {doctor}");
            }
            reply.push('\n');
        }
        return reply;
    }
    format!(
        "We have {total} patient(s) in our medical database. I can provide information about \
         specific patients or show you a list of all patients."
    )
}

fn capabilities_reply(ctx: &ChatContext) -> String {
    format!(
        "I am your AI Medical Assistant with access to the healthcare system's database. \
         Here's what I can help you with:\n\n\
         • **Patient Information**: View patient records, demographics, and medical history\n\
         • **Medical Analyses**: Access AI-powered liver disease analysis results and confidence scores\n\
         • **Lab Results**: Review laboratory test results and interpretations\n\
         • **Appointment Management**: Schedule and manage patient appointments\n\
         • **Medical Reports**: Generate comprehensive medical reports\n\
         • **General Medical Information**: Answer questions about medical conditions and health advice\n\n\
         I have real-time access to {} patients and {} medical analyses in our system.",
        ctx.patients.len(),
        ctx.analyses.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_memory_database, seed_demo_data};

    fn seeded() -> ChatContext {
        let conn = open_memory_database().unwrap();
        seed_demo_data(&conn).unwrap();
        ChatContext::load(&conn).unwrap()
    }

    #[test]
    fn every_reply_ends_with_disclaimer() {
        let ctx = ChatContext::default();
        for message in ["hello", "how many patients", "xyz", "liver", "help", "report"] {
            assert!(respond(message, &ctx).ends_with(DISCLAIMER), "{message}");
        }
    }

    #[test]
    fn analysis_count() {
        let reply = respond("How many analyses do we have?", &seeded());
        assert!(reply.starts_with("We have performed 3 medical analysis(es) in our system."));
    }

    #[test]
    fn latest_analysis_names_patient() {
        let reply = respond("  Show the LATEST report ", &seeded());
        assert!(reply.starts_with(
            "The most recent analysis was for Michael Brown with a diagnosis of \
             Liver Cirrhosis (Stage 3) (confidence: 85.0%)."
        ));
    }

    #[test]
    fn latest_analysis_keeps_stored_precision() {
        use crate::models::MedicalReport;

        let ctx = ChatContext {
            patients: Vec::new(),
            analyses: vec![ReportWithPatient {
                report: MedicalReport {
                    id: 1,
                    patient_id: 1,
                    diagnosis: "Fatty Liver Disease".into(),
                    confidence: 33.33,
                    advice: String::new(),
                    created_at: chrono::Utc::now(),
                },
                patient: None,
            }],
        };
        let reply = respond("latest analysis", &ctx);
        assert!(reply.starts_with(
            "The most recent analysis was for Unknown Patient with a diagnosis of \
             Fatty Liver Disease (confidence: 33.33%)."
        ));
        assert_eq!(confidence_text(72.5), "72.5");
        assert_eq!(confidence_text(90.0), "90.0");
    }

    #[test]
    fn latest_analysis_when_empty() {
        let reply = respond("latest results", &ChatContext::default());
        assert!(reply.starts_with("No medical analyses have been performed yet."));
    }

    #[test]
    fn analysis_words_win_over_patient_words() {
        let reply = respond("patient diagnosis", &seeded());
        assert!(reply.starts_with("We have completed 3 medical analysis(es)."));
    }

    #[test]
    fn patient_count_lists_three_names() {
        let ctx = seeded();
        let reply = respond("how many patients are there", &ctx);
        assert!(reply.starts_with("We currently have 5 patient(s) in our system. Recent patients include: "));
        assert!(reply.contains(" and 2 others."));
    }

    #[test]
    fn patient_list_shows_department_and_doctor() {
        let reply = respond("list patients", &seeded());
        assert!(reply.starts_with("Here are our current patients:\n"));
        assert!(reply.contains("• John Smith (ID: P-2024-001) - Hepatology - Dr. Sarah Ahmed\n"));
        assert_eq!(reply.matches('•').count(), 5);
    }

    #[test]
    fn patient_list_when_empty() {
        let reply = respond("show patients", &ChatContext::default());
        assert!(reply.starts_with("No patients are currently registered in the system."));
    }

    #[test]
    fn capabilities_and_greeting() {
        let ctx = seeded();
        let caps = respond("what can you do", &ctx);
        assert!(caps.contains("**Lab Results**"));
        assert!(caps.contains("I have real-time access to 5 patients and 3 medical analyses"));

        let hello = respond("Hey there", &ctx);
        assert!(hello.starts_with("Hello! I'm your AI Medical Assistant. I have access to 5 patients"));
    }

    #[test]
    fn liver_question_gets_info_block() {
        let reply = respond("tell me about fatty liver", &ChatContext::default());
        assert!(reply.starts_with("Regarding liver health and medical conditions:"));
    }

    #[test]
    fn unknown_topic_echoes_original_message() {
        let reply = respond("Quantum Flux?", &ChatContext::default());
        assert!(reply.starts_with("I understand you're asking about: 'Quantum Flux?'."));
    }
}

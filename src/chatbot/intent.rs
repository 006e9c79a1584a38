//! Few-shot intent classification for usage logging.
//!
//! Intent never gates the answer pipeline; it only annotates usage logs so
//! admins can see what students ask about. Classification failures collapse
//! to [`Intent::Unknown`].

use crate::llm::{ChatMessage, LlmClient};
use std::fmt;
use tracing::debug;

/// The fixed label set the classifier may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    AdmissionInfo,
    ProgramInfo,
    Fees,
    HostelInfo,
    Contact,
    GeneralQuery,
    ApplicationDeadline,
    CourseStructure,
    Location,
    Scholarship,
    RegistrationHelp,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::AdmissionInfo => "admission_info",
            Intent::ProgramInfo => "program_info",
            Intent::Fees => "fees",
            Intent::HostelInfo => "hostel_info",
            Intent::Contact => "contact",
            Intent::GeneralQuery => "general_query",
            Intent::ApplicationDeadline => "application_deadline",
            Intent::CourseStructure => "course_structure",
            Intent::Location => "location",
            Intent::Scholarship => "scholarship",
            Intent::RegistrationHelp => "registration_help",
            Intent::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Intent::Unknown)
    }

    /// Parse a classifier label. Anything outside the allowed set is `Unknown`.
    pub fn parse_label(label: &str) -> Intent {
        match label.trim().to_lowercase().as_str() {
            "admission_info" => Intent::AdmissionInfo,
            "program_info" => Intent::ProgramInfo,
            "fees" => Intent::Fees,
            "hostel_info" => Intent::HostelInfo,
            "contact" => Intent::Contact,
            "general_query" => Intent::GeneralQuery,
            "application_deadline" => Intent::ApplicationDeadline,
            "course_structure" => Intent::CourseStructure,
            "location" => Intent::Location,
            "scholarship" => Intent::Scholarship,
            "registration_help" => Intent::RegistrationHelp,
            _ => Intent::Unknown,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn classifier_prompt(message: &str) -> String {
    format!(
        "You are an intent classifier for a university chatbot. Return only the intent label. \
         Possible labels: admission_info, program_info, fees, hostel_info, contact, general_query, \
         application_deadline, course_structure, location, scholarship, registration_help, unknown.\n\n\
         User: What are the admission requirements?\nIntent: admission_info\n\
         User: Tell me about the Nautical Science program.\nIntent: program_info\n\
         User: How much is the tuition?\nIntent: fees\n\
         User: Do you offer accommodation?\nIntent: hostel_info\n\
         User: Where is the school located?\nIntent: location\n\
         User: What are the deadlines for applying?\nIntent: application_deadline\n\
         User: Do you offer any scholarships?\nIntent: scholarship\n\
         User: Can you help me register my courses?\nIntent: registration_help\n\
         User: Hello\nIntent: general_query\n\
         User: I want to speak to someone\nIntent: contact\n\
         User: {message}\nIntent:"
    )
}

/// Classify a user message. Best-effort: any LLM failure yields `Unknown`.
pub async fn classify(client: &LlmClient, model: &str, message: &str) -> Intent {
    let messages = [ChatMessage::user(classifier_prompt(message))];
    match client.complete(model, &messages, 0.0).await {
        Ok(label) => Intent::parse_label(&label),
        Err(e) => {
            debug!(error = %e, "intent classification failed");
            Intent::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_labels() {
        assert_eq!(Intent::parse_label("fees"), Intent::Fees);
        assert_eq!(Intent::parse_label(" Admission_Info \n"), Intent::AdmissionInfo);
        assert_eq!(Intent::parse_label("registration_help"), Intent::RegistrationHelp);
    }

    #[test]
    fn test_parse_rejects_out_of_set_labels() {
        assert_eq!(Intent::parse_label("pizza_orders"), Intent::Unknown);
        assert_eq!(Intent::parse_label(""), Intent::Unknown);
        // A chatty model response is not a label.
        assert_eq!(
            Intent::parse_label("The intent is admission_info."),
            Intent::Unknown
        );
    }

    #[test]
    fn test_label_round_trip() {
        for intent in [
            Intent::AdmissionInfo,
            Intent::ProgramInfo,
            Intent::Fees,
            Intent::HostelInfo,
            Intent::Contact,
            Intent::GeneralQuery,
            Intent::ApplicationDeadline,
            Intent::CourseStructure,
            Intent::Location,
            Intent::Scholarship,
            Intent::RegistrationHelp,
            Intent::Unknown,
        ] {
            assert_eq!(Intent::parse_label(intent.as_str()), intent);
        }
    }

    #[test]
    fn test_prompt_embeds_message() {
        let prompt = classifier_prompt("Where can I pay my fees?");
        assert!(prompt.contains("User: Where can I pay my fees?\nIntent:"));
    }
}

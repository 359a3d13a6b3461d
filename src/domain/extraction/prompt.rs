//! Prompt text for extraction requests.

use crate::domain::schema::{helpdesk, Schema};

use super::RepairFeedback;

const HELPDESK_SYSTEM_PROMPT: &str = "\
You are an expert IT helpdesk conversation analyst specializing in:
- Detecting bot failures
- Accurately assessing user sentiment and satisfaction
- Identifying knowledge base gaps and resolution outcomes

Use the full 1-5 scoring range. Be conservative: high scores must be earned.

Extract all relevant fields according to the schema provided.";

const HELPDESK_NOTES: [&str; 6] = [
    "Analyze the ENTIRE conversation to determine the outcome",
    "Pay attention to the LAST few messages to understand how it ended",
    "If the bot asked a question but never responded after the user's answer, that is a bot failure",
    "A user saying \"hello\" or \"are you there?\" after a bot question most likely means the bot went silent",
    "Be conservative with satisfaction and quality scores; they must be earned",
    "Separate IMS tickets (always created for IT calls) from INC tickets (escalations only)",
];

const GENERIC_SYSTEM_PROMPT: &str = "\
You are a careful conversation analyst. Read the transcript and extract \
the requested fields exactly as specified. Do not guess values that the \
conversation does not support; use null for optional fields instead.";

/// Prompt wording for one analytics domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system_prompt: String,
    task: String,
    notes: Vec<String>,
}

impl PromptTemplate {
    pub fn new(system_prompt: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            task: task.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Built-in wording for a domain, with a neutral fallback.
    pub fn for_domain(domain: &str) -> Self {
        if domain == helpdesk::DOMAIN {
            HELPDESK_NOTES.iter().fold(
                Self::new(
                    HELPDESK_SYSTEM_PROMPT,
                    "Analyze this IT helpdesk conversation and extract structured information:",
                ),
                |template, note| template.with_note(*note),
            )
        } else {
            Self::new(
                GENERIC_SYSTEM_PROMPT,
                "Analyze this conversation and extract structured information:",
            )
        }
    }

    /// System prompt followed by the schema instruction.
    pub fn system_prompt(&self, schema: &Schema) -> String {
        format!("{}\n\n{}", self.system_prompt, schema.instruction())
    }

    /// User message embedding the canonical transcript.
    pub fn user_prompt(&self, canonical_text: &str) -> String {
        let mut prompt = format!("{}\n\n{}", self.task, canonical_text);
        if !self.notes.is_empty() {
            prompt.push_str("\n\nIMPORTANT NOTES:");
            for note in &self.notes {
                prompt.push_str("\n- ");
                prompt.push_str(note);
            }
        }
        prompt
    }
}

/// User message asking the model to fix its previous answer.
pub fn repair_message(feedback: &RepairFeedback) -> String {
    let mut message = String::from(
        "Your previous answer did not match the required format. Fix these problems:",
    );
    for error in &feedback.errors {
        message.push_str("\n- ");
        message.push_str(&error.to_string());
    }
    message.push_str(
        "\n\nRespond again with the complete JSON object. Keep every correct field \
         and change only what is listed above.",
    );
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{FieldError, FieldErrorReason, FieldSpec};

    #[test]
    fn helpdesk_template_carries_analysis_notes() {
        let prompt = PromptTemplate::for_domain(helpdesk::DOMAIN).user_prompt("USER: hi");
        assert!(prompt.contains("USER: hi"));
        assert!(prompt.contains("IMPORTANT NOTES:"));
        assert!(prompt.contains("IMS tickets"));
    }

    #[test]
    fn generic_template_has_no_notes() {
        let prompt = PromptTemplate::for_domain("billing").user_prompt("USER: hi");
        assert!(!prompt.contains("IMPORTANT NOTES"));
    }

    #[test]
    fn system_prompt_includes_schema_instruction() {
        let schema = Schema::builder("triage")
            .field(FieldSpec::boolean("first_call_resolution"))
            .build()
            .unwrap();
        let prompt = PromptTemplate::for_domain("triage").system_prompt(&schema);
        assert!(prompt.contains("- first_call_resolution (required): boolean"));
    }

    #[test]
    fn repair_message_lists_every_error() {
        let feedback = RepairFeedback {
            previous_output: None,
            errors: vec![
                FieldError::new("request_type", FieldErrorReason::Missing),
                FieldError::new(
                    "satisfaction_score",
                    FieldErrorReason::OutOfRange {
                        value: 7,
                        min: Some(1),
                        max: Some(5),
                    },
                ),
            ],
        };
        let message = repair_message(&feedback);
        assert!(message.contains("- request_type: required field is missing"));
        assert!(message.contains("- satisfaction_score: 7 is outside the range 1..=5"));
    }
}

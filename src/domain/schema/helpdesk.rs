//! Built-in IT helpdesk conversation analytics.
//!
//! The schema feeds dashboard metrics: satisfaction, first call resolution,
//! automation success, KB gaps, top intents and escalation reasons. The
//! typed [`ConversationAnalytics`] view can be decoded from any validated
//! record of this domain.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FieldSpec, FieldValue, Schema, SchemaDefinitionError};
use crate::domain::extraction::ResultRecord;

/// Domain name of the built-in helpdesk schema.
pub const DOMAIN: &str = "it_helpdesk";

macro_rules! token_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            /// Every token, in declaration order.
            pub const TOKENS: &'static [&'static str] = &[$($token),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token,)+
                }
            }
        }
    };
}

token_enum! {
    /// Primary classification of the request.
    RequestType {
        Incident => "incident",
        ServiceRequest => "service_request",
        GeneralInquiry => "general_inquiry",
        OutOfScope => "out_of_scope",
    }
}

token_enum! {
    /// Incident categories, aligned with the knowledge base structure.
    IncidentCategory {
        UniflowPrinter => "uniflow_printer",
        Citrix => "citrix",
        MultifactorAuthentication => "multifactor_authentication",
        AdAccount => "ad_account",
        Hardware => "hardware",
        SoftwareApplication => "software_application",
        Other => "other",
        NotApplicable => "not_applicable",
    }
}

token_enum! {
    /// Service request forms the bot can hand out.
    ServiceRequestType {
        SapAccess => "sap_access",
        EmailSharedDrive => "email_shared_drive",
        BusinessAppAccess => "business_app_access",
        NetworkAccess => "network_access",
        GeneralCatalog => "general_catalog",
        OtherForm => "other_form",
        NotApplicable => "not_applicable",
    }
}

token_enum! {
    ResolutionMethod {
        KbGuidedTroubleshooting => "kb_guided_troubleshooting",
        FormProvided => "form_provided",
        SimpleInformation => "simple_information",
        Escalated => "escalated",
        NoResolution => "no_resolution",
        NotApplicable => "not_applicable",
    }
}

token_enum! {
    /// Final outcome of the conversation.
    ResolutionStatus {
        ResolvedByBot => "resolved_by_bot",
        ResolvedWithForm => "resolved_with_form",
        EscalatedToHuman => "escalated_to_human",
        UserAbandoned => "user_abandoned",
        OutOfScope => "out_of_scope",
        BotFailure => "bot_failure",
    }
}

token_enum! {
    EscalationReason {
        KbStepsFailed => "kb_steps_failed",
        NoKbArticleFound => "no_kb_article_found",
        KbStepsInfeasible => "kb_steps_infeasible",
        UserRequestedHuman => "user_requested_human",
        UserFrustrated => "user_frustrated",
        ComplexIssue => "complex_issue",
        UrgentRequest => "urgent_request",
        AuthenticationRequired => "authentication_required",
        NotEscalated => "not_escalated",
    }
}

token_enum! {
    ConversationQuality {
        Excellent => "excellent",
        Good => "good",
        Acceptable => "acceptable",
        Poor => "poor",
        Failed => "failed",
    }
}

token_enum! {
    UserSentiment {
        VerySatisfied => "very_satisfied",
        Satisfied => "satisfied",
        Neutral => "neutral",
        Dissatisfied => "dissatisfied",
        VeryDissatisfied => "very_dissatisfied",
    }
}

token_enum! {
    BotFailureType {
        WentSilent => "went_silent",
        MissedKbSearch => "missed_kb_search",
        MultipleQuestions => "multiple_questions",
        WrongFormProvided => "wrong_form_provided",
        ProtocolViolation => "protocol_violation",
        None => "none",
    }
}

token_enum! {
    /// How and why the call ended.
    CallEndReason {
        ResolvedNormalClose => "resolved_normal_close",
        EscalatedClose => "escalated_close",
        FormProvidedClose => "form_provided_close",
        UserAbandoned => "user_abandoned",
        UserDisconnected => "user_disconnected",
        UserRequestedEnd => "user_requested_end",
        BotFailure => "bot_failure",
        OutOfScopeRedirect => "out_of_scope_redirect",
        UrgentHandoff => "urgent_handoff",
    }
}

fn empty_list() -> FieldValue {
    FieldValue::List(Vec::new())
}

/// Builds the `it_helpdesk` schema.
pub fn schema() -> Result<Schema, SchemaDefinitionError> {
    Schema::builder(DOMAIN)
        .title("IT helpdesk conversation analytics")
        // Request classification
        .field(
            FieldSpec::enumeration("request_type", RequestType::TOKENS.iter().copied())
                .describe("Primary classification of what the user needed"),
        )
        .field(
            FieldSpec::enumeration("incident_category", IncidentCategory::TOKENS.iter().copied())
                .describe("Specific incident category, or not_applicable for non-incidents"),
        )
        .field(
            FieldSpec::enumeration(
                "service_request_type",
                ServiceRequestType::TOKENS.iter().copied(),
            )
            .describe("Specific service request type, or not_applicable"),
        )
        .field(
            FieldSpec::text("issue_summary")
                .max_length(200)
                .describe("One-sentence summary, e.g. 'User unable to print to Uniflow after PIN reset'"),
        )
        .field(
            FieldSpec::string_list("issue_keywords")
                .max_items(5)
                .with_default(empty_list())
                .describe("Key technical terms from the conversation, e.g. ['uniflow', 'pin reset']"),
        )
        // Resolution tracking
        .field(
            FieldSpec::enumeration("resolution_status", ResolutionStatus::TOKENS.iter().copied())
                .describe(
                    "Final outcome. resolved_by_bot and resolved_with_form count as first call \
                     resolution; escalated_to_human means a ticket was left open for an agent; \
                     bot_failure means the bot went silent or failed to respond",
                ),
        )
        .field(
            FieldSpec::enumeration("resolution_method", ResolutionMethod::TOKENS.iter().copied())
                .describe("How the request was handled"),
        )
        .field(
            FieldSpec::text("resolution_provided")
                .max_length(300)
                .optional()
                .describe("Brief summary of the solution if resolved"),
        )
        // Escalation analysis
        .field(
            FieldSpec::enumeration("escalation_reason", EscalationReason::TOKENS.iter().copied())
                .describe(
                    "Primary reason for escalation, or not_escalated. kb_steps_failed, \
                     no_kb_article_found and kb_steps_infeasible point at knowledge base gaps",
                ),
        )
        .field(
            FieldSpec::integer("escalation_turn_number")
                .optional()
                .describe("Turn number at which escalation happened"),
        )
        // Knowledge base effectiveness
        .field(FieldSpec::boolean("kb_search_performed").describe("Whether the KB search tool was called"))
        .field(
            FieldSpec::boolean("kb_article_found")
                .describe("Whether a relevant KB article came back from the search"),
        )
        .field(
            FieldSpec::string_list("kb_steps_attempted")
                .with_default(empty_list())
                .describe("Troubleshooting steps from the KB that were attempted"),
        )
        .field(
            FieldSpec::integer("kb_steps_count")
                .with_default(FieldValue::Integer(0))
                .describe("Number of distinct troubleshooting steps attempted"),
        )
        .field(
            FieldSpec::boolean("kb_steps_successful")
                .describe("Whether the KB steps resolved the issue; false suggests a KB gap"),
        )
        // Form handling
        .field(FieldSpec::boolean("form_provided").describe("Whether a service request form was provided"))
        .field(
            FieldSpec::enumeration("form_type_provided", ServiceRequestType::TOKENS.iter().copied())
                .optional()
                .describe("Which form was provided, if any"),
        )
        .field(
            FieldSpec::text("form_url_sent")
                .optional()
                .describe("The form URL that was sent to the user"),
        )
        .field(
            FieldSpec::boolean("correct_form_provided")
                .with_default(FieldValue::Boolean(true))
                .describe("Whether the bot provided the correct form; false is a process failure"),
        )
        // Ticket tracking
        .field(
            FieldSpec::boolean("ims_ticket_created")
                .describe("Whether an IMS interaction ticket was created; expected for every IT call"),
        )
        .field(FieldSpec::text("ims_ticket_number").optional().describe("IMS ticket number, if created"))
        .field(
            FieldSpec::boolean("inc_ticket_created")
                .describe("Whether an INC incident ticket was created; indicates escalation"),
        )
        .field(FieldSpec::text("inc_ticket_number").optional().describe("INC ticket number, if created"))
        // Conversation metrics
        .field(
            FieldSpec::integer("total_turns").describe("Total user and assistant messages"),
        )
        .field(FieldSpec::integer("user_turns").describe("Number of user messages"))
        .field(
            FieldSpec::integer("assistant_turns").describe("Number of assistant messages"),
        )
        .field(
            FieldSpec::boolean("conversation_ended_naturally").describe(
                "True if the conversation closed properly; false if the bot went silent, \
                 the user abandoned or the call disconnected",
            ),
        )
        // User experience
        .field(
            FieldSpec::enumeration("user_sentiment", UserSentiment::TOKENS.iter().copied())
                .describe("Overall user sentiment across the conversation"),
        )
        .field(
            FieldSpec::integer("satisfaction_score")
                .range(1, 5)
                .describe("5 very satisfied, 4 satisfied, 3 neutral, 2 dissatisfied, 1 very dissatisfied"),
        )
        .field(
            FieldSpec::boolean("user_expressed_satisfaction")
                .optional()
                .describe("True if the user thanked the bot, false if they complained, null if unclear"),
        )
        .field(
            FieldSpec::boolean("user_expressed_frustration")
                .describe("Whether the user showed signs of frustration"),
        )
        .field(
            FieldSpec::string_list("frustration_triggers")
                .with_default(empty_list())
                .describe("What caused frustration, e.g. ['bot went silent', 'unclear instructions']"),
        )
        .field(
            FieldSpec::enumeration("call_end_reason", CallEndReason::TOKENS.iter().copied())
                .describe("How and why the call ended"),
        )
        // Bot performance
        .field(
            FieldSpec::enumeration(
                "conversation_quality",
                ConversationQuality::TOKENS.iter().copied(),
            )
            .describe("Overall quality of the bot's handling"),
        )
        .field(
            FieldSpec::integer("quality_score")
                .range(1, 5)
                .describe("5 excellent, 4 good, 3 acceptable, 2 poor, 1 failed"),
        )
        .field(FieldSpec::boolean("bot_followed_protocol").describe(
            "Whether the bot searched the KB before troubleshooting, asked one question at a time, \
             collected triage details before ticketing and closed properly",
        ))
        .field(
            FieldSpec::boolean("bot_failure_occurred")
                .describe("Whether any bot failure or malfunction occurred"),
        )
        .field(
            FieldSpec::enumeration("bot_failure_type", BotFailureType::TOKENS.iter().copied())
                .describe("Type of bot failure, or none"),
        )
        .field(
            FieldSpec::string_list("protocol_violations")
                .with_default(empty_list())
                .describe("Specific protocol violations, e.g. ['skipped KB search']"),
        )
        // Urgent requests
        .field(
            FieldSpec::boolean("urgent_request")
                .describe("Whether the user indicated urgency (urgent, emergency, critical)"),
        )
        .field(
            FieldSpec::boolean("urgent_handled_correctly")
                .optional()
                .describe("If urgent, whether the urgent protocol was followed"),
        )
        // Multi-issue and edge cases
        .field(
            FieldSpec::boolean("multi_issue_conversation")
                .describe("Whether the user raised several separate issues"),
        )
        .field(
            FieldSpec::string_list("secondary_issues")
                .with_default(empty_list())
                .describe("Secondary issues, when multi_issue_conversation is true"),
        )
        .field(
            FieldSpec::boolean("third_party_request")
                .describe("Whether the caller was acting on behalf of someone else"),
        )
        .field(
            FieldSpec::boolean("technical_confusion")
                .describe("Whether the user was confused by technical terms"),
        )
        .build()
}

/// Failure to decode a record into [`ConversationAnalytics`].
#[derive(Debug, Error)]
pub enum AnalyticsDecodeError {
    #[error("Record belongs to domain '{found}', expected 'it_helpdesk'")]
    WrongDomain { found: String },

    #[error("Record does not match the helpdesk shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Typed view of a validated `it_helpdesk` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAnalytics {
    pub request_type: RequestType,
    pub incident_category: IncidentCategory,
    pub service_request_type: ServiceRequestType,
    pub issue_summary: String,
    pub issue_keywords: Vec<String>,

    pub resolution_status: ResolutionStatus,
    pub resolution_method: ResolutionMethod,
    pub resolution_provided: Option<String>,

    pub escalation_reason: EscalationReason,
    pub escalation_turn_number: Option<i64>,

    pub kb_search_performed: bool,
    pub kb_article_found: bool,
    pub kb_steps_attempted: Vec<String>,
    pub kb_steps_count: i64,
    pub kb_steps_successful: bool,

    pub form_provided: bool,
    pub form_type_provided: Option<ServiceRequestType>,
    pub form_url_sent: Option<String>,
    pub correct_form_provided: bool,

    pub ims_ticket_created: bool,
    pub ims_ticket_number: Option<String>,
    pub inc_ticket_created: bool,
    pub inc_ticket_number: Option<String>,

    pub total_turns: i64,
    pub user_turns: i64,
    pub assistant_turns: i64,
    pub conversation_ended_naturally: bool,

    pub user_sentiment: UserSentiment,
    pub satisfaction_score: i64,
    pub user_expressed_satisfaction: Option<bool>,
    pub user_expressed_frustration: bool,
    pub frustration_triggers: Vec<String>,
    pub call_end_reason: CallEndReason,

    pub conversation_quality: ConversationQuality,
    pub quality_score: i64,
    pub bot_followed_protocol: bool,
    pub bot_failure_occurred: bool,
    pub bot_failure_type: BotFailureType,
    pub protocol_violations: Vec<String>,

    pub urgent_request: bool,
    pub urgent_handled_correctly: Option<bool>,

    pub multi_issue_conversation: bool,
    pub secondary_issues: Vec<String>,
    pub third_party_request: bool,
    pub technical_confusion: bool,
}

impl ConversationAnalytics {
    /// Counts toward first call resolution and automation success.
    pub fn is_first_call_resolution(&self) -> bool {
        matches!(
            self.resolution_status,
            ResolutionStatus::ResolvedByBot | ResolutionStatus::ResolvedWithForm
        )
    }

    /// Escalations whose reason points at missing or weak KB content.
    pub fn indicates_kb_gap(&self) -> bool {
        matches!(
            self.escalation_reason,
            EscalationReason::KbStepsFailed
                | EscalationReason::NoKbArticleFound
                | EscalationReason::KbStepsInfeasible
        )
    }
}

impl TryFrom<&ResultRecord> for ConversationAnalytics {
    type Error = AnalyticsDecodeError;

    fn try_from(record: &ResultRecord) -> Result<Self, Self::Error> {
        if record.domain() != DOMAIN {
            return Err(AnalyticsDecodeError::WrongDomain {
                found: record.domain().to_string(),
            });
        }
        Ok(serde_json::from_value(record.to_json())?)
    }
}

//! Arbitration between the safety and intent signals.
//!
//! Safety decides tone and crisis flagging; it never changes the mode the
//! intent signal picked. Mode handlers read [`SafetyContext::is_crisis`] and
//! answer with [`crisis_response`] instead of generating free text.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::ResponseMode;
use crate::domain::foundation::Timestamp;

use super::values::{IntentResult, SafetyLevel, SafetyResult, Tone};

/// A support service offered to a user in crisis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrisisResource {
    pub name: String,
    pub contact: String,
    pub availability: String,
}

const CRISIS_RESOURCE_TABLE: [(&str, &str, &str); 3] = [
    ("988 Suicide & Crisis Lifeline", "Call or text 988", "24/7"),
    ("Crisis Text Line", "Text HOME to 741741", "24/7"),
    ("Emergency Services", "Call 911 or your local emergency number", "24/7"),
];

/// The fixed list of crisis resources. Always three entries.
pub fn crisis_resources() -> Vec<CrisisResource> {
    CRISIS_RESOURCE_TABLE
        .iter()
        .map(|(name, contact, availability)| CrisisResource {
            name: name.to_string(),
            contact: contact.to_string(),
            availability: availability.to_string(),
        })
        .collect()
}

/// Safety-derived instructions for the response generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyContext {
    pub level: SafetyLevel,
    pub tone: Tone,
    pub is_crisis: bool,
    pub crisis_resources: Option<Vec<CrisisResource>>,
}

impl SafetyContext {
    pub fn normal() -> Self {
        Self {
            level: SafetyLevel::Safe,
            tone: Tone::Normal,
            is_crisis: false,
            crisis_resources: None,
        }
    }
}

/// The single decision produced per turn from both signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbiterDecision {
    pub final_mode: ResponseMode,
    pub final_intent: String,
    pub safety_context: SafetyContext,
    pub override_reason: Option<String>,
    pub confidence: f64,
    pub timestamp: Timestamp,
}

/// Applies the priority rules: CRISIS, then CONCERN, then SAFE.
pub fn arbitrate(safety: &SafetyResult, intent: &IntentResult, now: Timestamp) -> ArbiterDecision {
    let final_mode = intent.suggested_mode.clone();
    let final_intent = intent.intent.clone();

    match safety.level {
        SafetyLevel::Crisis => ArbiterDecision {
            final_mode,
            final_intent,
            safety_context: SafetyContext {
                level: SafetyLevel::Crisis,
                tone: Tone::Urgent,
                is_crisis: true,
                crisis_resources: Some(crisis_resources()),
            },
            override_reason: Some(format!(
                "crisis signals detected: {}",
                if safety.signals.is_empty() {
                    "unspecified".to_string()
                } else {
                    safety.signals.join(", ")
                }
            )),
            confidence: 1.0,
            timestamp: now,
        },
        SafetyLevel::Concern => ArbiterDecision {
            final_mode,
            final_intent,
            safety_context: SafetyContext {
                level: SafetyLevel::Concern,
                tone: Tone::Empathetic,
                is_crisis: false,
                crisis_resources: None,
            },
            override_reason: None,
            confidence: intent.confidence,
            timestamp: now,
        },
        SafetyLevel::Safe => ArbiterDecision {
            final_mode,
            final_intent,
            safety_context: SafetyContext::normal(),
            override_reason: None,
            confidence: intent.confidence,
            timestamp: now,
        },
    }
}

/// Fixed reply used whenever a turn is flagged as a crisis.
pub fn crisis_response(resources: &[CrisisResource]) -> String {
    let mut reply = String::from(
        "I'm really sorry you're going through this, and I'm glad you told me. \
         Your safety matters most right now. Please reach out to someone who can help immediately:\n",
    );
    for resource in resources {
        reply.push_str(&format!(
            "\n- {}: {} ({})",
            resource.name, resource.contact, resource.availability
        ));
    }
    reply.push_str("\n\nIf you are in immediate danger, please contact emergency services now. I'm here to keep talking with you.");
    reply
}

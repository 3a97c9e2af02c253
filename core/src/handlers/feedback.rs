use serde::Serialize;
use serde_json::json;

use super::{ActionHandler, owned};
use crate::action::ActionName;
use crate::context::ActionContext;
use crate::envelope::Envelope;
use crate::response::Response;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

/// Two disjoint keyword sets matched as case-insensitive substrings.
#[derive(Debug, Clone)]
pub struct FeedbackKeywords {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl FeedbackKeywords {
    pub fn standard() -> Self {
        Self {
            positive: owned(&["great", "excellent", "amazing", "good", "love", "perfect"]),
            negative: owned(&["bad", "poor", "terrible", "slow", "cold", "wrong"]),
        }
    }

    /// Positive is checked first, so a message hitting both sets is positive.
    pub fn classify(&self, message: &str) -> Sentiment {
        let message = message.to_lowercase();
        let hits = |words: &[String]| words.iter().any(|w| message.contains(&w.to_lowercase()));
        if hits(&self.positive) {
            Sentiment::Positive
        } else if hits(&self.negative) {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

pub struct HandleFeedback {
    keywords: FeedbackKeywords,
}

impl HandleFeedback {
    pub fn new(keywords: FeedbackKeywords) -> Self {
        Self { keywords }
    }
}

impl ActionHandler for HandleFeedback {
    fn name(&self) -> ActionName {
        ActionName::HandleFeedback
    }

    fn run(&self, envelope: &Envelope, ctx: &ActionContext) -> Response {
        let message = envelope.latest_message.text.as_str();
        let sentiment = self.keywords.classify(message);
        tracing::info!(
            parent: &ctx.span,
            sentiment = sentiment.as_str(),
            feedback = message,
            "feedback received"
        );

        let lowered = message.to_lowercase();
        let text = match sentiment {
            Sentiment::Positive => {
                let mut text = String::from(
                    "Thank you for your wonderful feedback! We're delighted to hear you enjoyed your experience.",
                );
                if lowered.contains("service") {
                    text.push_str(" Our team takes great pride in providing exceptional service.");
                } else if lowered.contains("food") {
                    text.push_str(" Our chef will be thrilled to hear your appreciation.");
                }
                text
            }
            Sentiment::Negative => "I sincerely apologize for any disappointment. Your feedback is invaluable to us. \
                 Would you like to speak with a manager to address your concerns?"
                .to_string(),
            Sentiment::Neutral => "Thank you for sharing your feedback. We value your input and continuously strive to improve."
                .to_string(),
        };

        Response::text(text).with_custom(
            "feedback_data",
            json!({
                "sentiment": sentiment,
                "timestamp": envelope.get_slot("timestamp"),
                "user_id": envelope.sender_id,
            }),
        )
    }
}

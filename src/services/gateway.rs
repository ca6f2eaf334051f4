//! LLM gateway — the three product-level operations built on [`LlmChat`].
//!
//! DESIGN
//! ======
//! `stream` is the only fallible operation: its errors are the caller's to
//! log. `summarize_followups` and `structured_expand` substitute fixed
//! fallbacks instead of failing, so callers never branch on them.
//! Nothing here retries.

use std::sync::Arc;

use tracing::{info, warn};

use super::badges::{self, BadgeSource};
use super::expand::{self, Section};
use crate::llm::LlmChat;
use crate::llm::types::{ChatMessage, ChatRequest, LlmError, TextStream, Tier, TierModels};

const SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant in a swipe-based terminal interface.

The user is just swiping, they can't answer questions.

Always respond directly to the user's question. Do NOT ask unrelated questions or change the topic.

You should provide helpful information on a wide range of topics including health, science, technology, and general knowledge. For health questions, provide informative, factual responses while noting that users should consult healthcare professionals for personalized advice.

Keep ALL responses short enough to fit on screen without scrolling. Maximum 8-10 lines of text.

Use markdown formatting in your response for better readability.

If you're confused don't make up an answer, just say \"I'm not sure\".

Don't do meta-reasoning, just answer the question. Don't mention your inner workings.
You receive the conversation history so you don't repeat earlier ideas, but treat each response as self-contained.";

pub struct Gateway {
    llm: Arc<dyn LlmChat>,
    models: TierModels,
    badge_source: BadgeSource,
}

impl Gateway {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmChat>, models: TierModels, badge_source: BadgeSource) -> Self {
        Self { llm, models, badge_source }
    }

    #[must_use]
    pub fn models(&self) -> &TierModels {
        &self.models
    }

    #[must_use]
    pub fn model_for(&self, tier: Tier) -> &str {
        self.models.model_for(tier)
    }

    /// Prepend the persona system prompt and open a token stream on the
    /// tier's model.
    ///
    /// # Errors
    ///
    /// Returns the provider error if the upstream call is rejected.
    pub async fn stream(&self, conversation: &[ChatMessage], tier: Tier) -> Result<TextStream, LlmError> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(conversation.iter().cloned());

        let model = self.model_for(tier);
        info!(tier = tier.as_str(), %model, turns = conversation.len(), "gateway: stream");
        self.llm.stream(&ChatRequest::new(model, messages)).await
    }

    /// Up to three follow-up topics for a finished answer.
    pub async fn summarize_followups(&self, question: &str, response: &str) -> Vec<String> {
        if self.badge_source == BadgeSource::Heuristic {
            return badges::heuristic_badges(question, response);
        }

        let request = ChatRequest::new(self.model_for(Tier::Fast), badges::followup_messages(question, response))
            .with_max_tokens(badges::BADGE_MAX_TOKENS)
            .with_temperature(badges::BADGE_TEMPERATURE);

        match self.llm.complete(&request).await {
            Ok(reply) => badges::parse_badges(&reply).unwrap_or_else(|| {
                warn!(reply_len = reply.len(), "gateway: unparsable badge reply, using fallback");
                badges::fallback_badges()
            }),
            Err(e) => {
                warn!(error = %e, "gateway: badge request failed, using fallback");
                badges::fallback_badges()
            }
        }
    }

    /// Expansion split into titled sections. Empty only on transport failure.
    pub async fn structured_expand(&self, conversation: &[ChatMessage]) -> Vec<Section> {
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
        messages.extend(expand::expand_messages(conversation));
        let request = ChatRequest::new(self.model_for(Tier::Slow), messages);

        match self.llm.complete(&request).await {
            Ok(reply) => expand::parse_sections(&reply),
            Err(e) => {
                warn!(error = %e, "gateway: structured expansion failed");
                Vec::new()
            }
        }
    }
}


#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;

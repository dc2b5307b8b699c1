// Answer pipeline
// One invocation per user question: retrieve, assemble context, build the
// message sequence, complete, shape the output. Strictly sequential. The
// pipeline never mutates history; the caller appends the finished turn.


use tracing::{debug, warn};

use crate::Result;
use crate::chat::{ChatCompleter, ChatMessage};
use crate::context::{format_context, sources_block};
use crate::history::ConversationTurn;
use crate::index::VectorIndex;

pub const SYSTEM_PROMPT: &str = "You are answering questions using the provided project documents.\n\
Use the context to answer. If the context does not contain the answer, say you do not know.\n\
Cite sources using bracket numbers like [1] or [2].\n\
You have access to the conversation history so you can resolve references to earlier questions and answers.";

pub const NO_RESULTS_MESSAGE: &str = "No relevant documents were found for your question. \
Try rephrasing or check that the document set covers this topic.";

/// The shaped result of one pipeline invocation. `display` carries the
/// sources block for printing; `raw` is what the caller stores in history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub display: String,
    pub raw: String,
}

impl Answer {
    fn uniform(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            display: text.clone(),
            raw: text,
        }
    }
}

/// Retrieve relevant chunks for `question` and generate a cited answer.
///
/// Completion failures are absorbed: the failure reason becomes both the
/// displayed text and the raw answer, so future context stays consistent
/// with what was shown. Retrieval and index errors propagate to the
/// caller's loop boundary.
#[inline]
pub async fn answer_question(
    index: &VectorIndex,
    question: &str,
    history_window: &[ConversationTurn],
    completer: &dyn ChatCompleter,
    top_k: usize,
) -> Result<Answer> {
    let retrieved = index.query(question, top_k).await?;

    if retrieved.is_empty() {
        debug!("No chunks retrieved, short-circuiting without a completion call");
        return Ok(Answer::uniform(NO_RESULTS_MESSAGE));
    }

    let (context, citations) = format_context(&retrieved);
    let messages = build_messages(question, &context, history_window);

    debug!(
        "Requesting completion with {} messages ({} retrieved chunks, {} history turns)",
        messages.len(),
        retrieved.len(),
        history_window.len()
    );

    let raw_answer = match completer.complete(&messages) {
        Ok(text) => text,
        Err(e) => {
            warn!("Chat completion failed: {:#}", e);
            return Ok(Answer::uniform(format!("LLM call failed: {:#}", e)));
        }
    };

    let display = format!("{}\n\n{}", raw_answer, sources_block(&citations));

    Ok(Answer {
        display,
        raw: raw_answer,
    })
}

/// Assemble the message sequence: the fixed system instruction, then the
/// history window expanded to user/assistant pairs in chronological order,
/// then the current question with its context block under labeled headers.
#[inline]
pub fn build_messages(
    question: &str,
    context: &str,
    history_window: &[ConversationTurn],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history_window.len() * 2 + 2);
    messages.push(ChatMessage::system(SYSTEM_PROMPT));

    for turn in history_window {
        messages.push(ChatMessage::user(turn.question.clone()));
        messages.push(ChatMessage::assistant(turn.answer.clone()));
    }

    messages.push(ChatMessage::user(format!(
        "Question:\n{}\n\nContext:\n{}",
        question, context
    )));

    messages
}

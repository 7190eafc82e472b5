use conductor_domain::message::Message;

/// Approximate token count for a chunk of text.
///
/// No tokenizer is wired into this crate — providers disagree on
/// tokenization anyway, and the budget only needs to be right within a
/// margin that keeps requests under a provider's context window. Four
/// characters per token is the common rule-of-thumb estimate for English
/// prose.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() as f64 / 4.0).ceil() as usize
}

/// Approximate token count for one message: its text content plus a small
/// fixed overhead for role/structure framing, and the serialized size of
/// any tool call/result payload.
pub fn estimate_message_tokens(message: &Message) -> usize {
    let mut total = 4; // role + message framing overhead
    total += estimate_tokens(&message.all_text());

    if let Some(calls) = &message.tool_calls {
        for call in calls {
            total += estimate_tokens(&call.name);
            total += estimate_tokens(&call.arguments.to_string());
        }
    }
    if let Some(result) = &message.tool_result {
        total += estimate_tokens(&result.content);
    }

    total
}

pub fn estimate_total(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

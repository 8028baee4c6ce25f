use serde_json::{json, Value};

use crate::prompts::with_command_prompt;
use crate::traits::ChatRequest;

/// Body of a `chat/completions` call
///
/// `model` is `None` for deployment-addressed backends, where the URL already
/// names the model.
pub(crate) fn build_chat_payload(request: &ChatRequest, model: Option<&str>, stream: bool) -> Value {
    let messages = with_command_prompt(&request.messages, request.command.as_deref());

    let mut payload = json!({
        "messages": messages,
        "temperature": request.options.temperature,
        "max_tokens": request.options.max_tokens,
        "stream": stream,
    });

    if let (Some(model), Some(obj)) = (model, payload.as_object_mut()) {
        obj.insert("model".to_string(), json!(model));
    }

    payload
}

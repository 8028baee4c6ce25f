use crate::types::Message;

/// Slash commands and the system prompt each one prepends
const COMMAND_PROMPTS: &[(&str, &str)] = &[
    (
        "/explain",
        "You are a helpful coding assistant. Explain the provided code clearly and concisely.",
    ),
    (
        "/refactor",
        "You are an expert code refactorer. Improve the provided code for readability, performance, and maintainability.",
    ),
    (
        "/tests",
        "You are a test-driven development expert. Generate comprehensive unit tests for the provided code.",
    ),
    (
        "/summarize",
        "You are a concise technical writer. Summarize the key points of our conversation.",
    ),
];

/// Look up the system prompt for a command; `explain` and `/explain` are equivalent
pub fn system_prompt_for(command: &str) -> Option<&'static str> {
    let name = command.trim().trim_start_matches('/');
    COMMAND_PROMPTS
        .iter()
        .find(|(cmd, _)| cmd.trim_start_matches('/') == name)
        .map(|(_, prompt)| *prompt)
}

/// Prepend the command's system prompt, if any, to the conversation
pub fn with_command_prompt(messages: &[Message], command: Option<&str>) -> Vec<Message> {
    let prompt = command.and_then(system_prompt_for);
    let mut result = Vec::with_capacity(messages.len() + usize::from(prompt.is_some()));

    if let Some(prompt) = prompt {
        result.push(Message::system(prompt));
    }
    result.extend_from_slice(messages);
    result
}

//! Prompt assembly.

use hottake_core::message::Message;
use hottake_core::style::Style;

/// System + user messages for one generation.
pub fn build_messages(style: Style, topic: &str, context: Option<&str>) -> Vec<Message> {
    vec![
        Message::system(style.system_prompt(context.is_some())),
        Message::user(user_prompt(topic, context)),
    ]
}

pub fn user_prompt(topic: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!(
            "Topic: {topic}\n\n\
             Recent news context:\n\
             {context}\n\n\
             Instructions:\n\
             - Base your take on the strongest evidence in the context.\n\
             - Ignore low-signal details and unsupported claims.\n\
             - If sources disagree, briefly note the tension.\n\
             - Keep it punchy, but fact-grounded.\n\n\
             Generate a hot take about: {topic}"
        ),
        None => format!("Generate a hot take about: {topic}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hottake_core::message::Role;

    #[test]
    fn plain_prompt_without_context() {
        let messages = build_messages(Style::Witty, "cats", None);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, Style::Witty.system_prompt(false));
        assert_eq!(messages[1].content, "Generate a hot take about: cats");
    }

    #[test]
    fn context_prompt_carries_grounding_instructions() {
        let messages = build_messages(Style::Analytical, "AI", Some("Web search results:\n..."));
        assert_eq!(messages[0].content, Style::Analytical.system_prompt(true));

        let user = &messages[1].content;
        assert!(user.starts_with("Topic: AI\n\nRecent news context:\nWeb search results:"));
        assert!(user.contains("\n- If sources disagree, briefly note the tension.\n"));
        assert!(user.ends_with("\n\nGenerate a hot take about: AI"));
    }
}

use crate::config::PromptStyle;
use crate::model::knowledge::KnowledgeBase;
use crate::model::message::Message;

/// Builds the grounding prompt sent to the model.
/// Only formats text: no networking, no session state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    pub style: PromptStyle,
    /// Prefix limit applied to the knowledge text, in characters.
    pub max_knowledge_chars: Option<usize>,
}

impl PromptBuilder {
    pub fn new(style: PromptStyle, max_knowledge_chars: Option<usize>) -> Self {
        Self { style, max_knowledge_chars }
    }

    pub fn build(&self, knowledge: &KnowledgeBase, history: &[Message], user_input: &str) -> String {
        let knowledge = knowledge.excerpt(self.max_knowledge_chars);
        let mut prompt = String::with_capacity(knowledge.len() + 256);

        match self.style {
            PromptStyle::Grounded => {
                push_grounded_header(&mut prompt, knowledge);
                prompt.push_str("Previous chat history:\n");
                push_history_lines(&mut prompt, history);
                push_question(&mut prompt, user_input, "Answer based on the knowledge above.");
            }
            PromptStyle::Strict => {
                push_strict_header(&mut prompt, knowledge);
                push_history_lines(&mut prompt, history);
                push_question(
                    &mut prompt,
                    user_input,
                    "Answer based ONLY on the knowledge base above.",
                );
            }
        }

        prompt
    }
}

fn push_grounded_header(prompt: &mut String, knowledge: &str) {
    prompt.push_str("Use the following knowledge base to answer the user's question:\n\n");
    prompt.push_str(knowledge);
    prompt.push_str("\n\n");
}

fn push_strict_header(prompt: &mut String, knowledge: &str) {
    prompt.push_str("Knowledge base:\n");
    prompt.push_str(knowledge);
    prompt.push_str("\n\n");
}

fn push_history_lines(prompt: &mut String, history: &[Message]) {
    for msg in history {
        prompt.push_str(msg.role.label());
        prompt.push_str(": ");
        prompt.push_str(&msg.content);
        prompt.push('\n');
    }
}

fn push_question(prompt: &mut String, user_input: &str, instruction: &str) {
    prompt.push_str("User: ");
    prompt.push_str(user_input);
    prompt.push('\n');
    prompt.push_str(instruction);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transcript::{Transcript, WELCOME_MESSAGE};

    fn history() -> Transcript {
        let mut t = Transcript::new();
        t.push(Message::user("What is a resistor?"));
        t.push(Message::assistant("A component that limits current."));
        t
    }

    #[test]
    fn grounded_prompt_layout() {
        let kb = KnowledgeBase::new("Ohm's law: V = I * R");
        let prompt = PromptBuilder::default().build(&kb, history().messages(), "And a capacitor?");

        let expected = format!(
            "Use the following knowledge base to answer the user's question:\n\n\
             Ohm's law: V = I * R\n\n\
             Previous chat history:\n\
             System: {welcome}\n\
             User: What is a resistor?\n\
             Assistant: A component that limits current.\n\
             User: And a capacitor?\n\
             Answer based on the knowledge above.",
            welcome = WELCOME_MESSAGE,
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn strict_prompt_layout() {
        let kb = KnowledgeBase::new("Uno: 14 digital pins");
        let builder = PromptBuilder::new(PromptStyle::Strict, None);
        let prompt = builder.build(&kb, &[], "How many pins?");

        assert_eq!(
            prompt,
            "Knowledge base:\nUno: 14 digital pins\n\nUser: How many pins?\n\
             Answer based ONLY on the knowledge base above."
        );
    }

    #[test]
    fn truncates_knowledge_to_prefix() {
        let kb = KnowledgeBase::new("0123456789SECRET-TAIL");
        let builder = PromptBuilder::new(PromptStyle::Grounded, Some(10));
        let prompt = builder.build(&kb, &[], "q");

        assert!(prompt.contains("0123456789\n\n"));
        assert!(!prompt.contains("SECRET-TAIL"));
    }

    #[test]
    fn zero_limit_keeps_knowledge() {
        let kb = KnowledgeBase::new("ATmega328P datasheet");
        let builder = PromptBuilder::new(PromptStyle::Grounded, Some(0));
        let prompt = builder.build(&kb, &[], "Which chip?");

        assert!(prompt.contains("ATmega328P datasheet"));
    }

    #[test]
    fn knowledge_then_history_then_input() {
        let kb = KnowledgeBase::new("KB-MARKER");
        let prompt = PromptBuilder::default().build(&kb, history().messages(), "NEW-QUESTION");

        let kb_at = prompt.find("KB-MARKER").unwrap();
        let welcome_at = prompt.find(WELCOME_MESSAGE).unwrap();
        let first_at = prompt.find("What is a resistor?").unwrap();
        let second_at = prompt.find("limits current").unwrap();
        let input_at = prompt.find("User: NEW-QUESTION").unwrap();

        assert!(kb_at < welcome_at);
        assert!(welcome_at < first_at);
        assert!(first_at < second_at);
        assert!(second_at < input_at);
    }
}

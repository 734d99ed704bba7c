use crate::generate::Prompt;

/// Returned verbatim when retrieval finds nothing, and demanded from the
/// model when the context does not cover the question.
pub const FALLBACK_RESPONSE: &str = "Sorry, I do not have access to this information.";

/// Returned when the pipeline fails.
pub const APOLOGY_RESPONSE: &str =
    "I apologize, but I encountered an error while processing your question. Please try again.";

const SYSTEM_TEMPLATE: &str = "You are Lorekeeper, a developer onboarding assistant. You help new \
developers understand codebases, documentation and internal processes.

RULES:
1. Answer ONLY from the context below.
2. If the context does not contain enough information, reply exactly: \"{fallback}\"
3. Do not use outside knowledge and do not guess.
4. Cite the sources you use by number, for example \"According to Source 1\".
5. Use markdown, with bullet points and code blocks where they help.

Context from the knowledge base:
{context}

Answer only from the context above. If it is not enough, reply \"{fallback}\"";

pub fn build_prompt(question: &str, context: &str) -> Prompt {
    let system = SYSTEM_TEMPLATE
        .replace("{fallback}", FALLBACK_RESPONSE)
        .replace("{context}", context);
    let user = format!(
        "Using the context provided, answer the following question.\n\n\
         **Question:** {question}\n\n\
         Reference the sources you rely on and keep the answer specific and actionable."
    );
    Prompt::new(system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_carries_context_question_and_fallback() {
        let prompt = build_prompt("How do I deploy?", "[Source 1] Title: Deploy\nrun make deploy\n");
        assert!(prompt.system.contains("[Source 1] Title: Deploy"));
        assert!(prompt.system.contains(FALLBACK_RESPONSE));
        assert!(!prompt.system.contains("{context}"));
        assert!(prompt.user.contains("**Question:** How do I deploy?"));
    }

    #[test]
    fn test_context_braces_are_not_template_slots() {
        let prompt = build_prompt("q", "fn f() { {fallback} }");
        assert!(prompt.system.contains("fn f() { {fallback} }"));
    }
}

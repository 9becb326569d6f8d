//! Rewrite prompt construction and model output cleanup.

use crate::persona::PersonaProfile;

/// Build the single user message sent to the text generation model.
pub fn build_prompt(text: &str, persona: &PersonaProfile) -> String {
    let style = persona.prompt_description;
    format!(
        "You are a text transformation engine specializing in preparing text for high-quality \
Text-to-Speech (TTS) synthesis.
Your task is to rewrite the following text while maintaining its core meaning, but adopting the \
persona and speaking style of {style}
The output must be formatted for natural spoken delivery:
- Use natural-sounding phrasing consistent with the persona.
- Use punctuation (commas, periods, exclamation marks, question marks) to guide intonation, \
rhythm and pauses the way this persona would speak.
- Break very long sentences into shorter ones where that helps delivery.
- Match vocabulary and sentence structure to the persona.
- Avoid conversational filler unless it is part of the persona.
Do NOT add any introductory phrases (\"Here's the text:\"), concluding remarks, explanations, \
apologies, or markdown formatting (like quotes or asterisks). Output ONLY the raw, transformed \
text suitable for direct TTS input.

Original Text:
\"{text}\"

Rewrite the text in the style of {style}, optimized for speech synthesis:",
        text = text.trim(),
    )
}

/// Strip wrappers models add despite instructions.
///
/// Removes code fences, a leading "Here's the text:" preamble, trailing
/// "Note:" commentary and matching surrounding quotes. Returns an empty
/// string if nothing usable remains.
pub fn clean_output(raw: &str) -> String {
    let mut text = raw.trim();

    text = strip_code_fence(text);
    text = strip_preamble(text);
    text = strip_trailing_note(text);
    text = strip_quotes(text);

    text.trim().to_string()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn strip_preamble(text: &str) -> &str {
    let first_line = text.lines().next().unwrap_or_default();
    let lowered = first_line.to_lowercase().replace('\u{2019}', "'");
    if !(lowered.starts_with("here's") || lowered.starts_with("here is")) {
        return text;
    }
    // The preamble runs up to the first colon, on its own line or inline
    match first_line.find(':') {
        Some(colon) => text[colon + 1..].trim(),
        None => text,
    }
}

fn strip_trailing_note(text: &str) -> &str {
    for marker in ["\nNote:", "\n(Note", "\n*Note", "\nNOTE:"] {
        if let Some(index) = text.rfind(marker) {
            let head = text[..index].trim_end();
            if !head.is_empty() {
                return head;
            }
        }
    }
    text
}

fn strip_quotes(text: &str) -> &str {
    const PAIRS: &[(char, char)] = &[('"', '"'), ('“', '”'), ('\'', '\''), ('`', '`')];
    let mut text = text.trim();
    loop {
        let stripped = PAIRS.iter().find_map(|&(open, close)| {
            let inner = text.strip_prefix(open)?.strip_suffix(close)?;
            // Only a wrapper if the quote does not also appear inside
            (!inner.contains(close)).then_some(inner.trim())
        });
        match stripped {
            Some("") => return "",
            Some(inner) => text = inner,
            None => return text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::get_persona;

    #[test]
    fn prompt_quotes_text_and_embeds_persona_twice() {
        let persona = get_persona("pirate").unwrap();
        let prompt = build_prompt("  hello world \n", persona);

        assert!(prompt.contains("Original Text:\n\"hello world\""));
        assert_eq!(prompt.matches(persona.prompt_description).count(), 2);
        assert!(prompt.contains("Do NOT add any introductory phrases"));
        assert!(prompt.ends_with("optimized for speech synthesis:"));
    }

    #[test]
    fn clean_strips_surrounding_quotes() {
        assert_eq!(clean_output("\"Arrr, hello world!\""), "Arrr, hello world!");
        assert_eq!(clean_output("“Ahoy there.”"), "Ahoy there.");
        assert_eq!(clean_output("  '\"nested\"'  "), "nested");
    }

    #[test]
    fn clean_keeps_inner_quotes() {
        let text = "\"Arrr,\" he said, \"hello.\"";
        assert_eq!(clean_output(text), text);
    }

    #[test]
    fn clean_strips_preamble_line() {
        let raw = "Here's the text in the requested style:\nArrr, hello world!";
        assert_eq!(clean_output(raw), "Arrr, hello world!");

        let raw = "Here is the rewritten text:\n\"Ahoy!\"";
        assert_eq!(clean_output(raw), "Ahoy!");
    }

    #[test]
    fn clean_strips_inline_preamble_before_quotes() {
        let raw = "Here's the text: \"Arrr, hello world!\"";
        assert_eq!(clean_output(raw), "Arrr, hello world!");

        let raw = "Here is the rewritten version: Ahoy, matey.";
        assert_eq!(clean_output(raw), "Ahoy, matey.");
    }

    #[test]
    fn clean_strips_preamble_with_typographic_apostrophe() {
        let raw = "Here\u{2019}s the text:\nArrr, hello world!";
        assert_eq!(clean_output(raw), "Arrr, hello world!");

        let raw = "HERE\u{2019}S THE TEXT: \u{201c}Arrr!\u{201d}";
        assert_eq!(clean_output(raw), "Arrr!");
    }

    #[test]
    fn clean_keeps_first_line_that_is_content() {
        let raw = "Here's to the sea\nand all who sail her.";
        assert_eq!(clean_output(raw), raw);
    }

    #[test]
    fn clean_strips_trailing_note() {
        let raw = "Arrr, hello world!\n\nNote: I added nautical flavor.";
        assert_eq!(clean_output(raw), "Arrr, hello world!");

        let raw = "Ahoy!\n(Note: shortened for delivery)";
        assert_eq!(clean_output(raw), "Ahoy!");
    }

    #[test]
    fn clean_strips_code_fence() {
        let raw = "```text\nArrr, hello world!\n```";
        assert_eq!(clean_output(raw), "Arrr, hello world!");
    }

    #[test]
    fn clean_leaves_plain_text_alone() {
        assert_eq!(clean_output("  Ahoy, matey.  "), "Ahoy, matey.");
    }

    #[test]
    fn clean_of_only_wrappers_is_empty() {
        assert_eq!(clean_output("   "), "");
        assert_eq!(clean_output("\"\""), "");
        assert_eq!(clean_output("```\n```"), "");
    }
}

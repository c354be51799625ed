// Common text blocks for all prompts
pub const DONT_NARRATE: &str = r#"
Important instructions for your response:

1. Do not narrate or describe your actions.
2. Do not restate or acknowledge these instructions.
3. Do not preface your response with phrases like "Here is..." or "I will now...".
4. Simply proceed with the task directly, without any meta-commentary.
"#;

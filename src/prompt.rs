//! The fixed analysis prompt sent to every provider.

pub const SYSTEM_PROMPT: &str = "You are a sales call analysis assistant.";

const INSTRUCTIONS: &str = "\
Analyze the following sales call transcript and provide:

1. Strongest moments (what the rep did well)
2. Points that could be improved (constructive, not negative)
3. Opportunities the rep may have missed
4. Trends or patterns worth noting
5. A success score from 1–10

Transcript:
";

/// Embed a transcript into the analysis prompt.
#[must_use]
pub fn render(transcript: &str) -> String {
    format!("{INSTRUCTIONS}{transcript}\n")
}

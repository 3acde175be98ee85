// Prompt fragments shared by every stage that calls the model.
// Stage-specific prompts live in each stage's own prompts.rs.

/// Output contract appended to every system prompt. Replies are still run
/// through `extract_json_object`, so stray prose or fences are tolerated.
pub const JSON_ONLY_SYSTEM: &str = "Reply with exactly one JSON object and nothing else: \
    no markdown code fences, no commentary before or after it, no apologies.";

/// Builds a system prompt from a role description plus the JSON contract.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_SYSTEM}")
}

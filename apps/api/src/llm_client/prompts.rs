// Shared prompt fragments. Each service that needs oracle calls defines its
// own prompts.rs alongside it; this file contains cross-cutting pieces only.

/// Preamble that enforces JSON-only output. Gemini's generateContent call has
/// no separate system slot in this wire shape, so the instruction is prepended
/// to the user prompt.
pub const JSON_ONLY_PREAMBLE: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON payload. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

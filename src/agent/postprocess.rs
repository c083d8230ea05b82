//! Best-effort cleanup of raw model output.

pub const FALLBACK_RESPONSE: &str = "I'm not sure about that. Could you rephrase your question?";

const ROLE_PREFIXES: [&str; 7] = [
    "Bot:",
    "bot:",
    "Bot :",
    "bot :",
    "BOT:",
    "Assistant:",
    "assistant:",
];

const MIN_RESPONSE_CHARS: usize = 3;

/// Strips a leading role label and stray `Bot:` markers, substituting a
/// fallback when too little text survives.
pub fn clean_response(raw: &str) -> String {
    let mut response = raw.trim();

    if let Some(rest) = ROLE_PREFIXES.iter().find_map(|prefix| response.strip_prefix(prefix)) {
        response = rest.trim();
    }

    let response = response.replace("Bot:", "").replace("bot:", "");
    let response = response.trim();

    if response.chars().count() < MIN_RESPONSE_CHARS {
        return FALLBACK_RESPONSE.to_string();
    }

    response.to_string()
}

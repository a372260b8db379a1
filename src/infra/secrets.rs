use std::panic;

const REDACTED: &str = "[REDACTED]";

const SENSITIVE_MARKERS: [&str; 6] = [
    "password",
    "secret",
    "token",
    "bearer",
    "authorization",
    "apikey",
];

pub fn redact_text(input: &str) -> String {
    let mut redact_next = false;

    input
        .split_whitespace()
        .map(|chunk| {
            let lowered = chunk.to_ascii_lowercase();
            // `Bearer <jwt>` carries the secret in the following word.
            let scrubbed = if redact_next || is_sensitive(&lowered) || looks_like_jwt(chunk) {
                REDACTED.to_owned()
            } else {
                chunk.to_owned()
            };
            redact_next = lowered.trim_end_matches(':') == "bearer";
            scrubbed
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn install_panic_redaction_hook() {
    panic::set_hook(Box::new(|panic_info| {
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic payload omitted".to_owned());

        let scrubbed = redact_text(&payload);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "gigchat panic: {} at {}:{}:{}",
                scrubbed,
                location.file(),
                location.line(),
                location.column()
            );
        } else {
            eprintln!("gigchat panic: {}", scrubbed);
        }
    }));
}

fn is_sensitive(lowered: &str) -> bool {
    SENSITIVE_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn looks_like_jwt(value: &str) -> bool {
    let cleaned = value.trim_matches(|ch: char| !ch.is_ascii_alphanumeric());
    cleaned.starts_with("eyJ") && cleaned.matches('.').count() >= 2
}

use std::fmt::Write;

use certctl::SetupResult;

const COMPLETED_ACTIONS: [&str; 4] = [
    "PKI backend mounted",
    "Root CA generated",
    "PKI role created",
    "PKI policy created",
];

pub(crate) fn print_setup_summary(result: &SetupResult, token_ttl: &str) {
    print!("{}", format_setup_summary(result, token_ttl));
}

pub(crate) fn format_setup_summary(result: &SetupResult, token_ttl: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Set up cluster for ID '{}':", result.cluster_id);
    out.push('\n');
    for action in COMPLETED_ACTIONS {
        let _ = writeln!(out, "    - {action}");
    }
    out.push('\n');
    out.push_str("The following tokens have been generated for this cluster:\n");
    out.push('\n');
    for token in &result.tokens {
        let _ = writeln!(out, "    {token}");
    }
    if let Some(ttl) = humanize_ttl(token_ttl) {
        let _ = writeln!(out, "\nTokens expire after {ttl}.");
    }
    out.push('\n');
    out
}

fn humanize_ttl(ttl: &str) -> Option<String> {
    let duration = humantime::parse_duration(ttl.trim()).ok()?;
    Some(humantime::format_duration(duration).to_string())
}

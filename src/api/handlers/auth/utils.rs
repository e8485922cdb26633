use axum::http::HeaderMap;

/// Lowercase and trim an email address for comparisons and storage.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Build the recovery URL pointing at the frontend sign-in page.
pub(super) fn build_recovery_url(base_url: &str, token: &str) -> String {
    let base = base_url.trim_end_matches('/');

    format!("{base}/admin/recover?token={token}")
}

/// Best-effort client IP from proxy headers, for log context only.
pub(super) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let trimmed = first.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }

    None
}

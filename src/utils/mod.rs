pub mod validation;

pub use validation::ValidatedJson;

/// Uppercase and trim an invite code for exact matching.
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Derive a display name from the local part of an email address:
/// "jo.ann-smith@example.com" becomes "Jo Ann Smith".
pub fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let parts: Vec<String> = local
        .split(['.', '_', '-'])
        .filter(|p| !p.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if parts.is_empty() {
        "User".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_normalize_to_uppercase() {
        assert_eq!(normalize_invite_code("  family2024 "), "FAMILY2024");
        assert_eq!(normalize_invite_code("Friends"), "FRIENDS");
    }

    #[test]
    fn display_name_title_cases_separators() {
        assert_eq!(
            display_name_from_email("jo.ann-smith@example.com"),
            "Jo Ann Smith"
        );
        assert_eq!(display_name_from_email("grandpa@example.com"), "Grandpa");
        assert_eq!(display_name_from_email("a_b@x.org"), "A B");
    }

    #[test]
    fn degenerate_emails_still_produce_a_name() {
        assert_eq!(display_name_from_email("@example.com"), "User");
        assert_eq!(display_name_from_email("..@example.com"), "User");
    }
}

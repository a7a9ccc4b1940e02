//! Utility functions

use super::constants::SLUG_MAX_LENGTH;

/// Derives a URL-safe tenant slug from an organization name: lowercased,
/// runs of non-alphanumeric characters collapsed to single hyphens, trimmed,
/// capped at [`SLUG_MAX_LENGTH`].
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    let slug = slug.trim_matches('-');
    slug.chars().take(SLUG_MAX_LENGTH).collect()
}

pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        if local.len() <= 2 {
            format!("{}***{}", &local[..1], domain)
        } else {
            format!("{}***{}", &local[..2], domain)
        }
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Acme, Inc."), "acme-inc");
        assert_eq!(slugify("  Nova   Talento  "), "nova-talento");
    }

    #[test]
    fn slugify_caps_length() {
        let long = "x".repeat(80);
        assert_eq!(slugify(&long).len(), SLUG_MAX_LENGTH);
    }

    #[test]
    fn slugify_handles_only_symbols() {
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn mask_email_keeps_domain() {
        assert_eq!(mask_email("someone@example.com"), "so***@example.com");
        assert_eq!(mask_email("a@example.com"), "a***@example.com");
    }
}

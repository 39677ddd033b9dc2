//! Small helpers shared across handlers: money formatting, slugs,
//! token/code generation, file naming.

use rand::RngCore;

/// Render cents as a fixed-point 2-decimal string ("1200" cents -> "12.00").
/// This is the amount format the payment gateway and CSV export expect.
pub fn cents_to_decimal(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Generate a URL-friendly slug: lowercase, non-alphanumerics collapsed
/// to single hyphens, trimmed.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_hyphen = true;
    for c in input.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Human-facing order code: "ORD-" + 16 uppercase hex chars (8 random bytes).
pub fn generate_order_code() -> String {
    let mut bytes = [0u8; 8];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("ORD-{}", hex::encode_upper(bytes))
}

/// Download token: 32 random bytes, hex-encoded (64 chars).
pub fn generate_download_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Session token for admin auth: 32 random bytes, hex-encoded.
pub fn generate_session_token() -> String {
    generate_download_token()
}

/// Format a byte count for display ("1.25 MB", "512 bytes").
pub fn format_file_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    const KB: u64 = 1024;
    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Lowercased extension of a filename, if any.
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Unique storage filename: slugged stem + short random suffix + extension.
pub fn unique_filename(original: &str) -> String {
    let stem = std::path::Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let mut suffix = [0u8; 6];
    rand::rngs::OsRng.fill_bytes(&mut suffix);
    match file_extension(original) {
        Some(ext) => format!("{}-{}.{}", slugify(stem), hex::encode(suffix), ext),
        None => format!("{}-{}", slugify(stem), hex::encode(suffix)),
    }
}

/// Minimal shape check; real validation is the confirmation email.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_to_decimal() {
        assert_eq!(cents_to_decimal(1200), "12.00");
        assert_eq!(cents_to_decimal(5), "0.05");
        assert_eq!(cents_to_decimal(0), "0.00");
        assert_eq!(cents_to_decimal(99999), "999.99");
        assert_eq!(cents_to_decimal(-150), "-1.50");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Layer Export Pro"), "layer-export-pro");
        assert_eq!(slugify("  Fancy!! Script  "), "fancy-script");
        assert_eq!(slugify("Äöü-Test"), "test");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
    }

    #[test]
    fn test_order_code_format() {
        let code = generate_order_code();
        assert!(code.starts_with("ORD-"));
        let hex_part = &code[4..];
        assert_eq!(hex_part.len(), 16);
        assert!(hex_part
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_download_token_format() {
        let token = generate_download_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_download_token());
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(2048), "2.00 KB");
        assert_eq!(format_file_size(1_310_720), "1.25 MB");
    }

    #[test]
    fn test_unique_filename_keeps_extension() {
        let name = unique_filename("My Script (final).jsx");
        assert!(name.ends_with(".jsx"));
        assert!(name.starts_with("my-script-final-"));
        assert_ne!(name, unique_filename("My Script (final).jsx"));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("buyer@example.com"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@example.com"));
    }
}

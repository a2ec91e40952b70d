//! Phone number validation and normalization.

use crate::tool::{Tool, ToolFailure};
use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::LazyLock;

static NON_PHONE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\d+]").expect("valid regex")
});

/// Normalize a Kazakhstani/Russian mobile number to `+7XXXXXXXXXX`.
///
/// Requires a `+7` or leading-`8` prefix followed by exactly ten
/// subscriber digits; anything else is invalid and yields `None`.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let cleaned = NON_PHONE_CHARS.replace_all(raw, "").into_owned();

    let digits = if let Some(rest) = cleaned.strip_prefix("+7") {
        rest
    } else if let Some(rest) = cleaned.strip_prefix('8') {
        rest
    } else {
        // No recognized country prefix, even if ten digits follow.
        return None;
    };

    if digits.len() == 10 && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(format!("+7{digits}"))
    } else {
        None
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PhoneArgs {
    /// Phone number as the client wrote it.
    pub phone_number: String,
}

/// Validates client phone numbers before an order is created.
#[derive(Debug, Clone, Copy)]
pub struct PhoneTool;

#[async_trait]
impl Tool for PhoneTool {
    const NAME: &'static str = "check_phone_number";
    type Args = PhoneArgs;
    type Output = Option<String>;

    fn description(&self) -> &str {
        "Validate a client phone number and normalize it to +7XXXXXXXXXX. \
         Returns null when the number is invalid."
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolFailure> {
        Ok(normalize_phone(&args.phone_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_plus7_number() {
        assert_eq!(
            normalize_phone("+7(999)123-45-67").as_deref(),
            Some("+79991234567")
        );
    }

    #[test]
    fn leading_eight_number() {
        assert_eq!(
            normalize_phone("89991234567").as_deref(),
            Some("+79991234567")
        );
    }

    #[test]
    fn bare_ten_digits_without_prefix_is_invalid() {
        assert_eq!(normalize_phone("9991234567"), None);
        assert_eq!(normalize_phone("999 123 45 67"), None);
    }

    #[test]
    fn spaces_and_dashes_are_stripped() {
        assert_eq!(
            normalize_phone("8 999 123 45 67").as_deref(),
            Some("+79991234567")
        );
    }

    #[test]
    fn too_short_is_invalid() {
        assert_eq!(normalize_phone("12345"), None);
    }

    #[test]
    fn too_long_is_invalid() {
        assert_eq!(normalize_phone("+799912345678"), None);
    }

    #[test]
    fn stray_plus_inside_is_invalid() {
        assert_eq!(normalize_phone("8999+1234567"), None);
    }

    #[test]
    fn empty_is_invalid() {
        assert_eq!(normalize_phone(""), None);
    }

    #[tokio::test]
    async fn tool_wraps_normalization() {
        let out = PhoneTool
            .call(PhoneArgs {
                phone_number: "89991234567".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.as_deref(), Some("+79991234567"));
    }
}

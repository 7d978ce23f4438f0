//! Business constants and input validation.

use common::Money;

use crate::error::{DomainError, Result};

pub const MAX_CUSTOMER_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 256;
pub const MAX_PHONE_LENGTH: usize = 20;
pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;
pub const MAX_PRODUCT_DESCRIPTION_LENGTH: usize = 2000;
pub const MAX_SKU_LENGTH: usize = 50;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
pub const MAX_CATEGORY_DESCRIPTION_LENGTH: usize = 500;
pub const MAX_ORDER_NOTES_LENGTH: usize = 1000;
pub const MAX_TRANSACTION_ID_LENGTH: usize = 100;

pub const MIN_PRICE: Money = Money::from_cents(1);
pub const MAX_PRICE: Money = Money::from_cents(99_999_999);
pub const MIN_QUANTITY: u32 = 1;
pub const MAX_QUANTITY: u32 = 10_000;

/// Days of inactivity after which a cart is discarded.
pub const CART_EXPIRATION_DAYS: i64 = 30;

pub const SUPPORTED_PAYMENT_METHODS: [&str; 4] = ["CreditCard", "DebitCard", "PayPal", "BankTransfer"];

/// Trims `value` and checks it is non-empty and at most `max` characters long.
pub fn required(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    max_length(field, trimmed, max)?;
    Ok(trimmed.to_string())
}

/// Trims an optional value, mapping blank input to `None`.
pub fn optional(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(trimmed) => {
            max_length(field, trimmed, max)?;
            Ok(Some(trimmed.to_string()))
        }
    }
}

pub fn max_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Normalizes an email address to lowercase and checks its shape.
pub fn email(value: &str) -> Result<String> {
    let email = required("Email", value, MAX_EMAIL_LENGTH)?.to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(email)
}

pub fn phone(value: Option<&str>) -> Result<Option<String>> {
    let phone = optional("Phone", value, MAX_PHONE_LENGTH)?;
    if let Some(ref p) = phone
        && !p
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'))
    {
        return Err(DomainError::validation(format!(
            "'{p}' is not a valid phone number"
        )));
    }
    Ok(phone)
}

/// SKUs are alphanumeric with `-` and `_` separators. Stored uppercase.
pub fn sku(value: &str) -> Result<String> {
    let sku = required("SKU", value, MAX_SKU_LENGTH)?;
    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::validation(
            "SKU may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(sku.to_uppercase())
}

pub fn price(cents: i64) -> Result<Money> {
    let price = Money::from_cents(cents);
    if price < MIN_PRICE || price > MAX_PRICE {
        return Err(DomainError::validation(format!(
            "Price must be between {MIN_PRICE} and {MAX_PRICE}"
        )));
    }
    Ok(price)
}

pub fn quantity(quantity: u32) -> Result<u32> {
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
        return Err(DomainError::validation(format!(
            "Quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"
        )));
    }
    Ok(quantity)
}

pub fn payment_method(value: &str) -> Result<String> {
    SUPPORTED_PAYMENT_METHODS
        .iter()
        .find(|m| m.eq_ignore_ascii_case(value.trim()))
        .map(|m| m.to_string())
        .ok_or_else(|| {
            DomainError::rule(format!(
                "Payment method '{value}' is not supported. Supported methods: {}",
                SUPPORTED_PAYMENT_METHODS.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_lowercased() {
        assert_eq!(email("  Ada@Example.COM ").unwrap(), "ada@example.com");
    }

    #[test]
    fn test_invalid_emails_rejected() {
        for bad in ["", "no-at-sign", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@b."] {
            assert!(
                matches!(email(bad), Err(DomainError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_price_bounds() {
        assert!(price(0).is_err());
        assert!(price(1).is_ok());
        assert!(price(99_999_999).is_ok());
        assert!(price(100_000_000).is_err());
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(quantity(0).is_err());
        assert_eq!(quantity(10_000).unwrap(), 10_000);
        assert!(quantity(10_001).is_err());
    }

    #[test]
    fn test_sku_format() {
        assert_eq!(sku("kb-100_a").unwrap(), "KB-100_A");
        assert!(sku("KB 100").is_err());
        assert!(sku(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_payment_method_is_canonicalized() {
        assert_eq!(payment_method("paypal").unwrap(), "PayPal");
        assert!(matches!(
            payment_method("Cash"),
            Err(DomainError::BusinessRule(_))
        ));
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional("Notes", Some("   "), 10).unwrap(), None);
        assert!(optional("Notes", Some("12345678901"), 10).is_err());
    }
}

//! Turning an untrusted checkout payload into a persistable order.

use chrono::{DateTime, Utc};
use common::{Address, BookId, Shipping};
use serde::Deserialize;
use store::NewOrder;

use crate::auth::Principal;
use crate::error::{DomainError, Result};

/// The checkout body as posted by the client.
///
/// Missing string fields deserialize as empty and are rejected by
/// [`build_order`]. `user_id` is accepted for compatibility but never trusted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub total_price: f64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub book_ids: Vec<i64>,
    #[serde(default)]
    pub shipping: Shipping,
}

/// A validated order and the books to attach to it, in request order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub order: NewOrder,
    pub book_ids: Vec<BookId>,
}

/// Parses a raw JSON body.
pub fn parse_payload(body: &[u8]) -> Result<CreateOrderPayload> {
    serde_json::from_slice(body)
        .map_err(|e| DomainError::Validation(format!("JSON cannot be parsed: {e}")))
}

/// Longest phone number the orders table holds.
pub const MAX_PHONE_LENGTH: usize = 20;

/// Longest value for the other bounded text columns of an order.
pub const MAX_TEXT_LENGTH: usize = 255;

fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn at_most(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Validates a payload and binds it to the authenticated caller.
///
/// The owner is always taken from `principal`; a client-supplied `user_id`
/// is discarded. Nothing is written here.
pub fn build_order(
    payload: CreateOrderPayload,
    principal: Option<&Principal>,
    ordered_at: DateTime<Utc>,
) -> Result<OrderDraft> {
    let Some(principal) = principal else {
        return Err(DomainError::Unauthenticated(
            "authentication is required to place an order".to_string(),
        ));
    };

    required("name", &payload.name)?;
    required("email", &payload.email)?;
    required("phone", &payload.phone)?;
    required("address.city", &payload.address.city)?;
    required("shipping.shipping_type", &payload.shipping.shipping_type)?;
    required(
        "shipping.shipping_service",
        &payload.shipping.shipping_service,
    )?;

    at_most("phone", &payload.phone, MAX_PHONE_LENGTH)?;
    for (field, value) in [
        ("name", &payload.name),
        ("email", &payload.email),
        ("address.city", &payload.address.city),
        ("address.province", &payload.address.province),
        ("address.state", &payload.address.state),
        ("address.zipcode", &payload.address.zipcode),
        ("shipping.shipping_type", &payload.shipping.shipping_type),
        ("shipping.shipping_service", &payload.shipping.shipping_service),
    ] {
        at_most(field, value, MAX_TEXT_LENGTH)?;
    }

    if !payload.total_price.is_finite() || payload.total_price < 0.0 {
        return Err(DomainError::Validation(
            "total_price must be a non-negative number".to_string(),
        ));
    }
    if payload.shipping.shipping_cost < 0 {
        return Err(DomainError::Validation(
            "shipping_cost must not be negative".to_string(),
        ));
    }

    if let Some(claimed) = payload.user_id
        && claimed != principal.user_id.as_i64()
    {
        tracing::warn!(
            claimed,
            user_id = %principal.user_id,
            "Ignoring client-supplied user_id"
        );
    }

    Ok(OrderDraft {
        order: NewOrder {
            name: payload.name,
            email: payload.email,
            address: payload.address,
            phone: payload.phone,
            total_price: payload.total_price,
            user_id: principal.user_id,
            shipping: payload.shipping,
            ordered_at,
        },
        book_ids: payload.book_ids.into_iter().map(BookId::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use common::UserId;

    use super::*;

    fn principal() -> Principal {
        Principal {
            user_id: UserId::new(3),
            name: "Reader".to_string(),
            email: "reader@example.com".to_string(),
            is_admin: false,
        }
    }

    fn payload() -> CreateOrderPayload {
        parse_payload(
            br#"{
                "name": "Reader",
                "email": "reader@example.com",
                "address": {"city": "Bandung", "province": "Jawa Barat", "state": "ID", "zipcode": "40111"},
                "phone": "08123456789",
                "total_price": 19.98,
                "book_ids": [1, 2, 2],
                "shipping": {"shipping_type": "jne", "shipping_service": "REG", "shipping_cost": 9000}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn binds_owner_to_principal() {
        let mut spoofed = payload();
        spoofed.user_id = Some(999);

        let draft = build_order(spoofed, Some(&principal()), Utc::now()).unwrap();
        assert_eq!(draft.order.user_id, UserId::new(3));
        assert_eq!(
            draft.book_ids,
            vec![BookId::new(1), BookId::new(2), BookId::new(2)]
        );
    }

    #[test]
    fn anonymous_caller_is_unauthenticated() {
        let result = build_order(payload(), None, Utc::now());
        assert!(matches!(result, Err(DomainError::Unauthenticated(_))));
    }

    #[test]
    fn empty_required_field_is_rejected() {
        let mut p = payload();
        p.phone = "   ".to_string();
        let err = build_order(p, Some(&principal()), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg == "phone is required"));

        let mut p = payload();
        p.shipping.shipping_type.clear();
        assert!(build_order(p, Some(&principal()), Utc::now()).is_err());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut p = payload();
        p.total_price = -1.0;
        assert!(build_order(p, Some(&principal()), Utc::now()).is_err());

        let mut p = payload();
        p.shipping.shipping_cost = -5;
        assert!(build_order(p, Some(&principal()), Utc::now()).is_err());
    }

    #[test]
    fn overlong_fields_are_rejected_before_any_write() {
        let mut p = payload();
        p.phone = "0".repeat(MAX_PHONE_LENGTH);
        assert!(build_order(p, Some(&principal()), Utc::now()).is_ok());

        let mut p = payload();
        p.phone = "0".repeat(MAX_PHONE_LENGTH + 1);
        let err = build_order(p, Some(&principal()), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg == "phone must be at most 20 characters"));

        let mut p = payload();
        p.address.zipcode = "9".repeat(MAX_TEXT_LENGTH + 1);
        assert!(matches!(
            build_order(p, Some(&principal()), Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn empty_book_list_is_allowed() {
        let mut p = payload();
        p.book_ids.clear();
        let draft = build_order(p, Some(&principal()), Utc::now()).unwrap();
        assert!(draft.book_ids.is_empty());
    }

    #[test]
    fn unparseable_body_is_validation_error() {
        assert!(matches!(
            parse_payload(b"{not json"),
            Err(DomainError::Validation(_))
        ));
        assert!(parse_payload(br#"{"book_ids": "nope"}"#).is_err());
    }
}

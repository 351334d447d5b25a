//! Ticket Model

use serde::{Deserialize, Serialize};

/// Ticket status. `Used` and `Invalid` are terminal; the only legal
/// transitions are `Valid -> Used` (redemption) and `Valid -> Invalid`
/// (calendar-day expiry).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Valid,
    Used,
    Invalid,
}

impl TicketStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Valid => "valid",
            TicketStatus::Used => "used",
            TicketStatus::Invalid => "invalid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "valid" => Some(TicketStatus::Valid),
            "used" => Some(TicketStatus::Used),
            "invalid" => Some(TicketStatus::Invalid),
            _ => None,
        }
    }
}

/// Payment mode captured at the counter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    #[default]
    Cash,
    Upi,
}

impl PaymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(PaymentMode::Cash),
            "upi" => Some(PaymentMode::Upi),
            _ => None,
        }
    }
}

/// One line of the cart snapshot frozen onto a ticket at issuance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketItem {
    /// Product reference (catalog code)
    pub id: String,
    pub name: String,
    /// Price per unit in whole rupees
    pub price: i64,
    pub quantity: u32,
}

/// Ticket entity — one master accounting record or one printable,
/// independently scannable sub-ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// `TXN-...` for masters, `<masterId>-C<n>` / `<masterId>-R<n>` for sub-tickets
    pub id: String,
    /// Value this specific ticket represents, in whole rupees.
    /// Combo coupons carry the fixed face value, not a slice of the
    /// combo's purchase price.
    pub amount: i64,
    /// Issuance calendar date in the venue timezone (`YYYY-MM-DD`)
    pub date: String,
    /// Cart snapshot at issuance (denormalized copy, not a live reference)
    pub items: Vec<TicketItem>,
    pub status: TicketStatus,
    /// Customer phone, loyalty correlation only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub payment_mode: PaymentMode,
    /// Operator identity, denormalized at issuance
    pub created_by: String,
    /// Unix millis, shared by every ticket of one issuance batch
    pub created_at: i64,
    /// Redemption timestamp (Unix millis), set exactly once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<i64>,
    /// Master ticket back-reference (ownership only, never cascading)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// True for sub-tickets that admit a single ride/entry rather than
    /// summarizing the sale
    pub is_coupon: bool,
}

impl Ticket {
    pub fn is_master(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// QR payload wrapper: `{"id": "<ticket id>"}`
#[derive(Debug, Deserialize)]
struct ScanPayload {
    id: String,
}

/// Extract a ticket ID from a scanned QR payload.
///
/// Scanners emit either the raw ID string or the JSON-wrapped form;
/// both are accepted. Returns `None` for blank input.
pub fn scan_ticket_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.starts_with('{')
        && let Ok(payload) = serde_json::from_str::<ScanPayload>(trimmed)
    {
        return Some(payload.id);
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ticket() -> Ticket {
        Ticket {
            id: "TXN-482901-QM3K".to_string(),
            amount: 300,
            date: "2025-11-02".to_string(),
            items: vec![TicketItem {
                id: "7".to_string(),
                name: "Bumper Cars".to_string(),
                price: 150,
                quantity: 2,
            }],
            status: TicketStatus::Valid,
            mobile: Some("9876543210".to_string()),
            payment_mode: PaymentMode::Upi,
            created_by: "counter-1".to_string(),
            created_at: 1_762_060_000_000,
            used_at: None,
            parent_id: None,
            is_coupon: false,
        }
    }

    #[test]
    fn wire_field_names_are_stable() {
        let value = serde_json::to_value(sample_ticket()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "id",
            "amount",
            "date",
            "items",
            "status",
            "mobile",
            "paymentMode",
            "createdBy",
            "createdAt",
            "isCoupon",
        ] {
            assert!(obj.contains_key(key), "missing wire field {key}");
        }
        // Unset optionals stay off the wire
        assert!(!obj.contains_key("usedAt"));
        assert!(!obj.contains_key("parentId"));
        assert_eq!(value["status"], "valid");
        assert_eq!(value["paymentMode"], "upi");
        assert_eq!(value["items"][0]["price"], 150);
    }

    #[test]
    fn ticket_roundtrips_through_json() {
        let ticket = sample_ticket();
        let json = serde_json::to_string(&ticket).unwrap();
        let back: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, ticket.id);
        assert_eq!(back.status, ticket.status);
        assert_eq!(back.items, ticket.items);
    }

    #[test]
    fn scan_accepts_raw_and_wrapped_ids() {
        assert_eq!(
            scan_ticket_id("TXN-482901-QM3K").as_deref(),
            Some("TXN-482901-QM3K")
        );
        assert_eq!(
            scan_ticket_id("  TXN-482901-QM3K-C3 \n").as_deref(),
            Some("TXN-482901-QM3K-C3")
        );
        assert_eq!(
            scan_ticket_id(r#"{"id": "TXN-482901-QM3K"}"#).as_deref(),
            Some("TXN-482901-QM3K")
        );
        assert_eq!(scan_ticket_id(""), None);
        assert_eq!(scan_ticket_id("   "), None);
    }

    #[test]
    fn status_string_mapping_roundtrips() {
        for status in [TicketStatus::Valid, TicketStatus::Used, TicketStatus::Invalid] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("VALID"), None);
    }
}

//! Canonical lifecycle statuses for orders and purchase orders.
//!
//! Stored order statuses keep the Indonesian spellings that existing rows
//! carry; parsing additionally accepts the English aliases and the historic
//! `peding` misspelling, which is read but never written back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    /// Sent by the creating branch, awaiting the receiver ("menunggu").
    Waiting,
    /// Shipment on its way back to the creator ("dikirimkan").
    Shipped,
    /// Terminal; inventory has been settled ("selesai").
    Done,
    /// Legacy terminal state used only by the order-as-PO acceptance path.
    ReceivedPo,
}

impl OrderStatus {
    /// Canonical string written to storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Waiting => "menunggu",
            Self::Shipped => "dikirimkan",
            Self::Done => "selesai",
            Self::ReceivedPo => "received_po",
        }
    }

    /// Every stored spelling this status may appear under, for use in
    /// conditional-update and visibility filters.
    pub fn accepted(&self) -> &'static [&'static str] {
        match self {
            Self::Pending => &["pending", "peding"],
            Self::Waiting => &["menunggu", "waiting"],
            Self::Shipped => &["dikirimkan", "shipped"],
            Self::Done => &["selesai", "done"],
            Self::ReceivedPo => &["received_po"],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::ReceivedPo)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        for status in [
            Self::Pending,
            Self::Waiting,
            Self::Shipped,
            Self::Done,
            Self::ReceivedPo,
        ] {
            if status.accepted().contains(&lowered.as_str()) {
                return Ok(status);
            }
        }
        Err(UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Pending,
    Approved,
    Shipped,
    Delivered,
    Received,
}

impl PurchaseOrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Received => "RECEIVED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Received)
    }
}

impl fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseOrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "RECEIVED" => Ok(Self::Received),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_parses_aliases() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        // Historic typo accepted on read.
        assert_eq!("peding".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert_eq!("MENUNGGU".parse::<OrderStatus>().unwrap(), OrderStatus::Waiting);
        assert_eq!("waiting".parse::<OrderStatus>().unwrap(), OrderStatus::Waiting);
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!("dikirimkan".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!("selesai".parse::<OrderStatus>().unwrap(), OrderStatus::Done);
        assert!("bogus".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_status_never_writes_the_typo() {
        assert_eq!(OrderStatus::Pending.as_str(), "pending");
        assert_eq!(OrderStatus::Waiting.as_str(), "menunggu");
        assert_eq!(OrderStatus::Shipped.as_str(), "dikirimkan");
        assert_eq!(OrderStatus::Done.as_str(), "selesai");
    }

    #[test]
    fn po_status_round_trips() {
        for status in [
            PurchaseOrderStatus::Pending,
            PurchaseOrderStatus::Approved,
            PurchaseOrderStatus::Shipped,
            PurchaseOrderStatus::Delivered,
            PurchaseOrderStatus::Received,
        ] {
            assert_eq!(status.as_str().parse::<PurchaseOrderStatus>().unwrap(), status);
        }
        assert!(PurchaseOrderStatus::Received.is_terminal());
        assert!(!PurchaseOrderStatus::Delivered.is_terminal());
    }
}

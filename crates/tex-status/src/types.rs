use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The viewing/acting party. Selects the column set and the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Brand,
    Supplier,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Brand, Role::Supplier];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Brand => "BRAND",
            Role::Supplier => "SUPPLIER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid role '{}'. expected one of: BRAND | SUPPLIER",
            self.0
        )
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brand" | "marca" => Ok(Role::Brand),
            "supplier" | "workshop" | "oficina" => Ok(Role::Supplier),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// CanonicalStatus
// ---------------------------------------------------------------------------

/// Internal, stable order status. Every business decision is taken on this
/// vocabulary, never on the wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    /// Created by the brand, awaiting the workshop's answer.
    New,
    /// The workshop sent a counter-proposal.
    Negotiating,
    /// Accepted; materials not yet dispatched.
    Accepted,
    /// Materials being prepared, in transit, or delivered but not confirmed.
    Waiting,
    Production,
    ReadySend,
    /// **Terminal.**
    Finalized,
    /// **Terminal.**
    Rejected,
    /// **Terminal.**
    Cancelled,
}

impl CanonicalStatus {
    /// Lifecycle order; terminal failure states sort last.
    pub const ALL: [CanonicalStatus; 9] = [
        CanonicalStatus::New,
        CanonicalStatus::Negotiating,
        CanonicalStatus::Accepted,
        CanonicalStatus::Waiting,
        CanonicalStatus::Production,
        CanonicalStatus::ReadySend,
        CanonicalStatus::Finalized,
        CanonicalStatus::Rejected,
        CanonicalStatus::Cancelled,
    ];

    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CanonicalStatus::Finalized | CanonicalStatus::Rejected | CanonicalStatus::Cancelled
        )
    }

    /// Position in [`CanonicalStatus::ALL`]; used as the status sort key.
    pub fn rank(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::New => "NEW",
            CanonicalStatus::Negotiating => "NEGOTIATING",
            CanonicalStatus::Accepted => "ACCEPTED",
            CanonicalStatus::Waiting => "WAITING",
            CanonicalStatus::Production => "PRODUCTION",
            CanonicalStatus::ReadySend => "READY_SEND",
            CanonicalStatus::Finalized => "FINALIZED",
            CanonicalStatus::Rejected => "REJECTED",
            CanonicalStatus::Cancelled => "CANCELLED",
        }
    }

    /// Badge label shown next to an order.
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalStatus::New => "Novo",
            CanonicalStatus::Negotiating => "Em Negociação",
            CanonicalStatus::Accepted => "Aceito",
            CanonicalStatus::Waiting => "Aguardando Insumos",
            CanonicalStatus::Production => "Em Produção",
            CanonicalStatus::ReadySend => "Pronto para Envio",
            CanonicalStatus::Finalized => "Finalizado",
            CanonicalStatus::Rejected => "Recusado",
            CanonicalStatus::Cancelled => "Cancelado",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CanonicalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase().replace('-', "_");
        CanonicalStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| format!("invalid status '{}'", s.trim()))
    }
}

// ---------------------------------------------------------------------------
// ExternalStatus
// ---------------------------------------------------------------------------

/// Status vocabulary of the remote order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalStatus {
    Pending,
    CounterOffer,
    Approved,
    SuppliesPreparing,
    SuppliesInTransit,
    SuppliesReceived,
    InProduction,
    ReadyToShip,
    Shipped,
    Delivered,
    Declined,
    Cancelled,
}

impl ExternalStatus {
    pub const ALL: [ExternalStatus; 12] = [
        ExternalStatus::Pending,
        ExternalStatus::CounterOffer,
        ExternalStatus::Approved,
        ExternalStatus::SuppliesPreparing,
        ExternalStatus::SuppliesInTransit,
        ExternalStatus::SuppliesReceived,
        ExternalStatus::InProduction,
        ExternalStatus::ReadyToShip,
        ExternalStatus::Shipped,
        ExternalStatus::Delivered,
        ExternalStatus::Declined,
        ExternalStatus::Cancelled,
    ];

    pub fn as_wire(&self) -> &'static str {
        match self {
            ExternalStatus::Pending => "pending",
            ExternalStatus::CounterOffer => "counter_offer",
            ExternalStatus::Approved => "approved",
            ExternalStatus::SuppliesPreparing => "supplies_preparing",
            ExternalStatus::SuppliesInTransit => "supplies_in_transit",
            ExternalStatus::SuppliesReceived => "supplies_received",
            ExternalStatus::InProduction => "in_production",
            ExternalStatus::ReadyToShip => "ready_to_ship",
            ExternalStatus::Shipped => "shipped",
            ExternalStatus::Delivered => "delivered",
            ExternalStatus::Declined => "declined",
            ExternalStatus::Cancelled => "cancelled",
        }
    }

    /// Strict parse. `None` for anything outside the known vocabulary;
    /// callers decide the fallback (see [`crate::to_canonical_wire`]).
    pub fn from_wire(raw: &str) -> Option<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        ExternalStatus::ALL
            .into_iter()
            .find(|st| st.as_wire() == wanted)
    }
}

impl fmt::Display for ExternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

// ---------------------------------------------------------------------------
// PaymentStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl PaymentStatus {
    /// Lenient decode: absent or unknown values degrade to `Pending`.
    pub fn from_wire_or_default(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return PaymentStatus::Pending;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => PaymentStatus::Pending,
            "partial" | "partially_paid" => PaymentStatus::Partial,
            "paid" => PaymentStatus::Paid,
            "overdue" => PaymentStatus::Overdue,
            other => {
                warn!(payment_status = other, "unrecognized payment status; treating as PENDING");
                PaymentStatus::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_both_vocabularies() {
        assert_eq!("brand".parse::<Role>().unwrap(), Role::Brand);
        assert_eq!(" Oficina ".parse::<Role>().unwrap(), Role::Supplier);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        let terminal: Vec<_> = CanonicalStatus::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                CanonicalStatus::Finalized,
                CanonicalStatus::Rejected,
                CanonicalStatus::Cancelled
            ]
        );
    }

    #[test]
    fn rank_follows_lifecycle_order() {
        for (i, st) in CanonicalStatus::ALL.iter().enumerate() {
            assert_eq!(st.rank(), i);
        }
    }

    #[test]
    fn canonical_parse_accepts_dashes_and_case() {
        assert_eq!(
            "ready-send".parse::<CanonicalStatus>().unwrap(),
            CanonicalStatus::ReadySend
        );
        assert!("shipped".parse::<CanonicalStatus>().is_err());
    }

    #[test]
    fn external_wire_names_round_trip_through_serde() {
        for st in ExternalStatus::ALL {
            let json = serde_json::to_string(&st).unwrap();
            assert_eq!(json, format!("\"{}\"", st.as_wire()));
            assert_eq!(ExternalStatus::from_wire(st.as_wire()), Some(st));
        }
        assert_eq!(ExternalStatus::from_wire("on_hold"), None);
    }

    #[test]
    fn unknown_payment_status_defaults_to_pending() {
        assert_eq!(
            PaymentStatus::from_wire_or_default(Some("refunded")),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::from_wire_or_default(Some("PAID")),
            PaymentStatus::Paid
        );
        assert_eq!(PaymentStatus::from_wire_or_default(None), PaymentStatus::Pending);
    }
}

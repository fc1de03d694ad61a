use serde::{Deserialize, Serialize};

/// Status of a help request.
///
/// `Negotiating` and `Expired` are reserved: no endpoint currently drives a
/// request into them (an expiry sweep would own `Expired`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Open,
    Negotiating,
    InProgress,
    Completed,
    Cancelled,
    Expired,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Expired)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Negotiating => "negotiating",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "negotiating" => Ok(Self::Negotiating),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "expired" => Ok(Self::Expired),
            _ => Err(format!("unknown request status: {s}")),
        }
    }
}

/// Status of an offer against a request.
///
/// `Cancelled` is the reserved helper-withdrawal transition; no endpoint
/// drives it today, but `cancel request` moves non-terminal offers there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Pending,
    Accepted,
    Rejected,
    Borrowed,
    Returned,
    Cancelled,
}

impl OfferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Returned | Self::Cancelled)
    }

    /// An offer is active while the helper is still committed to it.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Borrowed => "borrowed",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "borrowed" => Ok(Self::Borrowed),
            "returned" => Ok(Self::Returned),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("unknown offer status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("unknown urgency: {s}")),
        }
    }
}

/// Direction of a post-exchange review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    RequesterToHelper,
    HelperToRequester,
}

impl std::fmt::Display for ReviewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RequesterToHelper => "requester_to_helper",
            Self::HelperToRequester => "helper_to_requester",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ReviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requester_to_helper" => Ok(Self::RequesterToHelper),
            "helper_to_requester" => Ok(Self::HelperToRequester),
            _ => Err(format!("unknown review type: {s}")),
        }
    }
}

/// Fixed request category catalog.
pub const CATEGORIES: &[&str] = &[
    "ferramentas",
    "cozinha",
    "esportes",
    "livros",
    "casa",
    "eventos",
    "eletronicos",
    "outros",
];

pub fn is_valid_category(slug: &str) -> bool {
    CATEGORIES.contains(&slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn statuses_round_trip_through_strings() {
        for status in [
            RequestStatus::Open,
            RequestStatus::Negotiating,
            RequestStatus::InProgress,
            RequestStatus::Completed,
            RequestStatus::Cancelled,
            RequestStatus::Expired,
        ] {
            assert_eq!(RequestStatus::from_str(&status.to_string()).unwrap(), status);
        }
        for status in [
            OfferStatus::Pending,
            OfferStatus::Accepted,
            OfferStatus::Rejected,
            OfferStatus::Borrowed,
            OfferStatus::Returned,
            OfferStatus::Cancelled,
        ] {
            assert_eq!(OfferStatus::from_str(&status.to_string()).unwrap(), status);
        }
    }

    #[test]
    fn terminal_classification() {
        assert!(!RequestStatus::Open.is_terminal());
        assert!(!RequestStatus::InProgress.is_terminal());
        assert!(RequestStatus::Completed.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
        assert!(RequestStatus::Expired.is_terminal());

        assert!(OfferStatus::Pending.is_active());
        assert!(OfferStatus::Accepted.is_active());
        assert!(OfferStatus::Borrowed.is_active());
        assert!(OfferStatus::Rejected.is_terminal());
        assert!(OfferStatus::Returned.is_terminal());
        assert!(OfferStatus::Cancelled.is_terminal());
    }

    #[test]
    fn category_catalog() {
        assert!(is_valid_category("ferramentas"));
        assert!(is_valid_category("outros"));
        assert!(!is_valid_category("naval-engineering"));
    }
}

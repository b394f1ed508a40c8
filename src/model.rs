use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of notification kinds emitted by the approval workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderPendingApproval,
    OrderApproved,
    PriceListPendingApproval,
    PriceListApproved,
}

/// Kind of business item a notification points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Order,
    PriceList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PendingApproval,
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Warning,
    Success,
}

/// Static display attributes for a notification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    pub label: &'static str,
    pub icon: &'static str,
    pub tone: Tone,
}

impl NotificationType {
    pub const ALL: [NotificationType; 4] = [
        NotificationType::OrderPendingApproval,
        NotificationType::OrderApproved,
        NotificationType::PriceListPendingApproval,
        NotificationType::PriceListApproved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::OrderPendingApproval => "order_pending_approval",
            NotificationType::OrderApproved => "order_approved",
            NotificationType::PriceListPendingApproval => "price_list_pending_approval",
            NotificationType::PriceListApproved => "price_list_approved",
        }
    }

    pub fn item_kind(&self) -> ItemKind {
        match self {
            NotificationType::OrderPendingApproval | NotificationType::OrderApproved => {
                ItemKind::Order
            }
            NotificationType::PriceListPendingApproval | NotificationType::PriceListApproved => {
                ItemKind::PriceList
            }
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            NotificationType::OrderPendingApproval
            | NotificationType::PriceListPendingApproval => Stage::PendingApproval,
            NotificationType::OrderApproved | NotificationType::PriceListApproved => {
                Stage::Approved
            }
        }
    }

    pub fn is_pending_approval(&self) -> bool {
        self.stage() == Stage::PendingApproval
    }

    pub fn is_approved(&self) -> bool {
        self.stage() == Stage::Approved
    }

    pub fn presentation(&self) -> Presentation {
        match self {
            NotificationType::OrderPendingApproval => Presentation {
                label: "Order awaiting approval",
                icon: "cart-clock",
                tone: Tone::Warning,
            },
            NotificationType::OrderApproved => Presentation {
                label: "Order approved",
                icon: "cart-check",
                tone: Tone::Success,
            },
            NotificationType::PriceListPendingApproval => Presentation {
                label: "Price list awaiting approval",
                icon: "tag-clock",
                tone: Tone::Warning,
            },
            NotificationType::PriceListApproved => Presentation {
                label: "Price list approved",
                icon: "tag-check",
                tone: Tone::Success,
            },
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Order => f.write_str("order"),
            ItemKind::PriceList => f.write_str("price_list"),
        }
    }
}

/// A notification record as stored in the backend collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub message: String,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    pub related_item_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<String>,
}

impl Notification {
    pub fn related_item(&self) -> RelatedItem {
        RelatedItem {
            kind: self.kind.item_kind(),
            id: self.related_item_id.clone(),
        }
    }
}

/// Navigation target handed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedItem {
    pub kind: ItemKind,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Supplier,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supplier => "supplier",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "supplier" => Ok(Role::Supplier),
            "customer" => Ok(Role::Customer),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// The notification view a panel shows: the admin queue, or the approved
/// items addressed to one supplier/customer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleScope {
    Admin,
    Supplier(String),
    Customer(String),
}

impl RoleScope {
    /// Build a scope from a role and an optional recipient id. Supplier and
    /// customer scopes require the id.
    pub fn new(role: Role, recipient_id: Option<String>) -> Option<Self> {
        match (role, recipient_id) {
            (Role::Admin, _) => Some(RoleScope::Admin),
            (Role::Supplier, Some(id)) => Some(RoleScope::Supplier(id)),
            (Role::Customer, Some(id)) => Some(RoleScope::Customer(id)),
            _ => None,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            RoleScope::Admin => Role::Admin,
            RoleScope::Supplier(_) => Role::Supplier,
            RoleScope::Customer(_) => Role::Customer,
        }
    }

    pub fn recipient_id(&self) -> Option<&str> {
        match self {
            RoleScope::Admin => None,
            RoleScope::Supplier(id) | RoleScope::Customer(id) => Some(id),
        }
    }

    /// Whether a notification belongs in this scope's list.
    pub fn accepts(&self, n: &Notification) -> bool {
        match self {
            RoleScope::Admin => !n.is_read && n.kind.is_pending_approval(),
            RoleScope::Supplier(id) | RoleScope::Customer(id) => {
                !n.is_read
                    && n.kind.is_approved()
                    && n.recipient_id.as_deref() == Some(id.as_str())
            }
        }
    }
}

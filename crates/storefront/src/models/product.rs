//! Products and the plan configuration that picks them.

use serde::{Deserialize, Serialize};

use petbox_core::{BillingCycle, Money, ProductId, ProductType};

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub product_type: ProductType,
    pub price: Money,
    /// Only set for subscriptions.
    pub billing_cycle: Option<BillingCycle>,
    pub active: bool,
}

/// Product ids stored in the `plan_products` setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLinks {
    #[serde(default)]
    pub monthly_product_id: Option<ProductId>,
    #[serde(default)]
    pub annual_product_id: Option<ProductId>,
    #[serde(default)]
    pub one_time_product_id: Option<ProductId>,
}

/// Products currently offered on the plan page. Any slot may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub monthly: Option<Product>,
    pub annual: Option<Product>,
    pub one_time: Option<Product>,
}

impl PlanConfig {
    /// The product backing `selection`, if configured.
    #[must_use]
    pub const fn product_for(&self, selection: PlanSelection) -> Option<&Product> {
        match selection {
            PlanSelection::Monthly => self.monthly.as_ref(),
            PlanSelection::Annual => self.annual.as_ref(),
            PlanSelection::OneTime => self.one_time.as_ref(),
        }
    }
}

/// What the visitor picked on the plan page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSelection {
    #[default]
    Monthly,
    Annual,
    OneTime,
}

impl PlanSelection {
    /// Billing cadence implied by the selection; `None` for the one-time box.
    #[must_use]
    pub const fn billing_cycle(self) -> Option<BillingCycle> {
        match self {
            Self::Monthly => Some(BillingCycle::Monthly),
            Self::Annual => Some(BillingCycle::Annual),
            Self::OneTime => None,
        }
    }

    /// Product type implied by the selection.
    #[must_use]
    pub const fn product_type(self) -> ProductType {
        match self {
            Self::Monthly | Self::Annual => ProductType::Subscription,
            Self::OneTime => ProductType::OneTime,
        }
    }

    /// Name shown when no product is configured for the selection.
    #[must_use]
    pub const fn fallback_name(self) -> &'static str {
        match self {
            Self::Monthly => "Plano Mensal",
            Self::Annual => "Plano Anual",
            Self::OneTime => "Box Avulsa",
        }
    }
}

impl std::fmt::Display for PlanSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Annual => write!(f, "annual"),
            Self::OneTime => write!(f, "one_time"),
        }
    }
}

//! Order context consumed by the payment page.

use serde::{Deserialize, Serialize};

use petbox_core::{
    BillingCycle, CouponId, Cpf, CustomerId, Money, PetId, Phone, ProductId, ProductType,
};

/// Customer, pet, product and discount data needed to create a payment.
///
/// Field names are camelCase because the payment page reads them as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderContext {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_document: Option<Cpf>,
    pub customer_phone: Phone,
    pub billing_customer_id: Option<String>,
    pub pet_id: PetId,
    /// `None` when the plan slot is not configured and the fallback price applies.
    pub product_id: Option<ProductId>,
    pub product_type: ProductType,
    pub product_name: String,
    pub product_value: Money,
    pub billing_cycle: Option<BillingCycle>,
    pub coupon_id: Option<CouponId>,
    pub discount_amount: Money,
    pub final_price: Money,
}

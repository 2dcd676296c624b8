// Sale records and checkout math.
// Sales have no backend service; completed sales live in the offline cache
// under the "sales" key and sync opportunistically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::product::Product;

/// Tax rate applied at checkout.
pub const TAX_RATE: f64 = 0.10;

/// One line of a cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
    pub price: f64,
    pub discount: f64,
    pub total: f64,
}

impl CartItem {
    /// Line for `quantity` units at the product's list price, no discount.
    pub fn new(product: Product, quantity: u32) -> Self {
        let price = product.price;
        Self {
            product,
            quantity,
            price,
            discount: 0.0,
            total: quantity as f64 * price,
        }
    }

    /// Apply a per-line discount and recompute the line total.
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self.total = self.quantity as f64 * self.price - discount;
        self
    }
}

/// Outcome of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Completed,
    Refunded,
    Voided,
}

/// A completed point-of-sale transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub items: Vec<CartItem>,
    pub subtotal: f64,
    pub discount: f64,
    pub tax: f64,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    pub payment_method: String,
    pub status: SaleStatus,
    pub branch_id: String,
    pub user_id: String,
}

/// Totals for a cart: sum of line totals, tax on top, grand total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

pub fn cart_totals(items: &[CartItem]) -> CartTotals {
    let subtotal: f64 = items.iter().map(|item| item.total).sum();
    let tax = subtotal * TAX_RATE;
    CartTotals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

/// Build a completed sale from the cart, the way the POS terminal checks out.
pub fn checkout(
    items: Vec<CartItem>,
    payment_method: impl Into<String>,
    branch_id: impl Into<String>,
    user_id: impl Into<String>,
) -> Sale {
    let totals = cart_totals(&items);
    let now = Utc::now();
    Sale {
        id: format!("sale-{}", now.timestamp_millis()),
        items,
        subtotal: totals.subtotal,
        discount: 0.0,
        tax: totals.tax,
        total: totals.total,
        created_at: now,
        customer: None,
        payment_method: payment_method.into(),
        status: SaleStatus::Completed,
        branch_id: branch_id.into(),
        user_id: user_id.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, price: f64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            barcode: format!("bar-{id}"),
            description: String::new(),
            category: "Test".to_string(),
            price,
            cost: price / 2.0,
            stock_quantity: 10,
            unit: "piece".to_string(),
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_cart_item_totals() {
        let item = CartItem::new(product("1", 25.0), 3);
        assert_eq!(item.total, 75.0);

        let discounted = item.with_discount(5.0);
        assert_eq!(discounted.total, 70.0);
    }

    #[test]
    fn test_cart_totals_applies_tax() {
        let items = vec![
            CartItem::new(product("1", 25.0), 2),
            CartItem::new(product("2", 50.0), 1),
        ];
        let totals = cart_totals(&items);

        assert_eq!(totals.subtotal, 100.0);
        assert!((totals.tax - 10.0).abs() < 1e-9);
        assert!((totals.total - 110.0).abs() < 1e-9);
    }

    #[test]
    fn test_checkout_builds_completed_sale() {
        let items = vec![CartItem::new(product("1", 20.0), 1)];
        let sale = checkout(items, "cash", "1", "3");

        assert!(sale.id.starts_with("sale-"));
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.payment_method, "cash");
        assert_eq!(sale.subtotal, 20.0);
        assert!((sale.total - 22.0).abs() < 1e-9);
        assert_eq!(sale.branch_id, "1");
        assert_eq!(sale.user_id, "3");
    }

    #[test]
    fn test_empty_cart_checkout() {
        let sale = checkout(Vec::new(), "card", "1", "1");
        assert_eq!(sale.subtotal, 0.0);
        assert_eq!(sale.total, 0.0);
    }

    #[test]
    fn test_sale_serializes_camel_case() {
        let sale = checkout(vec![CartItem::new(product("1", 10.0), 1)], "cash", "1", "1");
        let json = serde_json::to_string(&sale).unwrap();

        assert!(json.contains("\"paymentMethod\":\"cash\""));
        assert!(json.contains("\"status\":\"completed\""));
        assert!(!json.contains("\"customer\""));
    }
}

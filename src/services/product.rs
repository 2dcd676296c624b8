// Product catalog service.
// Mock in-memory CRUD backing the product management and POS screens.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A sellable product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub barcode: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub cost: f64,
    pub stock_quantity: u32,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a product; id and timestamps are assigned by the service.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub barcode: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub cost: f64,
    pub stock_quantity: u32,
    pub unit: String,
    pub image_url: Option<String>,
    pub is_active: bool,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub stock_quantity: Option<u32>,
    pub unit: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Mock product service with simulated request latency.
pub struct ProductService {
    products: Mutex<Vec<Product>>,
    next_id: AtomicU64,
    latency: Duration,
}

impl ProductService {
    pub fn new() -> Self {
        Self {
            products: Mutex::new(seed_products()),
            next_id: AtomicU64::new(6),
            latency: Duration::ZERO,
        }
    }

    /// Delay applied to every call, to mimic a remote API.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn list(&self) -> Result<Vec<Product>> {
        self.simulate_latency().await;
        Ok(self.products().clone())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Product>> {
        self.simulate_latency().await;
        Ok(self.products().iter().find(|p| p.id == id).cloned())
    }

    /// Barcode lookup, used by the POS terminal scanner path.
    pub async fn get_by_barcode(&self, barcode: &str) -> Result<Option<Product>> {
        self.simulate_latency().await;
        Ok(self
            .products()
            .iter()
            .find(|p| p.barcode == barcode)
            .cloned())
    }

    pub async fn create(&self, new: NewProduct) -> Result<Product> {
        self.simulate_latency().await;
        let now = Utc::now();
        let product = Product {
            id: self.next_id.fetch_add(1, Ordering::SeqCst).to_string(),
            name: new.name,
            sku: new.sku,
            barcode: new.barcode,
            description: new.description,
            category: new.category,
            price: new.price,
            cost: new.cost,
            stock_quantity: new.stock_quantity,
            unit: new.unit,
            image_url: new.image_url,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        self.products().push(product.clone());
        Ok(product)
    }

    pub async fn update(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>> {
        self.simulate_latency().await;
        let mut products = self.products();
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(cost) = patch.cost {
            product.cost = cost;
        }
        if let Some(stock_quantity) = patch.stock_quantity {
            product.stock_quantity = stock_quantity;
        }
        if let Some(unit) = patch.unit {
            product.unit = unit;
        }
        if let Some(image_url) = patch.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(is_active) = patch.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    /// Remove a product. Returns whether a row was actually deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.simulate_latency().await;
        let mut products = self.products();
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn products(&self) -> MutexGuard<'_, Vec<Product>> {
        self.products.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProductService {
    fn default() -> Self {
        Self::new()
    }
}

fn seed_products() -> Vec<Product> {
    let now = Utc::now();
    let product = |id: &str,
                   name: &str,
                   sku: &str,
                   barcode: &str,
                   description: &str,
                   category: &str,
                   price: f64,
                   cost: f64,
                   stock: u32| Product {
        id: id.to_string(),
        name: name.to_string(),
        sku: sku.to_string(),
        barcode: barcode.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        price,
        cost,
        stock_quantity: stock,
        unit: "piece".to_string(),
        image_url: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    vec![
        product(
            "1",
            "Laptop Computer",
            "LAP-001",
            "123456789",
            "High performance laptop for professionals",
            "Electronics",
            1200.0,
            800.0,
            10,
        ),
        product(
            "2",
            "Wireless Mouse",
            "MOU-002",
            "234567890",
            "Ergonomic wireless mouse",
            "Accessories",
            25.0,
            15.0,
            50,
        ),
        product(
            "3",
            "USB-C Cable",
            "CAB-003",
            "345678901",
            "2m USB-C charging cable",
            "Cables",
            15.0,
            5.0,
            100,
        ),
        product(
            "4",
            "Bluetooth Speaker",
            "SPK-004",
            "456789012",
            "Portable Bluetooth speaker with 20h battery life",
            "Audio",
            80.0,
            40.0,
            25,
        ),
        product(
            "5",
            "Smartphone Case",
            "CAS-005",
            "567890123",
            "Protective case for smartphones",
            "Phone Accessories",
            20.0,
            8.0,
            75,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_catalog() {
        let service = ProductService::new();
        let products = service.list().await.unwrap();

        assert_eq!(products.len(), 5);
        assert_eq!(products[0].sku, "LAP-001");
    }

    #[tokio::test]
    async fn test_barcode_lookup() {
        let service = ProductService::new();

        let hit = service.get_by_barcode("234567890").await.unwrap();
        assert_eq!(hit.map(|p| p.name), Some("Wireless Mouse".to_string()));

        let miss = service.get_by_barcode("000000000").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let service = ProductService::new();
        let created = service
            .create(NewProduct {
                name: "HDMI Adapter".into(),
                sku: "ADP-006".into(),
                barcode: "678901234".into(),
                description: "USB-C to HDMI adapter".into(),
                category: "Cables".into(),
                price: 30.0,
                cost: 12.0,
                stock_quantity: 40,
                unit: "piece".into(),
                image_url: None,
                is_active: true,
            })
            .await
            .unwrap();

        assert_eq!(created.id, "6");
        let fetched = service.get("6").await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_update_patches_price_and_stock() {
        let service = ProductService::new();
        let updated = service
            .update(
                "3",
                ProductPatch {
                    price: Some(12.5),
                    stock_quantity: Some(80),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.price, 12.5);
        assert_eq!(updated.stock_quantity, 80);
        assert_eq!(updated.name, "USB-C Cable");
    }

    #[tokio::test]
    async fn test_delete() {
        let service = ProductService::new();

        assert!(service.delete("5").await.unwrap());
        assert!(service.get("5").await.unwrap().is_none());
        assert!(!service.delete("5").await.unwrap());
    }
}

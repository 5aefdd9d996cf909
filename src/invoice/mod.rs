use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub mod money;
pub mod pdf;
pub mod picker;
pub mod store;

pub use money::Currency;

use crate::Product;

/// One invoice row. Owned exclusively by its parent [`Invoice`]; the
/// optional `product_id` is a weak reference into the catalog (the product
/// may be deleted independently).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    #[serde(default)]
    pub product_id: Option<String>,
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub discount: f64,
}

impl LineItem {
    /// Blank row: quantity 1, zero price, no discount.
    pub fn new() -> LineItem {
        LineItem {
            id: Uuid::new_v4().to_string(),
            product_id: None,
            name: String::new(),
            description: String::new(),
            quantity: 1,
            unit_price: 0.0,
            discount: 0.0,
        }
    }

    /// Row pre-filled from a catalog product. The description carries a SKU
    /// reference so the row stays meaningful if the product is later deleted.
    pub fn from_product(product: &Product) -> LineItem {
        LineItem {
            id: Uuid::new_v4().to_string(),
            product_id: Some(product.id.clone()),
            name: product.name.clone(),
            description: format!("SKU: {}", product.sku),
            quantity: 1,
            unit_price: product.price,
            discount: 0.0,
        }
    }

    /// Extended total: `qty * price * (1 - discount/100)`. Recomputed on
    /// every call, never cached.
    pub fn line_total(&self) -> f64 {
        let gross = self.quantity as f64 * self.unit_price;
        gross - gross * self.discount / 100.0
    }
}

impl Default for LineItem {
    fn default() -> Self {
        LineItem::new()
    }
}

/// Typed update surface for one row. Only fields present in the patch are
/// touched; numeric fields pass through the coercion helpers below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
}

/// Quantity is an integer of at least 1; anything else becomes 1.
pub fn normalize_quantity(q: i64) -> i64 {
    if q < 1 {
        1
    } else {
        q
    }
}

/// Prices are non-negative finite numbers; anything else becomes 0.
pub fn normalize_price(p: f64) -> f64 {
    if p.is_finite() && p >= 0.0 {
        p
    } else {
        0.0
    }
}

/// Discount percent is clamped into [0, 100]; non-finite input becomes 0.
pub fn normalize_discount(d: f64) -> f64 {
    if d.is_finite() {
        d.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Tax rate follows the discount rules.
pub fn normalize_tax_rate(r: f64) -> f64 {
    normalize_discount(r)
}

/// Raw form input -> quantity. Non-numeric text falls back to 1 (the
/// editor never leaves a row without a usable quantity).
pub fn coerce_quantity(raw: &str) -> i64 {
    normalize_quantity(raw.trim().parse::<i64>().unwrap_or(1))
}

/// Raw form input -> price. Non-numeric text falls back to 0.
pub fn coerce_price(raw: &str) -> f64 {
    normalize_price(raw.trim().parse::<f64>().unwrap_or(0.0))
}

/// Raw form input -> discount percent. Non-numeric text falls back to 0.
pub fn coerce_discount(raw: &str) -> f64 {
    normalize_discount(raw.trim().parse::<f64>().unwrap_or(0.0))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillTo {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillToPatch {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// The invoice being edited. One instance per editing session; totals are
/// derived on demand and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_number: String,
    /// YYYY-MM-DD
    pub date: String,
    /// YYYY-MM-DD
    pub due_date: String,
    #[serde(default)]
    pub bill_to: BillTo,
    pub items: Vec<LineItem>,
    pub tax_rate: f64,
    pub currency: Currency,
    pub notes: String,
}

/// Header-level update surface (dates, tax, currency, notes, bill-to).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatch {
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub bill_to: Option<BillToPatch>,
    #[serde(default)]
    pub tax_rate: Option<f64>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// `INV-<base36 millis>-<3 random base36 chars>`. Timestamp plus a short
/// random suffix; a display label, not a primary key.
pub fn generate_invoice_number() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("INV-{}-{}", to_base36(millis), random_base36(3))
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

fn random_base36(len: usize) -> String {
    use rand::Rng;
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| DIGITS[rng.gen_range(0..36)] as char)
        .collect()
}

fn ymd(d: time::Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

impl Invoice {
    /// Fresh editing session: generated number, dated today, due in 30
    /// days, 5% tax, default currency.
    pub fn new() -> Invoice {
        let today = OffsetDateTime::now_utc().date();
        let due = today.checked_add(Duration::days(30)).unwrap_or(today);
        Invoice {
            invoice_number: generate_invoice_number(),
            date: ymd(today),
            due_date: ymd(due),
            bill_to: BillTo::default(),
            items: Vec::new(),
            tax_rate: 5.0,
            currency: Currency::default(),
            notes: "Thank you for your business.".to_string(),
        }
    }

    /// Appends at the end; display order is insertion order. Returns the
    /// new row's id.
    pub fn add_item(&mut self, item: LineItem) -> String {
        let id = item.id.clone();
        self.items.push(item);
        id
    }

    pub fn add_blank_item(&mut self) -> String {
        self.add_item(LineItem::new())
    }

    pub fn add_product(&mut self, product: &Product) -> String {
        self.add_item(LineItem::from_product(product))
    }

    /// Removes the row with the given id; absent ids are a no-op.
    pub fn remove_item(&mut self, id: &str) {
        if let Some(pos) = self.items.iter().position(|it| it.id == id) {
            self.items.remove(pos);
        }
    }

    /// Applies a patch to the row with the given id; absent ids are a
    /// no-op. Numeric fields are normalized, never rejected.
    pub fn update_item(&mut self, id: &str, patch: LineItemPatch) {
        let Some(item) = self.items.iter_mut().find(|it| it.id == id) else {
            return;
        };
        if let Some(v) = patch.name {
            item.name = v;
        }
        if let Some(v) = patch.description {
            item.description = v;
        }
        if let Some(v) = patch.quantity {
            item.quantity = normalize_quantity(v);
        }
        if let Some(v) = patch.unit_price {
            item.unit_price = normalize_price(v);
        }
        if let Some(v) = patch.discount {
            item.discount = normalize_discount(v);
        }
    }

    /// Applies header-level edits with the same normalization discipline.
    pub fn apply(&mut self, patch: InvoicePatch) {
        if let Some(v) = patch.invoice_number {
            self.invoice_number = v;
        }
        if let Some(v) = patch.date {
            self.date = v;
        }
        if let Some(v) = patch.due_date {
            self.due_date = v;
        }
        if let Some(b) = patch.bill_to {
            if let Some(v) = b.company_name {
                self.bill_to.company_name = v;
            }
            if let Some(v) = b.contact_person {
                self.bill_to.contact_person = v;
            }
            if let Some(v) = b.address {
                self.bill_to.address = v;
            }
            if let Some(v) = b.email {
                self.bill_to.email = v;
            }
            if let Some(v) = b.phone {
                self.bill_to.phone = v;
            }
        }
        if let Some(v) = patch.tax_rate {
            self.tax_rate = normalize_tax_rate(v);
        }
        if let Some(v) = patch.currency {
            self.currency = v;
        }
        if let Some(v) = patch.notes {
            self.notes = v;
        }
    }

    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|it| it.line_total()).sum()
    }

    pub fn tax(&self) -> f64 {
        self.subtotal() * self.tax_rate / 100.0
    }

    pub fn total(&self) -> f64 {
        self.subtotal() + self.tax()
    }

    pub fn format_amount(&self, v: f64) -> String {
        money::format_amount(self.currency, v)
    }
}

impl Default for Invoice {
    fn default() -> Self {
        Invoice::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, sku: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "power-tools".to_string(),
            sku: sku.to_string(),
            price,
            description: String::new(),
            specs: Vec::new(),
            image: String::new(),
            featured: false,
        }
    }

    #[test]
    fn line_total_applies_discount() {
        let mut it = LineItem::new();
        it.quantity = 2;
        it.unit_price = 100.0;
        it.discount = 10.0;
        assert_eq!(it.line_total(), 180.0);
    }

    #[test]
    fn line_total_never_negative_for_valid_inputs() {
        let mut it = LineItem::new();
        it.quantity = 3;
        it.unit_price = 19.99;
        it.discount = 100.0;
        assert_eq!(it.line_total(), 0.0);
    }

    #[test]
    fn totals_for_known_inputs() {
        // items = [{qty:2, price:100, discount:10}], taxRate = 5
        let mut inv = Invoice::new();
        let id = inv.add_blank_item();
        inv.update_item(
            &id,
            LineItemPatch {
                quantity: Some(2),
                unit_price: Some(100.0),
                discount: Some(10.0),
                ..Default::default()
            },
        );
        inv.apply(InvoicePatch {
            tax_rate: Some(5.0),
            ..Default::default()
        });
        assert_eq!(inv.subtotal(), 180.0);
        assert_eq!(inv.tax(), 9.0);
        assert_eq!(inv.total(), 189.0);
    }

    #[test]
    fn totals_are_idempotent_and_order_independent() {
        let mut inv = Invoice::new();
        let id = inv.add_blank_item();
        inv.update_item(
            &id,
            LineItemPatch {
                quantity: Some(4),
                unit_price: Some(12.5),
                ..Default::default()
            },
        );
        let total_first = inv.total();
        let tax = inv.tax();
        let sub = inv.subtotal();
        assert_eq!(inv.total(), total_first);
        assert_eq!(sub + tax, total_first);
    }

    #[test]
    fn add_then_remove_restores_item_sequence() {
        let mut inv = Invoice::new();
        let a = inv.add_blank_item();
        let b = inv.add_blank_item();
        let before: Vec<String> = inv.items.iter().map(|i| i.id.clone()).collect();

        let c = inv.add_blank_item();
        inv.remove_item(&c);

        let after: Vec<String> = inv.items.iter().map(|i| i.id.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(after, vec![a, b]);

        // fresh ids keep coming after a removal
        let d = inv.add_blank_item();
        assert!(!before.contains(&d));
    }

    #[test]
    fn remove_and_update_missing_id_are_noops() {
        let mut inv = Invoice::new();
        inv.add_blank_item();
        let len = inv.items.len();
        inv.remove_item("nope");
        inv.update_item(
            "nope",
            LineItemPatch {
                quantity: Some(9),
                ..Default::default()
            },
        );
        assert_eq!(inv.items.len(), len);
        assert_eq!(inv.items[0].quantity, 1);
    }

    #[test]
    fn item_from_product_carries_sku_reference() {
        let p = product("1", "Cordless Drill X200", "PT-001", 562.46);
        let it = LineItem::from_product(&p);
        assert_eq!(it.name, "Cordless Drill X200");
        assert_eq!(it.description, "SKU: PT-001");
        assert_eq!(it.unit_price, 562.46);
        assert_eq!(it.quantity, 1);
        assert_eq!(it.product_id.as_deref(), Some("1"));
    }

    #[test]
    fn coercion_defaults_and_clamps() {
        assert_eq!(coerce_quantity("abc"), 1);
        assert_eq!(coerce_quantity("0"), 1);
        assert_eq!(coerce_quantity("7"), 7);
        assert_eq!(coerce_price("-3"), 0.0);
        assert_eq!(coerce_price("12.5"), 12.5);
        assert_eq!(coerce_discount("150"), 100.0);
        assert_eq!(coerce_discount("x"), 0.0);
        assert_eq!(normalize_discount(f64::NAN), 0.0);
    }

    #[test]
    fn invoice_formats_amounts_in_its_currency() {
        let mut inv = Invoice::new();
        assert_eq!(inv.format_amount(42.5), "SAR42.50");
        inv.currency = Currency::Usd;
        assert_eq!(inv.format_amount(42.5), "$42.50");
    }

    #[test]
    fn invoice_number_shape() {
        let n = generate_invoice_number();
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "INV");
        assert!(!parts[1].is_empty());
        assert_eq!(parts[2].len(), 3);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn due_date_defaults_thirty_days_out() {
        let inv = Invoice::new();
        assert_ne!(inv.date, inv.due_date);
        assert_eq!(inv.tax_rate, 5.0);
        assert_eq!(inv.currency, Currency::Sar);
    }

    #[test]
    fn base36_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(46655), "ZZZ");
    }
}

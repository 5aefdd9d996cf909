use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Mutex, time::Duration};

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use sha2::{Digest, Sha256};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

pub mod invoice;

const DB_FILE: &str = "grayship.db";
const DB_ENV: &str = "GRAYSHIP_DB";
const SETTINGS_ID: &str = "company";
const ADMIN_HASH_KEY: &str = "admin_password_sha256";
const DEFAULT_ADMIN_PASSWORD: &str = "gs-admin-password";

pub fn now_iso() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn today_ymd() -> String {
    let d = OffsetDateTime::now_utc().date();
    format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
}

pub fn sanitize_filename(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        let ok = ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' || ch == ' ';
        out.push(if ok { ch } else { '_' });
    }
    let trimmed = out.trim().to_string();
    if trimmed.is_empty() { "invoice".to_string() } else { trimmed }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub sku: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub sku: String,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specs: Option<Vec<String>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    #[serde(default)]
    pub swift_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub whatsapp_number: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub bank_details: Option<BankDetails>,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        CompanyInfo {
            name: "GrayShip".to_string(),
            tagline: "Quality Industrial Tools & Equipment".to_string(),
            address: "Al-Khafji Al Jawharah Dist prince Naif Ibn Abdulaziz P.O.39261".to_string(),
            city: "Al Khafji".to_string(),
            country: "Saudi".to_string(),
            phone: "+966597566381".to_string(),
            email: "info@grayship.co".to_string(),
            whatsapp_number: "+966597566381".to_string(),
            website: "www.grayship.co".to_string(),
            tax_id: Some("TAX-123456789".to_string()),
            bank_details: Some(BankDetails {
                bank_name: "xxxxx".to_string(),
                account_name: "grayship est.".to_string(),
                account_number: "xxxxxx".to_string(),
                swift_code: Some("xxxxxx".to_string()),
            }),
        }
    }
}

pub fn default_categories() -> Vec<Category> {
    let rows = [
        ("construction-tools", "Construction Tools", "Hammer", "Heavy-duty tools for construction sites"),
        ("power-tools", "Power Tools", "Drill", "Electric and battery-powered tools"),
        ("welding-equipment", "Welding Equipment & Consumables", "Flame", "Welding machines and accessories"),
        ("sanitary-plumbing", "Sanitary & Plumbing", "Droplets", "Plumbing fixtures and fittings"),
        ("lubricants-chemicals", "Lubricants & Chemicals", "FlaskConical", "Industrial lubricants and chemicals"),
        ("painting-accessories", "Painting & Accessories", "Paintbrush", "Paints, brushes, and accessories"),
        ("air-water-hoses", "Air & Water Hoses", "Cable", "Industrial hoses and fittings"),
        ("valves-fittings", "Valves & Fittings", "CircleDot", "Industrial valves and pipe fittings"),
        ("locks-hardware", "Locks & Hardware", "Lock", "Security locks and hardware items"),
        ("gardening-tools", "Gardening Tools", "Leaf", "Tools for landscaping and gardening"),
        ("cleaning-appliances", "Cleaning Appliances", "SprayCan", "Industrial cleaning equipment"),
    ];
    rows.iter()
        .map(|(id, name, icon, description)| Category {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
        })
        .collect()
}

/// Starter catalog loaded into an empty database. Prices are in SAR.
pub fn default_catalog() -> Vec<Product> {
    let rows: [(&str, &str, &str, &str, f64, &str, &[&str], bool); 8] = [
        (
            "1",
            "Cordless Drill X200",
            "power-tools",
            "PT-001",
            562.46,
            "Professional-grade cordless drill with variable speed control and ergonomic design for extended use.",
            &["18V Lithium-ion", "2Ah Battery", "Variable Speed 0-1500 RPM", "13mm Chuck", "LED Work Light"],
            true,
        ),
        (
            "2",
            "Angle Grinder 7 inch",
            "construction-tools",
            "CT-010",
            337.46,
            "Heavy-duty angle grinder perfect for cutting, grinding, and polishing metal surfaces.",
            &["750W Motor", "7 inch Abrasive Disc", "8000 RPM", "Side Handle", "Spindle Lock"],
            true,
        ),
        (
            "3",
            "Industrial Welding Machine 250A",
            "welding-equipment",
            "WELD-05",
            2249.96,
            "Inverter welding machine for MMA and TIG work on site or in the shop.",
            &["250A Output", "MMA/TIG", "Hot Start", "Anti-Stick"],
            true,
        ),
        (
            "4",
            "Professional Impact Wrench",
            "power-tools",
            "PT-015",
            749.96,
            "High-torque impact wrench for automotive and assembly applications.",
            &["1/2 inch Drive", "600Nm Torque", "Brushless Motor"],
            true,
        ),
        (
            "5",
            "Gate Valve 2 inch Brass",
            "valves-fittings",
            "VF-001",
            172.46,
            "Brass gate valve with threaded connections for water and low-pressure lines.",
            &["2 inch NPT", "Brass Body", "Non-Rising Stem"],
            false,
        ),
        (
            "6",
            "Multi-Purpose Lubricant Spray",
            "lubricants-chemicals",
            "LC-005",
            48.71,
            "Penetrating lubricant for rusted fasteners, hinges, and general maintenance.",
            &["400ml Aerosol", "Corrosion Protection"],
            false,
        ),
        (
            "7",
            "Professional Paint Sprayer",
            "painting-accessories",
            "PA-008",
            937.46,
            "Airless paint sprayer for fast, even coverage on large surfaces.",
            &["650W Motor", "Adjustable Flow", "1.5L Container"],
            true,
        ),
        (
            "8",
            "Industrial Pressure Washer",
            "cleaning-appliances",
            "CA-007",
            1687.46,
            "High-pressure washer for industrial cleaning of equipment and surfaces.",
            &["150 Bar", "2200W", "10m Hose", "Detergent Tank"],
            true,
        ),
    ];

    rows.iter()
        .map(
            |(id, name, category, sku, price, description, specs, featured)| Product {
                id: id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                sku: sku.to_string(),
                price: *price,
                description: description.to_string(),
                specs: specs.iter().map(|s| s.to_string()).collect(),
                image: String::new(),
                featured: *featured,
            },
        )
        .collect()
}

fn sqlite_error_string(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(code, msg) => {
            let message = msg.clone().unwrap_or_else(|| "".to_string());
            format!(
                "sqlite(code={:?}, extended_code={}, msg={})",
                code.code, code.extended_code, message
            )
        }
        other => other.to_string(),
    }
}

/// Picks the first existing candidate, or the first writable location for a
/// fresh database: the `GRAYSHIP_DB` override, then next to the executable,
/// then the working directory.
pub fn resolve_db_path() -> Result<PathBuf, String> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Ok(overridden) = std::env::var(DB_ENV) {
        if !overridden.trim().is_empty() {
            candidates.push(PathBuf::from(overridden));
        }
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(DB_FILE));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(DB_FILE));
    }

    for p in &candidates {
        if p.exists() {
            return Ok(p.clone());
        }
    }

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| "Unable to resolve database path".to_string())
}

fn configure_sqlite(conn: &Connection) -> Result<(), rusqlite::Error> {
    // Apply PRAGMAs on init (outside any transaction).
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;\n\
         PRAGMA synchronous = NORMAL;\n\
         PRAGMA foreign_keys = ON;\n\
         PRAGMA temp_store = MEMORY;\n\
         PRAGMA busy_timeout = 5000;\n",
    )?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS app_meta (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS settings (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            data_json TEXT NOT NULL,
            updatedAt TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            sku TEXT NOT NULL,
            price REAL NOT NULL,
            featured INTEGER NOT NULL DEFAULT 0,
            createdAt TEXT NOT NULL,
            data_json TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
        CREATE INDEX IF NOT EXISTS idx_products_sku ON products(sku);
        "#,
    )?;
    Ok(())
}

fn apply_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    let v: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    if v == 0 {
        // Fresh database; init_schema created the current layout.
        conn.execute_batch("PRAGMA user_version = 2;")?;
        return Ok(());
    }

    if v < 2 {
        conn.execute_batch(
            "ALTER TABLE products ADD COLUMN featured INTEGER NOT NULL DEFAULT 0;\n\
             PRAGMA user_version = 2;\n",
        )?;
    }
    Ok(())
}

fn ensure_settings_row(conn: &Connection) -> Result<(), rusqlite::Error> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(1) FROM settings WHERE id = ?1",
            params![SETTINGS_ID],
            |row| row.get(0),
        )
        .unwrap_or(0);
    if count > 0 {
        return Ok(());
    }

    let info = CompanyInfo::default();
    let data_json = serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string());
    conn.execute(
        "INSERT INTO settings (id, name, email, phone, data_json, updatedAt)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![SETTINGS_ID, info.name, info.email, info.phone, data_json, now_iso()],
    )?;
    Ok(())
}

fn ensure_admin_hash(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO app_meta (key, value) VALUES (?1, ?2)",
        params![ADMIN_HASH_KEY, sha256_hex(DEFAULT_ADMIN_PASSWORD)],
    )?;
    Ok(())
}

fn seed_catalog(conn: &Connection) -> Result<(), rusqlite::Error> {
    let count: i64 = conn.query_row("SELECT COUNT(1) FROM products", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }

    let now = now_iso();
    for p in default_catalog() {
        let json = serde_json::to_string(&p).unwrap_or_else(|_| "{}".to_string());
        conn.execute(
            "INSERT INTO products (id, name, category, sku, price, featured, createdAt, data_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![p.id, p.name, p.category, p.sku, p.price, p.featured as i32, now, json],
        )?;
    }
    Ok(())
}

/// Single shared SQLite handle. Reads and writes go through one connection
/// behind a mutex; there is no cross-process story here.
pub struct AppDb {
    conn: Mutex<Connection>,
}

impl AppDb {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
        }

        let conn = Connection::open(&path).map_err(|e| e.to_string())?;
        configure_sqlite(&conn).map_err(|e| e.to_string())?;
        init_schema(&conn).map_err(|e| e.to_string())?;
        apply_migrations(&conn).map_err(|e| e.to_string())?;
        ensure_settings_row(&conn).map_err(|e| e.to_string())?;
        ensure_admin_hash(&conn).map_err(|e| e.to_string())?;
        seed_catalog(&conn).map_err(|e| e.to_string())?;

        log::info!("database ready at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_default() -> Result<Self, String> {
        Self::open(resolve_db_path()?)
    }

    fn with_read<T, F>(&self, op_name: &'static str, f: F) -> Result<T, String>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let guard = self.conn.lock().map_err(|_| "db mutex poisoned".to_string())?;
        f(&guard).map_err(|e| {
            let msg = sqlite_error_string(&e);
            log::error!("sqlite op={} error={}", op_name, msg);
            msg
        })
    }

    fn with_write<T, F>(&self, op_name: &'static str, f: F) -> Result<T, String>
    where
        F: FnOnce(&mut Connection) -> Result<T, rusqlite::Error>,
    {
        let mut guard = self.conn.lock().map_err(|_| "db mutex poisoned".to_string())?;
        f(&mut guard).map_err(|e| {
            let msg = sqlite_error_string(&e);
            log::error!("sqlite op={} error={}", op_name, msg);
            msg
        })
    }

    // ----- catalog -----

    pub fn list_products(&self) -> Result<Vec<Product>, String> {
        self.with_read("list_products", |conn| {
            let mut stmt =
                conn.prepare("SELECT data_json FROM products ORDER BY CAST(id AS INTEGER), id")?;
            let mut rows = stmt.query([])?;
            let mut out: Vec<Product> = Vec::new();
            while let Some(row) = rows.next()? {
                let json: String = row.get(0)?;
                if let Ok(p) = serde_json::from_str::<Product>(&json) {
                    out.push(p);
                }
            }
            Ok(out)
        })
    }

    pub fn list_products_in_category(&self, category: &str) -> Result<Vec<Product>, String> {
        let category = category.to_string();
        self.with_read("list_products_in_category", move |conn| {
            let mut stmt = conn.prepare(
                "SELECT data_json FROM products WHERE category = ?1 ORDER BY CAST(id AS INTEGER), id",
            )?;
            let mut rows = stmt.query(params![category])?;
            let mut out: Vec<Product> = Vec::new();
            while let Some(row) = rows.next()? {
                let json: String = row.get(0)?;
                if let Ok(p) = serde_json::from_str::<Product>(&json) {
                    out.push(p);
                }
            }
            Ok(out)
        })
    }

    pub fn get_product(&self, id: &str) -> Result<Option<Product>, String> {
        let id = id.to_string();
        self.with_read("get_product", move |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT data_json FROM products WHERE id = ?1",
                    params![id],
                    |r| r.get(0),
                )
                .optional()?;
            Ok(json.and_then(|j| serde_json::from_str(&j).ok()))
        })
    }

    pub fn create_product(&self, input: NewProduct) -> Result<Product, String> {
        self.with_write("create_product", move |conn| {
            let created = Product {
                id: Uuid::new_v4().to_string(),
                name: input.name,
                category: input.category,
                sku: input.sku,
                price: invoice::normalize_price(input.price),
                description: input.description,
                specs: input.specs,
                image: input.image,
                featured: input.featured,
            };
            let json = serde_json::to_string(&created).unwrap_or_else(|_| "{}".to_string());
            conn.execute(
                "INSERT INTO products (id, name, category, sku, price, featured, createdAt, data_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    created.id,
                    created.name,
                    created.category,
                    created.sku,
                    created.price,
                    created.featured as i32,
                    now_iso(),
                    json,
                ],
            )?;
            Ok(created)
        })
    }

    pub fn update_product(&self, id: &str, patch: ProductPatch) -> Result<Option<Product>, String> {
        let id = id.to_string();
        self.with_write("update_product", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let existing_json: Option<String> = tx
                .query_row(
                    "SELECT data_json FROM products WHERE id = ?1",
                    params![&id],
                    |r| r.get(0),
                )
                .optional()?;
            let Some(j) = existing_json else {
                return Ok(None);
            };
            let mut existing: Product = match serde_json::from_str(&j) {
                Ok(v) => v,
                Err(_) => return Ok(None),
            };

            if let Some(v) = patch.name {
                existing.name = v;
            }
            if let Some(v) = patch.category {
                existing.category = v;
            }
            if let Some(v) = patch.sku {
                existing.sku = v;
            }
            if let Some(v) = patch.price {
                existing.price = invoice::normalize_price(v);
            }
            if let Some(v) = patch.description {
                existing.description = v;
            }
            if let Some(v) = patch.specs {
                existing.specs = v;
            }
            if let Some(v) = patch.image {
                existing.image = v;
            }
            if let Some(v) = patch.featured {
                existing.featured = v;
            }

            let json = serde_json::to_string(&existing).unwrap_or_else(|_| "{}".to_string());
            tx.execute(
                "UPDATE products SET name = ?2, category = ?3, sku = ?4, price = ?5,
                 featured = ?6, data_json = ?7 WHERE id = ?1",
                params![
                    existing.id,
                    existing.name,
                    existing.category,
                    existing.sku,
                    existing.price,
                    existing.featured as i32,
                    json,
                ],
            )?;
            tx.commit()?;
            Ok(Some(existing))
        })
    }

    pub fn delete_product(&self, id: &str) -> Result<bool, String> {
        let id = id.to_string();
        self.with_write("delete_product", move |conn| {
            let n = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
            Ok(n > 0)
        })
    }

    // ----- company settings -----

    pub fn get_company_info(&self) -> Result<CompanyInfo, String> {
        self.with_read("get_company_info", |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT data_json FROM settings WHERE id = ?1",
                    params![SETTINGS_ID],
                    |r| r.get(0),
                )
                .optional()?;
            Ok(json
                .and_then(|j| serde_json::from_str(&j).ok())
                .unwrap_or_default())
        })
    }

    pub fn save_company_info(&self, info: CompanyInfo) -> Result<CompanyInfo, String> {
        self.with_write("save_company_info", move |conn| {
            let json = serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string());
            conn.execute(
                "INSERT INTO settings (id, name, email, phone, data_json, updatedAt)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   email = excluded.email,
                   phone = excluded.phone,
                   data_json = excluded.data_json,
                   updatedAt = excluded.updatedAt",
                params![SETTINGS_ID, info.name, info.email, info.phone, json, now_iso()],
            )?;
            Ok(info)
        })
    }

    // ----- admin gate -----

    /// Compares the SHA-256 of the supplied password against the stored
    /// digest. The plaintext is never persisted.
    pub fn verify_admin_password(&self, password: &str) -> Result<bool, String> {
        let candidate = sha256_hex(password);
        self.with_read("verify_admin_password", move |conn| {
            let stored: Option<String> = conn
                .query_row(
                    "SELECT value FROM app_meta WHERE key = ?1",
                    params![ADMIN_HASH_KEY],
                    |r| r.get(0),
                )
                .optional()?;
            Ok(stored.map(|s| s == candidate).unwrap_or(false))
        })
    }

    pub fn set_admin_password(&self, new_password: &str) -> Result<(), String> {
        if new_password.trim().is_empty() {
            return Err("admin password must not be empty".to_string());
        }
        let hash = sha256_hex(new_password);
        self.with_write("set_admin_password", move |conn| {
            conn.execute(
                "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![ADMIN_HASH_KEY, hash],
            )?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_db(dir: &std::path::Path) -> AppDb {
        AppDb::open(dir.join(DB_FILE)).unwrap()
    }

    #[test]
    fn env_override_wins_db_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("override.db");
        std::fs::write(&target, b"").unwrap();

        std::env::set_var(DB_ENV, &target);
        let resolved = resolve_db_path();
        std::env::remove_var(DB_ENV);

        assert_eq!(resolved.unwrap(), target);
    }

    #[test]
    fn fresh_db_is_seeded() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(dir.path());
        let products = db.list_products().unwrap();
        assert!(!products.is_empty());
        assert_eq!(products[0].sku, "PT-001");

        let info = db.get_company_info().unwrap();
        assert_eq!(info.name, "GrayShip");
        assert!(info.bank_details.is_some());
    }

    #[test]
    fn reopening_preserves_data_and_skips_reseed() {
        let dir = tempfile::tempdir().unwrap();
        let first_count;
        {
            let db = open_test_db(dir.path());
            first_count = db.list_products().unwrap().len();
            db.create_product(NewProduct {
                name: "Test Widget".to_string(),
                category: "power-tools".to_string(),
                sku: "PT-099".to_string(),
                price: 10.0,
                description: String::new(),
                specs: Vec::new(),
                image: String::new(),
                featured: false,
            })
            .unwrap();
        }
        let db = open_test_db(dir.path());
        assert_eq!(db.list_products().unwrap().len(), first_count + 1);
    }

    #[test]
    fn product_crud_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(dir.path());

        let created = db
            .create_product(NewProduct {
                name: "Torque Wrench".to_string(),
                category: "power-tools".to_string(),
                sku: "PT-050".to_string(),
                price: 199.0,
                description: "Click-type torque wrench".to_string(),
                specs: vec!["40-200Nm".to_string()],
                image: String::new(),
                featured: false,
            })
            .unwrap();

        let fetched = db.get_product(&created.id).unwrap().unwrap();
        assert_eq!(fetched.sku, "PT-050");

        let updated = db
            .update_product(
                &created.id,
                ProductPatch {
                    price: Some(179.0),
                    featured: Some(true),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.price, 179.0);
        assert!(updated.featured);
        // untouched fields survive the patch
        assert_eq!(updated.description, "Click-type torque wrench");

        assert!(db.delete_product(&created.id).unwrap());
        assert!(db.get_product(&created.id).unwrap().is_none());
        assert!(!db.delete_product(&created.id).unwrap());
    }

    #[test]
    fn update_missing_product_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(dir.path());
        let out = db.update_product("nope", ProductPatch::default()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn negative_price_is_normalized_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(dir.path());
        let p = db
            .create_product(NewProduct {
                name: "Broken".to_string(),
                category: "power-tools".to_string(),
                sku: "PT-098".to_string(),
                price: -5.0,
                description: String::new(),
                specs: Vec::new(),
                image: String::new(),
                featured: false,
            })
            .unwrap();
        assert_eq!(p.price, 0.0);
    }

    #[test]
    fn category_listing_filters() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(dir.path());
        let tools = db.list_products_in_category("power-tools").unwrap();
        assert!(!tools.is_empty());
        assert!(tools.iter().all(|p| p.category == "power-tools"));
        assert!(db
            .list_products_in_category("no-such-category")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn company_info_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(dir.path());

        let mut info = db.get_company_info().unwrap();
        info.name = "GrayShip Trading".to_string();
        info.bank_details = None;
        db.save_company_info(info).unwrap();

        let back = db.get_company_info().unwrap();
        assert_eq!(back.name, "GrayShip Trading");
        assert!(back.bank_details.is_none());
    }

    #[test]
    fn admin_gate_accepts_default_and_rejects_wrong() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(dir.path());
        assert!(db.verify_admin_password(DEFAULT_ADMIN_PASSWORD).unwrap());
        assert!(!db.verify_admin_password("wrong").unwrap());

        db.set_admin_password("new-secret").unwrap();
        assert!(db.verify_admin_password("new-secret").unwrap());
        assert!(!db.verify_admin_password(DEFAULT_ADMIN_PASSWORD).unwrap());
        assert!(db.set_admin_password("  ").is_err());
    }

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sanitize_filename_strips_path_separators() {
        assert_eq!(sanitize_filename("INV-123"), "INV-123");
        assert_eq!(sanitize_filename("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize_filename("   "), "invoice");
    }

    #[test]
    fn picker_finds_seeded_products() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_test_db(dir.path());
        let products = db.list_products().unwrap();
        let hits = invoice::picker::search(&products, "PT-0");
        assert!(hits.len() >= 2);
        assert!(hits.iter().all(|p| p.sku.starts_with("PT-0")));
    }
}

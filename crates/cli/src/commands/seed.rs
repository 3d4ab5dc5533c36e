//! Seed the database with users and products from a YAML file.
//!
//! Seeding is additive and safe to re-run: users whose email already exists
//! and products whose name already exists are skipped. Products are owned by
//! the first admin listed in the file.
//!
//! ```yaml
//! users:
//!   - name: Admin User
//!     email: admin@example.com
//!     password: changeme123
//!     admin: true
//! products:
//!   - name: Airpods Wireless Bluetooth Headphones
//!     image: /uploads/airpods.jpg
//!     brand: Apple
//!     category: Electronics
//!     description: Bluetooth technology lets you connect it with compatible devices
//!     price: 89.99
//!     countInStock: 10
//! ```

use std::path::Path;

use bazaar_api::db::{ProductRepository, RepositoryError, UserRepository};
use bazaar_api::models::ProductInput;
use bazaar_api::services::auth::hash_password;
use bazaar_core::{Email, UserId, UserRole};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{error, info};

use super::connect;

/// Top-level layout of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub users: Vec<SeedUser>,
    pub products: Vec<ProductInput>,
}

#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub admin: bool,
}

/// Counts reported once seeding finishes.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users_inserted: usize,
    pub users_skipped: usize,
    pub products_inserted: usize,
    pub products_skipped: usize,
}

impl SeedFile {
    /// Check every entry before anything is written.
    ///
    /// Returns one message per problem; empty means the file is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for user in &self.users {
            if user.name.trim().is_empty() {
                errors.push(format!("user {}: name is required", user.email));
            }
            if let Err(e) = Email::parse(&user.email) {
                errors.push(format!("user {}: {e}", user.email));
            }
            if user.password.is_empty() {
                errors.push(format!("user {}: password is required", user.email));
            }
        }
        for product in &self.products {
            if let Err(e) = product.clone().validated() {
                errors.push(format!("product {}: {e}", product.name));
            }
        }
        errors
    }
}

/// Seed users and products from the YAML file at `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database operation fails.
pub async fn from_file(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed data from file");

    // Parse and validate before connecting
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        users = seed.users.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = connect().await?;
    let summary = apply(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Users inserted: {}", summary.users_inserted);
    info!("  Users skipped (already exist): {}", summary.users_skipped);
    info!("  Products inserted: {}", summary.products_inserted);
    info!(
        "  Products skipped (already exist): {}",
        summary.products_skipped
    );

    Ok(())
}

async fn apply(pool: &PgPool, seed: &SeedFile) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let users = UserRepository::new(pool);
    let products = ProductRepository::new(pool);
    let mut summary = SeedSummary::default();
    let mut owner: Option<UserId> = None;

    for user in &seed.users {
        let email = Email::parse(&user.email)?;
        let role = if user.admin {
            UserRole::Admin
        } else {
            UserRole::Customer
        };

        let id = if let Some(existing) = users.get_by_email(&email).await? {
            summary.users_skipped += 1;
            existing.id
        } else {
            let hash = hash_password(&user.password)?;
            match users.create(user.name.trim(), &email, &hash, role).await {
                Ok(created) => {
                    summary.users_inserted += 1;
                    created.id
                }
                Err(RepositoryError::Conflict(_)) => {
                    summary.users_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        if user.admin && owner.is_none() {
            owner = Some(id);
        }
    }

    for product in &seed.products {
        let input = product.clone().validated()?;
        if products.exists_by_name(&input.name).await? {
            summary.products_skipped += 1;
            continue;
        }
        products.create(owner, &input).await?;
        summary.products_inserted += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
users:
  - name: Admin User
    email: Admin@Example.com
    password: changeme123
    admin: true
  - name: Jane
    email: jane@example.com
    password: changeme123
products:
  - name: Phone
    price: 599.99
    countInStock: 7
";

    #[test]
    fn test_parse_sample() {
        let seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(seed.users.len(), 2);
        assert!(seed.users[0].admin);
        assert!(!seed.users[1].admin);
        assert_eq!(seed.products[0].count_in_stock, 7);
        assert!(seed.validate().is_empty());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let seed: SeedFile = serde_yaml::from_str("products: []").unwrap();
        assert!(seed.users.is_empty());
        assert!(seed.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
users:
  - name: ''
    email: not-an-email
    password: ''
products:
  - name: Broken
    price: -1
    countInStock: 1
",
        )
        .unwrap();
        assert_eq!(seed.validate().len(), 4);
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let content = include_str!("../../seed/catalog.yaml");
        let seed: SeedFile = serde_yaml::from_str(content).unwrap();
        assert!(!seed.products.is_empty());
        assert!(seed.users.iter().any(|u| u.admin));
        assert!(seed.validate().is_empty());
    }
}

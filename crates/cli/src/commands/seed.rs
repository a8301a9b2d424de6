//! Seed the menu from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! pizza-cli seed menu crates/cli/menu.example.yaml
//! ```
//!
//! # File Format
//!
//! ```yaml
//! items:
//!   - id: margherita
//!     name: Margherita
//!     price: 9.99
//!     image: https://example.com/margherita.jpg
//!     description: Tomato, mozzarella, basil
//! ```
//!
//! Items are upserted by id, so running the command again updates prices
//! without duplicating entries. Existing cart lines keep the price they were
//! added at.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use pizza_cafe_app::AppContext;
use pizza_cafe_app::config::AppConfig;
use pizza_cafe_app::models::MenuItem;
use pizza_cafe_app::services::MenuCatalog;
use pizza_cafe_core::{MenuItemId, Price};

use super::CliError;

/// Top level of a menu seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuFile {
    pub items: Vec<SeedItem>,
}

/// One menu entry in a seed file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedItem {
    pub id: String,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<SeedItem> for MenuItem {
    fn from(item: SeedItem) -> Self {
        Self {
            id: MenuItemId::new(item.id),
            name: item.name,
            price: item.price,
            image_url: item.image,
            description: item.description,
        }
    }
}

/// Parse a seed file.
///
/// # Errors
///
/// Returns `CliError::Yaml` if the content is not a valid menu file.
pub fn parse_menu(content: &str) -> Result<MenuFile, CliError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Problems that would make the seeded menu unusable.
#[must_use]
pub fn validate_menu(menu: &MenuFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for item in &menu.items {
        if item.id.trim().is_empty() || item.id.contains('/') {
            errors.push(format!("invalid id {:?}", item.id));
        }
        if !seen.insert(item.id.as_str()) {
            errors.push(format!("duplicate id {:?}", item.id));
        }
        if item.name.trim().is_empty() {
            errors.push(format!("{}: name is empty", item.id));
        }
        if item.price <= Price::ZERO {
            errors.push(format!("{}: price must be positive", item.id));
        }
    }
    errors
}

/// Upsert every item of the file at `path` into `menuItems`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or validated, or a write fails.
pub async fn menu(config: AppConfig, path: &Path) -> Result<(), CliError> {
    info!(path = %path.display(), "Loading menu from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let menu = parse_menu(&content)?;

    let errors = validate_menu(&menu);
    if !errors.is_empty() {
        error!("Menu validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CliError::InvalidMenu(format!(
            "{} validation errors found",
            errors.len()
        )));
    }
    info!(items = menu.items.len(), "Menu validated");

    let ctx = AppContext::connect(config).await?;
    let catalog = MenuCatalog::new(ctx.store());
    let count = menu.items.len();
    for item in menu.items {
        catalog.upsert_item(&MenuItem::from(item)).await?;
    }

    info!("Seeding complete: {count} menu items");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
items:
  - id: margherita
    name: Margherita
    price: 9.99
    description: Tomato, mozzarella, basil
  - id: cola
    name: Cola
    price: '2.50'
";

    #[test]
    fn test_parse_menu() {
        let menu = parse_menu(SAMPLE).unwrap();
        assert_eq!(menu.items.len(), 2);
        assert!(validate_menu(&menu).is_empty());

        let item = MenuItem::from(menu.items.into_iter().next().unwrap());
        assert_eq!(item.id.as_str(), "margherita");
        assert_eq!(item.price, Price::from_cents(999));
        assert!(item.image_url.is_none());
    }

    #[test]
    fn test_example_file_is_valid() {
        let content = include_str!("../../menu.example.yaml");
        let menu = parse_menu(content).unwrap();
        assert!(!menu.items.is_empty());
        assert_eq!(validate_menu(&menu), Vec::<String>::new());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = parse_menu("items:\n  - id: x\n    name: X\n    price: 1\n    Price: 2\n");
        assert!(matches!(err, Err(CliError::Yaml(_))));
    }

    #[test]
    fn test_validation_catches_duplicates_and_bad_prices() {
        let menu = parse_menu(
            "items:\n  - {id: a, name: A, price: 1}\n  - {id: a, name: B, price: 0}\n  - {id: 'x/y', name: ' ', price: abc}\n",
        )
        .unwrap();
        let errors = validate_menu(&menu);
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.contains("duplicate")));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = menu(AppConfig::default(), &dir.path().join("absent.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}

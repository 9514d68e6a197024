//! Table layout used to resolve logical entry fields.
//!
//! The defaults describe the stock schema: an `entries` table with a fixed set
//! of filterable columns, and an `entry_data` attribute table holding custom
//! field values as `(content_type_field_short_tag, data)` rows.
//!
//! ```toml
//! [entity]
//! table = "entries"
//! key = "id"
//! columns = ["id", "title", "url_title"]
//!
//! [attributes]
//! table = "entry_data"
//! entity_key = "entry_id"
//! tag_column = "content_type_field_short_tag"
//! value_column = "data"
//! ```

use crate::error::{FilterError, FilterResult};
use crate::ident::Ident;
use serde::Deserialize;
use std::path::Path;

/// Columns of the entity table that can be filtered directly.
pub const DEFAULT_ENTRY_COLUMNS: &[&str] = &[
    "id",
    "title",
    "url_title",
    "route",
    "meta_title",
    "meta_keywords",
    "meta_description",
    "entry_status_id",
    "author_id",
    "created_at",
    "updated_at",
];

/// Full filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default)]
    pub entity: EntitySchema,
    #[serde(default)]
    pub attributes: AttributeSchema,
}

/// The entity ("entries") table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntitySchema {
    pub table: String,
    /// Primary key, joined against [`AttributeSchema::entity_key`].
    pub key: String,
    /// Logical fields that map 1:1 onto columns of `table`.
    pub columns: Vec<String>,
}

impl Default for EntitySchema {
    fn default() -> Self {
        Self {
            table: "entries".to_string(),
            key: "id".to_string(),
            columns: DEFAULT_ENTRY_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl EntitySchema {
    pub fn has_column(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c == field)
    }

    pub fn column(&self, field: &str) -> String {
        format!("{}.{}", self.table, field)
    }
}

/// The attribute-value ("entry_data") side table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributeSchema {
    pub table: String,
    /// Foreign key pointing at the entity key.
    pub entity_key: String,
    /// Column holding the custom field's short tag.
    pub tag_column: String,
    /// Column holding the custom field's value.
    pub value_column: String,
}

impl Default for AttributeSchema {
    fn default() -> Self {
        Self {
            table: "entry_data".to_string(),
            entity_key: "entry_id".to_string(),
            tag_column: "content_type_field_short_tag".to_string(),
            value_column: "data".to_string(),
        }
    }
}

impl AttributeSchema {
    pub fn tag(&self) -> String {
        format!("{}.{}", self.table, self.tag_column)
    }

    pub fn value(&self) -> String {
        format!("{}.{}", self.table, self.value_column)
    }
}

impl FilterConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> FilterResult<Self> {
        let config: FilterConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> FilterResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FilterError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Check every configured table and column is a valid identifier.
    pub fn validate(&self) -> FilterResult<()> {
        let entity = &self.entity;
        Ident::qualified(&entity.table, &entity.key)?;
        if entity.columns.is_empty() {
            return Err(FilterError::validation("entity.columns cannot be empty"));
        }
        for column in &entity.columns {
            Ident::qualified(&entity.table, column)?;
        }

        let attrs = &self.attributes;
        for column in [&attrs.entity_key, &attrs.tag_column, &attrs.value_column] {
            Ident::qualified(&attrs.table, column)?;
        }
        if attrs.table == entity.table {
            return Err(FilterError::validation(
                "attributes.table must differ from entity.table",
            ));
        }
        Ok(())
    }
}

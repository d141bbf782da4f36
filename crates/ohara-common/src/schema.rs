//! Column definitions carried alongside rows.

use crate::error::{Error, Result};
use crate::types::DataType;
use serde::{Deserialize, Serialize};

/// Option key under which a connector receives its column list.
pub const COLUMN_KEY: &str = "ohara.columns";

/// A column of a row schema.
///
/// `new_name` lets a connector rename a field on its way through; `order`
/// is the position of the column in the produced row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub new_name: String,
    pub data_type: DataType,
    pub order: u32,
}

impl Column {
    pub fn of(name: impl Into<String>, data_type: DataType, order: u32) -> Self {
        let name = name.into();
        Self {
            new_name: name.clone(),
            name,
            data_type,
            order,
        }
    }

    pub fn renamed(
        name: impl Into<String>,
        new_name: impl Into<String>,
        data_type: DataType,
        order: u32,
    ) -> Self {
        Self {
            name: name.into(),
            new_name: new_name.into(),
            data_type,
            order,
        }
    }

    /// Encode columns into the string form stored under [`COLUMN_KEY`].
    pub fn from_columns(columns: &[Column]) -> String {
        // A Vec of plain structs always serializes.
        serde_json::to_string(columns).unwrap_or_else(|_| "[]".to_string())
    }

    /// Decode the string form produced by [`Column::from_columns`].
    pub fn to_columns(s: &str) -> Result<Vec<Column>> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Vec::new());
        }
        let columns: Vec<Column> = serde_json::from_str(s)?;
        for column in &columns {
            if column.name.is_empty() {
                return Err(Error::InvalidColumns(
                    "column name must not be empty".to_string(),
                ));
            }
        }
        Ok(columns)
    }
}

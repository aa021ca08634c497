//! Schema map: canonical output field -> spreadsheet column label.
//!
//! The built-in map describes the course offer catalog export. A different
//! mapping can be supplied as a JSON object whose key order is kept:
//!
//! ```json
//! {
//!   "sku_id": "SKU - ID",
//!   "sku_intake": "SKU - Intake"
//! }
//! ```

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};

/// Built-in offer catalog mapping, in output order.
pub const OFFER_COLUMNS: &[(&str, &str)] = &[
    ("sku_id", "SKU - ID"),
    ("sku_codigo_wakeme_oferta_parcial", "SKU - Código WakeMe Oferta (Parcial)"),
    ("sku_intake", "SKU - Intake"),
    ("bloco", "SKU - Bloco"),
    ("curso_nivel_ensino_id", "Curso - NivelEnsino - ID"),
    ("curso_nivel_ensino_nome", "Curso - NivelEnsino - Nome"),
    ("habilitacao_codigo_erp", "Habilitação - Código ERP"),
    ("habilitacao_nome", "Habilitação - Nome"),
    ("modalidade_id", "Modalidade - ID"),
    ("modalidade_nome", "Modalidade - Nome"),
    ("curso_id_erp", "Curso - ID ERP"),
    ("curso_id_site", "Curso - ID Site"),
    ("curso_nome_comercial", "Curso - Nome Comercial"),
    ("curso_nome_academico", "Curso - Nome Acadêmico"),
    ("curso_nome_hubspot", "Curso - Nome HubSpot"),
    ("sku_uf", "SKU - UF"),
    ("sku_cidade", "SKU - Cidade"),
    ("unidade_id_erp", "Unidade - ID ERP"),
    ("unidade_nome", "Unidade - Nome"),
    ("sku_turno_id_erp", "SKU - Turno ID ERP"),
    ("sku_turno_id_mid", "SKU - Turno ID Mid"),
    ("sku_turno_sigla", "SKU - Turno Sigla"),
    ("sku_turno_nome", "SKU - Turno Nome"),
    ("curso_duracao", "Curso - Duração"),
];

/// One entry of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Key used in the JSON output
    pub field: String,
    /// Header text expected in the spreadsheet
    pub column: String,
}

/// Ordered, immutable mapping from output field to source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMap {
    entries: Vec<FieldMapping>,
}

impl SchemaMap {
    /// The built-in offer catalog schema.
    pub fn offers() -> Self {
        Self {
            entries: OFFER_COLUMNS
                .iter()
                .map(|(field, column)| FieldMapping {
                    field: (*field).to_string(),
                    column: (*column).to_string(),
                })
                .collect(),
        }
    }

    /// Build a schema from `(field, column)` pairs. Field names must be unique.
    pub fn from_pairs<I, F, C>(pairs: I) -> SchemaResult<Self>
    where
        I: IntoIterator<Item = (F, C)>,
        F: Into<String>,
        C: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for (field, column) in pairs {
            let field = field.into();
            if !seen.insert(field.clone()) {
                return Err(SchemaError::DuplicateField(field));
            }
            entries.push(FieldMapping {
                field,
                column: column.into(),
            });
        }

        if entries.is_empty() {
            return Err(SchemaError::InvalidSchema("schema has no fields".to_string()));
        }

        Ok(Self { entries })
    }

    /// Parse a schema from a JSON object, keeping key order.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let pairs: OrderedPairs =
            serde_json::from_str(json).map_err(|e| SchemaError::InvalidSchema(e.to_string()))?;
        Self::from_pairs(pairs.0)
    }

    /// Load a schema from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SchemaError::InvalidSchema(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Iterate over the mappings in order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.entries.iter()
    }

    /// Output field names, in order.
    pub fn fields(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.field.as_str()).collect()
    }

    /// Source column labels, in order.
    pub fn columns(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.column.as_str()).collect()
    }

    /// Column label mapped to `field`.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.column.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The schema as a JSON object, in the same format [`SchemaMap::from_json`] reads.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|e| (e.field.clone(), Value::String(e.column.clone())))
            .collect();
        serde_json::to_string_pretty(&Value::Object(map))
    }
}

impl Default for SchemaMap {
    fn default() -> Self {
        Self::offers()
    }
}

/// JSON object read as a list of pairs, so duplicate keys stay visible.
struct OrderedPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedPairs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = OrderedPairs;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping field names to column labels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((field, column)) = access.next_entry::<String, String>()? {
                    pairs.push((field, column));
                }
                Ok(OrderedPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

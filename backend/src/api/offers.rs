//! Offer document loading and query filtering.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::logs::log_error;

/// Response body of `GET /api/offers`
#[derive(Debug, Clone, Serialize)]
pub struct OffersResponse {
    pub total: usize,
    pub data: Vec<Value>,
}

impl OffersResponse {
    pub fn new(data: Vec<Value>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}

/// Read the converted document. Records whose `sku_id` is null are dropped.
///
/// A missing file yields an empty list; an unreadable or malformed one is
/// logged and also yields an empty list.
pub fn load_offers(path: &Path) -> Vec<Value> {
    if !path.exists() {
        return Vec::new();
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str::<Vec<Value>>(&content).map_err(|e| e.to_string()));

    match parsed {
        Ok(records) => records
            .into_iter()
            .filter(|r| !matches!(r.get("sku_id"), Some(Value::Null)))
            .collect(),
        Err(e) => {
            log_error(format!("Error loading {}: {}", path.display(), e));
            Vec::new()
        }
    }
}

/// Extract `filter[field]=value` pairs from query parameters.
///
/// A field given more than once has its values joined with commas, in
/// query order.
pub fn parse_filters(query: &[(String, String)]) -> Vec<(String, String)> {
    let mut filters: Vec<(String, String)> = Vec::new();

    for (key, value) in query {
        let Some(field) = key.strip_prefix("filter[").and_then(|k| k.strip_suffix(']')) else {
            continue;
        };
        match filters.iter_mut().find(|(f, _)| f.as_str() == field) {
            Some(existing) => {
                existing.1.push(',');
                existing.1.push_str(value);
            }
            None => filters.push((field.to_string(), value.clone())),
        }
    }

    filters
}

/// Returns true if `item` satisfies every filter.
///
/// Values compare as trimmed strings. A null or absent field only matches
/// the filter values `null` and the empty string.
pub fn matches_filters(item: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(field, expected)| {
        let expected = expected.trim();
        match item.get(field) {
            None | Some(Value::Null) => expected == "null" || expected.is_empty(),
            Some(Value::String(s)) => s.trim() == expected,
            Some(other) => other.to_string().trim() == expected,
        }
    })
}

/// Keep the offers matching all filters.
pub fn filter_offers(offers: Vec<Value>, filters: &[(String, String)]) -> Vec<Value> {
    if filters.is_empty() {
        return offers;
    }
    offers
        .into_iter()
        .filter(|item| matches_filters(item, filters))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_filters() {
        let filters = parse_filters(&query(&[
            ("filter[sku_uf]", "PE"),
            ("page", "2"),
            ("filter[sku_id]", "1"),
            ("filter[sku_uf]", "PB"),
            ("filter", "x"),
        ]));
        assert_eq!(filters, query(&[("sku_uf", "PE,PB"), ("sku_id", "1")]));
    }

    #[test]
    fn test_repeated_filter_matches_joined_value() {
        let filters = parse_filters(&query(&[("filter[sku_uf]", "PE"), ("filter[sku_uf]", "PB")]));

        assert!(!matches_filters(&json!({"sku_uf": "PE"}), &filters));
        assert!(matches_filters(&json!({"sku_uf": "PE,PB"}), &filters));
    }

    #[test]
    fn test_matches_numbers_and_strings() {
        let item = json!({"sku_id": 101, "sku_uf": " PE ", "sku_intake": 10.5, "bloco": null});

        assert!(matches_filters(&item, &query(&[("sku_id", "101")])));
        assert!(matches_filters(&item, &query(&[("sku_uf", "PE"), ("sku_intake", " 10.5")])));
        assert!(!matches_filters(&item, &query(&[("sku_uf", "PE"), ("sku_id", "102")])));
    }

    #[test]
    fn test_null_matching() {
        let item = json!({"sku_id": 101, "bloco": null});

        assert!(matches_filters(&item, &query(&[("bloco", "null")])));
        assert!(matches_filters(&item, &query(&[("bloco", "")])));
        assert!(matches_filters(&item, &query(&[("absent", "null")])));
        assert!(!matches_filters(&item, &query(&[("bloco", "A")])));
    }

    #[test]
    fn test_load_offers_drops_null_sku() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.json");
        std::fs::write(
            &path,
            r#"[{"sku_id": 1, "sku_uf": "PE"}, {"sku_id": null, "sku_uf": "PB"}, {"sku_uf": "RN"}]"#,
        )
        .unwrap();

        let offers = load_offers(&path);
        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0]["sku_uf"], "PE");
        assert_eq!(offers[1]["sku_uf"], "RN");
    }

    #[test]
    fn test_load_offers_missing_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_offers(&dir.path().join("none.json")).is_empty());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        assert!(load_offers(&bad).is_empty());
    }

    #[test]
    fn test_response_total() {
        let response = OffersResponse::new(filter_offers(
            vec![json!({"sku_uf": "PE"}), json!({"sku_uf": "PB"})],
            &query(&[("sku_uf", "PB")]),
        ));
        assert_eq!(response.total, 1);
    }
}

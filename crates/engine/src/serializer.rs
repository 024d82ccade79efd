//! Conversion of store rows into plain records

use flightgraph_common::graph::{GraphRow, GraphValue, Scalar};
use serde_json::{Map, Number, Value};

/// Column name -> plain value, in projection order
pub type ResultRow = Map<String, Value>;

/// Strip every store-specific wrapper from the rows
pub fn serialize(rows: &[GraphRow]) -> Vec<ResultRow> {
    rows.iter().map(serialize_row).collect()
}

pub fn serialize_row(row: &GraphRow) -> ResultRow {
    row.iter()
        .map(|(column, value)| (column.to_string(), to_plain(value)))
        .collect()
}

/// Nodes, relationships and nested maps become objects of their properties;
/// lists are converted element-wise; scalars pass through.
pub fn to_plain(value: &GraphValue) -> Value {
    match value {
        GraphValue::Scalar(scalar) => match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Integer(i) => Value::from(*i),
            // NaN and infinities have no JSON form
            Scalar::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Scalar::String(s) => Value::String(s.clone()),
        },
        GraphValue::Composite(composite) => Value::Object(
            composite
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), to_plain(v)))
                .collect(),
        ),
        GraphValue::List(items) => Value::Array(items.iter().map(to_plain).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger_row() -> GraphRow {
        GraphRow::new()
            .with(
                "p",
                GraphValue::node([
                    ("record_locator", GraphValue::text("EPXXW8")),
                    ("generation", GraphValue::text("Boomer")),
                ]),
            )
            .with(
                "j",
                GraphValue::node([
                    ("food_satisfaction_score", GraphValue::integer(2)),
                    ("arrival_delay_minutes", GraphValue::float(f64::NAN)),
                ]),
            )
            .with(
                "path",
                GraphValue::List(vec![
                    GraphValue::relationship([("since", GraphValue::integer(2020))]),
                    GraphValue::text("LAX"),
                ]),
            )
    }

    #[test]
    fn test_nodes_become_plain_maps() {
        let rows = serialize(&[passenger_row()]);
        let row = &rows[0];

        assert_eq!(row["p"]["record_locator"], "EPXXW8");
        assert_eq!(row["j"]["food_satisfaction_score"], 2);
        assert_eq!(row["j"]["arrival_delay_minutes"], Value::Null);
        assert_eq!(row["path"][0]["since"], 2020);
        assert_eq!(row["path"][1], "LAX");
    }

    #[test]
    fn test_column_order_preserved() {
        let row = serialize_row(&passenger_row());
        let columns: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["p", "j", "path"]);
    }

    #[test]
    fn test_serialize_is_referentially_transparent() {
        let rows = vec![passenger_row(), GraphRow::new().with("n", GraphValue::integer(1))];
        assert_eq!(serialize(&rows), serialize(&rows));
    }
}

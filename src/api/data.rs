use std::collections::HashMap;

/// The stats of an item, keyed by the timestamp they were captured at
pub type PriceSeries = HashMap<String, Observation>;

/*
"2025-11-17T10:00:00": {
    "min_buy": 48500,
    "avg_buy": 51230,
    "quantity": 212
}
*/
#[derive(Debug, Default, Clone, PartialEq, serde::Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub min_buy: Option<serde_json::Value>,

    #[serde(flatten)]
    pub remaining: HashMap<String, serde_json::Value>,
}

impl Observation {
    pub fn with_min_buy(min_buy: impl Into<serde_json::Value>) -> Self {
        Self {
            min_buy: Some(min_buy.into()),
            remaining: HashMap::new(),
        }
    }

    /// The minimum buyout in copper, if the observation carries a usable (positive) one
    pub fn min_buy(&self) -> Option<u64> {
        let price = match self.min_buy.as_ref()? {
            serde_json::Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|v| *v > 0.0).map(|v| v.trunc() as u64))?,
            serde_json::Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };

        (price > 0).then_some(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Observation {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn integer_min_buy() {
        assert_eq!(parse(r#"{"min_buy": 48500}"#).min_buy(), Some(48500));
    }

    #[test]
    fn unusable_min_buy() {
        assert_eq!(parse(r#"{"min_buy": 0}"#).min_buy(), None);
        assert_eq!(parse(r#"{"min_buy": null}"#).min_buy(), None);
        assert_eq!(parse(r#"{"min_buy": -20}"#).min_buy(), None);
        assert_eq!(parse(r#"{"min_buy": false}"#).min_buy(), None);
        assert_eq!(parse(r#"{"min_buy": [1]}"#).min_buy(), None);
        assert_eq!(parse(r#"{"avg_buy": 300}"#).min_buy(), None);
    }

    #[test]
    fn lenient_min_buy() {
        assert_eq!(parse(r#"{"min_buy": 1250.9}"#).min_buy(), Some(1250));
        assert_eq!(parse(r#"{"min_buy": 0.4}"#).min_buy(), None);
        assert_eq!(parse(r#"{"min_buy": "777"}"#).min_buy(), Some(777));
        assert_eq!(parse(r#"{"min_buy": "abc"}"#).min_buy(), None);
    }

    #[test]
    fn keeps_other_fields() {
        let observation = parse(r#"{"min_buy": 5, "quantity": 12}"#);

        assert_eq!(
            observation.remaining.get("quantity"),
            Some(&serde_json::json!(12))
        );
    }

    #[test]
    fn series_from_body() {
        let series: PriceSeries = serde_json::from_str(
            r#"{"2025-11-17T10:00:00": {"min_buy": 500}, "2025-11-16T09:00:00": {}}"#,
        )
        .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series["2025-11-17T10:00:00"].min_buy(), Some(500));
        assert_eq!(series["2025-11-16T09:00:00"].min_buy(), None);
    }
}

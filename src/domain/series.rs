// Time series domain models - Data endpoint payload and per-series visibility
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(from = "(i64, f64)", into = "(i64, f64)")]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

impl From<(i64, f64)> for TimeSeriesPoint {
    fn from((time_ms, value): (i64, f64)) -> Self {
        Self::new(time_ms, value)
    }
}

impl From<TimeSeriesPoint> for (i64, f64) {
    fn from(point: TimeSeriesPoint) -> Self {
        (point.time_ms, point.value)
    }
}

/// One plotted line. Only `hide` changes after the payload is received.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Series {
    #[serde(default)]
    pub label: String,
    #[serde(default, alias = "data")]
    pub points: Vec<TimeSeriesPoint>,
    #[serde(default)]
    pub hide: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Per-series renderer settings (lines, bars, ...) passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Series {
    pub fn has_label(&self) -> bool {
        !self.label.is_empty()
    }
}

/// Response body of the data endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchedPayload {
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub properties: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FetchedPayload {
    pub fn hidden_labels(&self) -> HashSet<String> {
        self.series
            .iter()
            .filter(|s| s.hide && s.has_label())
            .map(|s| s.label.clone())
            .collect()
    }

    /// Hide every series whose label was hidden before a re-fetch.
    /// Series the server already flagged hidden stay hidden.
    pub fn carry_hidden(&mut self, hidden: &HashSet<String>) {
        for series in &mut self.series {
            if hidden.contains(&series.label) {
                series.hide = true;
            }
        }
    }

    /// Labels carried by more than one series. Visibility is keyed by label,
    /// so such series cannot be toggled independently.
    pub fn duplicate_labels(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for series in self.series.iter().filter(|s| s.has_label()) {
            if !seen.insert(series.label.as_str()) && !duplicates.contains(&series.label.as_str()) {
                duplicates.push(series.label.as_str());
            }
        }
        duplicates
    }

    pub fn find_mut(&mut self, label: &str) -> Option<&mut Series> {
        self.series.iter_mut().find(|s| s.label == label)
    }

    pub fn set_all_hidden(&mut self, hide: bool) {
        for series in &mut self.series {
            series.hide = hide;
        }
    }

    pub fn invert_hidden(&mut self) {
        for series in &mut self.series {
            series.hide = !series.hide;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> FetchedPayload {
        serde_json::from_value(json!({
            "series": [
                {"label": "cpu", "data": [[0, 1.0], [1, 2.0]]},
                {"label": "mem", "points": [[0, 5], [1, 6]], "hide": true, "lines": {"fill": true}}
            ],
            "error": null
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_payload() {
        let payload = payload();
        assert_eq!(payload.series.len(), 2);
        assert_eq!(payload.series[0].points[1], TimeSeriesPoint::new(1, 2.0));
        assert!(payload.series[1].hide);
        assert_eq!(payload.series[1].extra["lines"], json!({"fill": true}));
        assert!(payload.properties.is_none());
        assert!(payload.error.is_none());
    }

    #[test]
    fn test_carry_hidden_by_label() {
        let previous = payload();
        let mut next = payload();
        next.set_all_hidden(false);
        next.series.push(serde_json::from_value(json!({"label": "io"})).unwrap());

        next.carry_hidden(&previous.hidden_labels());

        let hidden: Vec<_> = next.series.iter().map(|s| s.hide).collect();
        assert_eq!(hidden, vec![false, true, false]);
    }

    #[test]
    fn test_duplicate_labels() {
        assert!(payload().duplicate_labels().is_empty());

        let payload: FetchedPayload = serde_json::from_value(json!({
            "series": [{"label": "cpu"}, {"label": ""}, {"label": "cpu"}, {"label": ""}, {"label": "cpu"}]
        }))
        .unwrap();
        assert_eq!(payload.duplicate_labels(), vec!["cpu"]);
    }

    #[test]
    fn test_invert_twice_restores() {
        let mut payload = payload();
        let before: Vec<_> = payload.series.iter().map(|s| s.hide).collect();
        payload.invert_hidden();
        payload.invert_hidden();
        let after: Vec<_> = payload.series.iter().map(|s| s.hide).collect();
        assert_eq!(before, after);
    }
}

// Render options - Display settings handed to the plot renderer
use serde::Serialize;
use serde_json::{json, Value};

/// Option tree passed to the plot renderer, always rooted at a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderOptions(Value);

impl Default for RenderOptions {
    fn default() -> Self {
        Self(json!({
            "shadowSize": 0,
            "legend": { "position": "ne", "show": true },
            "autoscale": true,
            "HtmlText": false,
            "yaxis": { "autoscale": true, "autoscaleMargin": 5 },
            "xaxis": { "mode": "time", "autoscale": false, "autoscaleMargin": 5 },
            "selection": { "mode": "x", "fps": 30 },
            "mouse": { "track": true, "sensibility": 5 }
        }))
    }
}

impl RenderOptions {
    /// Built-in defaults with each layer merged over them in order.
    pub fn layered<'a>(layers: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut options = Self::default();
        for layer in layers {
            deep_merge(&mut options.0, layer);
        }
        options
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn legend_shown(&self) -> bool {
        self.0
            .pointer("/legend/show")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    pub fn set_legend_shown(&mut self, show: bool) {
        match self.0.pointer_mut("/legend").and_then(Value::as_object_mut) {
            Some(legend) => {
                legend.insert("show".to_string(), Value::Bool(show));
            }
            None => deep_merge(&mut self.0, &json!({"legend": {"show": show}})),
        }
    }

    pub fn legend_columns(&self) -> usize {
        self.0
            .pointer("/legend/noColumns")
            .and_then(Value::as_u64)
            .filter(|n| *n > 0)
            .map(|n| n as usize)
            .unwrap_or(1)
    }

    /// Unit used by the y-axis tick formatter (`B`, `s`, or free text).
    pub fn y_unit(&self) -> Option<&str> {
        self.0.pointer("/yaxis/unit").and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }
}

/// Recursive merge: objects merge key by key, anything else is replaced.
pub fn deep_merge(target: &mut Value, overlay: &Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, overlay) => *target = overlay.clone(),
    }
}

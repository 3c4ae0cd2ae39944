use crate::domain::time_range::RangePreset;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize, Clone)]
pub struct GrapherSettings {
    #[serde(default = "default_listen")]
    pub listen: String,
    pub endpoint: EndpointSettings,
    #[serde(default = "default_preset")]
    pub default_preset: RangePreset,
    #[serde(default)]
    pub graphs: Vec<GraphEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EndpointSettings {
    pub url: String,
    #[serde(default)]
    pub encoding: RequestEncoding,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// How the `{id, from, to}` request is posted to the data endpoint.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RequestEncoding {
    #[default]
    Form,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphEntry {
    pub id: String,
    #[serde(default = "empty_options")]
    pub render_options: Value,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_preset() -> RangePreset {
    RangePreset::Week
}

fn default_timeout_secs() -> u64 {
    30
}

fn empty_options() -> Value {
    Value::Object(Default::default())
}

pub fn load_grapher_config() -> anyhow::Result<GrapherSettings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/grapher"))
        .add_source(config::Environment::with_prefix("GRAPHER").separator("__"))
        .build()?;

    parse_settings(settings)
}

fn parse_settings(settings: config::Config) -> anyhow::Result<GrapherSettings> {
    let parsed: GrapherSettings = settings.try_deserialize()?;
    if parsed.endpoint.url.trim().is_empty() {
        anyhow::bail!("endpoint.url must not be empty");
    }
    if let Some(graph) = parsed.graphs.iter().find(|g| g.id.trim().is_empty()) {
        anyhow::bail!("graph entry with an empty id (render options: {})", graph.render_options);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(source: &str) -> anyhow::Result<GrapherSettings> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(source, FileFormat::Toml))
            .build()?;
        parse_settings(settings)
    }

    #[test]
    fn test_parse_settings() {
        let settings = from_toml(
            r#"
            default_preset = "day"

            [endpoint]
            url = "http://opm/grapher/graphs/data"
            encoding = "json"

            [[graphs]]
            id = "12"

            [[graphs]]
            id = "13"
            render_options = { title = "WAL", yaxis = { unit = "B" } }
            "#,
        )
        .unwrap();

        assert_eq!(settings.listen, "0.0.0.0:8080");
        assert_eq!(settings.default_preset, RangePreset::Day);
        assert_eq!(settings.endpoint.encoding, RequestEncoding::Json);
        assert_eq!(settings.endpoint.timeout_secs, 30);
        assert_eq!(settings.graphs.len(), 2);
        assert!(settings.graphs[0].render_options.as_object().unwrap().is_empty());
        assert_eq!(settings.graphs[1].render_options["yaxis"]["unit"], "B");
    }

    #[test]
    fn test_rejects_missing_endpoint() {
        assert!(from_toml("[endpoint]\nurl = \"\"").is_err());
        assert!(from_toml("listen = \"127.0.0.1:1\"").is_err());
    }
}

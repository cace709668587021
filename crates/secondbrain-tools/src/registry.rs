#[derive(Debug, Clone)]
pub struct ToolDef {
    pub id: &'static str,
    pub description: &'static str,
    pub schema: schemars::Schema,
}

impl ToolDef {
    /// JSON schema of the parameters with the generator's `$schema`/`title` keys removed,
    /// as expected by OpenAI-style function definitions.
    #[must_use]
    pub fn parameters(&self) -> serde_json::Value {
        let mut params = serde_json::to_value(&self.schema).unwrap_or_default();
        if let serde_json::Value::Object(ref mut map) = params {
            map.remove("$schema");
            map.remove("title");
        }
        params
    }
}

#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    #[must_use]
    pub fn from_definitions(tools: Vec<ToolDef>) -> Self {
        Self { tools }
    }

    #[must_use]
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ToolDef> {
        self.tools.iter().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(schemars::JsonSchema, serde::Deserialize)]
    #[allow(dead_code)]
    struct LookupParams {
        /// What to look up
        query: String,
    }

    fn sample() -> ToolDef {
        ToolDef {
            id: "lookup",
            description: "Look something up",
            schema: schemars::schema_for!(LookupParams),
        }
    }

    #[test]
    fn parameters_strip_meta_keys() {
        let params = sample().parameters();
        let obj = params.as_object().unwrap();
        assert!(!obj.contains_key("$schema"));
        assert!(!obj.contains_key("title"));
        assert_eq!(obj["type"], "object");
        assert!(obj["properties"]["query"].is_object());
        assert_eq!(obj["required"][0], "query");
    }

    #[test]
    fn registry_find() {
        let reg = ToolRegistry::from_definitions(vec![sample()]);
        assert_eq!(reg.tools().len(), 1);
        assert!(reg.find("lookup").is_some());
        assert!(reg.find("missing").is_none());
    }
}

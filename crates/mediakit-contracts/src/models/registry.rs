use indexmap::IndexMap;
use serde::Serialize;

/// What a gateway operation needs from an inference model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ImageEdit,
    Vision,
    Text,
}

impl Capability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImageEdit => "image_edit",
            Self::Vision => "vision",
            Self::Text => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSpec {
    pub name: String,
    pub capabilities: Vec<Capability>,
}

impl ModelSpec {
    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Known inference models in preference order.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.values()
    }

    pub fn by_capability(&self, capability: Capability) -> Vec<ModelSpec> {
        self.models
            .values()
            .filter(|model| model.supports(capability))
            .cloned()
            .collect()
    }

    pub fn ensure(&self, name: &str, capability: Capability) -> Option<ModelSpec> {
        let model = self.get(name)?;
        if model.supports(capability) {
            return Some(model.clone());
        }
        None
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();
    let mut insert = |name: &str, capabilities: &[Capability]| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                capabilities: capabilities.to_vec(),
            },
        );
    };

    insert("gemini-2.5-flash-image", &[Capability::ImageEdit]);
    insert("gemini-2.5-pro", &[Capability::Text]);
    insert("gemini-2.5-flash", &[Capability::Vision, Capability::Text]);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_orders_preferred_models_first() {
        let registry = ModelRegistry::new(None);
        let first = |capability| {
            registry
                .by_capability(capability)
                .first()
                .map(|model| model.name.clone())
        };
        assert_eq!(first(Capability::ImageEdit).as_deref(), Some("gemini-2.5-flash-image"));
        assert_eq!(first(Capability::Vision).as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(first(Capability::Text).as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(registry.list().count(), 3);
    }

    #[test]
    fn capabilities_serialize_like_their_labels() -> serde_json::Result<()> {
        let spec = ModelRegistry::new(None)
            .get("gemini-2.5-flash")
            .cloned()
            .map(serde_json::to_value)
            .transpose()?;
        assert_eq!(
            spec,
            Some(serde_json::json!({
                "name": "gemini-2.5-flash",
                "capabilities": [Capability::Vision.as_str(), Capability::Text.as_str()],
            }))
        );
        Ok(())
    }

    #[test]
    fn ensure_checks_capability() {
        let registry = ModelRegistry::new(None);
        assert!(registry.ensure("gemini-2.5-flash", Capability::Vision).is_some());
        assert!(registry.ensure("gemini-2.5-pro", Capability::ImageEdit).is_none());
        assert!(registry.ensure("missing", Capability::Text).is_none());
    }
}

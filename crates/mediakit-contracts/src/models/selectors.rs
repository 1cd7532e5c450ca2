use serde::Serialize;

use super::registry::{Capability, ModelRegistry, ModelSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_else(|| ModelRegistry::new(None)),
        }
    }

    /// A requested model outside the registry is trusted as-is; only a known model
    /// lacking the capability falls back to the registry default.
    pub fn select(
        &self,
        requested: Option<&str>,
        capability: Capability,
    ) -> Result<ModelSelection, String> {
        let requested = requested.map(str::trim).filter(|value| !value.is_empty());
        let fallback_reason = if let Some(requested_value) = requested {
            if let Some(model) = self.registry.ensure(requested_value, capability) {
                return Ok(ModelSelection {
                    model,
                    requested: Some(requested_value.to_string()),
                    fallback_reason: None,
                });
            }
            if self.registry.get(requested_value).is_none() {
                return Ok(ModelSelection {
                    model: ModelSpec {
                        name: requested_value.to_string(),
                        capabilities: vec![capability],
                    },
                    requested: Some(requested_value.to_string()),
                    fallback_reason: None,
                });
            }
            Some(format!(
                "Requested model '{requested_value}' unavailable for capability '{}'.",
                capability.as_str()
            ))
        } else {
            None
        };

        let candidates = self.registry.by_capability(capability);
        let Some(model) = candidates.first().cloned() else {
            return Err(format!(
                "No models available for capability '{}'.",
                capability.as_str()
            ));
        };
        Ok(ModelSelection {
            model,
            requested: requested.map(str::to_string),
            fallback_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn no_request_uses_registry_default() -> Result<(), String> {
        let selection = ModelSelector::new(None).select(None, Capability::Vision)?;
        assert_eq!(selection.model.name, "gemini-2.5-flash");
        assert_eq!(selection.fallback_reason, None);
        Ok(())
    }

    #[test]
    fn known_model_without_capability_falls_back() -> Result<(), String> {
        let selection =
            ModelSelector::new(None).select(Some("gemini-2.5-pro"), Capability::ImageEdit)?;
        assert_eq!(selection.model.name, "gemini-2.5-flash-image");
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("Requested model 'gemini-2.5-pro' unavailable for capability 'image_edit'.")
        );
        Ok(())
    }

    #[test]
    fn unknown_override_is_trusted() -> Result<(), String> {
        let selection = ModelSelector::new(None)
            .select(Some(" gemini-3-pro-image-preview "), Capability::ImageEdit)?;
        assert_eq!(selection.model.name, "gemini-3-pro-image-preview");
        assert!(selection.model.supports(Capability::ImageEdit));
        Ok(())
    }

    #[test]
    fn empty_registry_reports_missing_capability() {
        let registry = ModelRegistry::new(Some(IndexMap::new()));
        let err = ModelSelector::new(Some(registry))
            .select(None, Capability::Text)
            .err()
            .unwrap_or_default();
        assert_eq!(err, "No models available for capability 'text'.");
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

/// Provider name to ordered model list, loaded once at startup. The active
/// pair defaults to the first model of the first provider and the model is
/// re-derived whenever the provider selection changes.
#[derive(Default)]
pub struct ProviderCatalog {
    providers: Vec<(String, Vec<String>)>,
    provider: Option<String>,
    model: Option<String>,
}

impl ProviderCatalog {
    pub fn load(&mut self, providers: Vec<(String, Vec<String>)>) {
        self.providers = providers;

        if let Some((name, models)) = self.providers.first() {
            self.provider = Some(name.to_string());
            self.model = models.first().cloned();
        } else {
            self.provider = None;
            self.model = None;
        }
    }

    pub fn providers(&self) -> &[(String, Vec<String>)] {
        return &self.providers;
    }

    pub fn provider(&self) -> Option<&str> {
        return self.provider.as_deref();
    }

    pub fn model(&self) -> Option<&str> {
        return self.model.as_deref();
    }

    fn models_for(&self, provider: &str) -> Option<&Vec<String>> {
        return self
            .providers
            .iter()
            .find(|(name, _)| return name == provider)
            .map(|(_, models)| return models);
    }

    pub fn select_provider(&mut self, provider: &str) -> Result<()> {
        let Some(models) = self.models_for(provider) else {
            bail!("unknown provider {provider}");
        };

        self.model = models.first().cloned();
        self.provider = Some(provider.to_string());

        return Ok(());
    }

    pub fn select_model(&mut self, model: &str) -> Result<()> {
        let Some(provider) = &self.provider else {
            bail!("select a provider before choosing a model");
        };

        let models = self.models_for(provider).cloned().unwrap_or_default();
        if !models.contains(&model.to_string()) {
            bail!("no model named {model} for provider {provider}");
        }

        self.model = Some(model.to_string());
        return Ok(());
    }
}

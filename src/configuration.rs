use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub api_keys: ApiKeySettings,
    pub pipeline: PipelineSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    /// Shared secret checked against the `x-api-key` request header.
    pub shared_api_key: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApiKeySettings {
    pub openai: String,
    pub serper: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct PipelineSettings {
    pub max_urls_per_segment: usize,
    pub request_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    /// Pause between successive enrichment calls, to stay under upstream rate limits.
    pub courtesy_delay_ms: u64,
    /// Path to the static client/segment catalog.
    pub profile_path: String,
}

impl Settings {
    /// Returns the names of required credentials that are missing.
    /// Any entry here is a fatal configuration error.
    pub fn validate(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.api_keys.openai.trim().is_empty() {
            missing.push("api_keys.openai".to_string());
        }
        if self.api_keys.serper.trim().is_empty() {
            missing.push("api_keys.serper".to_string());
        }
        if self.application.shared_api_key.trim().is_empty() {
            missing.push("application.shared_api_key".to_string());
        }
        missing
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::File::from(configuration_directory.join("local.yaml")).required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_keys(openai: &str, serper: &str, shared: &str) -> Settings {
        Settings {
            application: ApplicationSettings {
                host: "127.0.0.1".to_string(),
                port: 8000,
                shared_api_key: shared.to_string(),
            },
            api_keys: ApiKeySettings {
                openai: openai.to_string(),
                serper: serper.to_string(),
            },
            pipeline: PipelineSettings {
                max_urls_per_segment: 10,
                request_timeout_secs: 20,
                cache_ttl_secs: 3600,
                retry_max_attempts: 3,
                retry_initial_delay_ms: 2000,
                courtesy_delay_ms: 500,
                profile_path: "configuration/profile.json".to_string(),
            },
        }
    }

    #[test]
    fn validate_passes_with_all_keys() {
        let settings = settings_with_keys("sk-123", "serper-key", "shared");
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn validate_reports_each_missing_key() {
        let settings = settings_with_keys("", "  ", "shared");
        let missing = settings.validate();
        assert_eq!(missing, vec!["api_keys.openai", "api_keys.serper"]);
    }
}

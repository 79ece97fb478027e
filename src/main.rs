use std::net::TcpListener;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use env_logger::Env;

use magnet::configuration::get_configuration;
use magnet::domain::profile::ClientProfile;
use magnet::pipeline::Pipeline;
use magnet::resilience::{ErrorCollection, RetryPolicy};
use magnet::services::{
    HttpPageFetcher, OpenaiClient, ScrapingEmailFinder, SerperClient,
};
use magnet::startup::run;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration");

    let mut startup_errors = ErrorCollection::new();
    let missing = configuration.validate();
    if !missing.is_empty() {
        startup_errors.add(
            "Configuration",
            "ConfigError",
            format!("missing required settings: {}", missing.join(", ")),
            true,
        );
    }

    let profile = match ClientProfile::from_file(&configuration.pipeline.profile_path) {
        Ok(profile) => Some(profile),
        Err(e) => {
            startup_errors.add("Client profile", "ConfigError", format!("{e:#}"), true);
            None
        }
    };

    if startup_errors.has_fatal_errors() {
        log::error!("Startup aborted.\n{}", startup_errors.summary());
        process::exit(1);
    }
    let profile = profile.expect("profile present when startup checks pass");
    log::info!(
        "Loaded profile for '{}' with {} target segments",
        profile.client_name,
        profile.target_segments.len()
    );

    let retry = RetryPolicy::new(
        configuration.pipeline.retry_max_attempts,
        Duration::from_millis(configuration.pipeline.retry_initial_delay_ms),
    );
    let timeout = Duration::from_secs(configuration.pipeline.request_timeout_secs);
    let cache_ttl = Duration::from_secs(configuration.pipeline.cache_ttl_secs);

    let openai_client = Arc::new(OpenaiClient::new(
        configuration.api_keys.openai.clone(),
        retry,
    ));
    let serper_client = Arc::new(
        SerperClient::new(
            configuration.api_keys.serper.clone(),
            timeout,
            cache_ttl,
            retry,
        )
        .expect("Failed to build search client"),
    );
    let page_fetcher =
        Arc::new(HttpPageFetcher::new(timeout).expect("Failed to build page fetcher"));
    let email_finder = Arc::new(ScrapingEmailFinder::new(
        page_fetcher.clone(),
        cache_ttl,
        retry,
    ));

    let pipeline = Pipeline::new(
        openai_client.clone(),
        Some(openai_client),
        serper_client,
        page_fetcher,
        email_finder,
        profile,
        configuration.pipeline.max_urls_per_segment,
        Duration::from_millis(configuration.pipeline.courtesy_delay_ms),
    );

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    log::info!("Starting server on {}", address);
    let listener = TcpListener::bind(address)?;
    run(listener, pipeline, configuration.application.shared_api_key)?.await
}

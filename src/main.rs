use anyhow::Result;
use msm::config::ApiConfig;
use msm::ui_dioxus::App;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Fail fast on a bad environment before opening a window
    let config = ApiConfig::from_env()?;
    tracing::info!(
        use_mocks = config.use_mocks,
        core_url = ?config.core_url.as_ref().map(|url| url.as_str()),
        "Starting MSM"
    );

    dioxus::launch(App);
    Ok(())
}

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 120;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_CLIENT_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(15))
        .user_agent(concat!("brow-consult/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client")
});

/// Shared client; per-request timeouts override the default.
pub fn get_http_client() -> &'static Client {
    &HTTP_CLIENT
}

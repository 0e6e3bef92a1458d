//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

/// Test helper functions
pub mod helpers {
    use instant_domains::{InstantDomainsClient, Settings};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Settings pointing both hosts at a mock server, with fast retries
    pub fn test_settings(server_uri: &str) -> Settings {
        let mut settings = Settings::default();
        settings.endpoints.site_url = server_uri.to_string();
        settings.endpoints.api_url = server_uri.to_string();
        settings.http.timeout_secs = 5;
        settings.retry.base_delay_ms = 1;
        settings.retry.max_delay_ms = 2;
        settings
    }

    /// Client wired to a mock server
    pub fn test_client(server_uri: &str) -> InstantDomainsClient {
        InstantDomainsClient::with_settings(test_settings(server_uri))
            .expect("test settings must be valid")
    }

    /// Mount the three warmup entry points: the landing page sets the `sid`
    /// cookie and the auth-session endpoint exposes the `csrf` token.
    pub async fn mount_warmup_fixtures(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "sid=abc; Path=/; HttpOnly")
                    .set_body_raw(
                        "<html><head><title>Instant Domain Search</title></head>\
                         <body>landing</body></html>",
                        "text/html",
                    ),
            )
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/services/geography"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"city":"Houston","country":"US"}"#,
                "application/json",
            ))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/services/auth/session"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"user":null,"csrfToken":"xyz"}"#,
                "application/json",
            ))
            .mount(server)
            .await;
    }
}

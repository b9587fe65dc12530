use std::sync::Arc;

use authgate::{AppState, InMemoryUserStore, Settings};

/// App state over an in-memory store with cheap hashing.
pub fn test_state() -> (AppState, Arc<InMemoryUserStore>) {
    let mut settings = Settings::new().expect("Failed to load settings");
    settings.auth.jwt_secret = "integration_test_secret".to_string();
    settings.auth.hash_memory_kib = 1024;
    settings.auth.hash_iterations = 1;

    let store = Arc::new(InMemoryUserStore::new());
    let state = AppState::with_store(settings, store.clone()).expect("Failed to build state");
    (state, store)
}

#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .configure(authgate::configure),
        )
        .await
    };
}

/// Sends a POST with a JSON body; yields `(status, raw body)`.
#[macro_export]
macro_rules! post_json {
    ($app:expr, $uri:expr, $body:expr) => {{
        let resp = actix_web::test::TestRequest::post()
            .uri($uri)
            .set_json($body)
            .send_request(&$app)
            .await;
        let status = resp.status();
        (status, actix_web::test::read_body(resp).await)
    }};
}

#[allow(dead_code)]
pub fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).expect("Response body is not JSON")
}

use crate::db::{BasicCredentials, ClientStorage};
use tracing::{info, warn};

/// Sample clients inserted at startup when `seed_demo_data` is enabled.
pub fn demo_clients() -> Vec<(&'static str, i64, Option<BasicCredentials>)> {
    vec![
        (
            "John Doe",
            31,
            Some(BasicCredentials::new("john.doe@example.com", "12345")),
        ),
        ("Amy Kruger", 25, None),
        (
            "Donald Trump",
            60,
            Some(BasicCredentials::new("donald.trump@example.com", "china")),
        ),
    ]
}

/// Insert the demo clients. Failures are logged and skipped; returns how
/// many were stored.
pub async fn seed_demo_data(storage: &ClientStorage) -> usize {
    let mut inserted = 0;
    for (full_name, age, credentials) in demo_clients() {
        match storage.insert_client(full_name, age, credentials).await {
            Ok(_) => inserted += 1,
            Err(e) => warn!(full_name, error = %e, "failed to seed demo client"),
        }
    }
    info!(count = inserted, "demo clients seeded");
    inserted
}

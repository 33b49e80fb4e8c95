//! A minimal presence server: one open space anyone can walk around in.
//!
//! Tokens are `guest-<name>`; the name becomes the identity, so two tabs
//! with the same name in the same space will see the second one refused.

use plaza::prelude::*;

// ---------------------------------------------------------------------------
// Guest verifier
// ---------------------------------------------------------------------------

/// Accepts `guest-<name>` tokens. Anything else is refused.
struct GuestVerifier;

impl TokenVerifier for GuestVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, SessionError> {
        match token.strip_prefix("guest-") {
            Some(name) if !name.is_empty() => Ok(UserId::new(name)),
            _ => Err(SessionError::AuthFailed(
                "token must look like guest-<name>".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,plaza=debug".into()),
        )
        .init();

    let directory = StaticSpaceDirectory::new()
        .with_space(SpaceId::new("plaza"), Bounds::new(40, 25));

    let server = PlazaServer::<GuestVerifier, StaticSpaceDirectory, RandomSpawn>::builder()
        .bind("0.0.0.0:8080")
        .build(GuestVerifier, directory, RandomSpawn)
        .await?;

    tracing::info!("open-plaza listening on 0.0.0.0:8080");
    server.run().await?;
    Ok(())
}

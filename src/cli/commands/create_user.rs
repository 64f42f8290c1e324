//! Create-user command handler

use crate::config::Config;
use crate::domain::Role;
use crate::services::Registration;
use crate::state::SharedState;

pub async fn cmd_create_user(
    config: Config,
    username: String,
    email: String,
    role: Role,
    password: String,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let result = state
        .auth_service
        .register(Registration {
            username,
            email,
            password,
            role,
        })
        .await?;

    println!(
        "✓ Created {} '{}' (id {})",
        result.user.role, result.user.username, result.user.id
    );
    println!("  API key: {}", result.token);

    state.store.close().await?;
    Ok(())
}

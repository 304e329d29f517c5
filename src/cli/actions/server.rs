use crate::{
    api,
    api::{AuthConfig, AuthState, LabsState},
    cli::actions::Action,
};
use anyhow::Result;
use std::sync::Arc;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            secret,
            frontend_url,
            access_token_ttl,
            refresh_token_ttl,
            rotate_refresh,
            data_dir,
        } => {
            let config = AuthConfig::new(frontend_url)
                .with_access_token_ttl_seconds(access_token_ttl)
                .with_refresh_token_ttl_seconds(refresh_token_ttl)
                .with_rotate_refresh(rotate_refresh);

            let auth_state = Arc::new(AuthState::new(config, secret)?);
            let labs_state = Arc::new(LabsState::new(data_dir));

            api::new(port, dsn, auth_state, labs_state).await?;
        }
    }

    Ok(())
}

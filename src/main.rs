// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Second Innings admin client
//!
//! Restores the stored session (signing in as a test user in test mode),
//! then runs one navigation through the route guard and reports where it
//! lands.

use anyhow::Context;
use second_innings_admin::{config::Config, session::SignInOutcome, AdminContext};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        base_url = %config.endpoint_url(""),
        test_mode = config.test_mode,
        "Starting Second Innings admin client"
    );

    let test_token = config.test_token.clone();
    let ctx = AdminContext::new(config).context("Failed to initialize client")?;

    let view = ctx.session.restore().await;
    if view.user().is_none() && ctx.config.test_mode {
        if let Some(token) = test_token {
            match ctx.session.sign_in_with_test_user(&token).await {
                SignInOutcome::ExistingUser { user, redirect_to } => {
                    tracing::info!(user_id = ?user.id, redirect_to, "Signed in")
                }
                SignInOutcome::NewUser { prefill, redirect_to } => {
                    tracing::info!(email = %prefill.gmail_id, redirect_to, "Registration required")
                }
                SignInOutcome::Failed(e) => tracing::warn!(error = %e, "Sign-in failed"),
            }
        }
    }

    let target = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    let navigation = ctx
        .navigator
        .navigate(&target)
        .await
        .context("Navigation failed")?;

    let view = ctx.session.view().await;
    tracing::info!(
        requested = %navigation.requested,
        resolved = %navigation.resolved,
        logged_out = navigation.logged_out,
        authenticated = view.is_authenticated,
        user = view.user_name().unwrap_or("-"),
        role = view.role().map(|r| r.as_str()).unwrap_or("-"),
        "Navigation complete"
    );
    println!("{}", navigation.resolved);
    Ok(())
}

/// Initialize logging; `LOG_FORMAT=json` selects structured JSON output.
fn init_logging() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info").add_directive("second_innings_admin=debug".parse()?),
    };

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_current_span(true)
                    .flatten_event(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

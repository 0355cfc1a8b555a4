//! CLI command implementations.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bx_actor::{create_actor, AgentConnector};
use bx_identity::{FileSessionStore, Identity, SessionStore};
use bx_widget::{
    round_total, ConnectOutcome, ErrorClass, FetchOutcome, SummaryController, TerminalView,
    WidgetConfig,
};
use candid::Principal;

fn session_store(config: &WidgetConfig) -> Result<FileSessionStore> {
    match &config.session_file {
        Some(path) => Ok(FileSessionStore::new(path)),
        None => Ok(FileSessionStore::in_config_dir()?),
    }
}

/// Logs in and renders the caller's total.
pub async fn connect(mut config: WidgetConfig, provider: Option<String>) -> Result<()> {
    if provider.is_some() {
        config.identity_provider = provider;
    }

    let view = Arc::new(TerminalView::new());
    let controller = SummaryController::from_config(&config, view.clone(), None).await?;

    match controller.on_connect_clicked().await? {
        ConnectOutcome::LoginFailed(e) => bail!("login failed: {e}"),
        ConnectOutcome::Fetched(FetchOutcome::Populated(_)) => {
            if let Some(session) = controller.session() {
                tracing::info!(principal = %session.principal(), "Connected");
            }
            Ok(())
        }
        ConnectOutcome::Fetched(FetchOutcome::Failed(class)) => {
            bail!("could not fetch holdings ({class})")
        }
        ConnectOutcome::Fetched(FetchOutcome::Discarded) => Ok(()),
    }
}

/// Prints the summary of `principal` as JSON, fetched anonymously.
pub async fn summary(config: &WidgetConfig, principal: &str) -> Result<()> {
    let principal = Principal::from_text(principal)
        .with_context(|| format!("invalid principal {principal:?}"))?;
    let descriptor = config.descriptor()?;
    let connector = AgentConnector::new(config.replica_url())?;

    let identity = Identity::anonymous();
    let actor = create_actor(&connector, &identity, descriptor, config.network).await?;

    let summary = match actor.call(principal).await {
        Ok(summary) => summary,
        Err(e) => bail!("{}", ErrorClass::classify(&e.message()).user_message()),
    };

    let total = round_total(summary.grand_total());
    let output = serde_json::json!({
        "principal": principal.to_text(),
        "entries": summary,
        "total": total.to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Removes the stored login.
pub fn logout(config: &WidgetConfig) -> Result<()> {
    let store = session_store(config)?;
    store.clear()?;
    println!("Logged out");
    Ok(())
}

/// Prints configuration and stored login.
pub fn status(config: &WidgetConfig) -> Result<()> {
    println!("Network:     {}", config.network);
    println!("Replica:     {}", config.replica_url());
    match &config.canister_id {
        Some(id) => println!("Canister:    {id}"),
        None => println!("Canister:    (not set)"),
    }

    let store = session_store(config)?;
    match store.load()? {
        Some(session) if !session.is_expired() => {
            println!("Logged in:   {}", session.principal);
            println!("Provider:    {}", session.provider_url);
            println!("Expires:     {}", session.expires_at.to_rfc3339());
        }
        Some(session) => {
            println!("Logged in:   no (session for {} expired)", session.principal);
        }
        None => println!("Logged in:   no"),
    }
    Ok(())
}

/// Prints the rendered Candid interface.
pub fn interface(config: &WidgetConfig) -> Result<()> {
    print!("{}", config.descriptor()?.candid_source());
    Ok(())
}

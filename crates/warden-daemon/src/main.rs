// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Warden tenant credential lifecycle daemon binary.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warden_core::SystemIdentityGenerator;
use warden_db::OrgRepository;
use warden_lifecycle::{FleetRunner, OrgStateMachine, RefreshScheduler};
use warden_provider::HttpIdentityProvider;

/// Warden - keeps per-org identity provider credentials fresh.
#[derive(Parser, Debug)]
#[command(name = "warden", about = "Tenant credential lifecycle daemon", version)]
struct Args {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let _args = Args::parse();

	// Load .env file if present
	dotenvy::dotenv().ok();

	// Load configuration
	let config = warden_config::load_config()?;

	// Setup tracing; RUST_LOG wins over the configured level
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		database = %config.database.url,
		provider = %config.provider.base_url,
		interval_minutes = config.refresh.interval_minutes,
		"starting warden"
	);

	// Create database pool and run migrations
	let pool = warden_db::create_pool(&config.database.url).await?;
	warden_db::run_migrations(&pool).await?;

	let store = Arc::new(OrgRepository::new(pool));
	let provider = Arc::new(HttpIdentityProvider::with_timeout(
		config.provider.base_url.clone(),
		Duration::from_secs(config.provider.timeout_secs),
	));
	let generator = Arc::new(SystemIdentityGenerator::new(
		config.provider.account_prefix.clone(),
	));

	let machine = OrgStateMachine::new(provider, generator);
	let runner = Arc::new(FleetRunner::new(store, machine));
	let scheduler = RefreshScheduler::new(runner, config.refresh.interval());

	scheduler.start().await;

	// Run until interrupted, then let any in-flight run finish
	tokio::signal::ctrl_c().await?;
	tracing::info!("shutdown signal received");
	scheduler.shutdown().await;

	Ok(())
}

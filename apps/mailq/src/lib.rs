pub mod plan;

use std::{io, path::PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mailq_config::Config;
use mailq_query::{HttpEmbedding, OutputFormat};
use mailq_storage::{PointRef, qdrant::QdrantStore};

use crate::plan::Plan;

#[derive(Debug, Parser)]
#[command(
	version = mailq_cli::VERSION,
	about = mailq_cli::ABOUT,
	rename_all = "kebab",
	styles = mailq_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
	/// Overrides `storage.qdrant.host`.
	#[arg(long, value_name = "HOST")]
	pub host: Option<String>,
	/// Overrides `storage.qdrant.port` (gRPC).
	#[arg(long, value_name = "PORT")]
	pub port: Option<u16>,
	/// Overrides `storage.qdrant.collection`.
	#[arg(long, value_name = "NAME")]
	pub collection: Option<String>,
	#[command(subcommand)]
	pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// List the collections on the server.
	ListCollections,
	/// Show point count, vector size and distance of the collection.
	CollectionInfo,
	/// Page through stored mail, optionally filtered.
	QueryAll(QueryAllArgs),
	/// Find the mail closest in meaning to a query.
	SearchSimilar(SearchSimilarArgs),
	/// Fetch one point by id.
	GetPoint(GetPointArgs),
}

#[derive(Debug, clap::Args)]
pub struct QueryAllArgs {
	#[arg(long, value_name = "N", default_value_t = 100)]
	pub limit: u32,
	#[arg(long, value_name = "N", default_value_t = 0)]
	pub offset: u64,
	/// Case-sensitive substring of the subject.
	#[arg(long, value_name = "TEXT")]
	pub filter_subject: Option<String>,
	/// Case-sensitive substring of the sender.
	#[arg(long, value_name = "TEXT")]
	pub filter_sender: Option<String>,
	/// Case-sensitive substring of the URL.
	#[arg(long, value_name = "TEXT")]
	pub filter_url: Option<String>,
	/// Exact category.
	#[arg(long, value_name = "CATEGORY")]
	pub filter_category: Option<String>,
	/// Generic form of the filters above, e.g. `--filter subject=meeting`.
	#[arg(long = "filter", value_name = "NAME=VALUE")]
	pub filters: Vec<String>,
	#[arg(long, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
	pub output_format: OutputFormat,
}

#[derive(Debug, clap::Args)]
pub struct SearchSimilarArgs {
	#[arg(value_name = "QUERY")]
	pub query: String,
	#[arg(long, value_name = "N", default_value_t = 10)]
	pub limit: u32,
	#[arg(long, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
	pub output_format: OutputFormat,
}

#[derive(Debug, clap::Args)]
pub struct GetPointArgs {
	/// Unsigned integer or UUID.
	#[arg(value_name = "ID")]
	pub id: PointRef,
	#[arg(long)]
	pub with_vector: bool,
	#[arg(long, value_name = "FORMAT", default_value_t = OutputFormat::Table)]
	pub output_format: OutputFormat,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let (config, plan) = prepare(args)?;
	init_tracing(&config)?;
	let store = QdrantStore::new(&config.storage.qdrant)?;

	tracing::debug!(url = %config.storage.qdrant.url(), "Qdrant client ready.");

	let mut stdout = io::stdout().lock();

	plan::execute(plan, &config, &store, &HttpEmbedding, &mut stdout).await
}

/// Loads configuration and resolves the command. Nothing here touches the network.
pub fn prepare(args: Args) -> color_eyre::Result<(Config, Plan)> {
	let mut config = match &args.config {
		Some(path) => mailq_config::load(path)?,
		None => Config::default(),
	};

	mailq_config::apply_overrides(&mut config, args.host, args.port, args.collection)?;

	let plan = Plan::resolve(args.command)?;

	Ok((config, plan))
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
	Ok(())
}

//! `tagstore` command line.
//!
//! Usage:
//!     tagstore tags.db tags new photo
//!     tagstore tags.db files set_tags a.jpg photo raw
//!     tagstore --json tags.db selections select pictures
//!     tagstore tags.db files          (lists the file commands)

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tagstore::{EntityKind, Output, StoreConfig, TagStore, commands_for, dispatch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "tagstore", about = "Tag and file metadata store")]
struct Cli {
   /// Store file, created if missing unless --no-create is given
   database: PathBuf,

   /// tags, files, options or selections
   entity: String,

   /// Command to run; omit to list the entity's commands
   command: Option<String>,

   /// Command arguments. Integers refer to tags and files by id.
   #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
   args: Vec<String>,

   /// Print results and errors as JSON
   #[arg(long)]
   json: bool,

   /// How long to wait on a locked store, in milliseconds
   #[arg(long, default_value_t = 5000)]
   busy_timeout_ms: u64,

   /// Fail instead of creating a missing store file
   #[arg(long)]
   no_create: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
   tracing_subscriber::registry()
      .with(
         tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "tagstore=warn".into()),
      )
      .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
      .init();

   let cli = Cli::parse();
   let kind: EntityKind = cli.entity.parse()?;

   let Some(command) = cli.command else {
      for command in commands_for(kind) {
         println!("{:<12} {:<16} {}", command.name, command.usage, command.about);
      }
      return Ok(ExitCode::SUCCESS);
   };

   let config = StoreConfig {
      busy_timeout: Duration::from_millis(cli.busy_timeout_ms),
      create_if_missing: !cli.no_create,
      ..StoreConfig::default()
   };
   tracing::debug!(database = %cli.database.display(), "Opening store");
   let store = TagStore::open(&cli.database, Some(config)).await?;
   let mut session = store.session().await?;

   let result = dispatch(&mut session, &cli.entity, &command, cli.args).await;
   session.close().await?;

   match result {
      Ok(output) => {
         print_output(&output, cli.json)?;
         Ok(ExitCode::SUCCESS)
      }
      Err(err) if cli.json => {
         let body = serde_json::json!({ "code": err.error_code(), "message": err.to_string() });
         eprintln!("{body}");
         Ok(ExitCode::FAILURE)
      }
      Err(err) => Err(err.into()),
   }
}

fn print_output(output: &Output, json: bool) -> anyhow::Result<()> {
   if json {
      println!("{}", serde_json::to_string(output)?);
      return Ok(());
   }

   let text = output.to_string();
   if !text.is_empty() {
      println!("{text}");
   }
   Ok(())
}

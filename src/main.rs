use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use folio::cli::{output::Output, Cli};
use folio::config::Config;
use folio::db::LocalVectorStore;
use folio::rag::{embeddings, RagEngine};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let default_filter = if cli.verbose {
        "folio=debug,folio_update=debug"
    } else {
        "folio=info,folio_update=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match run(&cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&format!("{}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, output: &Output) -> folio::types::Result<()> {
    let mut config = Config::from_env()?;
    config.storage.resources_dir = cli.resources_dir.clone();
    config.storage.db_path = cli.db_path.clone();

    output.header("Portfolio RAG update");
    output.kv("resources", &config.storage.resources_dir.display().to_string());
    output.kv("database", &config.storage.db_path.display().to_string());
    output.kv("collection", &config.storage.collection);

    let store = Arc::new(LocalVectorStore::open(&config.storage.db_path)?);
    let embedder = embeddings::from_config(&config.embedding)?;
    output.kv("embedding model", embedder.model_name());

    let engine = RagEngine::new(&config, store, embedder).await?;

    if cli.force {
        output.warning("force rebuild requested, clearing existing collection");
        engine.rebuild().await?;
    }

    output.info("processing resources...");
    let ok = engine.process_all_resources().await;

    if cli.stats {
        let stats = engine.get_database_stats().await?;
        output.header("Database statistics");
        output.kv("total documents", &stats.total_documents.to_string());
        output.kv("database path", &stats.database_path);
        let mut breakdown: Vec<_> = stats.source_types.iter().collect();
        breakdown.sort();
        for (source_type, count) in breakdown {
            output.list_item(&format!("{}: {}", source_type, count));
        }
        output.newline();
    }

    if ok {
        output.success("database update complete");
        Ok(())
    } else {
        Err(folio::types::AppError::Store(
            "database update failed; see log for details".to_string(),
        ))
    }
}

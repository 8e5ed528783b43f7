use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use ferrum_reduce::config::reduce_config::ReduceConfig;
use ferrum_reduce::core::task::{ReduceTask, Task};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "config/reduce.xml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reduce a single partition.
    Run {
        #[arg(short, long)]
        partition: usize,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Overrides `num.mappers` from the config.
        #[arg(short, long)]
        maps: Option<usize>,
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // add logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let config = ReduceConfig::from_xml_file(&args.config)
        .with_context(|| format!("loading {}", args.config))?;
    let reducer = config.builtin_reducer()?.into_reducer();

    let now = Local::now();
    println!("Time: {}", now.format("%Y-%m-%d %H:%M:%S"));

    match args.command {
        Commands::Run {
            partition,
            output,
            maps,
            strict,
        } => {
            let mut options = config.options()?;
            if strict {
                options = ferrum_reduce::ReduceOptions::strict();
            }
            let output = output.unwrap_or_else(|| config.output_path(partition));
            let task = ReduceTask::new(
                &config.job_name,
                partition,
                &output,
                maps.unwrap_or(config.num_mappers),
                Arc::from(reducer),
            )
            .with_options(options)
            .with_naming(Arc::new(config.naming()));

            info!(task_id = %task.task_id, partition, "running reduce task");
            let report = task
                .execute()
                .await
                .with_context(|| format!("reduce task for partition {}", partition))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

//! Generate command - produce a lockfile from sbt runs

use crate::cli::args::GenerateArgs;
use crate::config::{Config, RunConfig};
use crate::error::{SquishError, SquishResult};
use crate::generate::{GenerateOptions, Generator};
use crate::lockfile::Lockfile;
use crate::orchestration::{RunDriver, TokioProcessRunner};
use crate::ui;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Execute the generate command
pub async fn execute(args: GenerateArgs, config: &Config) -> SquishResult<()> {
    let run_config = RunConfig::load(&args.run_config)?;
    debug!(
        "Loaded {} sbt run(s) from {}",
        run_config.sbt_runs.len(),
        args.run_config.display()
    );

    let project_dir = match args.project {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| SquishError::io("getting current directory", e))?,
    };

    let driver = RunDriver::new(Arc::new(TokioProcessRunner::new()), project_dir)
        .with_sbt(config.generate.sbt.as_str())
        .with_coursier(config.generate.coursier.as_str());

    let lockfile = Generator::new(driver)
        .with_options(GenerateOptions {
            keep_temp: args.keep_temp || config.generate.keep_temp,
            clean_targets: config.generate.clean_targets,
            network_allowed: true,
        })
        .generate(&run_config)
        .await?;

    let json = lockfile.to_json()?;
    if args.dry_run {
        ui::step_info("Dry run, lockfile not written");
    } else {
        write_lockfile(&lockfile, &json, &args.output).await?;
    }

    std::io::stdout()
        .write_all(json.as_bytes())
        .map_err(|e| SquishError::io("writing lockfile to stdout", e))?;

    Ok(())
}

async fn write_lockfile(lockfile: &Lockfile, json: &str, output: &Path) -> SquishResult<()> {
    tokio::fs::write(output, json)
        .await
        .map_err(|e| SquishError::io(format!("writing lockfile to {}", output.display()), e))?;

    ui::step_ok_detail(
        &format!("Locked {} artifacts", lockfile.len()),
        &output.display().to_string(),
    );
    Ok(())
}

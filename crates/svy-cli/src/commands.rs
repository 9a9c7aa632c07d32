use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use tracing::info;

use svy_cli::config::CampaignConfig;
use svy_cli::pipeline::run_campaign;
use svy_cli::types::RunResult;
use svy_ingest::load_metadata;
use svy_model::NestingMode;

use crate::cli::{DescribeArgs, NestingArg, RunArgs};

pub fn run(args: &RunArgs) -> Result<RunResult> {
    let mut config = CampaignConfig::load(&args.config)
        .with_context(|| format!("load configuration {}", args.config.display()))?;
    apply_overrides(&mut config, args);
    let output_dir = output_dir(&config, args);
    info!(
        campaign = %config.campaign,
        modes = config.modes.len(),
        output_dir = %output_dir.display(),
        "starting campaign"
    );
    run_campaign(&config, &output_dir, args.dry_run)
}

/// Command-line flags win over the configuration file.
fn apply_overrides(config: &mut CampaignConfig, args: &RunArgs) {
    let options = &mut config.options;
    if let Some(nesting) = args.nesting {
        options.nesting = match nesting {
            NestingArg::Recursive => NestingMode::Recursive,
            NestingArg::SingleLevel => NestingMode::SingleLevel,
        };
    }
    if let Some(size) = args.partition_size {
        options.partition_size = size.max(1);
    }
    if args.no_paradata {
        options.paradata = false;
    }
    if args.drop_paradata_variables {
        options.keep_paradata_variables = false;
    }
    if let Some(delimiter) = &args.delimiter {
        config.output.delimiter = delimiter.clone();
    }
}

fn output_dir(config: &CampaignConfig, args: &RunArgs) -> PathBuf {
    args.output_dir
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| {
            args.config
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join("output")
        })
}

pub fn describe(args: &DescribeArgs) -> Result<()> {
    let registry = load_metadata(&args.metadata, &args.separator)
        .with_context(|| format!("load metadata {}", args.metadata.display()))?;
    let mut table = Table::new();
    table.set_header(vec!["Variable", "Group", "Type", "Length", "Qualified name"]);
    table.load_preset(UTF8_FULL_CONDENSED);
    for variable in registry.variables() {
        let qualified = registry
            .fully_qualified_name(&variable.name)
            .with_context(|| format!("qualify {}", variable.name))?;
        table.add_row(vec![
            variable.name.clone(),
            variable.group_name.clone(),
            variable.variable_type.to_string(),
            variable.declared_length.clone().unwrap_or_default(),
            qualified,
        ]);
    }
    println!("{table}");
    Ok(())
}

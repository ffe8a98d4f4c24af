//! `protohelp generate`: write `.helpers.go` files for a descriptor document.

use std::path::{Path, PathBuf};

use protohelp_sdk::codegen::DEFAULT_COMMON_IMPORT;
use protohelp_sdk::{module_path, DescriptorSet, GeneratedFile, Generator, GeneratorOptions};

use super::{aggregate_options, planner_options};
use crate::cli_config::loader::expand_path;
use crate::cli_config::CliConfig;
use crate::error::{CtlError, CtlResult};
use crate::output;
use crate::GenerateArgs;

/// Where the Go module is looked up when nothing else names it.
const DEFAULT_GO_MOD: &str = "../../go.mod";

pub(crate) fn handle_generate_command(args: GenerateArgs, config: &CliConfig) -> CtlResult<()> {
    let set = DescriptorSet::load(&args.schema.descriptor)?;

    let generator = Generator::new(generator_options(&args, config))
        .with_aggregate_options(aggregate_options(&args.schema, config))
        .with_planner_options(planner_options(&args.schema, config));

    let files = generator.generate(&set)?;
    if files.is_empty() {
        output::warning(format!(
            "'{}' declares no schema files",
            args.schema.descriptor.display()
        ));
        return Ok(());
    }

    if args.stdout {
        for file in &files {
            output::dim(format!("// {}", file.path));
            output::plain(&file.content);
        }
        return Ok(());
    }

    for file in &files {
        write_file(file)?;
        output::success(format!("{} -> {}", file.source, file.path));
    }
    Ok(())
}

fn write_file(file: &GeneratedFile) -> CtlResult<()> {
    let path = PathBuf::from(&file.path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| CtlError::write(parent, e))?;
    }
    std::fs::write(&path, &file.content).map_err(|e| CtlError::write(&path, e))
}

/// Emission settings: flags (and their env vars), then config, then defaults.
pub(crate) fn generator_options(args: &GenerateArgs, config: &CliConfig) -> GeneratorOptions {
    let defaults = GeneratorOptions::default();
    GeneratorOptions {
        package: args
            .package
            .clone()
            .or_else(|| config.package.clone())
            .unwrap_or(defaults.package),
        module_path: resolve_go_module(args, config),
        common_import: args
            .common_import
            .clone()
            .or_else(|| config.common_import.clone())
            .unwrap_or_else(|| DEFAULT_COMMON_IMPORT.to_string()),
        out_dir: args.out_dir.clone().or_else(|| config.out_dir.clone()),
        module_prefix: args.module.clone().or_else(|| config.module.clone()),
    }
}

fn resolve_go_module(args: &GenerateArgs, config: &CliConfig) -> Option<String> {
    if let Some(module) = args.go_module.clone().or_else(|| config.go_module.clone()) {
        return Some(module);
    }

    let path = args.go_mod.clone().unwrap_or_else(|| {
        expand_path(config.go_mod.as_deref().unwrap_or(DEFAULT_GO_MOD))
    });
    read_go_module(&path)
}

fn read_go_module(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let module = module_path(&text);
            if module.is_none() {
                tracing::warn!(?path, "go.mod has no module directive");
            }
            module
        }
        Err(e) => {
            tracing::debug!(?path, error = %e, "go.mod not readable");
            None
        }
    }
}

//! Command handlers for the protohelp CLI.

pub(crate) mod case;
pub(crate) mod generate;
pub(crate) mod plan;

pub(crate) use case::{handle_case_command, CaseStyle};
pub(crate) use generate::handle_generate_command;
pub(crate) use plan::{handle_plan_command, PlanFormat};

use protohelp_sdk::{AggregateOptions, PlannerOptions};

use crate::cli_config::CliConfig;
use crate::SchemaArgs;

/// Aggregation settings: flags, then config, then defaults.
pub(crate) fn aggregate_options(args: &SchemaArgs, config: &CliConfig) -> AggregateOptions {
    let shared_nested_names = if !args.shared_nested.is_empty() {
        args.shared_nested.clone()
    } else if !config.shared_nested_names.is_empty() {
        config.shared_nested_names.clone()
    } else {
        return AggregateOptions::default();
    };
    AggregateOptions {
        shared_nested_names,
    }
}

/// Planner settings: flags, then config, then defaults.
pub(crate) fn planner_options(args: &SchemaArgs, config: &CliConfig) -> PlannerOptions {
    let defaults = PlannerOptions::default();
    PlannerOptions {
        request_suffix: args
            .request_suffix
            .clone()
            .or_else(|| config.request_suffix.clone())
            .unwrap_or(defaults.request_suffix),
        default_page_limit: args
            .page_limit
            .or(config.default_page_limit)
            .unwrap_or(defaults.default_page_limit),
        ..defaults
    }
}

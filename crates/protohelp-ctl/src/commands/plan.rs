//! `protohelp plan`: print the helper artifacts each message would get.
//!
//! The plan of every valid entity is printed even when others failed; the
//! command still exits non-zero with the collected errors.

use clap::ValueEnum;
use protohelp_sdk::{CodegenError, DescriptorSet, GenerationPlan, GenerationReport, Generator};
use serde::Serialize;

use super::{aggregate_options, planner_options};
use crate::cli_config::CliConfig;
use crate::error::{CtlError, CtlResult};
use crate::output;
use crate::PlanArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PlanFormat {
    Json,
    Yaml,
}

#[derive(Debug, Serialize)]
struct FilePlan<'a> {
    file: &'a str,
    #[serde(flatten)]
    plan: &'a GenerationPlan,
}

pub(crate) fn handle_plan_command(args: PlanArgs, config: &CliConfig) -> CtlResult<()> {
    let set = DescriptorSet::load(&args.schema.descriptor)?;

    let generator = Generator::default()
        .with_aggregate_options(aggregate_options(&args.schema, config))
        .with_planner_options(planner_options(&args.schema, config));

    let plans: Vec<(String, GenerationPlan)> = set
        .files
        .iter()
        .map(|file| (file.name.clone(), generator.plan_file(file)))
        .collect();

    let mut report = GenerationReport::new();
    for (_, plan) in &plans {
        report.extend(plan.errors.iter().cloned());
    }

    let view: Vec<FilePlan<'_>> = plans
        .iter()
        .map(|(file, plan)| FilePlan { file, plan })
        .collect();
    output::plain(render(&view, args.format)?.trim_end());

    if !report.is_empty() {
        return Err(CtlError::Codegen(CodegenError::Generation(report)));
    }

    let entities: usize = plans.iter().map(|(_, plan)| plan.entities.len()).sum();
    output::header(format!("planned {entities} entities across {} file(s)", plans.len()));
    Ok(())
}

fn render(view: &[FilePlan<'_>], format: PlanFormat) -> CtlResult<String> {
    match format {
        PlanFormat::Json => {
            serde_json::to_string_pretty(view).map_err(|e| CtlError::Serialize(e.to_string()))
        }
        PlanFormat::Yaml => {
            serde_yaml::to_string(view).map_err(|e| CtlError::Serialize(e.to_string()))
        }
    }
}

//! Generation runs: aggregate, plan and render one schema file at a time.
//!
//! Errors are collected over the whole run. A run that collected any error
//! produces no files, so callers never write a partial set of helpers.

use crate::aggregate::{aggregate, AggregateOptions};
use crate::codegen::{output_path, render_file, CodegenError, GeneratorOptions};
use crate::descriptor::{DescriptorSet, FileDescriptor};
use crate::error::GenerationReport;
use crate::plan::{GenerationPlan, Planner, PlannerOptions};

/// One rendered helpers file.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    /// Schema file the helpers were generated from.
    pub source: String,
    /// Output path, relative to the output root.
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct Generator {
    aggregate: AggregateOptions,
    planner: Planner,
    emit: GeneratorOptions,
}

impl Generator {
    pub fn new(emit: GeneratorOptions) -> Self {
        Self {
            emit,
            ..Default::default()
        }
    }

    pub fn with_aggregate_options(mut self, options: AggregateOptions) -> Self {
        self.aggregate = options;
        self
    }

    pub fn with_planner_options(mut self, options: PlannerOptions) -> Self {
        self.planner = Planner::new(options);
        self
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.emit
    }

    /// Aggregate and plan one file. Aggregation errors precede planning
    /// errors in `errors`.
    pub fn plan_file(&self, file: &FileDescriptor) -> GenerationPlan {
        let entities = file.entities();
        let aggregation = aggregate(&entities, &self.aggregate);
        let mut plan = self.planner.plan_all(&aggregation.plans);

        let mut errors = aggregation.errors;
        errors.append(&mut plan.errors);
        plan.errors = errors;

        tracing::debug!(
            file = %file.name,
            entities = plan.entities.len(),
            errors = plan.errors.len(),
            "planned file"
        );
        plan
    }

    /// Generate the helpers of one file, failing on any collected error.
    pub fn generate_file(&self, file: &FileDescriptor) -> Result<GeneratedFile, CodegenError> {
        let plan = self.plan_file(file);
        let mut report = GenerationReport::new();
        report.extend(plan.errors.iter().cloned());
        report.into_result()?;
        self.render(file, &plan)
    }

    /// Generate every file of `set`.
    ///
    /// All files are planned before anything is rendered; the returned
    /// report then holds the errors of every file.
    pub fn generate(&self, set: &DescriptorSet) -> Result<Vec<GeneratedFile>, CodegenError> {
        let mut report = GenerationReport::new();
        let mut planned = Vec::with_capacity(set.files.len());

        for file in &set.files {
            let plan = self.plan_file(file);
            report.extend(plan.errors.iter().cloned());
            planned.push((file, plan));
        }

        if !report.is_empty() {
            tracing::error!(errors = report.len(), "generation run failed");
            return Err(CodegenError::Generation(report));
        }

        planned
            .into_iter()
            .map(|(file, plan)| self.render(file, &plan))
            .collect()
    }

    fn render(
        &self,
        file: &FileDescriptor,
        plan: &GenerationPlan,
    ) -> Result<GeneratedFile, CodegenError> {
        let path = output_path(&file.name, &self.emit)?;
        let content = render_file(&file.name, plan, &self.emit)?;
        tracing::debug!(file = %file.name, output = %path, "rendered helpers");
        Ok(GeneratedFile {
            source: file.name.clone(),
            path,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;

    const SCHEMA: &str = r#"
files:
  - name: shop/v1/jeton.proto
    package: shop.v1
    messages:
      - name: JetonEntity
        options:
          model_feature: { keeper_key: providers_token }
        fields:
          - { name: id, type: TYPE_STRING, options: { field_option: { picked: true } } }
      - name: Broken
        options:
          parser: { pick: true }
"#;

    #[test]
    fn test_plan_file_collects_planning_errors() {
        let set = DescriptorSet::from_yaml(SCHEMA).unwrap();
        let plan = Generator::default().plan_file(&set.files[0]);
        let names: Vec<&str> = plan.entities.iter().map(|e| e.entity.as_str()).collect();
        assert_eq!(names, vec!["JetonEntity"]);
        assert_eq!(
            plan.errors,
            vec![GenerationError::MissingPickTarget {
                entity: "Broken".to_string()
            }]
        );
    }

    #[test]
    fn test_generate_writes_nothing_on_errors() {
        let set = DescriptorSet::from_yaml(SCHEMA).unwrap();
        let err = Generator::default().generate(&set).unwrap_err();
        match err {
            CodegenError::Generation(report) => assert_eq!(report.len(), 1),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_generate_file_renders_at_output_path() {
        let mut set = DescriptorSet::from_yaml(SCHEMA).unwrap();
        set.files[0].messages.truncate(1);
        let generator = Generator::new(GeneratorOptions {
            module_path: Some("github.com/acme/shop".to_string()),
            out_dir: Some("gen".to_string()),
            ..Default::default()
        });
        let file = generator.generate_file(&set.files[0]).unwrap();
        assert_eq!(file.path, "gen/shop/v1/jeton.helpers.go");
        assert!(file.content.contains("\"github.com/acme/shop/internal/keeper\""));
        assert!(file.content.contains("func (x *JetonEntity) EncryptFields("));
    }
}

//! Annotation-driven helper generation for protobuf message descriptors.
//!
//! Messages and fields carry declarative annotations (`model_feature`,
//! `parser`, `field_option`). This crate turns them into a deterministic,
//! entity-scoped plan of helper artifacts and renders the plan as Go source.
//! It is consumed by the `protohelp` CLI.
//!
//! # Modules
//!
//! - [`case`]: identifier case conversion (lower, snake, camel, Pascal)
//! - [`annotation`]: typed annotations and the primitive type vocabulary
//! - [`descriptor`]: schema traits and the JSON/YAML descriptor document
//! - [`aggregate`](mod@aggregate): one `EntityPlan` per disambiguated entity
//! - [`plan`](mod@plan): ordered artifact requests per entity
//! - [`codegen`]: askama-backed Go emission and output naming
//! - [`generator`]: end-to-end runs with collected errors
//! - [`error`]: generation errors and reports

pub mod aggregate;
pub mod annotation;
pub mod case;
pub mod codegen;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod plan;

pub use aggregate::{aggregate, AggregateOptions, Aggregation, EntityPlan};
pub use codegen::{module_path, output_path, CodegenError, GeneratorOptions};
pub use descriptor::{DescriptorError, DescriptorSet, SchemaEntity, SchemaField};
pub use error::{GenerationError, GenerationReport, Location};
pub use generator::{GeneratedFile, Generator};
pub use plan::{plan, ArtifactKind, ArtifactRequest, GenerationPlan, Planner, PlannerOptions};

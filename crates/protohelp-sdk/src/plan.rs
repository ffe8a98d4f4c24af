//! Generation planning: one [`EntityPlan`] → the ordered artifacts to emit.
//!
//! Planning is a pure decision table over the entity's feature flags. Every
//! parameter a renderer needs (field lists, type names, defaults) is resolved
//! here so the emission backend never looks at plans or flags.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::aggregate::{EntityPlan, LIST_ENTITY};
use crate::annotation::{BindingSource, FieldSpec, ParserFeature, PrimitiveType};
use crate::case;
use crate::error::GenerationError;

/// Tags of the closed artifact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArtifactKind {
    EncryptDecrypt,
    SwaggerWrapper,
    PagingFilter,
    PagingOptions,
    MergeFunction,
    PickFunction,
    RequestBinder,
    MarshalBinary,
    UnmarshalBinary,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::EncryptDecrypt => "encrypt_decrypt",
            ArtifactKind::SwaggerWrapper => "swagger_wrapper",
            ArtifactKind::PagingFilter => "paging_filter",
            ArtifactKind::PagingOptions => "paging_options",
            ArtifactKind::MergeFunction => "merge_function",
            ArtifactKind::PickFunction => "pick_function",
            ArtifactKind::RequestBinder => "request_binder",
            ArtifactKind::MarshalBinary => "marshal_binary",
            ArtifactKind::UnmarshalBinary => "unmarshal_binary",
        };
        write!(f, "{name}")
    }
}

/// One unit of emission work with its resolved parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "artifact", rename_all = "snake_case")]
pub enum ArtifactRequest {
    EncryptDecrypt(EncryptDecrypt),
    SwaggerWrapper(SwaggerWrapper),
    PagingFilter(PagingFilter),
    PagingOptions(PagingOptions),
    MergeFunction(MergeFunction),
    PickFunction(PickFunction),
    RequestBinder(RequestBinder),
    MarshalBinary(Marshal),
    UnmarshalBinary(Marshal),
}

impl ArtifactRequest {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactRequest::EncryptDecrypt(_) => ArtifactKind::EncryptDecrypt,
            ArtifactRequest::SwaggerWrapper(_) => ArtifactKind::SwaggerWrapper,
            ArtifactRequest::PagingFilter(_) => ArtifactKind::PagingFilter,
            ArtifactRequest::PagingOptions(_) => ArtifactKind::PagingOptions,
            ArtifactRequest::MergeFunction(_) => ArtifactKind::MergeFunction,
            ArtifactRequest::PickFunction(_) => ArtifactKind::PickFunction,
            ArtifactRequest::RequestBinder(_) => ArtifactKind::RequestBinder,
            ArtifactRequest::MarshalBinary(_) => ArtifactKind::MarshalBinary,
            ArtifactRequest::UnmarshalBinary(_) => ArtifactKind::UnmarshalBinary,
        }
    }
}

/// Paired `EncryptFields` / `DecryptFields` helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncryptDecrypt {
    pub entity: String,
    pub key_id: String,
}

/// Body parameter container for swagger docs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwaggerWrapper {
    pub entity: String,
    /// `<Entity>Wrapper`
    pub wrapper: String,
    /// `<camelEntity>Wrapper`
    pub swagger_id: String,
}

/// How a paging filter clause matches its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMatch {
    /// Equality, included only when the value is greater than zero.
    Positive,
    /// Pattern match, included only when the string is non-empty.
    Pattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterClause {
    /// Filter document key (the schema field name).
    pub key: String,
    /// Go struct field holding the value.
    pub accessor: String,
    pub matcher: FilterMatch,
}

impl FilterClause {
    pub fn is_pattern(&self) -> bool {
        self.matcher == FilterMatch::Pattern
    }
}

/// `GetFilter` builder for a paging request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagingFilter {
    pub entity: String,
    pub clauses: Vec<FilterClause>,
    /// Annotated fields whose type has no filter translation.
    pub skipped: Vec<String>,
}

/// Window settings applied to list requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListWindow {
    pub default_limit: u32,
    pub sort_key: String,
    /// `1` for ascending.
    pub sort_direction: i32,
}

/// `GetOptions` builder for a paging request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagingOptions {
    pub entity: String,
    /// Present only for list requests; otherwise the options stay empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<ListWindow>,
}

/// `x.<target> = request.<getter>()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub target: String,
    pub getter: String,
}

impl Assignment {
    fn for_field(field: &FieldSpec) -> Self {
        let target = case::pascal(&field.name);
        let getter = format!("Get{target}");
        Self { target, getter }
    }
}

/// `MergeFrom<Entity>` attached to the merge target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeFunction {
    /// Type the function is attached to.
    pub receiver: String,
    /// Type of the update payload (the planned entity).
    pub payload: String,
    pub function: String,
    /// Copies for `merged` fields in declaration order.
    pub assignments: Vec<Assignment>,
}

/// `PickFrom<Source>` attached to the planned entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickFunction {
    pub entity: String,
    pub source: String,
    pub function: String,
    /// Accepts a sequence of sources and fills `Items`.
    pub list: bool,
    /// List variant also receives and stores a pagination descriptor.
    pub paginated: bool,
    /// Item type of the list variant: `<Entity>_ListEntity`.
    pub item_type: String,
    /// Copies for `picked` fields: the entity's own for single sources,
    /// the item plan's for lists.
    pub assignments: Vec<Assignment>,
}

/// One step of request binding, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum BindingStep {
    Query,
    Body,
    Path {
        param: String,
        target: String,
        go_type: String,
    },
    Context {
        key: String,
        target: String,
        go_type: String,
    },
}

/// `BindFromFiber` populating the entity from a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestBinder {
    pub entity: String,
    pub steps: Vec<BindingStep>,
}

/// `MustMarshalBinary` / `UnmarshalBinary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Marshal {
    pub entity: String,
}

/// Planner defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerOptions {
    /// Paging helpers are only generated for entities with this suffix.
    pub request_suffix: String,
    pub default_page_limit: u32,
    pub sort_key: String,
    /// Nested item type name looked up by list pick functions.
    pub list_item_name: String,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            request_suffix: "Request".to_string(),
            default_page_limit: 20,
            sort_key: "_id".to_string(),
            list_item_name: LIST_ENTITY.to_string(),
        }
    }
}

/// The planned artifacts of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedEntity {
    pub entity: String,
    pub requests: Vec<ArtifactRequest>,
}

/// Planning output for a whole unit, entities in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationPlan {
    pub entities: Vec<PlannedEntity>,
    #[serde(skip)]
    pub errors: Vec<GenerationError>,
}

impl GenerationPlan {
    pub fn requests(&self) -> impl Iterator<Item = &ArtifactRequest> {
        self.entities.iter().flat_map(|e| e.requests.iter())
    }
}

/// Plan with [`PlannerOptions::default`].
pub fn plan(
    entity: &EntityPlan,
    all_plans: &BTreeMap<String, EntityPlan>,
) -> Result<Vec<ArtifactRequest>, GenerationError> {
    Planner::default().plan(entity, all_plans)
}

#[derive(Debug, Clone, Default)]
pub struct Planner {
    options: PlannerOptions,
}

impl Planner {
    pub fn new(options: PlannerOptions) -> Self {
        Self { options }
    }

    /// Plan every entity in key order, collecting per-entity failures.
    pub fn plan_all(&self, all_plans: &BTreeMap<String, EntityPlan>) -> GenerationPlan {
        let mut out = GenerationPlan::default();
        for (key, entity) in all_plans {
            match self.plan(entity, all_plans) {
                Ok(requests) => out.entities.push(PlannedEntity {
                    entity: key.clone(),
                    requests,
                }),
                Err(err) => {
                    tracing::warn!(entity = %key, error = %err, "planning failed");
                    out.errors.push(err);
                }
            }
        }
        out
    }

    /// Ordered artifact requests for `entity`.
    ///
    /// `all_plans` is consulted for list item types. Fails without partial
    /// output when a requested artifact cannot be resolved.
    pub fn plan(
        &self,
        entity: &EntityPlan,
        all_plans: &BTreeMap<String, EntityPlan>,
    ) -> Result<Vec<ArtifactRequest>, GenerationError> {
        let mut requests = Vec::new();
        let name = entity.name.as_str();

        if let Some(crypto) = &entity.crypto {
            requests.push(ArtifactRequest::EncryptDecrypt(EncryptDecrypt {
                entity: name.to_string(),
                key_id: crypto.key_id.clone(),
            }));
        }

        if let Some(parser) = &entity.parser {
            if parser.swagger_wrapper {
                requests.push(ArtifactRequest::SwaggerWrapper(SwaggerWrapper {
                    entity: name.to_string(),
                    wrapper: format!("{name}Wrapper"),
                    swagger_id: format!("{}Wrapper", case::camel(name)),
                }));
            }

            if parser.paging && name.ends_with(&self.options.request_suffix) {
                requests.push(ArtifactRequest::PagingFilter(paging_filter(entity)));
                requests.push(ArtifactRequest::PagingOptions(PagingOptions {
                    entity: name.to_string(),
                    window: parser.list.then(|| ListWindow {
                        default_limit: self.options.default_page_limit,
                        sort_key: self.options.sort_key.clone(),
                        sort_direction: 1,
                    }),
                }));
            }

            if parser.wants_merge() {
                requests.push(ArtifactRequest::MergeFunction(merge_function(entity, parser)));
            }

            if parser.pick {
                requests.push(ArtifactRequest::PickFunction(
                    self.pick_function(entity, parser, all_plans)?,
                ));
            }

            if parser.request_binder {
                requests.push(ArtifactRequest::RequestBinder(request_binder(entity)?));
            }
        }

        let marshal = Marshal {
            entity: name.to_string(),
        };
        requests.push(ArtifactRequest::MarshalBinary(marshal.clone()));
        requests.push(ArtifactRequest::UnmarshalBinary(marshal));

        tracing::debug!(
            entity = %name,
            artifacts = ?requests.iter().map(ArtifactRequest::kind).collect::<Vec<_>>(),
            "planned entity"
        );

        Ok(requests)
    }

    fn pick_function(
        &self,
        entity: &EntityPlan,
        parser: &ParserFeature,
        all_plans: &BTreeMap<String, EntityPlan>,
    ) -> Result<PickFunction, GenerationError> {
        let source = parser
            .pick_with
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GenerationError::MissingPickTarget {
                entity: entity.name.clone(),
            })?;

        let item_type = format!("{}_{}", entity.name, self.options.list_item_name);

        let assignments = if parser.list {
            match all_plans.get(&item_type) {
                Some(item_plan) => picked(item_plan),
                None => {
                    tracing::debug!(
                        entity = %entity.name,
                        item_type = %item_type,
                        "no plan for list item type, items carry no fields"
                    );
                    Vec::new()
                }
            }
        } else {
            picked(entity)
        };

        Ok(PickFunction {
            entity: entity.name.clone(),
            source: source.to_string(),
            function: format!("PickFrom{source}"),
            list: parser.list,
            paginated: parser.list && parser.paging,
            item_type,
            assignments,
        })
    }
}

fn picked(plan: &EntityPlan) -> Vec<Assignment> {
    plan.fields
        .iter()
        .filter(|f| f.picked)
        .map(Assignment::for_field)
        .collect()
}

fn paging_filter(entity: &EntityPlan) -> PagingFilter {
    let mut clauses = Vec::new();
    let mut skipped = Vec::new();

    for field in &entity.fields {
        if field.name == "skip" || field.name == "limit" {
            continue;
        }

        let matcher = match &field.primitive {
            p if p.is_unsigned() && !field.repeated => FilterMatch::Positive,
            PrimitiveType::String if !field.repeated => FilterMatch::Pattern,
            _ => {
                tracing::warn!(
                    entity = %entity.name,
                    field = %field.name,
                    ty = %field.go_type(),
                    "field type has no paging filter translation, skipping"
                );
                skipped.push(field.name.clone());
                continue;
            }
        };

        clauses.push(FilterClause {
            key: field.name.clone(),
            accessor: case::pascal(&field.name),
            matcher,
        });
    }

    PagingFilter {
        entity: entity.name.clone(),
        clauses,
        skipped,
    }
}

fn merge_function(entity: &EntityPlan, parser: &ParserFeature) -> MergeFunction {
    let receiver = parser
        .merge_from
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(&entity.name)
        .to_string();

    MergeFunction {
        receiver,
        payload: entity.name.clone(),
        function: format!("MergeFrom{}", entity.name),
        assignments: entity
            .fields
            .iter()
            .filter(|f| f.merged)
            .map(Assignment::for_field)
            .collect(),
    }
}

fn request_binder(entity: &EntityPlan) -> Result<RequestBinder, GenerationError> {
    let mut steps = vec![BindingStep::Query];

    if entity
        .fields
        .iter()
        .any(|f| f.source == Some(BindingSource::Body))
    {
        steps.push(BindingStep::Body);
    }

    for field in &entity.fields {
        match field.source {
            Some(BindingSource::Path) => {
                if field.repeated || !field.primitive.is_numeric() {
                    return Err(GenerationError::UnsupportedPathBinding {
                        entity: entity.name.clone(),
                        field: field.name.clone(),
                        primitive: field.primitive.clone(),
                    });
                }
                steps.push(BindingStep::Path {
                    param: field.name.clone(),
                    target: case::pascal(&field.name),
                    go_type: field.go_type(),
                });
            }
            Some(BindingSource::Context) => steps.push(BindingStep::Context {
                key: field.name.clone(),
                target: case::pascal(&field.name),
                go_type: field.go_type(),
            }),
            Some(BindingSource::Query | BindingSource::Body) | None => {}
        }
    }

    Ok(RequestBinder {
        entity: entity.name.clone(),
        steps,
    })
}

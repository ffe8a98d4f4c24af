//! Feature aggregation: schema entities → one [`EntityPlan`] per plan key.
//!
//! Runs once per compilation unit over every entity it declares (nested ones
//! included), in nesting order. The pass is sequential: plans for one key may
//! be touched by several declarations and the merge rules depend on order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::annotation::{
    Annotation, CryptoFeature, EntityAnnotation, FieldOption, FieldSpec, ParserFeature,
    PrimitiveType, FIELD_OPTION, MODEL_FEATURE, PARSER,
};
use crate::descriptor::{SchemaEntity, SchemaField};
use crate::error::{GenerationError, Location};

/// Nested name used by list responses for their item type.
pub const LIST_ENTITY: &str = "ListEntity";

/// Knobs for the aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Nested local names that are always keyed `<Parent>_<Local>`, even when
    /// only one parent declares them.
    pub shared_nested_names: Vec<String>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            shared_nested_names: vec![LIST_ENTITY.to_string()],
        }
    }
}

/// Everything the planner needs to know about one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityPlan {
    /// Disambiguated plan key, also the generated type name.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto: Option<CryptoFeature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parser: Option<ParserFeature>,
    /// Annotated fields in declaration order.
    pub fields: Vec<FieldSpec>,
}

impl EntityPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Plans without any entity feature produce no artifacts.
    pub fn has_features(&self) -> bool {
        self.crypto.is_some() || self.parser.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fold one annotation into the plan.
    ///
    /// Entity features overwrite earlier values of the same kind. A field that
    /// is already present is replaced in place so names stay unique; new
    /// fields are appended.
    pub fn apply(&mut self, annotation: Annotation) {
        match annotation {
            Annotation::Entity(EntityAnnotation::Crypto(crypto)) => self.crypto = Some(crypto),
            Annotation::Entity(EntityAnnotation::Parser(parser)) => self.parser = Some(parser),
            Annotation::Field(spec) => {
                match self.fields.iter_mut().find(|f| f.name == spec.name) {
                    Some(existing) => *existing = spec,
                    None => self.fields.push(spec),
                }
            }
        }
    }
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// Plans that carry at least one entity feature, keyed by plan key.
    pub plans: BTreeMap<String, EntityPlan>,
    pub errors: Vec<GenerationError>,
}

/// Aggregate the annotations of `entities` into plans.
///
/// Errors are collected rather than returned early: a malformed entity
/// annotation skips that entity, a malformed field annotation or unknown
/// field type skips that field, and everything else is still processed.
pub fn aggregate<E: SchemaEntity>(entities: &[E], options: &AggregateOptions) -> Aggregation {
    let keys = plan_keys(entities, options);
    let mut plans: BTreeMap<String, EntityPlan> = BTreeMap::new();
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut errors = Vec::new();

    for entity in entities {
        let key = keys
            .get(entity.full_name())
            .cloned()
            .unwrap_or_else(|| entity.local_name().to_string());

        if let Some(existing) = owners.get(&key) {
            if existing != entity.full_name() {
                tracing::error!(
                    key = %key,
                    existing = %existing,
                    incoming = %entity.full_name(),
                    "plan key collision"
                );
                errors.push(GenerationError::NameCollision {
                    key,
                    existing: existing.clone(),
                    incoming: entity.full_name().to_string(),
                });
                continue;
            }
        }

        let annotations = match read_entity_annotations(entity) {
            Ok(annotations) => annotations,
            Err(err) => {
                errors.push(GenerationError::annotation_read(Location::entity(&key), err));
                continue;
            }
        };

        owners
            .entry(key.clone())
            .or_insert_with(|| entity.full_name().to_string());
        let plan = plans
            .entry(key.clone())
            .or_insert_with(|| EntityPlan::new(&key));

        for annotation in annotations {
            plan.apply(annotation);
        }

        for field in entity.fields() {
            match read_field(&key, field) {
                Ok(Some(spec)) => plan.apply(Annotation::Field(spec)),
                Ok(None) => {}
                Err(err) => errors.push(err),
            }
        }

        tracing::debug!(
            entity = %key,
            crypto = plan.crypto.is_some(),
            parser = plan.parser.is_some(),
            fields = plan.fields.len(),
            "aggregated entity"
        );
    }

    plans.retain(|key, plan| {
        let keep = plan.has_features();
        if !keep {
            tracing::debug!(entity = %key, "no helper features, discarding plan");
        }
        keep
    });

    Aggregation { plans, errors }
}

/// Plan key of every entity, by full name.
///
/// Nested entities whose local name is shared or colliding are keyed
/// `<parent key>_<Local>`; everything else keeps its local name. Parents are
/// keyed before their children, so qualification compounds with depth.
pub fn plan_keys<E: SchemaEntity>(
    entities: &[E],
    options: &AggregateOptions,
) -> HashMap<String, String> {
    let colliding = colliding_nested_names(entities);
    let mut keys: HashMap<String, String> = HashMap::new();
    for entity in entities {
        let parent_key = entity
            .parent_full_name()
            .and_then(|parent| keys.get(parent))
            .map(String::as_str);
        let key = plan_key(entity, parent_key, &colliding, options);
        keys.entry(entity.full_name().to_string()).or_insert(key);
    }
    keys
}

/// Plan key for `entity` given the plan key of its parent.
pub fn plan_key<E: SchemaEntity>(
    entity: &E,
    parent_key: Option<&str>,
    colliding: &BTreeSet<String>,
    options: &AggregateOptions,
) -> String {
    let local = entity.local_name();
    let qualified = colliding.contains(local)
        || options.shared_nested_names.iter().any(|n| n == local);
    match entity.parent_name() {
        Some(parent) if qualified => {
            format!("{}_{local}", parent_key.unwrap_or(parent))
        }
        _ => local.to_string(),
    }
}

/// Nested local names declared in more than one distinct scope. The file
/// root counts as a scope, so a nested name that is also declared at the top
/// level collides.
pub fn colliding_nested_names<E: SchemaEntity>(entities: &[E]) -> BTreeSet<String> {
    let mut scopes: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    let mut nested: BTreeSet<&str> = BTreeSet::new();
    for entity in entities {
        let scope = entity.parent_full_name().unwrap_or_default();
        if entity.parent_full_name().is_some() {
            nested.insert(entity.local_name());
        }
        scopes.entry(entity.local_name()).or_default().insert(scope);
    }

    scopes
        .into_iter()
        .filter(|(name, scopes)| nested.contains(name) && scopes.len() > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

// Both entity annotations are read before anything is applied so a
// malformed one leaves no partial plan behind.
fn read_entity_annotations<E: SchemaEntity>(
    entity: &E,
) -> Result<Vec<Annotation>, crate::error::AnnotationReadError> {
    let crypto: Option<CryptoFeature> = entity.annotation(MODEL_FEATURE)?;
    let parser: Option<ParserFeature> = entity.annotation(PARSER)?;

    let mut out = Vec::with_capacity(2);
    if let Some(crypto) = crypto {
        out.push(Annotation::Entity(EntityAnnotation::Crypto(crypto)));
    }
    if let Some(parser) = parser {
        out.push(Annotation::Entity(EntityAnnotation::Parser(parser)));
    }
    Ok(out)
}

fn read_field<F: SchemaField>(key: &str, field: &F) -> Result<Option<FieldSpec>, GenerationError> {
    let location = || Location::field(key, field.name());

    let option = match field.annotation::<FieldOption>(FIELD_OPTION) {
        Ok(Some(option)) => option,
        Ok(None) => return Ok(None),
        Err(err) => return Err(GenerationError::annotation_read(location(), err)),
    };

    let primitive = PrimitiveType::from_descriptor(field.proto_type(), field.type_name())
        .ok_or_else(|| GenerationError::UnknownPrimitiveType {
            location: location(),
            proto_type: field.proto_type().to_string(),
        })?;

    Ok(Some(FieldSpec {
        name: field.name().to_string(),
        primitive,
        repeated: field.is_repeated(),
        source: option.source,
        merged: option.merged,
        picked: option.picked,
    }))
}

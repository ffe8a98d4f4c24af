//! End-to-end generation over descriptor fixtures: traversal → aggregation →
//! planning → Go rendering.

use protohelp_sdk::plan::{BindingStep, FilterMatch};
use protohelp_sdk::{
    ArtifactKind, ArtifactRequest, CodegenError, DescriptorSet, GenerationError,
    GeneratorOptions, Generator,
};

fn fixture(name: &str) -> DescriptorSet {
    let yaml = match name {
        "jeton" => include_str!("fixtures/jeton.yaml"),
        "broken" => include_str!("fixtures/broken.yaml"),
        other => panic!("unknown fixture {other}"),
    };
    DescriptorSet::from_yaml(yaml).expect("fixture should parse")
}

fn generator() -> Generator {
    Generator::new(GeneratorOptions {
        module_path: Some("github.com/acme/shop".to_string()),
        module_prefix: Some("github.com/acme/shop".to_string()),
        ..Default::default()
    })
}

fn requests<'a>(
    plan: &'a protohelp_sdk::GenerationPlan,
    entity: &str,
) -> &'a [ArtifactRequest] {
    &plan
        .entities
        .iter()
        .find(|e| e.entity == entity)
        .unwrap_or_else(|| panic!("no plan for {entity}"))
        .requests
}

fn kinds(requests: &[ArtifactRequest]) -> Vec<ArtifactKind> {
    requests.iter().map(ArtifactRequest::kind).collect()
}

#[test]
fn test_entities_planned_in_key_order() {
    let set = fixture("jeton");
    let plan = generator().plan_file(&set.files[0]);
    assert!(plan.errors.is_empty(), "{:?}", plan.errors);

    let names: Vec<&str> = plan.entities.iter().map(|e| e.entity.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "AdminJetonUpdateRequest",
            "JetonEntity",
            "JetonListRequest",
            "JetonListResponse",
            "JetonListResponse_ListEntity",
        ]
    );
}

#[test]
fn test_every_entity_ends_with_marshal_pair() {
    let set = fixture("jeton");
    let plan = generator().plan_file(&set.files[0]);
    for entity in &plan.entities {
        let kinds = kinds(&entity.requests);
        assert_eq!(
            &kinds[kinds.len() - 2..],
            &[ArtifactKind::MarshalBinary, ArtifactKind::UnmarshalBinary],
            "{}",
            entity.entity
        );
    }
}

#[test]
fn test_update_request_artifacts() {
    let set = fixture("jeton");
    let plan = generator().plan_file(&set.files[0]);
    let update = requests(&plan, "AdminJetonUpdateRequest");
    assert_eq!(
        kinds(update),
        vec![
            ArtifactKind::SwaggerWrapper,
            ArtifactKind::MergeFunction,
            ArtifactKind::RequestBinder,
            ArtifactKind::MarshalBinary,
            ArtifactKind::UnmarshalBinary,
        ]
    );

    let ArtifactRequest::RequestBinder(binder) = &update[2] else {
        panic!("expected binder");
    };
    assert_eq!(binder.steps[0], BindingStep::Query);
    assert_eq!(binder.steps[1], BindingStep::Body);
    assert!(matches!(&binder.steps[2], BindingStep::Path { param, .. } if param == "jeton_id"));
    assert!(matches!(&binder.steps[3], BindingStep::Context { key, .. } if key == "user_id"));
}

#[test]
fn test_list_request_filter() {
    let set = fixture("jeton");
    let plan = generator().plan_file(&set.files[0]);
    let list = requests(&plan, "JetonListRequest");
    let ArtifactRequest::PagingFilter(filter) = &list[0] else {
        panic!("expected paging filter");
    };
    let clauses: Vec<(&str, FilterMatch)> = filter
        .clauses
        .iter()
        .map(|c| (c.key.as_str(), c.matcher))
        .collect();
    assert_eq!(
        clauses,
        vec![("owner_id", FilterMatch::Positive), ("title", FilterMatch::Pattern)]
    );
    assert_eq!(filter.skipped, vec!["active"]);
}

#[test]
fn test_rendered_file() {
    let set = fixture("jeton");
    let files = generator().generate(&set).unwrap();
    assert_eq!(files.len(), 1);

    let file = &files[0];
    assert_eq!(file.path, "pb/jeton.helpers.go");
    let go = &file.content;

    assert!(go.starts_with("// Code generated by protohelp. DO NOT EDIT.\n"));
    assert!(go.contains("\npackage pb\n"));
    for import in [
        "\"context\"",
        "\"fmt\"",
        "deepcopy \"github.com/barkimedes/go-deepcopy\"",
        "\"github.com/acme/shop/internal/keeper\"",
        "\"github.com/epicbytes/protocommon/common\"",
        "json \"github.com/goccy/go-json\"",
        "\"github.com/gofiber/fiber/v2\"",
        "\"go.mongodb.org/mongo-driver/bson\"",
        "\"go.mongodb.org/mongo-driver/bson/primitive\"",
        "\"go.mongodb.org/mongo-driver/mongo/options\"",
    ] {
        assert!(go.contains(&format!("\t{import}\n")), "missing import {import}");
    }

    assert!(go.contains("type AdminJetonUpdateRequestWrapper struct {"));
    assert!(go.contains("func (x *JetonEntity) MergeFromAdminJetonUpdateRequest(request *AdminJetonUpdateRequest) {"));
    assert!(go.contains("var limit int64 = 20"));
    assert!(go.contains("opts.SetSort(bson.M{\"_id\": 1})"));
    assert!(go.contains(
        "func (x *JetonListResponse) PickFromJetonEntity(request []*JetonEntity, pagination *common.Pagination) {"
    ));
    assert!(go.contains("\t\titem.Title = req.GetTitle()\n"));
    assert!(go.contains("func (x *JetonListResponse_ListEntity) MustMarshalBinary() []byte {"));
    assert!(!go.contains("Plain"));

    let admin = go.find("func (x *AdminJetonUpdateRequest) BindFromFiber").unwrap();
    let entity = go.find("func (x *JetonEntity) EncryptFields").unwrap();
    assert!(admin < entity);
}

#[test]
fn test_errors_are_collected_across_entities() {
    let set = fixture("broken");
    let plan = generator().plan_file(&set.files[0]);

    assert_eq!(plan.errors.len(), 4, "{:?}", plan.errors);
    assert!(matches!(
        &plan.errors[0],
        GenerationError::AnnotationRead { location, annotation, .. }
            if location.entity == "TypoRequest" && annotation == "parser"
    ));
    assert!(matches!(
        &plan.errors[1],
        GenerationError::UnknownPrimitiveType { location, proto_type }
            if location.field.as_deref() == Some("status") && proto_type == "TYPE_ENUM"
    ));
    assert!(matches!(
        &plan.errors[2],
        GenerationError::AnnotationRead { location, .. }
            if location.field.as_deref() == Some("slug")
    ));
    assert!(matches!(
        &plan.errors[3],
        GenerationError::UnsupportedPathBinding { entity, .. } if entity == "SlugRequest"
    ));

    // The valid sibling is still planned.
    let good = requests(&plan, "GoodEntity");
    let ArtifactRequest::PickFunction(pick) = &good[0] else {
        panic!("expected pick function");
    };
    assert_eq!(pick.assignments.len(), 1);
    assert_eq!(pick.assignments[0].target, "Id");
}

#[test]
fn test_failed_run_renders_nothing() {
    let set = fixture("broken");
    let err = generator().generate(&set).unwrap_err();
    let CodegenError::Generation(report) = err else {
        panic!("expected generation report");
    };
    assert_eq!(report.len(), 4);
    assert!(report.to_string().starts_with("4 generation error(s)"));
}

#[test]
fn test_output_outside_module_prefix() {
    let mut set = fixture("jeton");
    set.files[0].name = "elsewhere/jeton.proto".to_string();
    let err = generator().generate(&set).unwrap_err();
    assert!(matches!(err, CodegenError::OutputOutsideModule { .. }));
}

//! Askama template structs for the Go helper artifacts.
//!
//! One template per artifact kind, plus the file wrapper. Template structs
//! borrow from the planned requests; the few values Go needs in a different
//! shape (string literals, binder locals) are derived here.

use askama::Template;

use super::{imports_for, CodegenError, GeneratorOptions, GoImport};
use crate::case;
use crate::plan::{
    ArtifactRequest, Assignment, BindingStep, EncryptDecrypt, FilterClause, GenerationPlan,
    MergeFunction, PagingFilter, PagingOptions, PickFunction, RequestBinder, SwaggerWrapper,
};

#[derive(Template, Debug)]
#[template(path = "codegen/encrypt_decrypt.go", escape = "none")]
struct EncryptDecryptTemplate<'a> {
    entity: &'a str,
    key_literal: String,
}

#[derive(Template, Debug)]
#[template(path = "codegen/swagger_wrapper.go", escape = "none")]
struct SwaggerWrapperTemplate<'a> {
    entity: &'a str,
    wrapper: &'a str,
    swagger_id: &'a str,
}

#[derive(Template, Debug)]
#[template(path = "codegen/paging_filter.go", escape = "none")]
struct PagingFilterTemplate<'a> {
    entity: &'a str,
    clauses: &'a [FilterClause],
}

#[derive(Template, Debug)]
#[template(path = "codegen/paging_options.go", escape = "none")]
struct PagingOptionsTemplate<'a> {
    entity: &'a str,
    list: bool,
    default_limit: u32,
    sort_key: &'a str,
    sort_direction: i32,
}

#[derive(Template, Debug)]
#[template(path = "codegen/merge_function.go", escape = "none")]
struct MergeFunctionTemplate<'a> {
    receiver: &'a str,
    payload: &'a str,
    function: &'a str,
    assignments: &'a [Assignment],
}

#[derive(Template, Debug)]
#[template(path = "codegen/pick_single.go", escape = "none")]
struct PickSingleTemplate<'a> {
    entity: &'a str,
    source: &'a str,
    function: &'a str,
    assignments: &'a [Assignment],
}

#[derive(Template, Debug)]
#[template(path = "codegen/pick_list.go", escape = "none")]
struct PickListTemplate<'a> {
    entity: &'a str,
    source: &'a str,
    function: &'a str,
    item_type: &'a str,
    paginated: bool,
    assignments: &'a [Assignment],
}

/// Path or context assignment inside `BindFromFiber`.
#[derive(Debug)]
struct FieldBind<'a> {
    path: bool,
    key: &'a str,
    target: &'a str,
    go_type: &'a str,
    /// Local holding the converted path parameter.
    local: String,
}

#[derive(Template, Debug)]
#[template(path = "codegen/request_binder.go", escape = "none")]
struct RequestBinderTemplate<'a> {
    entity: &'a str,
    has_body: bool,
    binds: Vec<FieldBind<'a>>,
}

#[derive(Template, Debug)]
#[template(path = "codegen/marshal_binary.go", escape = "none")]
struct MarshalBinaryTemplate<'a> {
    entity: &'a str,
}

#[derive(Template, Debug)]
#[template(path = "codegen/unmarshal_binary.go", escape = "none")]
struct UnmarshalBinaryTemplate<'a> {
    entity: &'a str,
}

#[derive(Template, Debug)]
#[template(path = "codegen/helpers_file.go", escape = "none")]
struct HelpersFileTemplate<'a> {
    source: &'a str,
    package: &'a str,
    imports: Vec<GoImport>,
    units: Vec<String>,
}

// JSON string escapes are a subset of Go's interpreted string literal syntax.
fn go_string_literal(value: &str) -> Result<String, CodegenError> {
    serde_json::to_string(value).map_err(|e| CodegenError::Rendering(e.to_string()))
}

fn encrypt_decrypt(request: &EncryptDecrypt) -> Result<String, CodegenError> {
    EncryptDecryptTemplate {
        entity: &request.entity,
        key_literal: go_string_literal(&request.key_id)?,
    }
    .render()
    .map_err(|e| CodegenError::Rendering(e.to_string()))
}

fn swagger_wrapper(request: &SwaggerWrapper) -> askama::Result<String> {
    SwaggerWrapperTemplate {
        entity: &request.entity,
        wrapper: &request.wrapper,
        swagger_id: &request.swagger_id,
    }
    .render()
}

fn paging_filter(request: &PagingFilter) -> askama::Result<String> {
    PagingFilterTemplate {
        entity: &request.entity,
        clauses: &request.clauses,
    }
    .render()
}

fn paging_options(request: &PagingOptions) -> askama::Result<String> {
    let (default_limit, sort_key, sort_direction) = match &request.window {
        Some(window) => (
            window.default_limit,
            window.sort_key.as_str(),
            window.sort_direction,
        ),
        None => (0, "", 0),
    };
    PagingOptionsTemplate {
        entity: &request.entity,
        list: request.window.is_some(),
        default_limit,
        sort_key,
        sort_direction,
    }
    .render()
}

fn merge_function(request: &MergeFunction) -> askama::Result<String> {
    MergeFunctionTemplate {
        receiver: &request.receiver,
        payload: &request.payload,
        function: &request.function,
        assignments: &request.assignments,
    }
    .render()
}

fn pick_function(request: &PickFunction) -> askama::Result<String> {
    if request.list {
        PickListTemplate {
            entity: &request.entity,
            source: &request.source,
            function: &request.function,
            item_type: &request.item_type,
            paginated: request.paginated,
            assignments: &request.assignments,
        }
        .render()
    } else {
        PickSingleTemplate {
            entity: &request.entity,
            source: &request.source,
            function: &request.function,
            assignments: &request.assignments,
        }
        .render()
    }
}

fn request_binder(request: &RequestBinder) -> askama::Result<String> {
    let mut has_body = false;
    let mut binds = Vec::new();

    for step in &request.steps {
        match step {
            BindingStep::Query => {}
            BindingStep::Body => has_body = true,
            BindingStep::Path {
                param,
                target,
                go_type,
            } => binds.push(FieldBind {
                path: true,
                key: param,
                target,
                go_type,
                local: format!("{}Param", case::camel(param)),
            }),
            BindingStep::Context {
                key,
                target,
                go_type,
            } => binds.push(FieldBind {
                path: false,
                key,
                target,
                go_type,
                local: String::new(),
            }),
        }
    }

    RequestBinderTemplate {
        entity: &request.entity,
        has_body,
        binds,
    }
    .render()
}

/// Render one artifact to a self-contained Go declaration block.
pub fn render_request(request: &ArtifactRequest) -> Result<String, CodegenError> {
    let output = match request {
        ArtifactRequest::EncryptDecrypt(r) => return encrypt_decrypt(r).map(trimmed),
        ArtifactRequest::SwaggerWrapper(r) => swagger_wrapper(r),
        ArtifactRequest::PagingFilter(r) => paging_filter(r),
        ArtifactRequest::PagingOptions(r) => paging_options(r),
        ArtifactRequest::MergeFunction(r) => merge_function(r),
        ArtifactRequest::PickFunction(r) => pick_function(r),
        ArtifactRequest::RequestBinder(r) => request_binder(r),
        ArtifactRequest::MarshalBinary(r) => MarshalBinaryTemplate { entity: &r.entity }.render(),
        ArtifactRequest::UnmarshalBinary(r) => {
            UnmarshalBinaryTemplate { entity: &r.entity }.render()
        }
    };

    output
        .map(trimmed)
        .map_err(|e| CodegenError::Rendering(e.to_string()))
}

/// Render the helpers file for schema file `source`.
///
/// Entities appear in plan order, their artifacts in request order.
pub fn render_file(
    source: &str,
    plan: &GenerationPlan,
    options: &GeneratorOptions,
) -> Result<String, CodegenError> {
    let units = plan
        .requests()
        .map(render_request)
        .collect::<Result<Vec<_>, _>>()?;

    let file = HelpersFileTemplate {
        source,
        package: &options.package,
        imports: imports_for(plan.requests(), options),
        units,
    };

    file.render()
        .map(|text| format!("{}\n", text.trim_end()))
        .map_err(|e| CodegenError::Rendering(e.to_string()))
}

fn trimmed(text: String) -> String {
    text.trim_end().to_string()
}

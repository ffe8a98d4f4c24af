//! Go emission backend.
//!
//! Renders planned [`ArtifactRequest`](crate::plan::ArtifactRequest)s into a
//! `<schema>.helpers.go` file. Each artifact has its own askama template under
//! `templates/codegen/`; the file wrapper owns the package clause and the
//! import block, which is derived from the artifacts actually emitted.

pub mod go_templates;

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::error::GenerationReport;
use crate::plan::ArtifactRequest;

pub use go_templates::{render_file, render_request};

/// Import path of the shared pagination/common proto package.
pub const DEFAULT_COMMON_IMPORT: &str = "github.com/epicbytes/protocommon/common";

/// Errors from rendering or placing generated output.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("template rendering failed: {0}")]
    Rendering(String),

    #[error("generated file '{path}' does not match module prefix '{module}'")]
    OutputOutsideModule { path: String, module: String },

    #[error(transparent)]
    Generation(#[from] GenerationReport),
}

/// Emission settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Go package clause of the generated files.
    pub package: String,
    /// Go module of the consuming project; the keeper lives under
    /// `<module_path>/internal/keeper`.
    pub module_path: Option<String>,
    pub common_import: String,
    /// Directory prepended to every output path.
    pub out_dir: Option<String>,
    /// Module prefix stripped from every output path.
    pub module_prefix: Option<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            package: "pb".to_string(),
            module_path: None,
            common_import: DEFAULT_COMMON_IMPORT.to_string(),
            out_dir: None,
            module_prefix: None,
        }
    }
}

impl GeneratorOptions {
    pub fn keeper_import(&self) -> String {
        match self.module_path.as_deref().filter(|m| !m.is_empty()) {
            Some(module) => format!("{module}/internal/keeper"),
            None => "internal/keeper".to_string(),
        }
    }
}

/// External Go packages a generated file may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GoPackage {
    Context,
    Fmt,
    Keeper,
    Common,
    Json,
    Bson,
    Primitive,
    Options,
    Fiber,
    DeepCopy,
}

impl GoPackage {
    /// Packages referenced by the rendered form of `request`.
    pub fn required_by(request: &ArtifactRequest) -> Vec<GoPackage> {
        match request {
            ArtifactRequest::EncryptDecrypt(_) => vec![
                GoPackage::Context,
                GoPackage::Fmt,
                GoPackage::Keeper,
                GoPackage::DeepCopy,
            ],
            ArtifactRequest::SwaggerWrapper(_) | ArtifactRequest::MergeFunction(_) => vec![],
            ArtifactRequest::PagingFilter(filter) => {
                let mut packages = vec![GoPackage::Bson];
                if filter.clauses.iter().any(|c| c.is_pattern()) {
                    packages.push(GoPackage::Primitive);
                }
                packages
            }
            ArtifactRequest::PagingOptions(options) => {
                let mut packages = vec![GoPackage::Options];
                if options.window.is_some() {
                    packages.push(GoPackage::Bson);
                }
                packages
            }
            ArtifactRequest::PickFunction(pick) if pick.paginated => vec![GoPackage::Common],
            ArtifactRequest::PickFunction(_) => vec![],
            ArtifactRequest::RequestBinder(_) => vec![GoPackage::Fiber],
            ArtifactRequest::MarshalBinary(_) => vec![GoPackage::Json, GoPackage::Fmt],
            ArtifactRequest::UnmarshalBinary(_) => vec![GoPackage::Json],
        }
    }

    pub fn import(self, options: &GeneratorOptions) -> GoImport {
        let (alias, path) = match self {
            GoPackage::Context => (None, "context".to_string()),
            GoPackage::Fmt => (None, "fmt".to_string()),
            GoPackage::Keeper => (None, options.keeper_import()),
            GoPackage::Common => (None, options.common_import.clone()),
            GoPackage::Json => (Some("json"), "github.com/goccy/go-json".to_string()),
            GoPackage::Bson => (None, "go.mongodb.org/mongo-driver/bson".to_string()),
            GoPackage::Primitive => (None, "go.mongodb.org/mongo-driver/bson/primitive".to_string()),
            GoPackage::Options => (None, "go.mongodb.org/mongo-driver/mongo/options".to_string()),
            GoPackage::Fiber => (None, "github.com/gofiber/fiber/v2".to_string()),
            GoPackage::DeepCopy => (Some("deepcopy"), "github.com/barkimedes/go-deepcopy".to_string()),
        };
        GoImport {
            alias: alias.map(str::to_string),
            path,
        }
    }

    fn is_std(self) -> bool {
        matches!(self, GoPackage::Context | GoPackage::Fmt)
    }
}

/// One line of a Go import block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoImport {
    pub alias: Option<String>,
    pub path: String,
}

impl fmt::Display for GoImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{alias} \"{}\"", self.path),
            None => write!(f, "\"{}\"", self.path),
        }
    }
}

/// Import block for `requests`: standard library first, then by path.
pub fn imports_for<'a>(
    requests: impl IntoIterator<Item = &'a ArtifactRequest>,
    options: &GeneratorOptions,
) -> Vec<GoImport> {
    let packages: BTreeSet<GoPackage> = requests
        .into_iter()
        .flat_map(GoPackage::required_by)
        .collect();

    if packages.contains(&GoPackage::Keeper) && options.module_path.is_none() {
        tracing::warn!("no Go module path configured, keeper import is relative");
    }

    let mut imports: Vec<(bool, GoImport)> = packages
        .into_iter()
        .map(|p| (!p.is_std(), p.import(options)))
        .collect();
    imports.sort_by(|(a_ext, a), (b_ext, b)| a_ext.cmp(b_ext).then_with(|| a.path.cmp(&b.path)));
    imports.into_iter().map(|(_, import)| import).collect()
}

/// Output path for the helpers of schema file `descriptor_name`.
///
/// The extension is replaced with `.helpers.go` and the result placed under
/// `out_dir`. With a module prefix set, the path must start with
/// `<module>/`, which is removed.
pub fn output_path(descriptor_name: &str, options: &GeneratorOptions) -> Result<String, CodegenError> {
    let stem = match descriptor_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => stem,
        _ => descriptor_name,
    };

    let mut path = format!("{stem}.helpers.go");
    if let Some(dir) = options.out_dir.as_deref().filter(|d| !d.is_empty()) {
        path = format!("{}/{path}", dir.trim_end_matches('/'));
    }

    let Some(module) = options.module_prefix.as_deref().filter(|m| !m.is_empty()) else {
        return Ok(path);
    };

    let path = path.replace('\\', "/");
    let prefix = format!("{module}/");
    match path.strip_prefix(&prefix) {
        Some(rest) => Ok(rest.to_string()),
        None => Err(CodegenError::OutputOutsideModule {
            path,
            module: module.to_string(),
        }),
    }
}

/// Go module path declared by a `go.mod` file.
///
/// The path may be bare, double-quoted or backquoted. The first `module`
/// directive decides: a malformed quoted path yields `None`.
pub fn module_path(go_mod: &str) -> Option<String> {
    for line in go_mod.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) && !rest.starts_with(['"', '`']) {
            continue;
        }
        return unquote(rest.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string);
    }
    None
}

fn unquote(name: &str) -> Option<&str> {
    for quote in ['"', '`'] {
        if name.starts_with(quote) || name.ends_with(quote) {
            let inner = name.strip_prefix(quote)?.strip_suffix(quote)?;
            return (!inner.contains(quote)).then_some(inner);
        }
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Marshal, PagingOptions};

    #[test]
    fn test_output_path_replaces_extension() {
        let options = GeneratorOptions::default();
        assert_eq!(
            output_path("shop/v1/jeton.proto", &options).unwrap(),
            "shop/v1/jeton.helpers.go"
        );
        assert_eq!(output_path("noext", &options).unwrap(), "noext.helpers.go");
        assert_eq!(
            output_path("dir.v1/noext", &options).unwrap(),
            "dir.v1/noext.helpers.go"
        );
    }

    #[test]
    fn test_output_path_out_dir_and_module_prefix() {
        let options = GeneratorOptions {
            out_dir: Some("github.com/acme/shop/".to_string()),
            module_prefix: Some("github.com/acme/shop".to_string()),
            ..Default::default()
        };
        assert_eq!(
            output_path("pb/jeton.proto", &options).unwrap(),
            "pb/jeton.helpers.go"
        );
    }

    #[test]
    fn test_output_path_outside_module_is_rejected() {
        let options = GeneratorOptions {
            module_prefix: Some("github.com/acme/shop".to_string()),
            ..Default::default()
        };
        let err = output_path("other/jeton.proto", &options).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::OutputOutsideModule { ref path, .. } if path == "other/jeton.helpers.go"
        ));
    }

    #[test]
    fn test_module_path_parsing() {
        let go_mod = "// project\nmodule github.com/acme/shop // main\n\ngo 1.21\n";
        assert_eq!(module_path(go_mod), Some("github.com/acme/shop".to_string()));
        assert_eq!(
            module_path("module \"example.com/quoted\"\n"),
            Some("example.com/quoted".to_string())
        );
        assert_eq!(module_path("go 1.21\n"), None);
        assert_eq!(module_path("modules x\n"), None);
    }

    #[test]
    fn test_module_path_quoting() {
        assert_eq!(
            module_path("module `example.com/raw`\n"),
            Some("example.com/raw".to_string())
        );
        assert_eq!(module_path("module \"example.com/open\n"), None);
        assert_eq!(module_path("module example.com/close`\n"), None);
        assert_eq!(module_path("module \"\"\n"), None);
        assert_eq!(module_path("module \"\n"), None);
        assert_eq!(
            module_path("module \"example.com/bad\nmodule example.com/later\n"),
            None
        );
    }

    #[test]
    fn test_keeper_import_follows_module_path() {
        let mut options = GeneratorOptions::default();
        assert_eq!(options.keeper_import(), "internal/keeper");
        options.module_path = Some("github.com/acme/shop".to_string());
        assert_eq!(options.keeper_import(), "github.com/acme/shop/internal/keeper");
    }

    #[test]
    fn test_imports_are_deduplicated_std_first() {
        let marshal = ArtifactRequest::MarshalBinary(Marshal {
            entity: "Order".to_string(),
        });
        let unmarshal = ArtifactRequest::UnmarshalBinary(Marshal {
            entity: "Order".to_string(),
        });
        let options_request = ArtifactRequest::PagingOptions(PagingOptions {
            entity: "OrderRequest".to_string(),
            window: None,
        });
        let imports = imports_for(
            [&options_request, &marshal, &unmarshal],
            &GeneratorOptions::default(),
        );
        let lines: Vec<String> = imports.iter().map(ToString::to_string).collect();
        assert_eq!(
            lines,
            vec![
                "\"fmt\"",
                "json \"github.com/goccy/go-json\"",
                "\"go.mongodb.org/mongo-driver/mongo/options\"",
            ]
        );
    }
}

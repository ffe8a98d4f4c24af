//! CLI configuration: generation defaults shared by a project.
//!
//! Every key is optional; command-line flags and environment variables take
//! precedence over the file.

pub(crate) mod loader;

pub(crate) use loader::load_cli_config;

use serde::Deserialize;

/// Contents of `.protohelp.toml`.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// Go package clause of generated files. Default: "pb".
    pub package: Option<String>,

    /// Directory generated files are placed under.
    pub out_dir: Option<String>,

    /// Module prefix stripped from output paths.
    pub module: Option<String>,

    /// Go module of the consuming project (keeper import root). When unset
    /// it is read from `go-mod`.
    pub go_module: Option<String>,

    /// Path of the `go.mod` to read the module from. Default: "../../go.mod".
    pub go_mod: Option<String>,

    /// Import path of the common proto package.
    pub common_import: Option<String>,

    /// Nested names always keyed by their parent. Default: ["ListEntity"].
    #[serde(default)]
    pub shared_nested_names: Vec<String>,

    /// Suffix that enables paging helpers. Default: "Request".
    pub request_suffix: Option<String>,

    /// Page size used when a list request leaves its limit unset. Default: 20.
    pub default_page_limit: Option<u32>,
}

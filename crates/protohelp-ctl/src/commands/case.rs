//! `protohelp case`: convert identifiers with the generator's case rules.

use clap::ValueEnum;
use protohelp_sdk::case;

use crate::error::CtlResult;
use crate::output;
use crate::CaseArgs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum CaseStyle {
    Lower,
    Snake,
    Kebab,
    Camel,
    Pascal,
}

impl CaseStyle {
    pub(crate) fn apply(self, identifier: &str) -> String {
        match self {
            CaseStyle::Lower => case::lower(identifier, None),
            CaseStyle::Snake => case::snake(identifier),
            CaseStyle::Kebab => case::lower(identifier, Some('-')),
            CaseStyle::Camel => case::camel(identifier),
            CaseStyle::Pascal => case::pascal(identifier),
        }
    }
}

pub(crate) fn handle_case_command(args: &CaseArgs) -> CtlResult<()> {
    for identifier in &args.identifiers {
        output::plain(args.style.apply(identifier));
    }
    Ok(())
}

use crate::builtin::BuiltInCommand;
use crate::config::ShellConfig;
use crate::path::find_partial_executable_matches_in_path;
use std::collections::BTreeSet;
use std::path::PathBuf;
use strum::VariantNames;

/// Completes a partial command name.
///
/// Completions are sorted lexicographically, so the first one is always the same for a given
/// input.
pub(crate) trait Autocomplete {
    fn completions(&self, input: &str) -> BTreeSet<String>;
}

pub(crate) struct CompositeAutocomplete {
    autocompletes: Vec<Box<dyn Autocomplete>>,
}

impl CompositeAutocomplete {
    pub(crate) fn new(config: &ShellConfig) -> Self {
        Self {
            autocompletes: vec![
                Box::new(BuiltInAutocompletion {}),
                Box::new(PathAutocompletion {
                    search_path: config.search_path().to_vec(),
                }),
            ],
        }
    }
}

impl Autocomplete for CompositeAutocomplete {
    fn completions(&self, input: &str) -> BTreeSet<String> {
        // Nothing to complete yet.
        if input.is_empty() {
            return BTreeSet::new();
        }

        // Collect into a set to deduplicate entries.
        self.autocompletes
            .iter()
            .flat_map(|autocomplete| autocomplete.completions(input))
            .collect()
    }
}

struct BuiltInAutocompletion {}

impl Autocomplete for BuiltInAutocompletion {
    fn completions(&self, input: &str) -> BTreeSet<String> {
        BuiltInCommand::VARIANTS
            .iter()
            .filter(|cmd| cmd.starts_with(input))
            .map(ToString::to_string)
            .collect()
    }
}

struct PathAutocompletion {
    search_path: Vec<PathBuf>,
}

impl Autocomplete for PathAutocompletion {
    fn completions(&self, input: &str) -> BTreeSet<String> {
        find_partial_executable_matches_in_path(&self.search_path, input)
    }
}

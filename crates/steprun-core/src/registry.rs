//! Step registry: ordered `(pattern, handler)` pairs with first-match
//! resolution.

use crate::arg::Arg;
use crate::errors::{RegistryError, StepResult};
use crate::model::Step;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;

/// Handler invoked for every step whose text matches its pattern.
///
/// Closures `Fn(&[Arg]) -> StepResult` implement this trait, so most suites
/// never name it.
pub trait StepHandler: Send + Sync {
    fn handle(&self, args: &[Arg]) -> StepResult;
}

impl<F> StepHandler for F
where
    F: Fn(&[Arg]) -> StepResult + Send + Sync,
{
    fn handle(&self, args: &[Arg]) -> StepResult {
        self(args)
    }
}

pub struct StepDefinition {
    pub index: usize,
    pub pattern: Regex,
    /// Handler type name, shown when listing definitions.
    pub name: String,
    handler: Arc<dyn StepHandler>,
}

impl StepDefinition {
    pub fn handler(&self) -> &dyn StepHandler {
        self.handler.as_ref()
    }
}

impl std::fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinition")
            .field("index", &self.index)
            .field("pattern", &self.pattern.as_str())
            .field("name", &self.name)
            .finish()
    }
}

/// Chosen definition and the arguments extracted for one step.
#[derive(Debug)]
pub struct StepMatch<'r> {
    pub definition: &'r StepDefinition,
    pub args: Vec<Arg>,
}

#[derive(Debug, Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
    sealed: bool,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a definition. Registration order is the tie-break order for
    /// matching.
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<(), RegistryError>
    where
        F: Fn(&[Arg]) -> StepResult + Send + Sync + 'static,
    {
        self.register_handler(pattern, handler)
    }

    /// Register any [`StepHandler`] implementor, such as a struct holding
    /// shared state.
    pub fn register_handler<H>(&mut self, pattern: &str, handler: H) -> Result<(), RegistryError>
    where
        H: StepHandler + 'static,
    {
        let name = std::any::type_name::<H>().to_string();
        self.register_named(pattern, name, Arc::new(handler))
    }

    pub fn register_named(
        &mut self,
        pattern: &str,
        name: impl Into<String>,
        handler: Arc<dyn StepHandler>,
    ) -> Result<(), RegistryError> {
        if self.sealed {
            return Err(RegistryError::Sealed {
                pattern: pattern.to_string(),
            });
        }
        let regex = Regex::new(pattern).map_err(|source| RegistryError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let index = self.definitions.len();
        tracing::debug!(index, pattern, "registered step definition");
        self.definitions.push(StepDefinition {
            index,
            pattern: regex,
            name: name.into(),
            handler,
        });
        Ok(())
    }

    /// Freeze the registry. Later registrations fail with
    /// [`RegistryError::Sealed`].
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    /// Resolve step text to the first definition, in registration order,
    /// whose pattern matches it.
    ///
    /// Matching is a regex search: a pattern matches when it is found
    /// anywhere in `text`, not only when it spans the whole text. Patterns
    /// that must cover the full step anchor themselves with `^...$`.
    pub fn find(&self, text: &str) -> Option<StepMatch<'_>> {
        self.definitions.iter().find_map(|definition| {
            let caps = definition.pattern.captures(text)?;
            let args = caps
                .iter()
                .skip(1)
                .map(|m| Arg::Text(m.map_or_else(String::new, |m| m.as_str().to_string())))
                .collect();
            Some(StepMatch { definition, args })
        })
    }

    /// Like [`find`](Self::find), with the step's doc string or table
    /// appended as the last argument.
    pub fn resolve(&self, step: &Step) -> Option<StepMatch<'_>> {
        let mut found = self.find(&step.text)?;
        if let Some(argument) = &step.argument {
            found.args.push(Arg::from(argument));
        }
        Some(found)
    }

    /// Print one line per definition: pattern followed by handler name.
    pub fn write_definitions(&self, w: &mut dyn Write) -> io::Result<()> {
        if self.definitions.is_empty() {
            return writeln!(
                w,
                "there were no contexts registered, could not find any step definition.."
            );
        }
        let width = self
            .definitions
            .iter()
            .map(|d| d.pattern.as_str().len())
            .max()
            .unwrap_or(0);
        for d in &self.definitions {
            writeln!(w, "{:>width$} -> {}", d.pattern.as_str(), d.name, width = width)?;
        }
        Ok(())
    }
}

use crate::error::{Result, SpreadsheetError};
use indexmap::IndexMap;
use recalc_engine::engine::{
    Cell, CellContent, CellValue, DependencyGraph, Normalizer, Validator, accept_all,
    identity_normalizer, is_valid_cell_name,
};
use std::path::PathBuf;
use std::rc::Rc;

/// Version tag used when the caller does not supply one.
pub const DEFAULT_VERSION: &str = "default";

static EMPTY_CONTENT: CellContent = CellContent::Empty;
static EMPTY_VALUE: CellValue = CellValue::Text(String::new());

/// Construction parameters for a [`Spreadsheet`].
#[derive(Clone)]
pub struct SheetOptions {
    /// Extra restriction on normalized cell names and formula variables.
    pub is_valid: Validator,
    /// Applied to every name before it is stored, compared or indexed.
    pub normalize: Normalizer,
    /// Opaque compatibility marker compared against saved snapshots.
    pub version: String,
}

impl SheetOptions {
    pub fn new(version: impl Into<String>) -> Self {
        SheetOptions {
            version: version.into(),
            ..SheetOptions::default()
        }
    }

    pub fn with_validator(mut self, is_valid: impl Fn(&str) -> bool + 'static) -> Self {
        self.is_valid = Rc::new(is_valid);
        self
    }

    pub fn with_normalizer(mut self, normalize: impl Fn(&str) -> String + 'static) -> Self {
        self.normalize = Rc::new(normalize);
        self
    }
}

impl Default for SheetOptions {
    fn default() -> Self {
        SheetOptions {
            is_valid: accept_all(),
            normalize: identity_normalizer(),
            version: DEFAULT_VERSION.to_string(),
        }
    }
}

/// A spreadsheet of named cells whose formulas are kept up to date on every edit.
///
/// Every possible cell name exists conceptually; only non-empty cells are
/// stored. The dependency graph holds an edge `(v, c)` for every variable `v`
/// in the formula of cell `c`, and is changed only together with the cells.
pub struct Spreadsheet {
    /// Non-empty cells by canonical name, in first-set order
    pub(crate) cells: IndexMap<String, Cell>,
    /// Edges (v, c): c's formula reads v
    pub(crate) graph: DependencyGraph,
    pub(crate) options: SheetOptions,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the sheet changed since it was last saved or loaded
    pub(crate) modified: bool,
}

impl Spreadsheet {
    /// Create an empty sheet with the identity normalizer, a validator that
    /// accepts everything, and the default version tag.
    pub fn new() -> Self {
        Self::with_options(SheetOptions::default())
    }

    pub fn with_options(options: SheetOptions) -> Self {
        Spreadsheet {
            cells: IndexMap::new(),
            graph: DependencyGraph::new(),
            options,
            file_path: None,
            modified: false,
        }
    }

    pub fn version(&self) -> &str {
        &self.options.version
    }

    pub fn options(&self) -> &SheetOptions {
        &self.options
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Stored content of `name`, or [`CellContent::Empty`] if nothing is stored.
    pub fn get_cell_contents(&self, name: &str) -> Result<&CellContent> {
        let name = self.canonical_name(name)?;
        Ok(self
            .cells
            .get(&name)
            .map_or(&EMPTY_CONTENT, |cell| &cell.contents))
    }

    /// Cached value of `name`, or empty text if nothing is stored.
    pub fn get_cell_value(&self, name: &str) -> Result<&CellValue> {
        let name = self.canonical_name(name)?;
        Ok(self.cells.get(&name).map_or(&EMPTY_VALUE, |cell| &cell.value))
    }

    /// Canonical names of every cell holding something, in first-set order.
    pub fn names_of_all_nonempty_cells(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Cells whose formulas read `name` directly.
    pub fn direct_dependents(&self, name: &str) -> Result<Vec<String>> {
        let name = self.canonical_name(name)?;
        Ok(self.graph.dependents(&name).map(str::to_string).collect())
    }

    /// Read-only view of the dependency graph.
    pub fn dependency_graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Check `name` against the grammar and the validator and return its canonical form.
    pub(crate) fn canonical_name(&self, name: &str) -> Result<String> {
        if !is_valid_cell_name(name) {
            return Err(SpreadsheetError::InvalidName(name.to_string()));
        }
        let normalized = (self.options.normalize)(name);
        if !is_valid_cell_name(&normalized) || !(self.options.is_valid)(&normalized) {
            return Err(SpreadsheetError::InvalidName(name.to_string()));
        }
        Ok(normalized)
    }
}

impl Default for Spreadsheet {
    fn default() -> Self {
        Self::new()
    }
}

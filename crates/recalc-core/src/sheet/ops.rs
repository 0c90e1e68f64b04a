use super::Spreadsheet;
use crate::error::Result;
use log::{debug, trace, warn};
use recalc_engine::engine::{
    Cell, CellContent, CellValue, CycleError, Formula, FormulaError, UndefinedVariable,
    recalculation_order,
};

impl Spreadsheet {
    /// Set the contents of `name` from user input and recalculate everything
    /// that depends on it.
    ///
    /// Input that parses as a number is stored as a number; input starting with
    /// `=` is parsed as a formula; anything else is text, and empty text clears
    /// the cell. Returns the recalculated cells, `name` first, each listed after
    /// every cell it depends on.
    ///
    /// Fails without touching the sheet if the name is invalid, the formula does
    /// not parse, or the new content would make a cell depend on itself.
    pub fn set_contents_of_cell(&mut self, name: &str, content: &str) -> Result<Vec<String>> {
        let name = self.canonical_name(name)?;
        let contents = CellContent::from_input(
            content,
            &*self.options.normalize,
            &*self.options.is_valid,
        )?;

        let reads: Vec<String> = contents
            .formula()
            .map(|f| f.variables().into_iter().map(str::to_string).collect())
            .unwrap_or_default();

        // Order against the graph as it would be after the edit, before committing anything.
        let order = self.pending_order(&name, &reads).inspect_err(|err| {
            warn!("Rejected edit to {name}: {err}");
        })?;

        self.graph.replace_dependees(&name, &reads);
        match contents {
            CellContent::Empty => {
                self.cells.shift_remove(&name);
            }
            CellContent::Text(text) => {
                self.cells.insert(name.clone(), Cell::new_text(&text));
            }
            CellContent::Number(n) => {
                self.cells.insert(name.clone(), Cell::new_number(n));
            }
            CellContent::Formula(formula) => {
                let value = self.evaluate_formula(&formula);
                self.cells
                    .insert(name.clone(), Cell::new_formula(formula, value));
            }
        }
        self.modified = true;

        debug!("Set {name}; recalculating {order:?}");
        for dependent in order.iter().skip(1) {
            self.recalculate_cell(dependent);
        }

        Ok(order)
    }

    /// Recalculation order for `name` with its incoming edges replaced by `reads`.
    fn pending_order(
        &self,
        name: &str,
        reads: &[String],
    ) -> std::result::Result<Vec<String>, CycleError> {
        let graph = &self.graph;
        recalculation_order(name, |n| {
            let will_read = reads.iter().any(|r| r == n);
            let mut next: Vec<&str> = graph
                .dependents(n)
                .filter(|d| *d != name || will_read)
                .collect();
            if will_read && !next.contains(&name) {
                next.push(name);
            }
            next
        })
    }

    /// Re-evaluate a stored formula against the current cached values.
    fn recalculate_cell(&mut self, name: &str) {
        let Some(formula) = self.cells.get(name).and_then(|c| c.contents.formula()) else {
            return;
        };
        let value = self.evaluate_formula(formula);
        trace!("Recalculated {name} = {value:?}");
        if let Some(cell) = self.cells.get_mut(name) {
            cell.value = value;
        }
    }

    /// Evaluate `formula`, reading other cells' cached numeric values.
    fn evaluate_formula(&self, formula: &Formula) -> CellValue {
        match formula.evaluate(|var| self.numeric_value(var)) {
            Ok(value) => value.into(),
            Err(UndefinedVariable(var)) => {
                let reason = match self.cells.get(&var).map(|c| &c.value) {
                    Some(CellValue::Error(e)) => format!("{var} has an error: {}", e.reason),
                    Some(_) => format!("{var} is not a number"),
                    None => format!("{var} is empty"),
                };
                CellValue::Error(FormulaError::new(reason))
            }
        }
    }

    fn numeric_value(&self, name: &str) -> std::result::Result<f64, UndefinedVariable> {
        self.cells
            .get(name)
            .and_then(|cell| cell.value.as_number())
            .ok_or_else(|| UndefinedVariable(name.to_string()))
    }
}

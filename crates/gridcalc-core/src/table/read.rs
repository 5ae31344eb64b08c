//! Read queries over a table's area.

use gridcalc_engine::engine::{
    Area, ColumnCache, Point, Solver, Value, point_to_address_in, y_to_row,
};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::Table;
use crate::cell::Cell;

/// Options shared by the matrix/object/rows/cols queries.
#[derive(Clone, Copy, Default)]
pub struct ReadOptions<'f> {
    /// Defaults to the handle's own area.
    pub area: Option<Area>,
    /// Replace formulas by their solved value (errors read as null).
    pub evaluates: bool,
    /// Cells for which this returns false are left out.
    pub filter: Option<&'f dyn Fn(&Cell) -> bool>,
}

impl<'f> ReadOptions<'f> {
    pub fn evaluated() -> Self {
        ReadOptions {
            evaluates: true,
            ..ReadOptions::default()
        }
    }

    pub fn in_area(mut self, area: Area) -> Self {
        self.area = Some(area);
        self
    }

    pub fn filtered(mut self, filter: &'f dyn Fn(&Cell) -> bool) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl Table {
    /// The cell at `point`; with `evaluates`, its value is solved.
    pub fn get_by_point(&self, point: Point, evaluates: bool) -> Option<Cell> {
        let mut cell = self.store().cell_at(point).cloned()?;
        if evaluates {
            cell.value = Some(self.solve_point(point).unwrap_or_default());
        }
        Some(cell)
    }

    fn query_area(&self, options: &ReadOptions<'_>) -> Option<Area> {
        let bounds = self.store().bounds();
        options.area.unwrap_or(self.area()).clip(&bounds)
    }

    /// Cells of the queried area, row by row. Filtered-out cells are None.
    fn gather(&self, options: &ReadOptions<'_>) -> (Area, Vec<Vec<Option<Cell>>>) {
        let Some(area) = self.query_area(options) else {
            return (Area::default(), Vec::new());
        };
        let mut rows: Vec<Vec<Option<Cell>>> = {
            let store = self.store();
            (area.top..=area.bottom)
                .map(|y| {
                    (area.left..=area.right)
                        .map(|x| store.cell_at(Point::new(y, x)).cloned())
                        .collect()
                })
                .collect()
        };
        if let Some(filter) = options.filter {
            for cell in rows.iter_mut().flatten() {
                if cell.as_ref().is_some_and(|c| !filter(c)) {
                    *cell = None;
                }
            }
        }
        if options.evaluates {
            let functions = Arc::clone(&self.store().functions);
            let solver = Solver::new(self, &functions, &self.cache);
            for (dy, row) in rows.iter_mut().enumerate() {
                for (dx, cell) in row.iter_mut().enumerate() {
                    if let Some(cell) = cell {
                        let point = Point::new(area.top + dy, area.left + dx);
                        cell.value = Some(solver.solve_point(point).unwrap_or_default());
                    }
                }
            }
        }
        (area, rows)
    }

    pub fn get_matrix(&self, options: ReadOptions<'_>) -> Vec<Vec<Option<Cell>>> {
        self.gather(&options).1
    }

    /// Cells keyed by address.
    pub fn get_object(&self, options: ReadOptions<'_>) -> BTreeMap<String, Cell> {
        let (area, rows) = self.gather(&options);
        let mut columns = ColumnCache::new(area.width());
        let mut object = BTreeMap::new();
        for (dy, row) in rows.into_iter().enumerate() {
            for (dx, cell) in row.into_iter().enumerate() {
                if let Some(cell) = cell {
                    let point = Point::new(area.top + dy, area.left + dx);
                    object.insert(point_to_address_in(point, &mut columns), cell);
                }
            }
        }
        object
    }

    /// One map per row, keyed by column letters.
    pub fn get_rows(&self, options: ReadOptions<'_>) -> Vec<BTreeMap<String, Cell>> {
        let (area, rows) = self.gather(&options);
        let mut columns = ColumnCache::new(area.width());
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .filter_map(|(dx, cell)| Some((columns.letters(area.left + dx), cell?)))
                    .collect()
            })
            .collect()
    }

    /// One map per column, keyed by row label.
    pub fn get_cols(&self, options: ReadOptions<'_>) -> Vec<BTreeMap<String, Cell>> {
        let (area, rows) = self.gather(&options);
        let mut cols: Vec<BTreeMap<String, Cell>> = vec![BTreeMap::new(); rows.first().map_or(0, Vec::len)];
        for (dy, row) in rows.into_iter().enumerate() {
            for (dx, cell) in row.into_iter().enumerate() {
                if let Some(cell) = cell {
                    cols[dx].insert(y_to_row(area.top + dy), cell);
                }
            }
        }
        cols
    }

    pub fn get_matrix_flatten(&self, options: ReadOptions<'_>) -> Vec<Vec<Option<Value>>> {
        self.get_matrix(options)
            .into_iter()
            .map(|row| row.into_iter().map(|cell| cell.map(|c| c.value())).collect())
            .collect()
    }

    pub fn get_object_flatten(&self, options: ReadOptions<'_>) -> BTreeMap<String, Value> {
        self.get_object(options)
            .into_iter()
            .map(|(address, cell)| (address, cell.value()))
            .collect()
    }

    pub fn get_rows_flatten(&self, options: ReadOptions<'_>) -> Vec<BTreeMap<String, Value>> {
        flatten_maps(self.get_rows(options))
    }

    pub fn get_cols_flatten(&self, options: ReadOptions<'_>) -> Vec<BTreeMap<String, Value>> {
        flatten_maps(self.get_cols(options))
    }

    /// Solve every cell of this handle's area. With `raise` unset, failing
    /// cells read as null; otherwise the first error is returned.
    pub fn solve_table(&self, raise: bool) -> gridcalc_engine::engine::Result<Vec<Vec<Value>>> {
        let functions = Arc::clone(&self.store().functions);
        Solver::new(self, &functions, &self.cache).solve_area(&self.area(), raise)
    }

    /// Display text for the cell at `point`, through its renderer.
    pub fn render(&self, point: Point) -> String {
        let key = self.store().cell_at(point).and_then(|c| c.renderer.clone());
        self.renderer_for(key.as_deref()).render(self, point)
    }

    /// Editable text for the cell at `point`, through its renderer.
    pub fn stringify(&self, point: Point) -> String {
        let key = self.store().cell_at(point).and_then(|c| c.renderer.clone());
        self.renderer_for(key.as_deref()).stringify(self, point)
    }
}

fn flatten_maps(maps: Vec<BTreeMap<String, Cell>>) -> Vec<BTreeMap<String, Value>> {
    maps.into_iter()
        .map(|map| map.into_iter().map(|(k, cell)| (k, cell.value())).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use std::collections::HashMap;

    fn table() -> Table {
        let config = TableConfig {
            num_rows: 3,
            num_cols: 2,
            ..TableConfig::default()
        };
        let initial = HashMap::from([
            ("A1".to_string(), Cell::with_value(1.0)),
            ("A2".to_string(), Cell::with_value(2.0)),
            ("B1".to_string(), Cell::with_value("=A1+A2")),
            ("B2".to_string(), Cell::with_value("=1/0")),
        ]);
        Table::new(config, initial).unwrap()
    }

    #[test]
    fn test_get_by_point_raw_and_evaluated() {
        let table = table();
        let raw = table.get_by_point(Point::new(1, 2), false).unwrap();
        assert_eq!(raw.value, Some(Value::from("=#4+#7")));
        let solved = table.get_by_point(Point::new(1, 2), true).unwrap();
        assert_eq!(solved.value, Some(Value::Number(3.0)));
        assert!(table.get_by_point(Point::new(9, 9), false).is_none());
    }

    #[test]
    fn test_matrix_flatten_evaluated_nulls_errors() {
        let table = table();
        let matrix = table.get_matrix_flatten(ReadOptions::evaluated().in_area(Area::new(1, 1, 2, 2)));
        assert_eq!(
            matrix,
            vec![
                vec![Some(Value::Number(1.0)), Some(Value::Number(3.0))],
                vec![Some(Value::Number(2.0)), Some(Value::Null)],
            ]
        );
    }

    #[test]
    fn test_object_rows_cols_keys() {
        let table = table();
        let area = Area::new(1, 1, 2, 1);
        let object = table.get_object_flatten(ReadOptions::default().in_area(area));
        assert_eq!(object.get("A2"), Some(&Value::Number(2.0)));
        let rows = table.get_rows_flatten(ReadOptions::default().in_area(area));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("A"), Some(&Value::Number(2.0)));
        let cols = table.get_cols_flatten(ReadOptions::default().in_area(area));
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].get("1"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_filter_leaves_holes() {
        let table = table();
        let numbers_only = |cell: &Cell| matches!(cell.value, Some(Value::Number(_)));
        let matrix = table.get_matrix(ReadOptions::default().filtered(&numbers_only));
        assert_eq!(matrix.len(), 3);
        assert!(matrix[0][0].is_some());
        assert!(matrix[0][1].is_none());
        assert!(matrix[2][0].is_none());
    }

    #[test]
    fn test_trimmed_handle_reads_its_area() {
        let table = table().trim(Area::new(2, 1, 2, 2));
        let object = table.get_object(ReadOptions::default());
        assert_eq!(object.keys().cloned().collect::<Vec<_>>(), vec!["A2", "B2"]);
    }

    #[test]
    fn test_solve_table_raise() {
        let table = table();
        assert_eq!(table.solve_table(true).unwrap_err().code(), "#DIV/0!");
        let values = table.solve_table(false).unwrap();
        assert_eq!(values[0][1], Value::Number(3.0));
        assert_eq!(values[1][1], Value::Null);
    }

    #[test]
    fn test_render_and_stringify_defaults() {
        let table = table();
        assert_eq!(table.render(Point::new(1, 2)), "3");
        assert_eq!(table.stringify(Point::new(1, 2)), "=A1+A2");
        assert_eq!(table.render(Point::new(2, 2)), "#DIV/0!");
    }
}

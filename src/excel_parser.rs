use crate::error::{ConvertError, ConvertResult};
use crate::header::{row_text, score_rows};
use crate::models::{Cell, Grid, HeaderRules, Sheet, SheetSelection};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

/// Lee las hojas del libro como grillas crudas, sin interpretar encabezados
pub fn read_sheets(file_path: &Path, selection: SheetSelection) -> ConvertResult<Vec<Sheet>> {
    let workbook_err = |source| ConvertError::Workbook {
        path: file_path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(file_path).map_err(workbook_err)?;

    let mut names = workbook.sheet_names();
    if selection == SheetSelection::First {
        names.truncate(1);
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name).map_err(workbook_err)?;
        debug!("hoja {:?}: {:?}", name, range.get_size());
        sheets.push(Sheet {
            grid: range_to_grid(&range),
            name,
        });
    }

    Ok(sheets)
}

/// El rango de calamine empieza en la primera celda usada; se rellena desde A1
pub fn range_to_grid(range: &Range<Data>) -> Grid {
    let (row0, col0) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row0];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col0];
        cells.extend(row.iter().map(to_cell));
        rows.push(cells);
    }

    Grid::new(rows)
}

/// Celda de calamine a celda propia
pub fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => Cell::Number(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(Cell::DateTime)
            .unwrap_or(Cell::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Diagnóstico de una hoja: puntaje por fila candidata
#[derive(Debug, Clone)]
pub struct SheetInspection {
    pub name: String,
    pub height: usize,
    pub width: usize,
    /// (fila, puntaje, texto) de las filas con puntaje > 0
    pub candidates: Vec<(usize, usize, String)>,
}

/// Muestra dónde cree el detector que está el encabezado de cada hoja
pub fn inspect_workbook(
    file_path: &Path,
    rules: &HeaderRules,
) -> ConvertResult<Vec<SheetInspection>> {
    let sheets = read_sheets(file_path, SheetSelection::All)?;

    Ok(sheets
        .into_iter()
        .map(|sheet| {
            let candidates = score_rows(&sheet.grid, rules)
                .into_iter()
                .enumerate()
                .filter(|(_, score)| *score > 0)
                .map(|(idx, score)| (idx, score, row_text(&sheet.grid.rows[idx])))
                .collect();
            SheetInspection {
                height: sheet.grid.height(),
                width: sheet.grid.width(),
                name: sheet.name,
                candidates,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn test_to_cell() {
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
        assert_eq!(to_cell(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(to_cell(&Data::Float(1.5)), Cell::Number(1.5));
        assert_eq!(to_cell(&Data::String("Lola".into())), Cell::text("Lola"));
        assert_eq!(to_cell(&Data::Bool(false)), Cell::Bool(false));
        assert_eq!(
            to_cell(&Data::Error(CellErrorType::Div0)),
            Cell::text("#DIV/0!")
        );
    }

    #[test]
    fn test_range_to_grid_keeps_absolute_positions() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("Numero".into()));
        range.set_value((3, 2), Data::Int(5));

        let grid = range_to_grid(&range);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.get(2, 1), &Cell::text("Numero"));
        assert_eq!(grid.get(3, 2), &Cell::Number(5.0));
        assert_eq!(grid.get(0, 0), &Cell::Empty);
    }
}

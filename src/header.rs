use crate::error::{ConvertError, ConvertResult};
use crate::models::{Cell, Grid, HeaderRules};
use crate::normalize::format_number;
use crate::text::{fold, is_blank};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Texto de una celda tal como se ve en la hoja
pub fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) if n.is_nan() => String::new(),
        Cell::Number(n) => format_number(*n),
        Cell::Bool(true) => "True".to_string(),
        Cell::Bool(false) => "False".to_string(),
        Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Celdas no vacías de la fila unidas con espacios
pub fn row_text(row: &[Cell]) -> String {
    row.iter()
        .map(cell_text)
        .filter(|s| !is_blank(s))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fragmentos sin tildes y sin repetidos ("numero" y "número" cuentan una vez)
fn folded_fragments(rules: &HeaderRules) -> Vec<String> {
    let mut seen = HashSet::new();
    rules
        .fragments
        .iter()
        .map(|f| fold(f))
        .filter(|f| !f.is_empty() && seen.insert(f.clone()))
        .collect()
}

/// Puntaje de cada fila candidata
pub fn score_rows(grid: &Grid, rules: &HeaderRules) -> Vec<usize> {
    let fragments = folded_fragments(rules);
    let scan = rules.scan_rows.min(grid.height());

    grid.rows[..scan]
        .iter()
        .map(|row| {
            let line = fold(&row_text(row));
            fragments.iter().filter(|f| line.contains(f.as_str())).count()
        })
        .collect()
}

/// Índice de la fila de encabezados; gana la primera con el mayor puntaje
pub fn find_header_row(grid: &Grid, rules: &HeaderRules) -> ConvertResult<usize> {
    let mut best: Option<(usize, usize)> = None;

    for (idx, score) in score_rows(grid, rules).into_iter().enumerate() {
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((idx, score));
        }
    }

    match best {
        Some((idx, score)) if score >= rules.min_score => {
            debug!("encabezado en la fila {} (puntaje {})", idx, score);
            Ok(idx)
        }
        other => Err(ConvertError::HeaderNotDetected {
            best: other.map_or(0, |(_, s)| s),
            min: rules.min_score,
        }),
    }
}

/// Etiquetas únicas: las repetidas reciben `_2`, `_3`, …
pub fn make_unique(labels: &[String]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(labels.len());

    for label in labels {
        let label = label.trim();
        let label = if label.is_empty() { "COL" } else { label };
        let key = label.to_lowercase();

        let count = counts.entry(key).or_insert(0);
        *count += 1;

        let mut candidate = if *count == 1 {
            label.to_string()
        } else {
            format!("{}_{}", label, count)
        };
        // "A", "A_2", "A" no debe repetir "A_2"
        while taken.contains(&candidate.to_lowercase()) {
            *count += 1;
            candidate = format!("{}_{}", label, count);
        }

        taken.insert(candidate.to_lowercase());
        out.push(candidate);
    }

    out
}

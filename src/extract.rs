use crate::header::{cell_text, make_unique, row_text};
use crate::models::{Grid, Table};
use crate::normalize::Normalizer;
use crate::text::canonical_key;
use std::collections::{HashMap, HashSet};
use tracing::debug;

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Tabla debajo de la fila de encabezados
pub fn extract_table(grid: &Grid, header_idx: usize, normalizer: &Normalizer) -> Table {
    let header_row = grid.rows.get(header_idx).map(Vec::as_slice).unwrap_or(&[]);
    let labels: Vec<String> = header_row.iter().map(cell_text).collect();

    // la última columna con etiqueta marca el ancho
    let last = labels.iter().rposition(|h| !h.is_empty()).unwrap_or(0);
    let width = last + 1;
    let mut labels = labels;
    labels.resize(width, String::new());
    let headers = make_unique(&labels);

    let rows = (header_idx + 1..grid.height())
        .map(|r| {
            (0..width)
                .map(|c| normalizer.cell(grid.get(r, c)))
                .collect::<Vec<_>>()
        })
        .filter(|row| !is_blank_row(row))
        .collect();

    Table { headers, rows }
}

/// Hoja "tal cual": sin encabezado, sin filas ni columnas vacías
pub fn raw_table(grid: &Grid, normalizer: &Normalizer) -> Table {
    let width = grid.width();
    let rows: Vec<Vec<String>> = grid
        .rows
        .iter()
        .map(|row| {
            (0..width)
                .map(|c| row.get(c).map(|cell| normalizer.cell(cell)).unwrap_or_default())
                .collect::<Vec<_>>()
        })
        .filter(|row| !is_blank_row(row))
        .collect();

    let keep: Vec<usize> = (0..width)
        .filter(|&c| rows.iter().any(|row| !row[c].trim().is_empty()))
        .collect();

    let rows = rows
        .into_iter()
        .map(|row| keep.iter().map(|&c| row[c].clone()).collect())
        .collect();

    Table {
        headers: Vec::new(),
        rows,
    }
}

/// Líneas de texto libre antes del encabezado (finca, fecha del reporte, …)
pub fn preamble_lines(grid: &Grid, header_idx: usize) -> Vec<String> {
    grid.rows
        .iter()
        .take(header_idx)
        .map(|row| row_text(row))
        .filter(|line| !line.is_empty())
        .collect()
}

/// Quita filas de totales; devuelve cuántas quitó
pub fn drop_totals(table: &mut Table, patterns: &[String]) -> usize {
    let patterns: Vec<String> = patterns.iter().map(|p| p.to_lowercase()).collect();
    let before = table.rows.len();

    table.rows.retain(|row| {
        let line = row.join(" ").to_lowercase();
        !patterns.iter().any(|p| !p.is_empty() && line.contains(p.as_str()))
    });

    before - table.rows.len()
}

/// Antepone una columna constante
pub fn prepend_column(table: &mut Table, label: &str, value: &str) {
    let mut headers = Vec::with_capacity(table.headers.len() + 1);
    headers.push(label.to_string());
    headers.extend(table.headers.drain(..));
    table.headers = make_unique(&headers);

    for row in table.rows.iter_mut() {
        row.insert(0, value.to_string());
    }
}

/// Primera columna cuyo nombre coincide con un alias de identificador
pub fn identifier_column(table: &Table, aliases: &[String]) -> Option<usize> {
    let aliases: HashSet<String> = aliases.iter().map(|a| canonical_key(a)).collect();
    table
        .headers
        .iter()
        .position(|h| aliases.contains(&canonical_key(h)))
}

/// Deja la primera fila de cada identificador; devuelve cuántas quitó
pub fn dedup_by_identifier(table: &mut Table, aliases: &[String]) -> usize {
    let Some(col) = identifier_column(table, aliases) else {
        debug!("sin columna identificadora, no se quitan duplicados");
        return 0;
    };

    let before = table.rows.len();
    let mut seen = HashSet::new();
    table.rows.retain(|row| {
        let id = row.get(col).map(|s| s.trim()).unwrap_or_default();
        // sin identificador no hay con qué comparar
        id.is_empty() || seen.insert(id.to_string())
    });

    before - table.rows.len()
}

/// Une tablas con columnas distintas; el orden de columnas es el de aparición
pub fn merge_tables(tables: &[Table]) -> Table {
    let mut headers: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for table in tables {
        for h in &table.headers {
            if !index.contains_key(h) {
                index.insert(h.clone(), headers.len());
                headers.push(h.clone());
            }
        }
    }

    let mut rows = Vec::new();
    for table in tables {
        for row in &table.rows {
            let mut merged = vec![String::new(); headers.len()];
            for (h, value) in table.headers.iter().zip(row) {
                merged[index[h]] = value.clone();
            }
            rows.push(merged);
        }
    }

    Table { headers, rows }
}

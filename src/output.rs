use crate::error::ConvertResult;
use crate::models::{CategoryRule, ManifestEntry, ManifestLayout, Table};
use crate::text::{fold, slugify};
use chrono::{DateTime, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").expect("valid regex"));

/// Nombre con el que el tablero reconoce la hoja; `<hoja>.csv` si ninguna regla aplica
pub fn canonical_file_name(sheet_name: &str, rules: &[CategoryRule]) -> String {
    let folded = fold(sheet_name);

    for rule in rules {
        if !rule.keywords.iter().all(|k| folded.contains(fold(k).as_str())) {
            continue;
        }
        if rule.canonical.contains("{year}") {
            let Some(caps) = YEAR.captures(&folded) else {
                continue;
            };
            return format!("{}.csv", rule.canonical.replace("{year}", &caps[1]));
        }
        return format!("{}.csv", rule.canonical);
    }

    format!("{}.csv", sheet_name)
}

/// Evita que dos hojas con nombres parecidos pisen el mismo archivo
#[derive(Debug, Default)]
pub struct SlugRegistry {
    seen: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slug libre a partir de un nombre cualquiera
    pub fn claim(&mut self, name: &str) -> String {
        self.claim_slug(&slugify(name))
    }

    /// Igual que `claim` pero con un slug ya armado
    pub fn claim_slug(&mut self, base: &str) -> String {
        let mut slug = base.to_string();
        let mut i = 2;
        while self.seen.contains(&slug) {
            slug = format!("{}_{}", base, i);
            i += 1;
        }
        self.seen.insert(slug.clone());
        slug
    }
}

/// CSV con `;`; las líneas de preámbulo van antes de la tabla, tal cual
pub fn write_csv(
    path: &Path,
    preamble: &[String],
    table: &Table,
    with_header: bool,
) -> ConvertResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut out = BufWriter::new(File::create(path)?);
    for line in preamble {
        writeln!(out, "{}", line)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(out);

    if with_header && !table.headers.is_empty() {
        writer.write_record(&table.headers)?;
    }
    for row in &table.rows {
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Entrada del índice por finca
#[derive(Serialize)]
struct SlugEntry<'a> {
    label: &'a str,
    csv: &'a str,
    source: &'a str,
}

/// Índice para la carga automática del tablero
#[derive(Debug, Clone)]
pub struct Manifest {
    pub layout: ManifestLayout,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(layout: ManifestLayout) -> Self {
        Self {
            layout,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn to_json(&self) -> ConvertResult<Value> {
        let value = match self.layout {
            ManifestLayout::Array => serde_json::to_value(&self.entries)?,
            ManifestLayout::BySlug => {
                let mut map = Map::new();
                for e in &self.entries {
                    let entry = SlugEntry {
                        label: &e.label,
                        csv: &e.csv,
                        source: &e.source,
                    };
                    map.insert(e.slug.clone(), serde_json::to_value(entry)?);
                }
                Value::Object(map)
            }
        };
        Ok(value)
    }

    /// Sobrescribe el archivo completo
    pub fn write(&self, path: &Path) -> ConvertResult<()> {
        write_json(path, &self.to_json()?)
    }
}

/// Qué archivo se usó y cuándo se convirtió
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub source: String,
    pub source_date: Option<NaiveDate>,
    pub converted_at: DateTime<Local>,
    pub outputs: usize,
}

impl RunMetadata {
    pub fn write(&self, path: &Path) -> ConvertResult<()> {
        write_json(path, &serde_json::to_value(self)?)
    }
}

fn write_json(path: &Path, value: &Value) -> ConvertResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.flush()?;
    Ok(())
}

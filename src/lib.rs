//! Convierte los Excel del hato en CSV (`;`) e índices JSON para el tablero.
//!
//! ```no_run
//! use ganado_csv::models::AppConfig;
//!
//! let report = ganado_csv::run(&AppConfig::informe())?;
//! println!("{} archivos", report.outputs.len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod error;
pub mod excel_parser;
pub mod extract;
pub mod header;
pub mod locator;
pub mod models;
pub mod normalize;
pub mod output;
pub mod text;

pub use error::{ConvertError, ConvertResult};
pub use models::{AppConfig, RunReport};

use anyhow::{bail, Context, Result};
use chrono::Local;
use excel_parser::read_sheets;
use extract::{
    dedup_by_identifier, drop_totals, extract_table, merge_tables, preamble_lines, prepend_column,
    raw_table,
};
use header::find_header_row;
use locator::{date_from_file_name, find_latest, resolve_fixed, resolve_mapping, WorkbookSource};
use models::{ManifestEntry, Sheet, SheetSelection, SourceMode, Table, TableLayout};
use normalize::Normalizer;
use output::{canonical_file_name, write_csv, Manifest, RunMetadata, SlugRegistry};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_FILE: &str = "config.json";

/// Ruta por defecto del archivo de configuración
pub fn get_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ganado-csv")
        .join(CONFIG_FILE)
}

/// Carga la configuración.
///
/// Con una ruta explícita cualquier error es fatal; el archivo por defecto,
/// si está dañado, se ignora y se usa `fallback`.
pub fn load_config(path: Option<&Path>, fallback: AppConfig) -> Result<AppConfig> {
    if let Some(path) = path {
        let content = fs::read_to_string(path)
            .with_context(|| format!("no se pudo leer la configuración {:?}", path))?;
        return serde_json::from_str(&content)
            .with_context(|| format!("configuración inválida en {:?}", path));
    }

    let config_path = get_config_path();
    if !config_path.exists() {
        return Ok(fallback);
    }

    match fs::read_to_string(&config_path)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_json::from_str::<AppConfig>(&content).map_err(Into::into))
    {
        Ok(config) => {
            debug!("configuración cargada de {:?}", config_path);
            Ok(config)
        }
        Err(e) => {
            warn!("se ignora {:?}: {}", config_path, e);
            Ok(fallback)
        }
    }
}

/// Guarda la configuración
pub fn save_config(path: &Path, config: &AppConfig) -> Result<()> {
    // crea la carpeta si no existe
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("no se pudo crear la carpeta {:?}", parent))?;
    }

    let content =
        serde_json::to_string_pretty(config).context("no se pudo serializar la configuración")?;
    fs::write(path, content).with_context(|| format!("no se pudo guardar {:?}", path))?;

    Ok(())
}

/// Libros a procesar según el modo de búsqueda
fn locate_sources(config: &AppConfig) -> Result<Vec<WorkbookSource>> {
    let dir = &config.input_dir;
    let sources = match &config.source {
        SourceMode::Fixed { base_name } => vec![WorkbookSource {
            path: resolve_fixed(dir, base_name)?,
            entity: None,
        }],
        SourceMode::Mapping { entities } => resolve_mapping(dir, entities),
        SourceMode::Latest => vec![WorkbookSource {
            path: find_latest(dir)?,
            entity: None,
        }],
    };
    Ok(sources)
}

/// Ruta como la ve el tablero
fn public_path(prefix: &str, file_name: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", prefix, file_name)
    }
}

/// Preámbulo y tabla de una hoja; `None` si hay que saltarla
fn sheet_table(
    sheet: &Sheet,
    config: &AppConfig,
    normalizer: &Normalizer,
) -> ConvertResult<Option<(Vec<String>, Table)>> {
    match config.layout {
        TableLayout::Raw => {
            let table = raw_table(&sheet.grid, normalizer);
            Ok((!table.is_empty()).then(|| (Vec::new(), table)))
        }
        TableLayout::DetectHeader => {
            let idx = find_header_row(&sheet.grid, &config.header)?;
            let preamble = if config.preamble {
                preamble_lines(&sheet.grid, idx)
            } else {
                Vec::new()
            };
            Ok(Some((preamble, extract_table(&sheet.grid, idx, normalizer))))
        }
    }
}

/// Filtros opcionales de limpieza
fn clean_table(table: &mut Table, sheet_name: &str, config: &AppConfig) {
    if config.drop_totals {
        let n = drop_totals(table, &config.totals_patterns);
        if n > 0 {
            debug!("{}: {} filas de totales quitadas", sheet_name, n);
        }
    }
    if config.dedup_by_id {
        let n = dedup_by_identifier(table, &config.id_aliases);
        if n > 0 {
            debug!("{}: {} filas duplicadas quitadas", sheet_name, n);
        }
    }
    if let Some(column) = &config.sheet_column {
        prepend_column(table, column, sheet_name);
    }
}

/// Corre la conversión completa: busca, lee, extrae y escribe CSV e índice
pub fn run(config: &AppConfig) -> Result<RunReport> {
    let sources = locate_sources(config)?;
    if sources.is_empty() {
        warn!("no hay archivos Excel para convertir en {:?}", config.input_dir);
    }

    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("no se pudo crear la carpeta de salida {:?}", config.output_dir))?;

    let normalizer = Normalizer::new(config.date_style, config.serial_dates);
    let mut manifest = Manifest::new(config.manifest.layout);
    let mut slugs = SlugRegistry::new();
    let mut skipped_sheets = Vec::new();
    let mut combined_tables = Vec::new();

    for source in &sources {
        let file_name = source.file_name();
        info!("leyendo {}", file_name);

        let sheets = read_sheets(&source.path, config.sheets)
            .with_context(|| format!("leyendo {:?}", source.path))?;

        for sheet in sheets {
            // con una sola hoja, la vacía cae en la detección y falla ahí
            if sheet.grid.is_empty() && config.sheets == SheetSelection::All {
                debug!("{}: hoja vacía", sheet.name);
                continue;
            }

            let (preamble, mut table) = match sheet_table(&sheet, config, &normalizer) {
                Ok(Some(found)) => found,
                Ok(None) => continue,
                Err(e @ ConvertError::HeaderNotDetected { .. })
                    if config.sheets == SheetSelection::All =>
                {
                    warn!("{} / {}: {}, se salta", file_name, sheet.name, e);
                    skipped_sheets.push(sheet.name.clone());
                    continue;
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("detectando encabezados en {:?}", source.path));
                }
            };

            clean_table(&mut table, &sheet.name, config);

            let single_sheet = config.sheets == SheetSelection::First;
            let (slug, label) = match (&source.entity, single_sheet) {
                (Some(entity), true) => (slugs.claim_slug(&entity.slug), entity.label.clone()),
                (Some(entity), false) => (
                    slugs.claim(&format!("{} {}", entity.slug, sheet.name)),
                    format!("{} - {}", entity.label, sheet.name),
                ),
                (None, _) => (slugs.claim(&sheet.name), sheet.name.clone()),
            };

            let csv_name = format!("{}.csv", slug);
            let out_path = config.output_dir.join(&csv_name);
            let with_header = config.layout == TableLayout::DetectHeader;
            write_csv(&out_path, &preamble, &table, with_header)
                .with_context(|| format!("escribiendo {:?}", out_path))?;
            info!("{} -> {} ({} filas)", sheet.name, csv_name, table.rows.len());

            let display_name = if config.canonical_names {
                canonical_file_name(&sheet.name, &config.categories)
            } else {
                format!("{}.csv", label)
            };

            manifest.push(ManifestEntry {
                label,
                slug,
                csv: public_path(&config.public_prefix, &csv_name),
                file_name: display_name,
                source: file_name.clone(),
            });

            if config.combined.is_some() && with_header {
                combined_tables.push(table);
            }
        }
    }

    if config.layout == TableLayout::DetectHeader
        && manifest.entries.is_empty()
        && !skipped_sheets.is_empty()
    {
        bail!("no se detectó la fila de encabezados en ninguna hoja");
    }

    let source_names: Vec<String> = sources.iter().map(WorkbookSource::file_name).collect();

    if let Some(combined) = &config.combined {
        if !combined_tables.is_empty() {
            let table = merge_tables(&combined_tables);
            let slug = slugs.claim_slug(&combined.slug);
            let csv_name = format!("{}.csv", slug);
            let out_path = config.output_dir.join(&csv_name);
            write_csv(&out_path, &[], &table, true)
                .with_context(|| format!("escribiendo {:?}", out_path))?;
            info!("{} hojas combinadas -> {}", combined_tables.len(), csv_name);

            manifest.push(ManifestEntry {
                label: combined.label.clone(),
                slug,
                csv: public_path(&config.public_prefix, &csv_name),
                file_name: format!("{}.csv", combined.label),
                source: source_names.join(", "),
            });
        }
    }

    let manifest_path = config.output_dir.join(&config.manifest.file_name);
    manifest
        .write(&manifest_path)
        .with_context(|| format!("escribiendo el índice {:?}", manifest_path))?;

    if let Some(meta_file) = &config.metadata_file {
        let meta_path = config.output_dir.join(meta_file);
        let metadata = RunMetadata {
            source: source_names.join(", "),
            source_date: source_names.first().and_then(|n| date_from_file_name(n)),
            converted_at: Local::now(),
            outputs: manifest.entries.len(),
        };
        metadata
            .write(&meta_path)
            .with_context(|| format!("escribiendo {:?}", meta_path))?;
    }

    Ok(RunReport {
        outputs: manifest.entries,
        skipped_sheets,
        manifest_path,
    })
}

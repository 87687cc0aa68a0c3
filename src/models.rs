use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Valor crudo de una celda
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Grilla sin esquema: filas × columnas, puede ser irregular
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(Cell::is_empty))
    }

    /// Fuera de rango devuelve una celda vacía
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Hoja de un libro
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub grid: Grid,
}

/// Tabla ya extraída, todo como texto
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Finca (u otra entidad lógica) con su nombre de archivo fijo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Nombre base del archivo y slug de salida
    pub slug: String,
    /// Nombre visible en el tablero
    pub label: String,
}

/// Cómo encontrar los libros de entrada
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SourceMode {
    Fixed { base_name: String },
    Mapping { entities: Vec<Entity> },
    Latest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetSelection {
    First,
    All,
}

/// `raw` deja la hoja "tal cual", sin encabezado
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableLayout {
    DetectHeader,
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateStyle {
    /// DD/MM/YYYY
    DayMonthYear,
    /// YYYY-MM-DD
    Iso,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderRules {
    pub fragments: Vec<String>,
    pub min_score: usize,
    pub scan_rows: usize,
}

impl Default for HeaderRules {
    fn default() -> Self {
        Self {
            fragments: [
                "numero", "número", "nombre", "e.mes", "e. años", "edad año - mes", "ea",
                "dpar", "#c", "#p", "abort", "gest", "f. preñ", "estado reprod", "tpreñez",
                "d.ab", "f. p. p", "uiep", "del",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_score: 6,
            scan_rows: 60,
        }
    }
}

/// Regla de nombre canónico: todas las palabras deben aparecer en el nombre de la hoja
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Nombre sin extensión; admite `{year}`
    pub canonical: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(canonical: &str, keywords: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Salida combinada de todas las hojas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedOutput {
    pub slug: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestLayout {
    /// `[{sheet, slug, csv, fileName, source}]`
    Array,
    /// `{slug: {label, csv, source}}`
    BySlug,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestSettings {
    pub file_name: String,
    pub layout: ManifestLayout,
}

/// Configuración de la conversión
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Carpeta con los Excel
    pub input_dir: PathBuf,
    /// Carpeta de salida
    pub output_dir: PathBuf,
    /// Prefijo de las rutas que se escriben en el índice
    pub public_prefix: String,
    pub source: SourceMode,
    pub sheets: SheetSelection,
    pub layout: TableLayout,
    pub header: HeaderRules,
    pub date_style: DateStyle,
    /// Interpretar números 1..=80000 como fechas seriales de Excel
    pub serial_dates: bool,
    /// Escribir las líneas previas al encabezado antes de la tabla
    pub preamble: bool,
    pub canonical_names: bool,
    pub categories: Vec<CategoryRule>,
    pub drop_totals: bool,
    pub totals_patterns: Vec<String>,
    pub dedup_by_id: bool,
    pub id_aliases: Vec<String>,
    /// Columna con el nombre de la hoja, antepuesta a cada fila
    pub sheet_column: Option<String>,
    pub combined: Option<CombinedOutput>,
    pub manifest: ManifestSettings,
    /// Archivo JSON con origen y fecha de la conversión
    pub metadata_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::fincas()
    }
}

impl AppConfig {
    /// Un Excel por finca, primera hoja, con encabezado detectado
    pub fn fincas() -> Self {
        let entities = [
            ("las_cuchillas", "Las Cuchillas"),
            ("los_carbonales", "Los Carbonales"),
            ("monte_fresco", "Monte Fresco"),
            ("primero_de_mayo", "Primero de Mayo"),
        ]
        .iter()
        .map(|(slug, label)| Entity {
            slug: slug.to_string(),
            label: label.to_string(),
        })
        .collect();

        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("data"),
            public_prefix: "data".to_string(),
            source: SourceMode::Mapping { entities },
            sheets: SheetSelection::First,
            layout: TableLayout::DetectHeader,
            header: HeaderRules::default(),
            date_style: DateStyle::Iso,
            serial_dates: false,
            preamble: true,
            canonical_names: false,
            categories: default_categories(),
            drop_totals: false,
            totals_patterns: default_totals_patterns(),
            dedup_by_id: false,
            id_aliases: default_id_aliases(),
            sheet_column: None,
            combined: None,
            manifest: ManifestSettings {
                file_name: "fincas.json".to_string(),
                layout: ManifestLayout::BySlug,
            },
            metadata_file: None,
        }
    }

    /// Informe de ganadería con nombre fijo, todas las hojas tal cual
    pub fn informe() -> Self {
        Self {
            input_dir: PathBuf::from("informe/input"),
            output_dir: PathBuf::from("informe/data"),
            public_prefix: "informe/data".to_string(),
            source: SourceMode::Fixed {
                base_name: "informe_ganaderia".to_string(),
            },
            sheets: SheetSelection::All,
            layout: TableLayout::Raw,
            date_style: DateStyle::DayMonthYear,
            serial_dates: true,
            preamble: false,
            canonical_names: true,
            manifest: ManifestSettings {
                file_name: "sheets.json".to_string(),
                layout: ManifestLayout::Array,
            },
            ..Self::fincas()
        }
    }

    /// Último reporte fechado de la carpeta, con limpieza de totales y duplicados
    pub fn reporte() -> Self {
        Self {
            input_dir: PathBuf::from("reporte/input"),
            output_dir: PathBuf::from("reporte/data"),
            public_prefix: "reporte/data".to_string(),
            source: SourceMode::Latest,
            sheets: SheetSelection::All,
            layout: TableLayout::DetectHeader,
            date_style: DateStyle::Iso,
            // las fechas ya llegan tipadas; un número de animal no es una fecha
            serial_dates: false,
            preamble: false,
            canonical_names: true,
            drop_totals: true,
            dedup_by_id: true,
            sheet_column: Some("Hoja".to_string()),
            combined: Some(CombinedOutput {
                slug: "todas_las_hojas".to_string(),
                label: "Todas las hojas".to_string(),
            }),
            manifest: ManifestSettings {
                file_name: "sheets.json".to_string(),
                layout: ManifestLayout::Array,
            },
            metadata_file: Some("meta.json".to_string()),
            ..Self::fincas()
        }
    }
}

fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("Inventario X Categoria", &["inventario", "categor"]),
        CategoryRule::new("Inventario General", &["inventario"]),
        CategoryRule::new("Ventas {year}", &["ventas"]),
        CategoryRule::new("Compras {year}", &["compras"]),
        CategoryRule::new("Nacimientos {year}", &["nacimiento"]),
        CategoryRule::new("Mortalidad {year}", &["muerte"]),
        CategoryRule::new("Mortalidad {year}", &["mortalidad"]),
        CategoryRule::new("Reproduccion", &["reproduc"]),
        CategoryRule::new("Pesajes", &["pesaje"]),
    ]
}

fn default_totals_patterns() -> Vec<String> {
    vec!["total animales".to_string(), "total:".to_string()]
}

fn default_id_aliases() -> Vec<String> {
    ["numero", "número", "no.", "id", "caravana", "arete", "identificacion"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Una entrada del índice por cada archivo generado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Hoja o finca de origen
    #[serde(rename = "sheet")]
    pub label: String,
    pub slug: String,
    /// Ruta relativa del CSV
    pub csv: String,
    /// Nombre con el que el tablero reconoce el módulo
    #[serde(rename = "fileName")]
    pub file_name: String,
    /// Archivo Excel de origen
    pub source: String,
}

/// Resultado de una corrida
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub outputs: Vec<ManifestEntry>,
    pub skipped_sheets: Vec<String>,
    pub manifest_path: PathBuf,
}

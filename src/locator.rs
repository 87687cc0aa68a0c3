use crate::error::{ConvertError, ConvertResult};
use crate::models::Entity;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

static DASHED_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid regex"));
static COMPACT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})(\d{2})(\d{2})").expect("valid regex"));

const WORKBOOK_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "xls"];

/// Libro encontrado, con la finca a la que pertenece si se buscó por mapeo
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookSource {
    pub path: PathBuf,
    pub entity: Option<Entity>,
}

impl WorkbookSource {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// `<stem>.xlsx`, o `<stem>.xls` si no existe el primero
pub fn resolve_fixed(dir: &Path, stem: &str) -> ConvertResult<PathBuf> {
    ["xlsx", "xls"]
        .iter()
        .map(|ext| dir.join(format!("{}.{}", stem, ext)))
        .find(|p| p.is_file())
        .ok_or_else(|| ConvertError::WorkbookNotFound {
            stem: stem.to_string(),
            dir: dir.to_path_buf(),
        })
}

/// Un libro por entidad; las que no tienen archivo se saltan
pub fn resolve_mapping(dir: &Path, entities: &[Entity]) -> Vec<WorkbookSource> {
    entities
        .iter()
        .filter_map(|entity| match resolve_fixed(dir, &entity.slug) {
            Ok(path) => Some(WorkbookSource {
                path,
                entity: Some(entity.clone()),
            }),
            Err(_) => {
                debug!("sin archivo para {}, se salta", entity.slug);
                None
            }
        })
        .collect()
}

/// Archivos Excel directamente dentro de la carpeta
pub fn scan_excel_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let Some(ext) = path.extension() else {
            continue;
        };
        let ext = ext.to_string_lossy().to_lowercase();
        if !WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            continue;
        }
        // archivos temporales de Office
        if entry.file_name().to_string_lossy().starts_with("~$") {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files
}

/// Fecha embebida en el nombre: `YYYY-MM-DD` o `YYYYMMDD`
pub fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    [&*DASHED_DATE, &*COMPACT_DATE].iter().find_map(|re| {
        re.captures_iter(name).find_map(|caps| {
            NaiveDate::from_ymd_opt(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        })
    })
}

/// El libro con la fecha más reciente en el nombre; sin fecha cuenta como el más viejo
pub fn find_latest(dir: &Path) -> ConvertResult<PathBuf> {
    scan_excel_files(dir)
        .into_iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let date = date_from_file_name(&name).unwrap_or(NaiveDate::MIN);
            ((date, name), path)
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path)
        .ok_or_else(|| ConvertError::NoWorkbooks(dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn test_resolve_fixed_prefers_xlsx() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "informe.xls");
        assert_eq!(
            resolve_fixed(tmp.path(), "informe").unwrap(),
            tmp.path().join("informe.xls")
        );
        touch(tmp.path(), "informe.xlsx");
        assert_eq!(
            resolve_fixed(tmp.path(), "informe").unwrap(),
            tmp.path().join("informe.xlsx")
        );
    }

    #[test]
    fn test_resolve_fixed_missing() {
        let tmp = TempDir::new().unwrap();
        let err = resolve_fixed(tmp.path(), "informe").unwrap_err();
        assert!(matches!(err, ConvertError::WorkbookNotFound { .. }));
    }

    #[test]
    fn test_resolve_mapping_skips_missing() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "monte_fresco.xls");
        let entities = vec![
            Entity {
                slug: "las_cuchillas".into(),
                label: "Las Cuchillas".into(),
            },
            Entity {
                slug: "monte_fresco".into(),
                label: "Monte Fresco".into(),
            },
        ];
        let found = resolve_mapping(tmp.path(), &entities);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].file_name(), "monte_fresco.xls");
        assert_eq!(found[0].entity.as_ref().unwrap().label, "Monte Fresco");
    }

    #[test]
    fn test_date_from_file_name() {
        assert_eq!(
            date_from_file_name("reporte_2025-09-01.xlsx"),
            NaiveDate::from_ymd_opt(2025, 9, 1)
        );
        assert_eq!(
            date_from_file_name("reporte20251215.xls"),
            NaiveDate::from_ymd_opt(2025, 12, 15)
        );
        assert_eq!(date_from_file_name("reporte_2025-13-40.xls"), None);
        assert_eq!(date_from_file_name("reporte.xls"), None);
    }

    #[test]
    fn test_find_latest_by_date_not_listing_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "reporte_2025-12-15.xls");
        touch(tmp.path(), "reporte_2025-09-01.xlsx");
        touch(tmp.path(), "zzz_sin_fecha.xlsx");
        touch(tmp.path(), "~$reporte_2026-01-01.xlsx");
        touch(tmp.path(), "notas_2027-01-01.txt");
        assert_eq!(
            find_latest(tmp.path()).unwrap(),
            tmp.path().join("reporte_2025-12-15.xls")
        );
    }

    #[test]
    fn test_find_latest_undated_uses_name() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.xlsx");
        touch(tmp.path(), "b.xlsx");
        assert_eq!(find_latest(tmp.path()).unwrap(), tmp.path().join("b.xlsx"));
    }

    #[test]
    fn test_find_latest_empty_dir() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "leeme.txt");
        assert!(matches!(
            find_latest(tmp.path()),
            Err(ConvertError::NoWorkbooks(_))
        ));
    }
}

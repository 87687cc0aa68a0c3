use std::path::PathBuf;
use thiserror::Error;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("no se encontró {stem}.xlsx ni {stem}.xls en {dir:?}")]
    WorkbookNotFound { stem: String, dir: PathBuf },

    #[error("no hay archivos Excel en {0:?}")]
    NoWorkbooks(PathBuf),

    #[error("no pude detectar la fila de encabezados (mejor puntaje {best}, mínimo {min})")]
    HeaderNotDetected { best: usize, min: usize },

    #[error("no se pudo abrir {path:?}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

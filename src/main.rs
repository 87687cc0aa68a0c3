use clap::{Parser, ValueEnum};
use ganado_csv::excel_parser::inspect_workbook;
use ganado_csv::models::AppConfig;
use ganado_csv::{load_config, run, save_config};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Un Excel por finca (input/ -> data/fincas.json)
    Fincas,
    /// Informe de ganadería, todas las hojas (informe/input -> informe/data/sheets.json)
    Informe,
    /// Último reporte fechado, limpio y combinado (reporte/input -> reporte/data)
    Reporte,
}

impl Preset {
    fn config(self) -> AppConfig {
        match self {
            Preset::Fincas => AppConfig::fincas(),
            Preset::Informe => AppConfig::informe(),
            Preset::Reporte => AppConfig::reporte(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ganado-csv")]
#[command(version)]
#[command(about = "Convierte los Excel del hato en CSV e índices JSON para el tablero")]
#[command(long_about = "Convierte los Excel del hato en CSV (separados por ;) e índices JSON.

Sin argumentos usa la configuración guardada (si existe) o el preset 'fincas'.
Un --preset explícito manda sobre la configuración guardada; --config manda sobre ambos.

EJEMPLOS:
  ganado-csv                                  # input/*.xls -> data/*.csv + data/fincas.json
  ganado-csv --preset informe                 # informe/input/informe_ganaderia.xlsx
  ganado-csv --preset reporte --input descargas
  ganado-csv --inspect input/monte_fresco.xls # dónde está el encabezado")]
struct Cli {
    /// Configuración base; si se indica, manda sobre la configuración guardada
    #[arg(short, long, value_enum)]
    preset: Option<Preset>,

    /// Archivo de configuración JSON
    #[arg(short, long, env = "GANADO_CONFIG")]
    config: Option<PathBuf>,

    /// Carpeta con los Excel
    #[arg(short, long, env = "GANADO_INPUT")]
    input: Option<PathBuf>,

    /// Carpeta de salida
    #[arg(short, long, env = "GANADO_OUTPUT")]
    output: Option<PathBuf>,

    /// Guarda la configuración efectiva y sale
    #[arg(long, value_name = "PATH")]
    save_config: Option<PathBuf>,

    /// Muestra los puntajes de encabezado de un libro y sale
    #[arg(long, value_name = "WORKBOOK")]
    inspect: Option<PathBuf>,

    /// Más detalle en el log
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match (cli.config.as_deref(), cli.preset) {
        (None, Some(preset)) => preset.config(),
        (path, preset) => {
            let fallback = preset.map_or_else(AppConfig::fincas, Preset::config);
            load_config(path, fallback)?
        }
    };
    if let Some(input) = cli.input {
        config.input_dir = input;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }

    if let Some(path) = cli.save_config {
        save_config(&path, &config)?;
        println!("Configuración guardada en {}", path.display());
        return Ok(());
    }

    if let Some(path) = cli.inspect {
        for sheet in inspect_workbook(&path, &config.header)? {
            println!("{} ({} filas x {} columnas)", sheet.name, sheet.height, sheet.width);
            let best = sheet
                .candidates
                .iter()
                .fold(None::<&(usize, usize, String)>, |best, c| match best {
                    Some(b) if b.1 >= c.1 => Some(b),
                    _ => Some(c),
                });
            for (idx, score, text) in &sheet.candidates {
                let mark = if best.map(|b| b.0) == Some(*idx) { "*" } else { " " };
                println!("  {} fila {:>3}  puntaje {:>2}  {}", mark, idx + 1, score, text);
            }
            match best {
                Some(b) if b.1 >= config.header.min_score => {}
                _ => println!("  sin encabezado (mínimo {})", config.header.min_score),
            }
        }
        return Ok(());
    }

    let report = run(&config)?;
    println!(
        "OK -> {} archivos exportados a {} + {}",
        report.outputs.len(),
        config.output_dir.display(),
        report.manifest_path.display()
    );
    if !report.skipped_sheets.is_empty() {
        println!("Hojas sin encabezado: {}", report.skipped_sheets.join(", "));
    }

    Ok(())
}

//! Pruebas del binario

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn ganado(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ganado-csv").unwrap();
    // que no lea una configuración guardada del usuario
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("GANADO_CONFIG")
        .env_remove("GANADO_INPUT")
        .env_remove("GANADO_OUTPUT")
        .env_remove("RUST_LOG");
    cmd
}

fn write_informe(path: &Path) {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();
    ws.set_name("Inventario X Categoria").unwrap();
    ws.write_string(0, 0, "Categoria").unwrap();
    ws.write_string(0, 1, "Cantidad").unwrap();
    ws.write_string(1, 0, "Vacas").unwrap();
    ws.write_string(1, 1, "40").unwrap();
    workbook.save(path).unwrap();
}

#[test]
fn test_cli_help() {
    let tmp = TempDir::new().unwrap();
    ganado(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--preset"));
}

#[test]
fn test_cli_informe_run() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("entrada");
    let output = tmp.path().join("salida");
    fs::create_dir_all(&input).unwrap();
    write_informe(&input.join("informe_ganaderia.xlsx"));

    ganado(tmp.path())
        .args(["--preset", "informe", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK -> 1 archivos"));

    assert!(output.join("inventario_x_categoria.csv").exists());
    assert!(output.join("sheets.json").exists());
}

#[test]
fn test_cli_missing_input_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("vacia");
    fs::create_dir_all(&input).unwrap();

    ganado(tmp.path())
        .args(["--preset", "informe", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(tmp.path().join("salida"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("informe_ganaderia"));
}

#[test]
fn test_cli_save_config_then_use_it() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("ganado.json");
    let input = tmp.path().join("entrada");
    fs::create_dir_all(&input).unwrap();
    write_informe(&input.join("informe_ganaderia.xlsx"));

    ganado(tmp.path())
        .args(["--preset", "informe", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(tmp.path().join("salida"))
        .arg("--save-config")
        .arg(&config_path)
        .assert()
        .success();

    let saved = fs::read_to_string(&config_path).unwrap();
    assert!(saved.contains("informe_ganaderia"));

    ganado(tmp.path())
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();
    assert!(tmp.path().join("salida").join("sheets.json").exists());
}

#[test]
fn test_cli_inspect() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("informe_ganaderia.xlsx");
    write_informe(&path);

    ganado(tmp.path())
        .arg("--inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Inventario X Categoria (2 filas x 2 columnas)"))
        .stdout(predicate::str::contains("sin encabezado"));
}

#[test]
fn test_cli_explicit_preset_beats_saved_config() {
    let tmp = TempDir::new().unwrap();
    let saved = tmp.path().join(".config").join("ganado-csv");
    fs::create_dir_all(&saved).unwrap();
    fs::write(
        saved.join("config.json"),
        r#"{"source": {"mode": "fixed", "base_name": "no_existe"}}"#,
    )
    .unwrap();

    let input = tmp.path().join("entrada");
    fs::create_dir_all(&input).unwrap();
    write_informe(&input.join("informe_ganaderia.xlsx"));

    // sin --preset manda la configuración guardada
    ganado(tmp.path())
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(tmp.path().join("salida"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no_existe"));

    ganado(tmp.path())
        .args(["--preset", "informe", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(tmp.path().join("salida"))
        .assert()
        .success()
        .stdout(predicate::str::contains("OK -> 1 archivos"));
}

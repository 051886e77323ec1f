//! Tests for fatal configuration defects: the run must stop with an error
//! that names the offending declaration instead of emitting a partial or
//! unsound API.

use std::path::Path;
use std::sync::LazyLock;

fn generate_fixture(name: &str) -> Result<bnd_norm::Generated, String> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../tests/fixtures")
        .join(name)
        .join("bnd-norm.toml");
    bnd_norm::generate(&path).map_err(|e| format!("{e:#}"))
}

/// Overlay still configures an enum the header no longer declares.
static DRIFT_RESULT: LazyLock<Result<bnd_norm::Generated, String>> =
    LazyLock::new(|| generate_fixture("drift"));

/// Overlay forces an output onto a by-value parameter.
static UNSOUND_RESULT: LazyLock<Result<bnd_norm::Generated, String>> =
    LazyLock::new(|| generate_fixture("unsound"));

#[test]
fn overlay_drift_is_caught() {
    let err = DRIFT_RESULT
        .as_ref()
        .expect_err("should fail due to an enum missing from the header");

    assert!(
        err.contains("MSKsolveform_enum"),
        "error should mention the missing enum 'MSKsolveform_enum', got:\n{err}"
    );
    assert!(
        err.contains("out of sync"),
        "error should hint at overlay/header drift, got:\n{err}"
    );
}

#[test]
fn drift_does_not_report_known_enums() {
    let err = DRIFT_RESULT
        .as_ref()
        .expect_err("should fail due to an enum missing from the header");

    // MSKobjsense_enum is declared in the header, so it should NOT appear.
    assert!(
        !err.contains("MSKobjsense_enum"),
        "error should NOT mention 'MSKobjsense_enum', got:\n{err}"
    );
}

#[test]
fn output_on_value_parameter_is_caught() {
    let err = UNSOUND_RESULT
        .as_ref()
        .expect_err("should fail due to a non-pointer output parameter");

    assert!(
        err.contains("MSK_putcj"),
        "error should mention the function 'MSK_putcj', got:\n{err}"
    );
    assert!(
        err.contains("`cj`"),
        "error should mention the parameter 'cj', got:\n{err}"
    );
    assert!(
        err.contains("MSKrealt"),
        "error should mention the parameter type 'MSKrealt', got:\n{err}"
    );
}

#[test]
fn missing_header_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bnd-norm.toml");
    std::fs::write(&config, "[input]\nheader = \"absent.toml\"\n").unwrap();

    let err = format!("{:#}", bnd_norm::generate(&config).unwrap_err());
    assert!(
        err.contains("absent.toml"),
        "error should name the missing header dump, got:\n{err}"
    );
}

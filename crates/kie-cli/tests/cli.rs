//! Drives the `kie` binary end to end.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REPORT: &str = "HAVENS CHRISTIAN HOSPICE\n\
                      Charity Name: Havens Christian Hospice\n\
                      Charity number 1022119\n\
                      Report for the year ended 31 March 2016\n\
                      Total income £10,348,000\n";

const REPORT_LINE: &str = "charity_name=Havens_Christian_Hospice charity_number=1022119 \
                           income_annually_in_british_pounds=10348000.00 report_date=2016-03-31";

/// A `kie` invocation that cannot see the user's own configuration.
fn kie(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kie").unwrap();
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join(".config"));
    cmd
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("report.txt"), REPORT).unwrap();
    dir
}

#[test]
fn test_parse_single_output() {
    let dir = workspace();
    let raw = dir.path().join("raw.txt");
    fs::write(
        &raw,
        " null\nAddress (post code): SS0 8HX\n\nCharity Name: Havens Christian Hospice\nCharity Number:   \n\"null\"  \n\
         Period End Date: 2016-03-31\nAnnual Spending:   null ",
    )
    .unwrap();

    kie(dir.path())
        .arg("parse")
        .arg(&raw)
        .assert()
        .success()
        .stdout("address__postcode=SS0_8HX charity_name=Havens_Christian_Hospice report_date=2016-03-31\n");
}

#[test]
fn test_parse_reconciles_chunks() {
    let dir = workspace();
    let first = dir.path().join("chunk-000.txt");
    let second = dir.path().join("chunk-001.txt");
    fs::write(&first, " null\nCharity Name: Ushaw Moor Pre-School\nPeriod End Date: 31 March 2016").unwrap();
    fs::write(&second, " null\nCharity Name: ushaw moor pre-school\nAnnual Income: null").unwrap();

    kie(dir.path())
        .args(["parse", "--format", "mapping"])
        .arg(&first)
        .arg(&second)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Charity Name\": \"Ushaw Moor Pre-School\""))
        .stdout(predicate::str::contains("\"Period End Date\": \"31 March 2016\""))
        .stdout(predicate::str::contains("Annual Income").not());
}

#[test]
fn test_extract_with_baseline() {
    let dir = workspace();

    kie(dir.path())
        .args(["extract", "--backend", "baseline"])
        .arg(dir.path().join("report.txt"))
        .assert()
        .success()
        .stdout(format!("{}\n", REPORT_LINE));
}

#[test]
fn test_extract_mapping_to_file() {
    let dir = workspace();
    let output = dir.path().join("result.json");

    kie(dir.path())
        .args(["extract", "--backend", "baseline", "--format", "mapping", "-o"])
        .arg(&output)
        .arg(dir.path().join("report.txt"))
        .assert()
        .success();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("\"Charity Number\": \"1022119\""));
    assert!(written.contains("\"Period End Date\": \"31 March 2016\""));
}

#[test]
fn test_extract_missing_document() {
    let dir = workspace();

    kie(dir.path())
        .args(["extract", "--backend", "baseline"])
        .arg(dir.path().join("missing.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_extract_from_dataset() {
    let dir = workspace();
    let dataset = dir.path().join("in.tsv");
    fs::write(
        &dataset,
        format!("havens.pdf\tkeys\t\t\t\t{}\n", REPORT.replace('\n', "\\n")),
    )
    .unwrap();

    kie(dir.path())
        .args(["extract", "--backend", "baseline", "--dataset"])
        .arg(&dataset)
        .arg("havens.pdf")
        .assert()
        .success()
        .stdout(format!("{}\n", REPORT_LINE));
}

#[test]
fn test_batch_dataset_keeps_order() {
    let dir = workspace();
    let dataset = dir.path().join("in.tsv");
    let output = dir.path().join("out").join("out.tsv");
    fs::write(
        &dataset,
        format!(
            "empty.pdf\tkeys\t\t\t\tNothing to see here\nhavens.pdf\tkeys\t\t\t\t{}\n",
            REPORT.replace('\n', "\\n")
        ),
    )
    .unwrap();

    kie(dir.path())
        .args(["batch", "--backend", "baseline", "-j", "2", "-o"])
        .arg(&output)
        .arg(&dataset)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).unwrap(), format!("\n{}\n", REPORT_LINE));
}

#[test]
fn test_batch_rejects_repeated_document() {
    let dir = workspace();
    let dataset = dir.path().join("in.tsv");
    fs::write(&dataset, "a.pdf\tkeys\t\t\t\tfirst\na.pdf\tkeys\t\t\t\tsecond\n").unwrap();

    kie(dir.path())
        .args(["batch", "--backend", "baseline"])
        .arg(&dataset)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate document a.pdf"));
}

#[test]
fn test_batch_glob_continue_on_error() {
    let dir = workspace();
    fs::write(dir.path().join("broken.pdf"), b"not a pdf").unwrap();
    let pattern = format!("{}/*.*", dir.path().display());

    kie(dir.path())
        .args(["batch", "--backend", "baseline", "--continue-on-error"])
        .arg(&pattern)
        .assert()
        .success()
        .stdout(format!("\n{}\n", REPORT_LINE))
        .stderr(predicate::str::contains("broken.pdf"));

    kie(dir.path())
        .args(["batch", "--backend", "baseline"])
        .arg(&pattern)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Processing failed"));
}

#[test]
fn test_config_init_set_get() {
    let dir = workspace();
    let config = dir.path().join("kie.json");

    kie(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    kie(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "chunking.overlap_tokens", "10"])
        .assert()
        .success();

    kie(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "get", "chunking.overlap_tokens"])
        .assert()
        .success()
        .stdout("10\n");

    kie(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["config", "set", "chunking.overlap_tokens", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));
}

#[test]
fn test_config_drives_output_mode() {
    let dir = workspace();
    let config = dir.path().join("kie.json");
    fs::write(&config, r#"{"generation":{"backend":"baseline"},"output":{"mode":"mapping"}}"#).unwrap();

    kie(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("extract")
        .arg(dir.path().join("report.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Charity Name\": \"Havens Christian Hospice\""));
}

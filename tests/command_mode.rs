//! Integration tests for command mode (-c/--command flag)

use std::process::Command;

fn run_command(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_gridcalc"))
        // Tests must be deterministic and not depend on a user's ~/.config/gridcalc/config.toml.
        .arg("--no-config")
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_basic_arithmetic() {
    let (stdout, _, code) = run_command(&["-c", "5 + 3"]);
    assert_eq!(stdout.trim(), "8");
    assert_eq!(code, 0);
}

#[test]
fn test_precedence_and_power() {
    let (stdout, _, code) = run_command(&["-c", "2 + 3 * 2 ^ 2"]);
    assert_eq!(stdout.trim(), "14");
    assert_eq!(code, 0);
}

#[test]
fn test_auto_prepend_equals() {
    let (stdout1, _, _) = run_command(&["-c", "10 + 5"]);
    let (stdout2, _, _) = run_command(&["-c", "=10 + 5"]);
    assert_eq!(stdout1, stdout2);
}

#[test]
fn test_cell_references() {
    let (stdout, _, code) = run_command(&["--set", "A1=5", "--set", "A2==A1+3", "-c", "A2*2"]);
    assert_eq!(stdout.trim(), "16");
    assert_eq!(code, 0);
}

#[test]
fn test_range_functions() {
    let (stdout, _, code) = run_command(&[
        "--set", "B1=1", "--set", "B2=2", "--set", "B3=3", "-c", "SUM(B1:B3)",
    ]);
    assert_eq!(stdout.trim(), "6");
    assert_eq!(code, 0);
}

#[test]
fn test_countif() {
    let mut args = Vec::new();
    for (i, v) in ["1", "5", "3", "7", "2"].iter().enumerate() {
        args.push("--set".to_string());
        args.push(format!("A{}={}", i + 1, v));
    }
    args.push("-c".to_string());
    args.push("COUNTIF(A1:A5, \">3\")".to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let (stdout, _, code) = run_command(&args);
    assert_eq!(stdout.trim(), "2");
    assert_eq!(code, 0);
}

#[test]
fn test_string_result() {
    let (stdout, _, code) = run_command(&["-c", "CONCAT(\"grid\", \"calc\")"]);
    assert_eq!(stdout.trim(), "gridcalc");
    assert_eq!(code, 0);
}

#[test]
fn test_error_exit_code() {
    let (stdout, _, code) = run_command(&["-c", "undefined_function()"]);
    assert_eq!(stdout.trim(), "#NAME?");
    assert_eq!(code, 1);
}

#[test]
fn test_division_by_zero() {
    let (stdout, _, code) = run_command(&["-c", "1/0"]);
    assert_eq!(stdout.trim(), "#DIV/0!");
    assert_eq!(code, 1);
}

#[test]
fn test_arity_error() {
    let (stdout, _, code) = run_command(&["-c", "SUM()"]);
    assert_eq!(stdout.trim(), "#N/A");
    assert_eq!(code, 1);
}

#[test]
fn test_circular_reference() {
    let (stdout, _, code) = run_command(&["--set", "A1==B1", "--set", "B1==A1", "-c", "A1"]);
    assert_eq!(stdout.trim(), "#CIRC!");
    assert_eq!(code, 1);
}

#[test]
fn test_bad_assignment() {
    let (_, stderr, code) = run_command(&["--set", "nonsense", "-c", "1"]);
    assert!(stderr.contains("ADDR=TEXT"));
    assert_eq!(code, 2);
}

#[test]
fn test_table_dump_without_command() {
    let (stdout, _, code) = run_command(&[
        "--rows", "2", "--cols", "2", "--set", "A1=1", "--set", "B2==A1+1",
    ]);
    assert_eq!(stdout, "1\n\t2\n");
    assert_eq!(code, 0);
}

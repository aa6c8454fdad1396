use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn ksieve() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ksieve"))
}

#[test]
fn counts_primes_with_single_bound() -> Result<(), Box<dyn std::error::Error>> {
    ksieve()
        .arg("100")
        .assert()
        .success()
        .stdout(predicate::str::contains("Primes: 25"));
    Ok(())
}

#[test]
fn counts_over_an_interval() -> Result<(), Box<dyn std::error::Error>> {
    ksieve()
        .args(["100", "200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Primes: 21"));
    Ok(())
}

#[test]
fn counts_twins_and_quadruplets() -> Result<(), Box<dyn std::error::Error>> {
    ksieve()
        .args(["--count", "2,4", "1000"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Twin primes: 35")
                .and(predicate::str::contains("Prime quadruplets: 5")),
        );
    Ok(())
}

#[test]
fn prints_primes_one_per_line() -> Result<(), Box<dyn std::error::Error>> {
    ksieve()
        .args(["--print", "30"])
        .assert()
        .success()
        .stdout(predicate::eq("2\n3\n5\n7\n11\n13\n17\n19\n23\n29\n"));
    Ok(())
}

#[test]
fn prints_twin_tuples() -> Result<(), Box<dyn std::error::Error>> {
    ksieve()
        .args(["--print=2", "20"])
        .assert()
        .success()
        .stdout(predicate::eq("(3, 5)\n(5, 7)\n(11, 13)\n(17, 19)\n"));
    Ok(())
}

#[test]
fn nth_prime_lookup() -> Result<(), Box<dyn std::error::Error>> {
    ksieve()
        .args(["--nth-prime", "25"])
        .assert()
        .success()
        .stdout(predicate::eq("97\n"));
    ksieve()
        .args(["--nth-prime", "--", "-1", "100"])
        .assert()
        .success()
        .stdout(predicate::eq("97\n"));
    Ok(())
}

#[test]
fn json_summary() -> Result<(), Box<dyn std::error::Error>> {
    ksieve()
        .args(["--json", "100"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"kind\": \"Primes\"")
                .and(predicate::str::contains("\"count\": 25")),
        );
    Ok(())
}

#[test]
fn rejects_bad_input() -> Result<(), Box<dyn std::error::Error>> {
    // start > stop
    ksieve().args(["200", "100"]).assert().failure();
    // count kind out of range
    ksieve().args(["--count", "9", "100"]).assert().failure();
    // print with threads
    ksieve()
        .args(["--print", "--threads", "4", "100"])
        .assert()
        .failure();
    // negative bound without --nth-prime
    ksieve().args(["--", "-5"]).assert().failure();
    Ok(())
}

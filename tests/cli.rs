use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn circle(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("circle").unwrap();
    cmd.env("CIRCLE_WALLET_DATA_DIR", dir.path())
        .env_remove("CIRCLE_WALLET_GROUP")
        .env_remove("CIRCLE_WALLET_USER")
        .env("RUST_LOG", "error");
    cmd
}

fn run(dir: &TempDir, args: &[&str]) -> String {
    let output = circle(dir).args(args).assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

/// First `txn-xxxxxxxx` token in the output
fn short_id(output: &str) -> String {
    output
        .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .find(|word| word.starts_with("txn-"))
        .map(str::to_string)
        .expect("no transaction id in output")
}

/// Group "Goa Trip" with two families and three members
fn trip(dir: &TempDir) {
    run(dir, &["init"]);
    run(dir, &["group", "create", "Goa Trip", "--threshold", "5000"]);
    run(dir, &["family", "add", "Sharma"]);
    run(dir, &["family", "add", "Iyer"]);
    run(dir, &["member", "add", "Sharma", "Asha"]);
    run(dir, &["member", "add", "Sharma", "Rohan", "--type", "teenager", "--age", "15"]);
    run(dir, &["member", "add", "Iyer", "Dev"]);
}

#[test]
fn init_writes_settings() {
    let dir = TempDir::new().unwrap();
    circle(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete"));
    assert!(dir.path().join("config.json").exists());
}

#[test]
fn deposit_and_small_payment_update_the_wallet() {
    let dir = TempDir::new().unwrap();
    trip(&dir);

    circle(&dir)
        .args(["deposit", "10000", "--family", "Sharma"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wallet balance: ₹10000.00"));

    circle(&dir)
        .args(["pay", "900", "--category", "food", "--merchant", "Fisherman's Wharf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Paid ₹900.00"))
        .stdout(predicate::str::contains("Rohan"))
        .stdout(predicate::str::contains("Wallet balance: ₹9100.00"));

    circle(&dir)
        .args(["txn", "list", "--kind", "payment"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fisherman's Wharf"));
}

#[test]
fn large_payment_waits_for_approval() {
    let dir = TempDir::new().unwrap();
    trip(&dir);
    run(&dir, &["deposit", "20000"]);

    let paid = run(&dir, &["pay", "6000", "--category", "accommodation"]);
    assert!(paid.contains("pending approval"));
    let id = short_id(&paid);

    circle(&dir)
        .args(["report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("₹20000.00"))
        .stdout(predicate::str::contains("1 awaiting approval"));

    circle(&dir)
        .args(["txn", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()));

    circle(&dir)
        .args(["approve", &id, "--by", "priya"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wallet balance: ₹14000.00"));

    circle(&dir)
        .args(["approve", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot approve"));

    circle(&dir)
        .args(["report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wallet Balance:"))
        .stdout(predicate::str::contains("₹14000.00"))
        .stdout(predicate::str::contains("Ledger check: balanced"));
}

#[test]
fn declined_payment_leaves_balances_alone() {
    let dir = TempDir::new().unwrap();
    trip(&dir);
    run(&dir, &["deposit", "8000", "--family", "Iyer"]);

    let id = short_id(&run(&dir, &["pay", "7500"]));
    circle(&dir)
        .args(["decline", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wallet balance: ₹8000.00"));

    circle(&dir)
        .args(["txn", "list", "--status", "declined"])
        .assert()
        .success()
        .stdout(predicate::str::contains(id.as_str()));
}

#[test]
fn custom_split_charges_only_the_chosen_members() {
    let dir = TempDir::new().unwrap();
    trip(&dir);
    run(&dir, &["deposit", "1000"]);

    let paid = run(&dir, &["pay", "300", "--member", "Dev", "--category", "drinks"]);
    assert!(paid.contains("Dev"));
    assert!(!paid.contains("Asha"));

    circle(&dir)
        .args(["family", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-₹300.00"))
        .stdout(predicate::str::contains("(in debit)"));
}

#[test]
fn reject_negative_policy_blocks_overdraft() {
    let dir = TempDir::new().unwrap();
    trip(&dir);
    run(&dir, &["config", "set", "balance_policy", "reject_negative"]);
    run(&dir, &["deposit", "100"]);

    circle(&dir)
        .args(["pay", "250"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient balance"));

    circle(&dir)
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+₹100.00"))
        .stdout(predicate::str::contains("-₹250.00").not());
}

#[test]
fn invalid_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    trip(&dir);

    circle(&dir)
        .args(["deposit", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));

    circle(&dir)
        .args(["pay", "12.345"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));

    circle(&dir)
        .args(["pay", "100", "--split", "kids", "--group", "Goa Trip"])
        .assert()
        .success();

    circle(&dir)
        .args(["member", "add", "Sharma", "Zoe", "--ratio", "1.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("share ratio"));
}

#[test]
fn several_groups_need_an_explicit_choice() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["init"]);
    run(&dir, &["group", "create", "Goa Trip"]);
    run(&dir, &["group", "create", "Manali", "--no-approval"]);

    circle(&dir)
        .args(["family", "add", "Sharma"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--group"));

    circle(&dir)
        .args(["--group", "manali", "family", "add", "Sharma"])
        .assert()
        .success();

    circle(&dir)
        .args(["group", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Manali"))
        .stdout(predicate::str::contains("off"));
}

#[test]
fn audit_records_approvals() {
    let dir = TempDir::new().unwrap();
    trip(&dir);
    run(&dir, &["deposit", "9000"]);
    let id = short_id(&run(&dir, &["pay", "5000"]));
    run(&dir, &["approve", &id, "--by", "priya"]);

    circle(&dir)
        .args(["audit", "--entity", "transaction"])
        .assert()
        .success()
        .stdout(predicate::str::contains("UPDATE Transaction"))
        .stdout(predicate::str::contains("by priya"));
}

#[test]
fn amounts_use_the_group_currency() {
    let dir = TempDir::new().unwrap();
    run(&dir, &["init"]);
    run(&dir, &["group", "create", "Lisbon", "--currency", "eur", "--threshold", "800"]);

    circle(&dir)
        .args(["deposit", "1200"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wallet balance: €1200.00"))
        .stdout(predicate::str::contains("₹").not());

    circle(&dir)
        .args(["group", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(">= €800.00"));
}

#[test]
fn search_and_split_narrow_the_listing() {
    let dir = TempDir::new().unwrap();
    trip(&dir);
    run(&dir, &["deposit", "3000"]);
    run(&dir, &["pay", "400", "--split", "adults", "--merchant", "Beach Shack"]);
    run(&dir, &["pay", "150", "--merchant", "Spice Farm"]);

    circle(&dir)
        .args(["txn", "list", "--search", "beach"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Beach Shack"))
        .stdout(predicate::str::contains("Spice Farm").not());

    circle(&dir)
        .args(["txn", "list", "--split", "everyone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spice Farm"))
        .stdout(predicate::str::contains("Beach Shack").not());

    circle(&dir)
        .args(["txn", "list", "--split", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid split"));
}

#[test]
fn groups_can_be_renamed() {
    let dir = TempDir::new().unwrap();
    trip(&dir);

    circle(&dir)
        .args(["group", "edit", "--name", "Goa Monsoon", "--description", "July trip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated group: Goa Monsoon"));

    circle(&dir)
        .args(["--group", "goa monsoon", "group", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("July trip"));
}

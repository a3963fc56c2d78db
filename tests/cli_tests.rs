use chrono::{Duration, Local, Utc};
use predicates::prelude::*;
use test_env::{import_snapshot, rhos_cmd, setup_test_env, write_file};

fn record(id: i64, status: &str) -> serde_json::Value {
    let now = Utc::now().to_rfc3339();
    serde_json::json!({
        "id": id,
        "orderCode": format!("RH-{}", id),
        "orderName": format!("Order {}", id),
        "status": status,
        "designApproved": false,
        "sizesValidated": false,
        "depositReceived": false,
        "invoiceUrl": null,
        "priority": "normal",
        "estDelivery": null,
        "createdAt": now,
        "updatedAt": now,
        "salespersonId": "sp-1",
    })
}

/// Seven orders covering every board situation the commands report on
fn sample_snapshot() -> String {
    let yesterday = (Local::now().date_naive() - Duration::days(1)).format("%Y-%m-%d").to_string();

    let mut validated = record(2, "waiting_sizes");
    validated["sizesValidated"] = true.into();

    let mut urgent = record(4, "new");
    urgent["priority"] = "high".into();

    let mut late_shipment = record(6, "shipped");
    late_shipment["estDelivery"] = yesterday.into();

    let mut stuck = record(7, "design_created");
    stuck["sizesValidated"] = true.into();

    serde_json::to_string(&vec![
        record(1, "new"),
        validated,
        record(3, "production"),
        urgent,
        record(5, "cancelled"),
        late_shipment,
        stuck,
    ])
    .unwrap()
}

#[test]
fn test_import_reports_count() {
    let (temp_dir, _guard) = setup_test_env("");
    let path = temp_dir.path().join("orders.json");
    write_file(&path, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["import", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 7 orders"));
}

#[test]
fn test_import_from_stdin() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .args(["import", "-"])
        .write_stdin(sample_snapshot())
        .assert()
        .success()
        .stdout(predicate::str::contains("from stdin"));
}

#[test]
fn test_import_rejects_unknown_status() {
    let (temp_dir, _guard) = setup_test_env("");
    let path = temp_dir.path().join("bad.json");
    let snapshot = serde_json::to_string(&vec![record(1, "new"), record(2, "on_hold")]).unwrap();
    write_file(&path, &snapshot);

    rhos_cmd(&temp_dir)
        .args(["import", path.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("order 2: unknown status 'on_hold'"));

    // Nothing from the rejected file is stored
    rhos_cmd(&temp_dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No orders found."));
}

#[test]
fn test_import_rejects_duplicate_ids() {
    let (temp_dir, _guard) = setup_test_env("");
    let path = temp_dir.path().join("dupes.json");
    let snapshot = serde_json::to_string(&vec![record(1, "new"), record(2, "new"), record(1, "production")]).unwrap();
    write_file(&path, &snapshot);

    rhos_cmd(&temp_dir)
        .args(["import", path.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("order 1 appears more than once"));

    rhos_cmd(&temp_dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No orders found."));
}

#[test]
fn test_import_missing_file_is_user_error() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .args(["import", "does-not-exist.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: Snapshot file not found"));
}

#[test]
fn test_import_replace_drops_missing_orders() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    let path = temp_dir.path().join("replacement.json");
    write_file(&path, &serde_json::to_string(&vec![record(42, "completed")]).unwrap());
    rhos_cmd(&temp_dir)
        .args(["import", "--replace", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("replaced existing snapshot"));

    rhos_cmd(&temp_dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RH-42"))
        .stdout(predicate::str::contains("RH-1 ").not())
        .stdout(predicate::str::contains("1 order\n"));
}

#[test]
fn test_list_admin_sees_everything() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ready to Invoice"))
        .stdout(predicate::str::contains("RH-5"))
        .stdout(predicate::str::contains("7 orders"));
}

#[test]
fn test_list_finance_sees_own_stages_only() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["--role", "finance", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RH-2"))
        .stdout(predicate::str::contains("RH-3").not())
        .stdout(predicate::str::contains("1 order\n"));
}

#[test]
fn test_list_role_from_rc_file() {
    let (temp_dir, _guard) = setup_test_env("role=manufacturer\n");
    import_snapshot(&temp_dir, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RH-3"))
        .stdout(predicate::str::contains("RH-6"))
        .stdout(predicate::str::contains("RH-1 ").not());
}

#[test]
fn test_list_filter() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["list", "risk", "not", "stage=shipped"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RH-4"))
        .stdout(predicate::str::contains("RH-6").not())
        .stdout(predicate::str::contains("1 order\n"));
}

#[test]
fn test_list_json() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    let output = rhos_cmd(&temp_dir)
        .args(["list", "--json", "stage=in-production"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let orders = value.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order"]["id"], 3);
    assert_eq!(orders[0]["order"]["orderCode"], "RH-3");
    assert_eq!(orders[0]["stage"], "in-production");
    assert_eq!(orders[0]["at_risk"], false);
}

#[test]
fn test_list_json_flag_after_filter() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    let output = rhos_cmd(&temp_dir)
        .args(["list", "stage=in-production", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let ids: Vec<i64> = value.as_array().unwrap().iter().map(|o| o["order"]["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3]);
}

#[test]
fn test_list_role_flag_after_filter() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    // Finance cannot see production orders, but can see ready-to-invoice ones
    rhos_cmd(&temp_dir)
        .args(["list", "stage=in-production", "--role", "finance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No orders found."));

    rhos_cmd(&temp_dir)
        .args(["list", "stage=ready-to-invoice", "--role", "finance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RH-2"))
        .stdout(predicate::str::contains("1 order\n"));
}

#[test]
fn test_list_role_flag_without_value() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .args(["list", "risk", "--role"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("'--role' requires a value"));
}

#[test]
fn test_list_bad_filter_is_user_error() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .args(["list", "stage=shiped"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Did you mean 'shipped'?"));
}

#[test]
fn test_unknown_role_is_user_error() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .args(["--role", "finanse", "stages"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown role 'finanse'"))
        .stderr(predicate::str::contains("Did you mean 'finance'?"));
}

#[test]
fn test_counts() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    let output = rhos_cmd(&temp_dir)
        .args(["counts", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let counts: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(counts["drafts"], 2);
    assert_eq!(counts["awaiting-sizes"], 0);
    assert_eq!(counts["ready-to-invoice"], 1);
    assert_eq!(counts["in-production"], 1);
    assert_eq!(counts["shipped"], 1);
    assert_eq!(counts["completed"], 0);
    assert_eq!(counts["issues"], 1);
}

#[test]
fn test_counts_limited_to_role() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["--role", "finance", "counts"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"Ready to Invoice\s+1").unwrap())
        .stdout(predicate::str::is_match(r"Completed\s+0").unwrap())
        .stdout(predicate::str::contains("Drafts").not());
}

#[test]
fn test_board_columns() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["board"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Drafts (2) ==="))
        .stdout(predicate::str::contains("=== Needs Attention (1) ==="))
        .stdout(predicate::str::contains("high priority"))
        .stdout(predicate::str::contains("2 orders in no stage"));
}

#[test]
fn test_board_json_for_manufacturer() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    let output = rhos_cmd(&temp_dir)
        .args(["--role", "manufacturer", "board", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let columns: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let stages: Vec<&str> = columns
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, vec!["ready-for-production", "in-production", "shipped"]);
    assert_eq!(columns[1]["orders"], serde_json::json!([3]));
}

#[test]
fn test_stages_listing() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .args(["--role", "finance", "stages"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ready-to-invoice"))
        .stdout(predicate::str::contains("action: Create Invoice*"))
        .stdout(predicate::str::contains("* = available to role 'finance'"));
}

#[test]
fn test_show_order_for_finance() {
    let (temp_dir, _guard) = setup_test_env("role=finance\n");
    import_snapshot(&temp_dir, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Order RH-2 - Order 2"))
        .stdout(predicate::str::contains("Ready to Invoice"))
        .stdout(predicate::str::contains("Create Invoice (available)"))
        .stdout(predicate::str::contains("Opens on: invoice"));
}

#[test]
fn test_show_json() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    let output = rhos_cmd(&temp_dir)
        .args(["--role", "sales", "show", "4", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["stage"], "drafts");
    assert_eq!(value["at_risk"], true);
    assert_eq!(value["risk_reasons"], serde_json::json!(["high priority"]));
    assert_eq!(value["role"], "sales");
    assert_eq!(value["primary_action"]["label"], "Request Sizes");
    assert_eq!(value["primary_action"]["allowed"], true);
}

#[test]
fn test_show_missing_order() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .args(["show", "999"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Order 999 not found"));

    rhos_cmd(&temp_dir)
        .args(["show", "abc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Order ID must be a number"));
}

#[test]
fn test_sections() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .args(["--role", "manufacturer", "sections"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Default module: manufacturing"))
        .stdout(predicate::str::contains("Hidden:"));
}

#[test]
fn test_audit() {
    let (temp_dir, _guard) = setup_test_env("");
    import_snapshot(&temp_dir, &sample_snapshot());

    rhos_cmd(&temp_dir)
        .args(["audit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("order 7 (design_created) matches no pipeline stage"))
        .stdout(predicate::str::contains(
            "order 2 (waiting_sizes) classified as ready-to-invoice but status maps to awaiting-sizes",
        ));
}

#[test]
fn test_audit_json_empty_store() {
    let (temp_dir, _guard) = setup_test_env("");

    let output = rhos_cmd(&temp_dir)
        .args(["audit", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["orders"], 0);
    assert_eq!(value["findings"], serde_json::json!([]));
}

#[test]
fn test_version() {
    let (temp_dir, _guard) = setup_test_env("");

    rhos_cmd(&temp_dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

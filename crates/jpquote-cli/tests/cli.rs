use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BICCAMERA_OCR: &str = "\
ビックカメラ.com
Apple AirPods Pro 第2世代 MTJV3J/A
価格 39,800円 (税込)
3,980ポイント(10%還元)
送料無料";

const AMAZON_HTML: &str = r#"<html><body>
<span id="productTitle">Anker PowerCore 10000</span>
<span class="a-price"><span class="a-offscreen">￥2,990</span></span>
</body></html>"#;

/// A `jpquote` command whose default config directory is isolated in `home`.
fn jpquote(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jpquote").unwrap();
    cmd.env("XDG_CONFIG_HOME", home).env("HOME", home);
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    jpquote(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("quote"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn test_quote_ocr_file() {
    let home = TempDir::new().unwrap();
    let input = write(&home, "bic.txt", BICCAMERA_OCR);

    jpquote(home.path())
        .args(["quote", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""product_name": "Apple AirPods Pro 第2世代 MTJV3J/A""#))
        .stdout(predicate::str::contains(r#""price_jpy": 39800"#))
        .stdout(predicate::str::contains(r#""price_twd": 13930"#))
        .stdout(predicate::str::contains(r#""profile": "biccamera""#));
}

#[test]
fn test_quote_stdin() {
    let home = TempDir::new().unwrap();
    jpquote(home.path())
        .args(["quote", "-", "--format", "text"])
        .write_stdin("ワイヤレスマウス MX Master\n¥19,800\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quote:   6930 TWD"));
}

#[test]
fn test_quote_html_with_origin() {
    let home = TempDir::new().unwrap();
    let input = write(&home, "page.html", AMAZON_HTML);

    jpquote(home.path())
        .args(["quote", &input, "--url", "https://www.amazon.co.jp/dp/B0000", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Anker PowerCore 10000,2990,1047,TWD,amazon,,"));
}

#[test]
fn test_quote_without_price_is_not_an_error() {
    let home = TempDir::new().unwrap();
    let input = write(&home, "empty-shelf.txt", "在庫切れ\nお問い合わせください");

    jpquote(home.path())
        .args(["quote", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""price_twd": "N/A""#));
}

#[test]
fn test_quote_forced_profile() {
    let home = TempDir::new().unwrap();
    let input = write(&home, "toy.txt", "ゴジラ ソフビ 2024\n￥3,300");

    jpquote(home.path())
        .args(["quote", &input, "--profile", "godzilla"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""profile": "godzilla""#));

    jpquote(home.path())
        .args(["quote", &input, "--profile", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown profile: nope"));
}

#[test]
fn test_quote_empty_file_fails() {
    let home = TempDir::new().unwrap();
    let input = write(&home, "blank.txt", "  \n");

    jpquote(home.path())
        .args(["quote", &input])
        .assert()
        .failure()
        .stderr(predicate::str::contains("input unreadable"));
}

#[test]
fn test_quote_missing_file_fails() {
    let home = TempDir::new().unwrap();
    jpquote(home.path())
        .args(["quote", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_quote_output_file() {
    let home = TempDir::new().unwrap();
    let input = write(&home, "bic.txt", BICCAMERA_OCR);
    let output = home.path().join("out.json");

    jpquote(home.path())
        .args(["quote", &input, "--output"])
        .arg(&output)
        .assert()
        .success();

    let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["price_jpy"], 39800);
}

#[test]
fn test_batch_with_summary() {
    let home = TempDir::new().unwrap();
    let inputs = home.path().join("inputs");
    fs::create_dir(&inputs).unwrap();
    fs::write(inputs.join("a.txt"), BICCAMERA_OCR).unwrap();
    fs::write(inputs.join("b.txt"), "ワイヤレスマウス MX Master\n¥19,800").unwrap();
    fs::write(inputs.join("c.txt"), "").unwrap();
    let out = home.path().join("out");

    jpquote(home.path())
        .args(["batch", &format!("{}/*.txt", inputs.display()), "--summary", "--continue-on-error", "-j", "2"])
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 successful, 1 failed"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    assert!(!out.join("c.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("filename,status,product_name,price_jpy,price_twd"));
    assert!(lines.iter().any(|l| l.starts_with("b.txt,success,ワイヤレスマウス MX Master,19800,6930,TWD,generic")));
    assert!(lines.iter().any(|l| l.starts_with("c.txt,error,")));
}

#[test]
fn test_batch_stops_on_error() {
    let home = TempDir::new().unwrap();
    write(&home, "empty.txt", "");

    jpquote(home.path())
        .args(["batch", &format!("{}/*.txt", home.path().display())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quoting failed"));
}

#[test]
fn test_batch_no_matches() {
    let home = TempDir::new().unwrap();
    jpquote(home.path())
        .args(["batch", &format!("{}/*.txt", home.path().display())])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_profiles_list_and_detect() {
    let home = TempDir::new().unwrap();
    jpquote(home.path())
        .args(["profiles", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("biccamera"))
        .stdout(predicate::str::contains("yahoo-auctions"))
        .stdout(predicate::str::contains("generic"));

    let input = write(&home, "bic.txt", BICCAMERA_OCR);
    jpquote(home.path())
        .args(["profiles", "detect", &input])
        .assert()
        .success()
        .stdout("biccamera\n");

    let page = write(&home, "page.html", AMAZON_HTML);
    jpquote(home.path())
        .args(["profiles", "detect", &page, "--url", "https://www.amazon.co.jp/dp/B0000"])
        .assert()
        .success()
        .stdout("amazon\n");
}

#[test]
fn test_config_init_get_set() {
    let home = TempDir::new().unwrap();

    jpquote(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(home.path().join("jpquote").join("config.json").exists());

    jpquote(home.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    jpquote(home.path())
        .args(["config", "get", "conversion.rate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.35"));

    jpquote(home.path())
        .args(["config", "get", "profiles.0.id"])
        .assert()
        .success()
        .stdout(predicate::str::contains("biccamera"));

    jpquote(home.path())
        .args(["config", "set", "conversion.rate", "0.5"])
        .assert()
        .success();

    jpquote(home.path())
        .args(["quote", "-"])
        .write_stdin("ワイヤレスマウス MX Master\n¥19,800\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""price_twd": 9900"#));
}

#[test]
fn test_config_rejects_invalid_values() {
    let home = TempDir::new().unwrap();

    jpquote(home.path())
        .args(["config", "set", "conversion.rate", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid conversion rate"));

    jpquote(home.path())
        .args(["config", "get", "no.such.key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_explicit_config_file() {
    let home = TempDir::new().unwrap();
    let config = write(&home, "custom.json", r#"{"conversion": {"rate": "0.2", "currency": "TWD"}}"#);

    jpquote(home.path())
        .args(["--config", &config, "quote", "-"])
        .write_stdin("ワイヤレスマウス MX Master\n¥19,800\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""price_twd": 3960"#));
}

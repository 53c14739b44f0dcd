mod common;

use std::io::Write;

use assert_cmd::Command;
use common::*;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn pem_file(contents: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file
}

fn updater(url: &str, cert: &NamedTempFile, key: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("update-ipmi-cert").unwrap();
    cmd.args(["--ipmi-url", url])
        .arg("--cert-file")
        .arg(cert.path())
        .arg("--key-file")
        .arg(key.path())
        .args(["--username", "ADMIN", "--password", "ADMIN"]);
    cmd
}

#[test]
fn missing_key_file_exits_2() {
    let cert = pem_file(fullchain().as_bytes());
    Command::cargo_bin("update-ipmi-cert")
        .unwrap()
        .args(["--ipmi-url", "https://127.0.0.1"])
        .arg("--cert-file")
        .arg(cert.path())
        .args(["--key-file", "/nonexistent/key.pem"])
        .args(["--username", "ADMIN", "--password", "ADMIN"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("--key-file '/nonexistent/key.pem' doesn't exist"));
}

#[test]
fn malformed_url_exits_2() {
    let cert = pem_file(fullchain().as_bytes());
    let key = pem_file(KEY);
    updater("bmc.example.com", &cert, &key).assert().code(2);
}

#[test]
fn successful_rotation_exits_0() {
    let controller = MockController::start();
    controller.accept_login();
    controller.serve_token();
    controller.status(&cert_status("Jan 19 03:14:07 2027 GMT"));
    controller.accept_upload();
    controller.validate(true);
    let reboot = controller.confirm_reboot();

    let cert = pem_file(fullchain().as_bytes());
    let key = pem_file(KEY);
    updater(&controller.url(), &cert, &key)
        .assert()
        .code(0)
        .stdout(predicate::str::contains("valid until Jan 19 03:14:07 2027 GMT"));
    reboot.assert_hits(1);
}

#[test]
fn upload_rejected_exits_2() {
    let controller = MockController::start();
    controller.accept_login();
    controller.serve_token();
    controller.status(NO_CERT);
    controller.upload("text/plain", "");
    let validate = controller.validate(true);

    let cert = pem_file(fullchain().as_bytes());
    let key = pem_file(KEY);
    updater(&controller.url(), &cert, &key)
        .arg("--no-reboot")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("certificate upload failed"));
    validate.assert_hits(0);
}

#[test]
fn failed_reboot_exits_1() {
    let controller = MockController::start();
    controller.accept_login();
    controller.serve_token();
    controller.status(&cert_status("Jan 19 03:14:07 2027 GMT"));
    controller.accept_upload();
    controller.validate(true);
    controller.reboot("<IPMI></IPMI>");

    let cert = pem_file(fullchain().as_bytes());
    let key = pem_file(KEY);
    updater(&controller.url(), &cert, &key)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("did not reboot"));
}

#[test]
fn help_documents_exit_status() {
    Command::cargo_bin("update-ipmi-cert")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit status:"))
        .stdout(predicate::str::contains("did not confirm the reboot"));
}

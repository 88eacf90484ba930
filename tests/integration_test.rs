use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Server, ServerGuard};
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

const ELF: &[u8] = b"\x7FELF\x02\x01\x01\x00\x00\x00\x00\x00\x00\x00\x00\x00integration";

fn gpm(store: &Path, bin: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("gpm"));
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("GPM_STORE")
        .env_remove("GPM_BIN")
        .arg("--store")
        .arg(store)
        .arg("--bin")
        .arg(bin);
    cmd
}

/// Serve one release `v1.0.0` of acme/tool with a single asset whose body is
/// `body`.
fn mock_release(server: &mut ServerGuard, body: &'static [u8]) {
    let url = server.url();

    server
        .mock("GET", "/repos/acme/tool/releases/tags/v1.0.0")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "tag_name": "v1.0.0", "prerelease": false}"#)
        .create();

    server
        .mock("GET", "/repos/acme/tool/releases/1/assets?per_page=100&page=1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"[{{
                "id": 7,
                "name": "tool-linux-amd64",
                "size": {},
                "content_type": "application/octet-stream",
                "browser_download_url": "{}/dl/tool-linux-amd64"
            }}]"#,
            body.len(),
            url
        ))
        .create();

    server
        .mock("GET", "/dl/tool-linux-amd64")
        .with_status(200)
        .with_body(body)
        .create();
}

#[cfg(unix)]
#[test]
fn test_end_to_end_install_and_list() {
    let mut server = Server::new();
    mock_release(&mut server, ELF);
    // The asset listing already carries the download URL and fits one page.
    let second_page = server
        .mock("GET", "/repos/acme/tool/releases/1/assets?per_page=100&page=2")
        .expect(0)
        .create();
    let asset_lookup = server
        .mock("GET", "/repos/acme/tool/releases/assets/7")
        .expect(0)
        .create();

    let dir = tempdir().unwrap();
    let store = dir.path().join("store");
    let bin = dir.path().join("bin");

    gpm(&store, &bin)
        .arg("--api-url")
        .arg(server.url())
        .arg("install")
        .arg("acme/tool@v1.0.0:tool-linux-amd64")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Installed acme/tool@v1.0.0:tool-linux-amd64",
        ));

    second_page.assert();
    asset_lookup.assert();
    let artifact = store.join("github.com/acme/tool/v1.0.0/tool-linux-amd64");
    assert_eq!(std::fs::read(&artifact).unwrap(), ELF);
    assert_eq!(
        std::fs::read_to_string(store.join(".gpm-layout")).unwrap(),
        "1\n"
    );

    let link = bin.join("tool");
    assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_link(&link).unwrap(), artifact);

    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(&artifact).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o500);

    gpm(&store, &bin)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Release assets available in cache:"))
        .stdout(predicate::str::contains(
            "  acme/tool@v1.0.0:tool-linux-amd64",
        ))
        .stdout(predicate::str::contains("Linked assets:"))
        .stdout(predicate::str::contains("tool-linux-amd64\n"));
}

#[cfg(unix)]
#[test]
fn test_install_with_link_name() {
    let mut server = Server::new();
    mock_release(&mut server, ELF);

    let dir = tempdir().unwrap();
    let store = dir.path().join("store");
    let bin = dir.path().join("bin");

    gpm(&store, &bin)
        .arg("--api-url")
        .arg(server.url())
        .arg("install")
        .arg("acme/tool@v1.0.0:tool-linux-amd64")
        .arg("--name")
        .arg("t")
        .assert()
        .success();

    assert!(bin.join("t").symlink_metadata().is_ok());
    assert!(bin.join("tool").symlink_metadata().is_err());
}

#[cfg(unix)]
#[test]
fn test_install_refuses_non_binary_content() {
    let mut server = Server::new();
    mock_release(&mut server, b"<!DOCTYPE html><html><body>nope</body></html>");

    let dir = tempdir().unwrap();
    let store = dir.path().join("store");
    let bin = dir.path().join("bin");

    gpm(&store, &bin)
        .arg("--api-url")
        .arg(server.url())
        .arg("install")
        .arg("acme/tool@v1.0.0:tool-linux-amd64")
        .assert()
        .failure()
        .stdout(predicate::str::contains("unsupported format"));

    assert!(
        !store
            .join("github.com/acme/tool/v1.0.0/tool-linux-amd64")
            .exists()
    );
    assert!(bin.join("tool").symlink_metadata().is_err());
}

#[cfg(unix)]
#[test]
fn test_partial_failure_keeps_successful_installs() {
    let mut server = Server::new();
    mock_release(&mut server, ELF);
    server
        .mock("GET", "/repos/acme/tool/releases/tags/v9.9.9")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create();

    let dir = tempdir().unwrap();
    let store = dir.path().join("store");
    let bin = dir.path().join("bin");

    gpm(&store, &bin)
        .arg("--api-url")
        .arg(server.url())
        .arg("install")
        .arg("acme/tool@v1.0.0:tool-linux-amd64")
        .arg("acme/tool@v9.9.9")
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Installed acme/tool@v1.0.0:tool-linux-amd64",
        ))
        .stdout(predicate::str::contains("Failed acme/tool@v9.9.9"))
        .stderr(predicate::str::contains("1 of 2 installation(s) failed"));

    assert!(
        store
            .join("github.com/acme/tool/v1.0.0/tool-linux-amd64")
            .exists()
    );
    assert!(bin.join("tool").symlink_metadata().is_ok());
}

#[test]
fn test_install_rejects_malformed_reference() {
    let dir = tempdir().unwrap();

    gpm(&dir.path().join("store"), &dir.path().join("bin"))
        .arg("--api-url")
        .arg("http://127.0.0.1:1")
        .arg("install")
        .arg("acme/tool")
        .arg("acme/")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid reference"));

    assert!(!dir.path().join("store").exists());
}

#[test]
fn test_install_rejects_name_with_multiple_references() {
    let dir = tempdir().unwrap();

    gpm(&dir.path().join("store"), &dir.path().join("bin"))
        .arg("--api-url")
        .arg("http://127.0.0.1:1")
        .arg("install")
        .arg("acme/tool")
        .arg("acme/other")
        .arg("--name")
        .arg("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--name"));
}

#[test]
fn test_list_empty_store() {
    let dir = tempdir().unwrap();

    gpm(&dir.path().join("store"), &dir.path().join("bin"))
        .arg("list")
        .assert()
        .success()
        .stdout("Release assets available in cache:\n\nLinked assets:\n");
}

#[test]
fn test_search_prints_repositories() {
    let mut server = Server::new();
    server
        .mock("GET", "/search/repositories")
        .match_query(mockito::Matcher::UrlEncoded("q".into(), "fzf".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"items": [
                {"name": "fzf", "owner": {"login": "junegunn"}, "stargazers_count": 70000},
                {"name": "fzf.vim", "owner": {"login": "junegunn"}, "stargazers_count": 9000}
            ]}"#,
        )
        .create();
    let dir = tempdir().unwrap();

    gpm(&dir.path().join("store"), &dir.path().join("bin"))
        .arg("--api-url")
        .arg(server.url())
        .arg("s")
        .arg("fzf")
        .assert()
        .success()
        .stdout("junegunn/fzf (70000 stars)\njunegunn/fzf.vim (9000 stars)\n");
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SCHEMA: &str = "tests/fixtures/apidoc.json";

fn pve_cmd() -> Command {
    let mut cmd = Command::cargo_bin("pve").unwrap();
    cmd.env_remove("PVE_SCHEMA")
        .env_remove("PVE_HOST")
        .env_remove("PVE_API_TOKEN");
    cmd
}

fn gen_cmd() -> Command {
    Command::cargo_bin("gen_client").unwrap()
}

mod explorer {
    use super::*;

    #[test]
    fn lists_root_children() {
        pve_cmd()
            .args(["--schema", SCHEMA, "ls"])
            .assert()
            .success()
            .stdout("Dr-        cluster\nDr-        nodes\n-r-        version\n");
    }

    #[test]
    fn lists_children_of_concrete_path() {
        pve_cmd()
            .args(["--schema", SCHEMA, "ls", "/nodes/pve1"])
            .assert()
            .success()
            .stdout("Drc        qemu\nDr-        storage\n");
    }

    #[test]
    fn schema_can_come_from_environment() {
        pve_cmd()
            .env("PVE_SCHEMA", SCHEMA)
            .args(["ls", "/nodes/pve1/qemu/100"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Dr-        status"));
    }

    #[test]
    fn ls_json_reports_paths() {
        pve_cmd()
            .args(["--schema", SCHEMA, "ls", "/nodes", "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""path": "/nodes/{node}""#));
    }

    #[test]
    fn unknown_path_fails() {
        pve_cmd()
            .args(["--schema", SCHEMA, "ls", "/access"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("error: unknown resource /access"));
    }

    #[test]
    fn missing_schema_fails() {
        pve_cmd()
            .args(["ls"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("PVE_SCHEMA"));
    }

    #[test]
    fn usage_for_one_verb() {
        pve_cmd()
            .args(["--schema", SCHEMA, "usage", "/nodes/pve1/qemu", "--verb", "post"])
            .assert()
            .success()
            .stdout("POST /nodes/{node}/qemu vmid:<integer> [OPTIONS]\n");
    }

    #[test]
    fn usage_lists_every_verb() {
        pve_cmd()
            .args(["--schema", SCHEMA, "usage", "/nodes/pve1/qemu/100"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("GET /nodes/{node}/qemu/{vmid}\n"))
            .stdout(predicate::str::contains("DELETE /nodes/{node}/qemu/{vmid}"));
    }

    #[test]
    fn verbose_usage_describes_returns() {
        pve_cmd()
            .args(["--schema", SCHEMA, "usage", "/version", "-v"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Returns: object"))
            .stdout(predicate::str::contains("repoid"));
    }

    #[test]
    fn usage_rejects_absent_verb() {
        pve_cmd()
            .args(["--schema", SCHEMA, "usage", "/version", "--verb", "delete"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("DELETE is not available on /version"));
    }

    #[test]
    fn tree_lists_paths_with_verbs() {
        pve_cmd()
            .args(["--schema", SCHEMA, "tree"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("/cluster (GET)\n"))
            .stdout(predicate::str::contains("/nodes/{node}/qemu (GET, POST)\n"))
            .stdout(predicate::str::contains("/nodes/{node}/storage/{storage}\n"));
    }

    #[test]
    fn tree_json_nests_children() {
        let output = pve_cmd()
            .args(["--schema", SCHEMA, "tree", "--json"])
            .output()
            .expect("Failed to execute");
        assert!(output.status.success());
        let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(value[1]["path"], "/nodes");
        assert_eq!(value[1]["children"][0]["indexed"], true);
        assert_eq!(value[1]["children"][0]["key_chain"][0], "node");
    }
}

mod call {
    use super::*;

    #[test]
    fn missing_required_parameter_fails_before_connecting() {
        pve_cmd()
            .args(["--schema", SCHEMA, "call", "post", "/nodes/pve1/qemu"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing required parameter 'vmid'"));
    }

    #[test]
    fn requires_host_configuration() {
        pve_cmd()
            .args(["--schema", SCHEMA, "call", "post", "/nodes/pve1/qemu", "vmid=100"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("PVE_HOST missing"));
    }

    #[test]
    fn rejects_malformed_parameter() {
        pve_cmd()
            .args(["--schema", SCHEMA, "call", "post", "/nodes/pve1/qemu", "vmid"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("expected KEY=VALUE"));
    }

    #[test]
    fn required_family_needs_one_indexed_member() {
        let temp_dir = TempDir::new().unwrap();
        let schema = temp_dir.path().join("apidoc.json");
        fs::write(
            &schema,
            r#"[{"text": "links", "path": "/links", "info": {"POST": {
                "name": "create_links",
                "parameters": {"properties": {"link[n]": {"type": "string"}}},
                "returns": {"type": "null"}
            }}}]"#,
        )
        .unwrap();

        pve_cmd()
            .arg("--schema")
            .arg(&schema)
            .args(["call", "post", "/links", "other=1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing required parameter 'link[n]'"));

        pve_cmd()
            .arg("--schema")
            .arg(&schema)
            .args(["call", "post", "/links", "link0=a"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("PVE_HOST missing"));
    }

    #[test]
    fn rejects_unknown_verb() {
        pve_cmd()
            .args(["--schema", SCHEMA, "call", "patch", "/version"])
            .assert()
            .failure();
    }
}

mod gen_client {
    use super::*;

    #[test]
    fn dry_run_prints_code() {
        gen_cmd()
            .args(["--schema", SCHEMA, "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::starts_with(
                "// This code was automatically generated by gen_client.",
            ))
            .stdout(predicate::str::contains("pub struct PveNodesItemNodeQemu<'a>"));
    }

    #[test]
    fn writes_output_file() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("generated").join("client.rs");
        let config = temp_dir.path().join("gen.yaml");
        fs::write(&config, "prefix: Px\nheader: from fixture\n").unwrap();

        gen_cmd()
            .args(["--schema", SCHEMA, "--out"])
            .arg(&out)
            .arg("--config")
            .arg(&config)
            .assert()
            .success()
            .stdout("");

        let code = fs::read_to_string(&out).unwrap();
        assert!(code.contains("// from fixture\n"));
        assert!(code.contains("pub struct PxApi<'a>"));
        let entries = fs::read_dir(out.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn out_is_required_without_dry_run() {
        gen_cmd().args(["--schema", SCHEMA]).assert().failure();
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("gen.yaml");
        fs::write(&config, "prefix: [unclosed\n").unwrap();

        gen_cmd()
            .args(["--schema", SCHEMA, "--dry-run", "--config"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid config"));
    }
}

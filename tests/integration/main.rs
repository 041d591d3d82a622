//! Integration tests for squish

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// squish isolated from any user settings file
    fn squish(settings_dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("squish");
        cmd.env("SQUISH_CONFIG", settings_dir.path().join("config.toml"))
            .env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        squish(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("generate"))
            .stdout(predicate::str::contains("reconstruct"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        squish(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("squish"));
    }

    #[test]
    fn config_path_follows_env() {
        let temp = TempDir::new().unwrap();
        squish(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        squish(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[reconstruct]"))
            .stdout(predicate::str::contains("jobs = 8"));
    }

    #[test]
    fn config_init_creates_file() {
        let temp = TempDir::new().unwrap();
        squish(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").exists());
    }

    #[test]
    fn generate_missing_run_config_fails() {
        let temp = TempDir::new().unwrap();
        squish(&temp)
            .args(["generate"])
            .arg(temp.path().join("missing.json"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("missing.json"));
    }

    #[test]
    fn generate_rejects_unknown_fields() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("runs.json");
        std::fs::write(&config, r#"{"sbt_runs":[{"args":["compile"]}],"extra":1}"#).unwrap();

        squish(&temp)
            .arg("generate")
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid run configuration"));
    }

    #[test]
    fn reconstruct_rejects_unknown_version() {
        let temp = TempDir::new().unwrap();
        let lockfile = temp.path().join("deps.lock.json");
        std::fs::write(&lockfile, r#"{"version":2,"artifacts":[]}"#).unwrap();

        squish(&temp)
            .arg("reconstruct")
            .arg(&lockfile)
            .arg(temp.path().join("cache"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported lockfile version 2"));
    }

    #[test]
    fn reconstruct_empty_lockfile_creates_target() {
        let temp = TempDir::new().unwrap();
        let lockfile = temp.path().join("deps.lock.json");
        std::fs::write(&lockfile, r#"{"version":1,"artifacts":[]}"#).unwrap();
        let target = temp.path().join("cache");

        squish(&temp)
            .arg("reconstruct")
            .arg(&lockfile)
            .arg(&target)
            .assert()
            .success();
        assert!(target.is_dir());
    }
}

#[cfg(unix)]
mod generate_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use squish::lockfile::Lockfile;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const PLUGIN_URL: &str = "https://repo.example.org/maven2/org/example/plugin/1.0/plugin-1.0.jar";
    const LIB_URL: &str = "https://repo.example.org/maven2/org/example/lib/2.1/lib-2.1.jar";

    /// Stand-in for sbt that "downloads" into the Coursier cache per command
    const FAKE_SBT: &str = r#"#!/bin/sh
repo="$COURSIER_CACHE/https/repo.example.org/maven2/org/example"
plugin() { mkdir -p "$repo/plugin/1.0"; printf 'plugin' > "$repo/plugin/1.0/plugin-1.0.jar"; }
lib() { mkdir -p "$repo/lib/2.1"; printf 'lib' > "$repo/lib/2.1/lib-2.1.jar"; }
unused() { mkdir -p "$repo/unused/0.1"; printf 'unused' > "$repo/unused/0.1/unused-0.1.jar"; }
for arg in "$@"; do
  case "$arg" in
    resolvePlugins) plugin ;;
    compile) plugin; lib ;;
    fail) echo "[error] Could not resolve org.example:missing" >&2; exit 1 ;;
  esac
done
"#;

    struct Fixture {
        temp: TempDir,
        project: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let project = temp.path().join("project");
            std::fs::create_dir_all(&project).unwrap();

            let sbt = temp.path().join("fake-sbt");
            std::fs::write(&sbt, FAKE_SBT).unwrap();
            std::fs::set_permissions(&sbt, std::fs::Permissions::from_mode(0o755)).unwrap();

            std::fs::write(
                temp.path().join("config.toml"),
                format!("[generate]\nsbt = \"{}\"\n", sbt.display()),
            )
            .unwrap();

            Self { temp, project }
        }

        fn runs(&self, runs: &[&str]) -> PathBuf {
            let runs: Vec<String> = runs
                .iter()
                .map(|r| format!(r#"{{"args":["{}"]}}"#, r))
                .collect();
            let path = self.temp.path().join("runs.json");
            std::fs::write(&path, format!(r#"{{"sbt_runs":[{}]}}"#, runs.join(","))).unwrap();
            path
        }

        fn output(&self) -> PathBuf {
            self.temp.path().join("deps.lock.json")
        }

        fn squish(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("squish");
            cmd.env("SQUISH_CONFIG", self.temp.path().join("config.toml"))
                .env_remove("RUST_LOG")
                .arg("generate")
                .arg("-p")
                .arg(&self.project)
                .arg("-o")
                .arg(self.output());
            cmd
        }
    }

    fn urls(path: &Path) -> Vec<String> {
        Lockfile::load(path)
            .unwrap()
            .artifacts
            .into_iter()
            .map(|e| e.url)
            .collect()
    }

    #[test]
    fn locks_union_of_runs() {
        let fixture = Fixture::new();
        let runs = fixture.runs(&["resolvePlugins", "compile"]);

        fixture
            .squish()
            .arg(&runs)
            .assert()
            .success()
            .stdout(predicate::str::contains(PLUGIN_URL))
            .stdout(predicate::str::contains("\"version\": 1"));

        assert_eq!(urls(&fixture.output()), vec![LIB_URL, PLUGIN_URL]);
    }

    #[test]
    fn output_is_stable_across_generations() {
        let fixture = Fixture::new();
        let runs = fixture.runs(&["resolvePlugins", "compile"]);

        fixture.squish().arg(&runs).assert().success();
        let first = std::fs::read_to_string(fixture.output()).unwrap();
        fixture.squish().arg(&runs).assert().success();
        let second = std::fs::read_to_string(fixture.output()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let fixture = Fixture::new();
        let runs = fixture.runs(&["compile"]);

        fixture
            .squish()
            .arg("--dry-run")
            .arg(&runs)
            .assert()
            .success()
            .stdout(predicate::str::contains(LIB_URL));

        assert!(!fixture.output().exists());
    }

    #[test]
    fn failing_run_names_its_index() {
        let fixture = Fixture::new();
        let runs = fixture.runs(&["resolvePlugins", "fail", "compile"]);

        fixture
            .squish()
            .arg(&runs)
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("sbt run 2 failed (exit code 1)"))
            .stderr(predicate::str::contains("Could not resolve org.example:missing"));

        assert!(!fixture.output().exists());
    }
}

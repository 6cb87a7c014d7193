#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const GPT_TEXT: &str = "We delve into the tapestry of ideas and delve deeper still";
pub const HUMAN_TEXT: &str = "honestly lol this was so much fun lol";
pub const MIXED_TEXT: &str = "furthermore it is crucial to keep vibrant work in this realm";
pub const BOUNDARY_TEXT: &str = "delve honestly into the old stories here";

pub fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

pub fn model_dir() -> PathBuf {
    fixture_dir().join("model")
}

pub struct TestEnv {
    tmp: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let config_dir = tmp.path().join("config");
        Self { tmp, config_dir }
    }

    pub fn path(&self) -> &Path {
        self.tmp.path()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("stylotrace");
        cmd.env("STYLOTRACE_DISABLE_FILE_LOG", "1")
            .env("STYLOTRACE_CONFIG_DIR", &self.config_dir)
            .env("STYLOTRACE_MODEL_DIR", model_dir())
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn classify_json(&self, extra: &[&str], text: &str) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .arg("classify")
            .args(extra)
            .arg("--text")
            .arg(text)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("classify output is JSON")
    }
}

//! Common test utilities for zAI integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Isolated home directory for one test
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub config_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let config_dir = temp_dir.path().join(".zai");
        std::fs::create_dir_all(&config_dir)?;

        Ok(Self {
            temp_dir,
            config_dir,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Command with HOME pointed at the temp dir and no secrets inherited
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_zai"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("OPENAI_API_KEY");
        cmd.env_remove("SERPAPI_KEY");
        cmd.env_remove("BOT_DB_API_KEY");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn write_config(&self, json: &str) -> anyhow::Result<()> {
        std::fs::write(self.config_file(), json)?;
        Ok(())
    }

    /// Config with an API key and the default agents
    pub fn create_config(&self) -> anyhow::Result<()> {
        self.write_config(
            r#"{
  "providers": { "openai": { "api_key": "test-api-key", "api_base": "http://127.0.0.1:9" } },
  "coordinator": { "model": "test/model" }
}"#,
        )
    }

    /// Write an `sh` launcher script and return its path
    pub fn agent_script(&self, name: &str, body: &str) -> anyhow::Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
        Ok(path)
    }

    /// Config declaring one subprocess agent run through `sh`
    pub fn create_subprocess_config(
        &self,
        agent: &str,
        script: &Path,
        timeout_secs: u64,
    ) -> anyhow::Result<()> {
        let config = serde_json::json!({
            "delegates": {
                "timeout_secs": timeout_secs,
                "agents": [{
                    "name": agent,
                    "transport": "subprocess",
                    "location": script.to_string_lossy(),
                    "entry_point": "sh {location}",
                    "description": "Test agent",
                    "categories": ["investment"]
                }]
            }
        });
        self.write_config(&config.to_string())
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}

use crate::api::MemoraApi;
use crate::config::MemoraConfig;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    // Held so the directory lives as long as the test
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub config: MemoraConfig,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let config = MemoraConfig {
            data_dir: Some(root.clone()),
            ..Default::default()
        };
        Self {
            _temp_dir: temp_dir,
            root,
            config,
        }
    }

    /// Open an API over this environment's data directory.
    pub fn api(&self) -> MemoraApi {
        MemoraApi::open(&self.config).expect("failed to open api")
    }
}

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// 環境定義ファイルを書き、そのパスを返す
    pub fn write_env_kdl(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("env.kdl");
        fs::write(&path, content).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}

use std::path::{Path, PathBuf};

/// Fixed output artifacts of a run. All three are rewritten wholesale;
/// there is no append mode.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub dataset: PathBuf,
    pub version: PathBuf,
    pub run_log: PathBuf,
}

impl OutputPaths {
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            dataset: dir.join("findsj.parquet"),
            version: dir.join("findsj_version.parquet"),
            run_log: dir.join("update_log.json"),
        }
    }
}

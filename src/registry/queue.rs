//! Request queue the crawler fleet pulls domains from

use crate::registry::RegistryResult;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A destination for domains that should be crawled
pub trait DomainQueue {
    fn push(&mut self, domain: &str) -> RegistryResult<()>;
}

impl DomainQueue for Vec<String> {
    fn push(&mut self, domain: &str) -> RegistryResult<()> {
        Vec::push(self, domain.to_string());
        Ok(())
    }
}

/// Appends one domain per line to a file
#[derive(Debug, Clone)]
pub struct FileDomainQueue {
    path: PathBuf,
}

impl FileDomainQueue {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DomainQueue for FileDomainQueue {
    fn push(&mut self, domain: &str) -> RegistryResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", domain)?;
        Ok(())
    }
}

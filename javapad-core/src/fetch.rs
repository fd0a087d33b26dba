//! Resource access for the initialization sequencer.
//!
//! The playground needs three binary resources at startup: the compiler
//! engine module and the two class-library archives. Front-ends differ in
//! where those bytes come from (a local asset directory for the CLI, real
//! HTTP fetches for the browser), so the sequencer works against the
//! [`ResourceFetcher`] trait. Failures carry an HTTP-equivalent status code;
//! a non-2xx status is a hard initialization failure.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::PlaygroundError;

/// The compiler engine module.
pub const ENGINE_RESOURCE: &str = "compiler.wasm";
/// The standard-library class archive.
pub const SDK_RESOURCE: &str = "compile-classlib-teavm.bin";
/// The runtime-support class archive.
pub const RUNTIME_RESOURCE: &str = "runtime-classlib-teavm.bin";

pub trait ResourceFetcher {
    /// Fetches a named binary resource. Errors are
    /// [`PlaygroundError::ResourceFetch`] with a status code: 404 for a
    /// missing resource, 500 for one that exists but cannot be read, 0 when
    /// the backing transport itself is gone.
    fn fetch(&self, name: &str) -> Result<Vec<u8>, PlaygroundError>;
}

/// Serves resources from a local directory, the CLI's deployment model.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Names of the servable assets under the root, for error context.
    pub fn available(&self) -> Vec<String> {
        let mut names = Vec::new();
        for entry in WalkDir::new(&self.root)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
        {
            let path = entry.path();
            let known = path
                .extension()
                .is_some_and(|ext| ext == "wasm" || ext == "bin");
            if path.is_file() && known {
                if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        names
    }
}

impl ResourceFetcher for DirFetcher {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, PlaygroundError> {
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(PlaygroundError::ResourceFetch {
                resource: name.to_string(),
                status: 404,
            });
        }
        fs::read(&path).map_err(|_| PlaygroundError::ResourceFetch {
            resource: name.to_string(),
            status: 500,
        })
    }
}

/// In-memory resource map.
///
/// The browser front-end pre-fetches over real HTTP and records each
/// response here (bytes on success, bare status on failure); tests seed it
/// directly. Unknown names report 404.
#[derive(Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Result<Vec<u8>, u16>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(name.into(), Ok(bytes));
    }

    pub fn insert_error(&mut self, name: impl Into<String>, status: u16) {
        self.entries.insert(name.into(), Err(status));
    }
}

impl ResourceFetcher for MemoryFetcher {
    fn fetch(&self, name: &str) -> Result<Vec<u8>, PlaygroundError> {
        match self.entries.get(name) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(status)) => Err(PlaygroundError::ResourceFetch {
                resource: name.to_string(),
                status: *status,
            }),
            None => Err(PlaygroundError::ResourceFetch {
                resource: name.to_string(),
                status: 404,
            }),
        }
    }
}

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::{
    error::{PrelabelError, Result},
    traits::ImageResolver,
};

const LOCAL_FILES_MARKER: &str = "/data/local-files/";

/// Where local images live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ImageRootsConfig {
    /// Base directory for `/data/local-files/?d=<relative>` references
    pub project_root: PathBuf,
    /// Base directory for relative plain paths
    pub document_root: PathBuf,
}

impl Default for ImageRootsConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            document_root: PathBuf::from("."),
        }
    }
}

/// Resolves local-files URLs, `file://` URLs and plain paths.
///
/// Remote `http(s)` references are not fetched.
#[derive(Debug, Clone)]
pub struct LocalFilesResolver {
    project_root: PathBuf,
    document_root: PathBuf,
}

impl LocalFilesResolver {
    pub fn new(config: &ImageRootsConfig) -> Self {
        Self {
            project_root: config.project_root.clone(),
            document_root: config.document_root.clone(),
        }
    }

    fn local_files_path(&self, reference: &str) -> Result<PathBuf> {
        let url = Url::parse("http://localhost")
            .and_then(|base| base.join(reference))
            .map_err(|e| resolution_error(reference, e.to_string()))?;

        let relative = url
            .query_pairs()
            .find(|(key, _)| key == "d")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| resolution_error(reference, "missing 'd' query parameter"))?;

        Ok(self.project_root.join(relative))
    }

    fn plain_path(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.document_root.join(path)
        }
    }
}

impl ImageResolver for LocalFilesResolver {
    fn resolve(&self, reference: &str) -> Result<PathBuf> {
        let path = if reference.contains(LOCAL_FILES_MARKER) {
            self.local_files_path(reference)?
        } else if let Ok(url) = Url::parse(reference) {
            match url.scheme() {
                "file" => url
                    .to_file_path()
                    .map_err(|_| resolution_error(reference, "not a valid file URL"))?,
                "http" | "https" => {
                    return Err(resolution_error(reference, "remote images are not supported"));
                }
                // Windows drive letters parse as a one-letter scheme
                scheme if scheme.len() == 1 => self.plain_path(reference),
                scheme => {
                    return Err(resolution_error(reference, format!("unsupported scheme '{scheme}'")));
                }
            }
        } else {
            self.plain_path(reference)
        };

        debug!(reference, path = %path.display(), "Resolved image reference");

        if !path.exists() {
            return Err(PrelabelError::ImageNotFound { path });
        }
        Ok(path)
    }
}

fn resolution_error(reference: &str, reason: impl Into<String>) -> PrelabelError {
    PrelabelError::ImageResolution {
        reference: reference.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn resolver_in(dir: &Path) -> LocalFilesResolver {
        LocalFilesResolver::new(&ImageRootsConfig {
            project_root: dir.to_path_buf(),
            document_root: dir.join("docs"),
        })
    }

    #[test]
    fn test_local_files_url() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("images/Accipiter gentilis")).unwrap();
        let image = dir.path().join("images/Accipiter gentilis/primaires.jpg");
        fs::write(&image, b"jpg").unwrap();

        let resolver = resolver_in(dir.path());
        let resolved = resolver
            .resolve("/data/local-files/?d=images/Accipiter%20gentilis/primaires.jpg")
            .unwrap();
        assert_eq!(resolved, image);
    }

    #[test]
    fn test_relative_and_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        let image = dir.path().join("docs/a.png");
        fs::write(&image, b"png").unwrap();

        let resolver = resolver_in(dir.path());
        assert_eq!(resolver.resolve("a.png").unwrap(), image);
        assert_eq!(resolver.resolve(image.to_str().unwrap()).unwrap(), image);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver_in(dir.path()).resolve("/data/local-files/?d=images/none.jpg").unwrap_err();
        assert!(matches!(err, PrelabelError::ImageNotFound { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_unresolvable_references() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver_in(dir.path());

        let remote = resolver.resolve("https://example.com/a.jpg").unwrap_err();
        assert!(matches!(remote, PrelabelError::ImageResolution { .. }));

        let no_param = resolver.resolve("/data/local-files/?x=1").unwrap_err();
        assert!(no_param.to_string().contains("'d'"));
    }
}

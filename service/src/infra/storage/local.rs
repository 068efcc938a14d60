//! Local filesystem implementation of a document [`Storage`].

use std::{
    io,
    path::{Component, Path, PathBuf},
    time::Duration,
};

use common::DateTime;
use tracerr::Traced;

use crate::domain::receipt;

use super::{Error, Storage};

/// Configuration of a [`Local`] document [`Storage`].
#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory documents are stored under.
    pub root: PathBuf,
}

/// Document [`Storage`] backed by a local filesystem directory.
///
/// Produced URLs are plain `file://` paths with an advisory `expires`
/// parameter: nothing enforces the expiry, as the directory is expected to
/// be served (or read) by the hosting machine only.
#[derive(Clone, Debug)]
pub struct Local {
    /// Root directory documents are stored under.
    root: PathBuf,
}

impl Local {
    /// Creates a new [`Local`] document [`Storage`] out of the provided
    /// [`Config`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { root: config.root }
    }

    /// Resolves the provided `key` into a path under the root directory.
    ///
    /// Rejects keys escaping the root directory.
    fn path_of(
        &self,
        key: &receipt::DocumentKey,
    ) -> Result<PathBuf, Traced<Error>> {
        let relative: &str = key.as_ref();
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(tracerr::new!(Error::InvalidKey(key.clone())));
        }
        Ok(self.root.join(relative))
    }
}

impl Storage for Local {
    async fn put(
        &self,
        key: &receipt::DocumentKey,
        _content_type: &str,
        data: Vec<u8>,
    ) -> Result<(), Traced<Error>> {
        let path = self.path_of(key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(tracerr::from_and_wrap!())?;
        }
        tokio::fs::write(path, data)
            .await
            .map_err(tracerr::from_and_wrap!())
    }

    async fn signed_url(
        &self,
        key: &receipt::DocumentKey,
        ttl: Duration,
    ) -> Result<String, Traced<Error>> {
        let path = self.path_of(key)?;
        match tokio::fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(tracerr::new!(Error::NotFound(key.clone())));
            }
            Err(e) => return Err(tracerr::new!(Error::Io(e))),
        }

        let expires = (DateTime::now() + ttl).unix_timestamp();
        Ok(format!("file://{}?expires={expires}", path.display()))
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::domain::{receipt, transaction};

    use super::{Config, Error, Local, Storage as _};

    fn storage() -> (Local, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let local = Local::new(Config { root: dir.path().to_path_buf() });
        (local, dir)
    }

    #[tokio::test]
    async fn stores_documents_and_signs_urls() {
        let (storage, dir) = storage();
        let key =
            receipt::DocumentKey::of(&transaction::Id::new("cs_test_1"));

        storage
            .put(&key, "text/plain", b"total: 100.00USD".to_vec())
            .await
            .unwrap();

        let stored = dir.path().join("receipts/cs_test_1.txt");
        assert_eq!(std::fs::read(&stored).unwrap(), b"total: 100.00USD");

        let url = storage
            .signed_url(&key, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.contains("receipts/cs_test_1.txt"));
    }

    #[tokio::test]
    async fn overwrites_on_repeated_put() {
        let (storage, dir) = storage();
        let key =
            receipt::DocumentKey::of(&transaction::Id::new("cs_test_2"));

        storage.put(&key, "text/plain", b"first".to_vec()).await.unwrap();
        storage.put(&key, "text/plain", b"second".to_vec()).await.unwrap();

        let stored = dir.path().join("receipts/cs_test_2.txt");
        assert_eq!(std::fs::read(&stored).unwrap(), b"second");
    }

    #[tokio::test]
    async fn reports_missing_documents() {
        let (storage, _dir) = storage();
        let key =
            receipt::DocumentKey::of(&transaction::Id::new("cs_missing"));

        assert!(matches!(
            storage
                .signed_url(&key, Duration::from_secs(60))
                .await
                .unwrap_err()
                .as_ref(),
            Error::NotFound(_),
        ));
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let (storage, _dir) = storage();
        let key =
            receipt::DocumentKey::from("../outside/evil.txt".to_owned());

        assert!(matches!(
            storage
                .put(&key, "text/plain", b"data".to_vec())
                .await
                .unwrap_err()
                .as_ref(),
            Error::InvalidKey(_),
        ));
    }
}

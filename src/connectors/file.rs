//! Local file connector

use async_trait::async_trait;
use bytes::Bytes;

use super::Connector;
use crate::Result;
use crate::value::Jsonable;

/// Reads a local path
pub struct FileConnector {
    path: String,
}

impl FileConnector {
    /// Create a connector for `path`.
    pub fn new(path: String) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Connector for FileConnector {
    async fn fetch(&self, _parent: Option<&Jsonable>, _index: Option<u32>) -> Result<Bytes> {
        let content = tokio::fs::read(&self.path).await?;
        Ok(Bytes::from(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_file_bytes() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(br#"[{"a":1}]"#).expect("write");

        let connector = FileConnector::new(file.path().to_string_lossy().into_owned());
        let bytes = connector.fetch(None, None).await.expect("read");
        assert_eq!(bytes, Bytes::from_static(br#"[{"a":1}]"#));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let connector = FileConnector::new("/no/such/file".to_string());
        assert!(connector.fetch(None, None).await.is_err());
    }
}

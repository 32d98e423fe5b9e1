//! File notifier

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{Notifier, Record};
use crate::Result;
use crate::config::FileNotifierConfig;
use crate::expression;
use crate::value::Jsonable;

/// Writes delivered records to files
///
/// The destination path, file name and content template are interpolated with
/// the record body (or the error text), so array splits can fan out to
/// per-index files.
pub struct FileNotifier {
    name: String,
    config: FileNotifierConfig,
}

impl FileNotifier {
    /// Create a file notifier for an item.
    pub fn new(name: &str, config: FileNotifierConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
        }
    }
}

#[async_trait]
impl Notifier for FileNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, record: &Record) -> Result<()> {
        let context = record
            .body
            .as_ref()
            .map(Jsonable::from_native)
            .or_else(|| record.error.clone().map(Jsonable::String));

        let directory =
            expression::format(&self.config.path, context.as_ref(), record.index, None);
        let file_name =
            expression::format(&self.config.file_name, context.as_ref(), record.index, None);
        let content = if self.config.content.is_empty() {
            serde_json::to_string(record)?
        } else {
            expression::format(&self.config.content, context.as_ref(), record.index, None)
        };

        let mut destination = PathBuf::from(&directory);
        if !directory.is_empty() {
            tokio::fs::create_dir_all(&directory).await?;
        }
        destination.push(&file_name);

        if self.config.append {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&destination)
                .await?;
            file.write_all(content.as_bytes()).await?;
            file.write_all(b"\n").await?;
        } else {
            tokio::fs::write(&destination, &content).await?;
        }
        debug!(path = %destination.display(), "record written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_record_json() {
        let dir = tempfile::tempdir().expect("temp dir");
        let notifier = FileNotifier::new(
            "out",
            FileNotifierConfig {
                path: dir.path().to_string_lossy().into_owned(),
                file_name: "result.json".to_string(),
                content: String::new(),
                append: false,
            },
        );
        let record = Record {
            name: "out".to_string(),
            index: None,
            body: Some(serde_json::json!({"a": 1})),
            error: None,
        };
        notifier.notify(&record).await.expect("writes");

        let written = std::fs::read_to_string(dir.path().join("result.json")).expect("file");
        assert!(written.contains(r#""a":1"#));
    }

    #[tokio::test]
    async fn templated_file_names_fan_out_per_index() {
        let dir = tempfile::tempdir().expect("temp dir");
        let notifier = FileNotifier::new(
            "out",
            FileNotifierConfig {
                path: dir.path().to_string_lossy().into_owned(),
                file_name: "item-{INDEX}.json".to_string(),
                content: "{PL}".to_string(),
                append: false,
            },
        );
        for (index, body) in ["a", "b"].iter().enumerate() {
            notifier
                .notify(&Record {
                    name: "out".to_string(),
                    index: Some(u32::try_from(index).unwrap_or(0)),
                    body: Some(serde_json::json!(body)),
                    error: None,
                })
                .await
                .expect("writes");
        }

        assert_eq!(
            std::fs::read_to_string(dir.path().join("item-0.json")).expect("file"),
            "a"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("item-1.json")).expect("file"),
            "b"
        );
    }
}

//! Filesystem storage for the local slide archive.
//!
//! Layout under the archive root:
//!
//! ```text
//! slides/<id>.json   one record per slide
//! media/<path>       image blobs, named by storage path
//! archive.lock       advisory lock serializing mutations
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use async_trait::async_trait;
use micrarium_core::error::{Error, InvalidInputError, ServiceError, TransportError};
use micrarium_core::{
    fields, Result, SlideFilter, SlideId, SlideRecord, SlideStore, StoreUrl, BLEB_COLORS,
    SITE_CATEGORIES,
};

fn map_io(err: std::io::Error) -> Error {
    Error::Transport(TransportError::Io {
        message: err.to_string(),
    })
}

fn map_json(err: serde_json::Error) -> Error {
    Error::InvalidInput(InvalidInputError::Other {
        message: err.to_string(),
    })
}

fn slide_not_found(id: &SlideId) -> Error {
    Error::Service(ServiceError::new(
        404,
        Some("SlideNotFound".to_string()),
        Some(format!("Slide {} not found", id)),
    ))
}

/// A slide to be added to the archive.
#[derive(Debug, Clone)]
pub struct NewSlide {
    /// Path to the image file to copy into the archive.
    pub media: PathBuf,
    /// Category labels; must be in the site vocabulary.
    pub categories: Vec<String>,
    /// Color labels; must be in the color vocabulary.
    pub colors: Vec<String>,
    /// Optional free-text notes.
    pub notes: Option<String>,
    /// Creation timestamp; defaults to the current time.
    pub created_at: Option<DateTime<Utc>>,
}

/// Filesystem-backed slide store.
///
/// Serves the same trait as the hosted REST store, so a gallery can run
/// against a local archive with no network at all. Mutations take an
/// advisory lock on `archive.lock` so concurrent curation tools do not
/// interleave read-modify-write cycles.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a file store over the given archive root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Create a file store from a `file://` store URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not a file URL.
    pub fn from_url(url: &StoreUrl) -> Result<Self> {
        let root = url.to_file_path().ok_or_else(|| {
            Error::InvalidInput(InvalidInputError::StoreUrl {
                value: url.to_string(),
                reason: "not a file:// URL".to_string(),
            })
        })?;
        Ok(Self::new(root))
    }

    /// Get the archive root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slides_dir(&self) -> PathBuf {
        self.root.join("slides")
    }

    fn media_dir(&self) -> PathBuf {
        self.root.join("media")
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join("archive.lock")
    }

    fn slide_path(&self, id: &SlideId) -> PathBuf {
        self.slides_dir().join(format!("{}.json", id))
    }

    /// Take the exclusive archive lock. The caller unlocks the returned
    /// file when its mutation is written out.
    fn lock_archive(&self) -> Result<std::fs::File> {
        fs::create_dir_all(&self.root).map_err(map_io)?;
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(map_io)?;
        lock_file.lock_exclusive().map_err(map_io)?;
        Ok(lock_file)
    }

    fn read_slide(&self, path: &Path) -> Result<SlideRecord> {
        let content = fs::read_to_string(path).map_err(map_io)?;
        serde_json::from_str(&content).map_err(map_json)
    }

    fn write_slide(&self, record: &SlideRecord) -> Result<()> {
        let path = self.slide_path(&record.id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let content = serde_json::to_string_pretty(record).map_err(map_json)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content).map_err(map_io)?;
        fs::rename(&temp_path, &path).map_err(map_io)?;

        Ok(())
    }

    /// Load every slide in the archive.
    ///
    /// Files that are not valid slide records are skipped rather than
    /// failing the whole scan.
    fn scan(&self) -> Result<Vec<SlideRecord>> {
        let dir = self.slides_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut slides = Vec::new();
        for entry in fs::read_dir(&dir).map_err(map_io)? {
            let entry = entry.map_err(map_io)?;
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            if let Ok(record) = self.read_slide(&path) {
                slides.push(record);
            }
        }

        Ok(slides)
    }

    /// Add a new slide to the archive, copying the media file in.
    ///
    /// The id and creation timestamp are assigned here, mirroring the
    /// hosted store where the service assigns both.
    ///
    /// # Errors
    ///
    /// Returns an error if a label is outside its vocabulary or the
    /// media file cannot be copied.
    #[instrument(skip(self, new), fields(media = %new.media.display()))]
    pub async fn insert(&self, new: NewSlide) -> Result<SlideRecord> {
        SITE_CATEGORIES.ensure_all(&new.categories)?;
        BLEB_COLORS.ensure_all(&new.colors)?;

        if !new.media.is_file() {
            return Err(Error::InvalidInput(InvalidInputError::Other {
                message: format!("media file {} does not exist", new.media.display()),
            }));
        }

        let extension = new
            .media
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("bin");
        let id = SlideId::new(Uuid::new_v4().to_string())?;
        let storage_path = format!("{}.{}", id, extension);

        let record = SlideRecord {
            id: id.clone(),
            categories: Some(new.categories.clone()),
            category: new.categories.first().cloned(),
            colors: Some(new.colors.clone()),
            color: new.colors.first().cloned(),
            notes: new.notes.clone(),
            featured: false,
            storage_path: storage_path.clone(),
            created_at: new.created_at.unwrap_or_else(Utc::now),
        };

        let lock = self.lock_archive()?;

        let media_dest = self.media_dir().join(&storage_path);
        if let Some(parent) = media_dest.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }
        fs::copy(&new.media, &media_dest).map_err(map_io)?;

        self.write_slide(&record)?;

        lock.unlock().map_err(map_io)?;

        debug!(id = %id, "Added slide to archive");

        Ok(record)
    }
}

fn string_list(field: &str, value: &Value) -> Result<Option<Vec<String>>> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| invalid_value(field))
            })
            .collect::<Result<Vec<String>>>()
            .map(Some),
        _ => Err(invalid_value(field)),
    }
}

fn string_scalar(field: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        _ => Err(invalid_value(field)),
    }
}

fn invalid_value(field: &str) -> Error {
    Error::Service(ServiceError::new(
        400,
        Some("22P02".to_string()),
        Some(format!("invalid value for column \"{}\"", field)),
    ))
}

fn apply_patch(record: &mut SlideRecord, field: &str, value: &Value) -> Result<()> {
    match field {
        fields::CATEGORIES => record.categories = string_list(field, value)?,
        fields::CATEGORY => record.category = string_scalar(field, value)?,
        fields::COLORS => record.colors = string_list(field, value)?,
        fields::COLOR => record.color = string_scalar(field, value)?,
        fields::NOTES => record.notes = string_scalar(field, value)?,
        fields::FEATURED => {
            record.featured = value.as_bool().ok_or_else(|| invalid_value(field))?;
        }
        other => {
            // Same shape a PostgREST deployment reports for a column the
            // schema lacks, so the caller's classification is uniform.
            return Err(Error::Service(ServiceError::new(
                400,
                Some("42703".to_string()),
                Some(format!(
                    "column \"{}\" of relation \"slides\" does not exist",
                    other
                )),
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl SlideStore for FileStore {
    async fn count(&self, filter: &SlideFilter) -> Result<u64> {
        let slides = self.scan()?;
        Ok(slides.iter().filter(|r| r.matches(filter)).count() as u64)
    }

    #[instrument(skip(self))]
    async fn fetch_page(
        &self,
        filter: &SlideFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<SlideRecord>> {
        let mut matching: Vec<SlideRecord> = self
            .scan()?
            .into_iter()
            .filter(|r| r.matches(filter))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });

        debug!(total = matching.len(), "Scanned archive");

        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    #[instrument(skip(self), fields(%id))]
    async fn fetch_record(&self, id: &SlideId) -> Result<SlideRecord> {
        let path = self.slide_path(id);
        if !path.exists() {
            return Err(slide_not_found(id));
        }
        self.read_slide(&path)
    }

    #[instrument(skip(self, value), fields(%id, field))]
    async fn patch_attribute(&self, id: &SlideId, field: &str, value: Value) -> Result<()> {
        let lock = self.lock_archive()?;

        let path = self.slide_path(id);
        if !path.exists() {
            lock.unlock().map_err(map_io)?;
            return Err(slide_not_found(id));
        }

        let mut record = self.read_slide(&path)?;
        apply_patch(&mut record, field, &value)?;
        self.write_slide(&record)?;

        lock.unlock().map_err(map_io)?;

        debug!("Patched slide");
        Ok(())
    }

    fn resolve_public_url(&self, storage_path: &str) -> Option<String> {
        let path = self.media_dir().join(storage_path);
        // canonicalize also rejects blobs that are not there
        let absolute = path.canonicalize().ok()?;
        Url::from_file_path(&absolute).ok().map(String::from)
    }
}

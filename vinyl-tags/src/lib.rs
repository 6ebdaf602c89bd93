use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::picture::Picture;
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;
use vinyl_core::{CoreError, EmbeddedPicture, TagReader, TrackTags};

const LOG_TARGET: &str = "vinyl::tags";

/// Tag reader backed by `lofty` (ID3v2, Vorbis comments, MP4 atoms, APE, ...)
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl LoftyTagReader {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<TaggedFile, CoreError> {
        Probe::open(path)
            .and_then(Probe::read)
            .map_err(|e| CoreError::TagRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Primary tag first, then every other tag in file order
    fn tags_in_priority(file: &TaggedFile) -> impl Iterator<Item = &Tag> {
        let primary = file.primary_tag();
        let primary_type = primary.map(Tag::tag_type);
        primary.into_iter().chain(
            file.tags()
                .iter()
                .filter(move |tag| Some(tag.tag_type()) != primary_type),
        )
    }
}

impl TagReader for LoftyTagReader {
    fn name(&self) -> &'static str {
        "lofty"
    }

    fn read_tags(&self, path: &Path) -> Result<TrackTags, CoreError> {
        let file = Self::open(path)?;

        // Each field falls back to the next tag when the preferred one lacks it
        let mut tags = TrackTags::default();
        for tag in Self::tags_in_priority(&file) {
            tags.title = tags.title.or_else(|| tag.title().map(Cow::into_owned));
            tags.artist = tags.artist.or_else(|| tag.artist().map(Cow::into_owned));
            tags.album = tags.album.or_else(|| tag.album().map(Cow::into_owned));
            tags.disc_number = tags.disc_number.or_else(|| tag.disk());
        }

        let duration = file.properties().duration();
        tags.duration = (!duration.is_zero()).then_some(duration);

        debug!(
            target: LOG_TARGET,
            "Read tags from {}: title={:?} disc={:?}",
            path.display(),
            tags.title,
            tags.disc_number
        );
        Ok(tags)
    }

    fn read_picture(&self, path: &Path) -> Result<Option<EmbeddedPicture>, CoreError> {
        let file = Self::open(path)?;

        let picture = Self::tags_in_priority(&file)
            .flat_map(Tag::pictures)
            .next()
            .map(|picture: &Picture| EmbeddedPicture {
                data: picture.data().to_vec(),
                mime_type: picture.mime_type().map(|mime| mime.as_str().to_string()),
            });

        if picture.is_none() {
            debug!(target: LOG_TARGET, "No embedded picture in {}", path.display());
        }
        Ok(picture)
    }
}

//! Volumes stored as numbered image files in a directory.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::slices::types::{FetchRequest, SliceError, SliceMessage, SlicePayload};

use super::{batch_bounds, last_index, ordered_indices, SliceSource};

/// Reads a volume from a directory of PNG files, one slice per file.
///
/// Files are ordered by name, so zero-padded numbering (`slice-000.png`,
/// `slice-001.png`, ...) yields the expected slice order.
pub struct DirectorySource {
    files: Vec<PathBuf>,
}

impl DirectorySource {
    /// Scans `dir` for PNG files.
    ///
    /// # Errors
    /// Fails when the directory cannot be read or holds no PNG files.
    pub fn open(dir: &Path) -> Result<Self, SliceError> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(SliceError::EmptyVolume(dir.display().to_string()));
        }
        log::info!("volume at {} holds {} slices", dir.display(), files.len());
        Ok(Self { files })
    }
}

#[async_trait]
impl SliceSource for DirectorySource {
    fn slice_count(&self) -> u32 {
        self.files.len() as u32
    }

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<SliceMessage>, SliceError> {
        let (begin, end) = batch_bounds(request, self.slice_count())?;
        let last_in_batch = last_index(begin, end, request.reversed);
        let mut batch = Vec::with_capacity((end - begin) as usize);
        for index in ordered_indices(begin, end, request.reversed) {
            let Some(path) = self.files.get(index as usize) else {
                continue;
            };
            let bytes = fs::read(path)?;
            batch.push(SliceMessage {
                index,
                last_in_batch,
                source: SlicePayload::Raw(bytes),
            });
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::new_canvas;
    use tempfile::TempDir;

    fn volume_dir(names: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        for name in names {
            let png = new_canvas(4, 4)
                .expect("canvas allocates")
                .encode_png()
                .expect("encodes");
            fs::write(dir.path().join(name), png).expect("writes slice");
        }
        dir
    }

    #[tokio::test]
    async fn reads_slices_in_name_order() {
        let dir = volume_dir(&["02.png", "00.png", "01.png", "notes.txt"]);
        fs::write(dir.path().join("notes.txt"), b"ignored").expect("writes");
        let source = DirectorySource::open(dir.path()).expect("opens");
        assert_eq!(source.slice_count(), 3);

        let batch = source
            .fetch(FetchRequest {
                begin: 0,
                count: 3,
                reversed: false,
            })
            .await
            .expect("fetch succeeds");
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].index, 0);
        assert!(batch[2].is_last_in_batch());
    }

    #[tokio::test]
    async fn reversed_fetch_delivers_descending() {
        let dir = volume_dir(&["00.png", "01.png", "02.png", "03.png"]);
        let source = DirectorySource::open(dir.path()).expect("opens");
        let batch = source
            .fetch(FetchRequest {
                begin: 1,
                count: 2,
                reversed: true,
            })
            .await
            .expect("fetch succeeds");
        let indices: Vec<u32> = batch.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![2, 1]);
        assert_eq!(batch[1].last_in_batch, 1);
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        assert!(matches!(
            DirectorySource::open(dir.path()),
            Err(SliceError::EmptyVolume(_))
        ));
    }
}

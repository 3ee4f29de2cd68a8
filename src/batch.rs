//! Apply a filter set to many image files.
//!
//! Inputs may be files or directories; directories are walked recursively
//! and every file with a decodable image extension is picked up. Results are
//! written under the output directory, mirroring each file's path relative
//! to the directory it was found in.
//!
//! ```text
//! photos/                       filtered/
//! ├── a.jpg          ──►        ├── a.jpg
//! └── trips/                    └── trips/
//!     └── b.png                     └── b.png
//! ```
//!
//! Files are processed in parallel with [rayon](https://docs.rs/rayon). One
//! failing file does not stop the others; failures are reported as events
//! and counted in the [`BatchSummary`].

use crate::binary::{Binary, BinaryError};
use crate::filter::{FilterConfiguration, FilterError, FilterManager};
use crate::imaging::Codec;
use image::ImageFormat;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk input directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Input not found: {0}")]
    InputNotFound(PathBuf),
    #[error("{} and {} would both write {}", .first.display(), .second.display(), .relative.display())]
    DuplicateOutput {
        relative: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Per-file failure, kept separate so one bad file never aborts the batch.
#[derive(Error, Debug)]
enum FileError {
    #[error(transparent)]
    Binary(#[from] BinaryError),
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file to process and where its output goes, relative to the output dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub source: PathBuf,
    pub relative: PathBuf,
}

/// Progress event emitted once per input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Processed {
        source: PathBuf,
        output: PathBuf,
        input_bytes: usize,
        output_bytes: usize,
    },
    Failed {
        source: PathBuf,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: usize,
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} processed, {} failed", self.processed, self.failed)
    }
}

/// True when the `image` crate can decode files with this extension.
///
/// AVIF is excluded: the `"avif"` feature only builds the encoder, yet
/// `ImageFormat::reading_enabled()` still reports it as readable.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(ImageFormat::from_extension)
        .is_some_and(|f| f != ImageFormat::Avif && f.reading_enabled())
}

/// Expand files and directories into a sorted list of input files.
///
/// Two inputs that map to the same output path (`a/x.png` and `b/x.png`, or
/// overlapping directory trees) are rejected with
/// [`BatchError::DuplicateOutput`].
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<InputFile>, BatchError> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input).follow_links(true) {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type().is_file() && is_supported_image(path) {
                    let relative = path.strip_prefix(input).unwrap_or(path).to_path_buf();
                    found.push(InputFile {
                        source: path.to_path_buf(),
                        relative,
                    });
                }
            }
            found.sort_by(|a, b| a.relative.cmp(&b.relative));
            files.extend(found);
        } else if input.is_file() {
            let relative = input
                .file_name()
                .map(PathBuf::from)
                .ok_or_else(|| BatchError::InputNotFound(input.clone()))?;
            files.push(InputFile {
                source: input.clone(),
                relative,
            });
        } else {
            return Err(BatchError::InputNotFound(input.clone()));
        }
    }

    let mut seen: HashMap<&Path, &Path> = HashMap::new();
    for file in &files {
        if let Some(first) = seen.insert(&file.relative, &file.source) {
            return Err(BatchError::DuplicateOutput {
                relative: file.relative.clone(),
                first: first.to_path_buf(),
                second: file.source.clone(),
            });
        }
    }

    Ok(files)
}

fn process_file<C, F>(
    manager: &FilterManager<C, F>,
    filter_set: &str,
    file: &InputFile,
    output_dir: &Path,
) -> Result<BatchEvent, FileError>
where
    C: Codec,
    F: FilterConfiguration,
{
    let binary = Binary::from_path(&file.source)?;
    let filtered = manager.apply_filter_set(&binary, filter_set)?;

    let output = output_dir.join(&file.relative);
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let output_bytes = filtered.len();
    std::fs::write(&output, filtered.into_content())?;

    Ok(BatchEvent::Processed {
        source: file.source.clone(),
        output,
        input_bytes: binary.len(),
        output_bytes,
    })
}

/// Apply `filter_set` to every file, writing results under `output_dir`.
///
/// The filter set is resolved once up front, so an unknown name fails the
/// whole batch before any file is read.
pub fn run_batch<C, F>(
    manager: &FilterManager<C, F>,
    filter_set: &str,
    files: &[InputFile],
    output_dir: &Path,
    events: Option<Sender<BatchEvent>>,
) -> Result<BatchSummary, BatchError>
where
    C: Codec,
    F: FilterConfiguration + Sync,
{
    manager.resolve(filter_set)?;
    std::fs::create_dir_all(output_dir)?;

    let results: Vec<BatchEvent> = files
        .par_iter()
        .map(|file| {
            let event = process_file(manager, filter_set, file, output_dir).unwrap_or_else(|e| {
                warn!(source = %file.source.display(), error = %e, "failed to filter image");
                BatchEvent::Failed {
                    source: file.source.clone(),
                    error: e.to_string(),
                }
            });
            if let Some(tx) = &events {
                tx.send(event.clone()).ok();
            }
            event
        })
        .collect();

    let failed = results
        .iter()
        .filter(|e| matches!(e, BatchEvent::Failed { .. }))
        .count();
    Ok(BatchSummary {
        processed: results.len() - failed,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FiltersConfig;
    use crate::filter::TransformRegistry;
    use crate::imaging::{RustCodec, register_builtin_transforms};
    use crate::test_helpers::{create_test_jpeg, create_test_png};
    use image::GenericImageView;
    use std::fs;
    use tempfile::TempDir;

    fn manager() -> FilterManager<RustCodec, FiltersConfig> {
        let config: FiltersConfig = toml::from_str(
            r#"
[filter_sets.thumbnail]
quality = 80
[[filter_sets.thumbnail.filters]]
type = "thumbnail"
size = [20, 20]
mode = "outbound"
"#,
        )
        .unwrap();
        let mut registry = TransformRegistry::new();
        register_builtin_transforms(&mut registry);
        FilterManager::with_registry(config, RustCodec::new(), registry)
    }

    #[test]
    fn supported_image_extensions() {
        assert!(is_supported_image(Path::new("a.jpg")));
        assert!(is_supported_image(Path::new("a.PNG")));
        assert!(is_supported_image(Path::new("a.webp")));
        assert!(!is_supported_image(Path::new("a.avif")));
        assert!(!is_supported_image(Path::new("a.txt")));
        assert!(!is_supported_image(Path::new("noext")));
    }

    #[test]
    fn collect_inputs_walks_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("photos");
        fs::create_dir_all(root.join("trips")).unwrap();
        fs::write(root.join("b.png"), b"x").unwrap();
        fs::write(root.join("trips/a.jpg"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();

        let files = collect_inputs(&[root.clone()]).unwrap();
        let relative: Vec<PathBuf> = files.iter().map(|f| f.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("b.png"), PathBuf::from("trips/a.jpg")]
        );
    }

    #[test]
    fn collect_inputs_accepts_single_files() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("one.png");
        fs::write(&file, b"x").unwrap();

        let files = collect_inputs(&[file.clone()]).unwrap();
        assert_eq!(
            files,
            vec![InputFile {
                source: file,
                relative: PathBuf::from("one.png"),
            }]
        );
    }

    #[test]
    fn collect_inputs_rejects_clashing_file_names() {
        let tmp = TempDir::new().unwrap();
        for dir in ["a", "b"] {
            fs::create_dir_all(tmp.path().join(dir)).unwrap();
            fs::write(tmp.path().join(dir).join("x.png"), b"x").unwrap();
        }

        let result = collect_inputs(&[tmp.path().join("a/x.png"), tmp.path().join("b/x.png")]);
        match result {
            Err(BatchError::DuplicateOutput {
                relative,
                first,
                second,
            }) => {
                assert_eq!(relative, PathBuf::from("x.png"));
                assert_eq!(first, tmp.path().join("a/x.png"));
                assert_eq!(second, tmp.path().join("b/x.png"));
            }
            other => panic!("expected DuplicateOutput, got {other:?}"),
        }
    }

    #[test]
    fn collect_inputs_rejects_overlapping_directories() {
        let tmp = TempDir::new().unwrap();
        for dir in ["one", "two"] {
            fs::create_dir_all(tmp.path().join(dir).join("sub")).unwrap();
            fs::write(tmp.path().join(dir).join("sub/y.jpg"), b"x").unwrap();
        }

        let result = collect_inputs(&[tmp.path().join("one"), tmp.path().join("two")]);
        assert!(matches!(
            result,
            Err(BatchError::DuplicateOutput { ref relative, .. }) if relative == Path::new("sub/y.jpg")
        ));
    }

    #[test]
    fn collect_inputs_missing_path_errors() {
        let tmp = TempDir::new().unwrap();
        let result = collect_inputs(&[tmp.path().join("missing")]);
        assert!(matches!(result, Err(BatchError::InputNotFound(_))));
    }

    #[test]
    fn run_batch_writes_outputs_and_reports_failures() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("in");
        fs::create_dir_all(input.join("sub")).unwrap();
        fs::write(input.join("a.png"), create_test_png(64, 48)).unwrap();
        fs::write(input.join("sub/b.jpg"), create_test_jpeg(30, 90)).unwrap();
        fs::write(input.join("broken.png"), b"not an image").unwrap();

        let output = tmp.path().join("out");
        let files = collect_inputs(&[input]).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();

        let summary = run_batch(&manager(), "thumbnail", &files, &output, Some(tx)).unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                processed: 2,
                failed: 1
            }
        );

        let events: Vec<BatchEvent> = rx.iter().collect();
        assert_eq!(events.len(), 3);

        let png = image::load_from_memory(&fs::read(output.join("a.png")).unwrap()).unwrap();
        assert_eq!(png.dimensions(), (20, 20));
        let jpg = fs::read(output.join("sub/b.jpg")).unwrap();
        assert_eq!(image::guess_format(&jpg).unwrap(), ImageFormat::Jpeg);
        assert!(!output.join("broken.png").exists());
    }

    #[test]
    fn run_batch_unknown_filter_set_fails_up_front() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("out");
        let result = run_batch(&manager(), "missing", &[], &output, None);
        assert!(matches!(result, Err(BatchError::Filter(_))));
        assert!(!output.exists());
    }
}

//! Asset staging: copy input images and font assets into the output workspace.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::base_name;
use crate::error::{PosterError, Result};

pub struct AssetStager {
    font_root: PathBuf,
    font_dir_name: String,
}

impl AssetStager {
    pub fn new(font_root: impl Into<PathBuf>, font_dir_name: impl Into<String>) -> Self {
        Self {
            font_root: font_root.into(),
            font_dir_name: font_dir_name.into(),
        }
    }

    /// Copy `input_dir` to `output_dir/<basename(input_dir)>` and every font
    /// subdirectory to `output_dir/<font_dir_name>/`. Existing files are
    /// overwritten, so staging twice is harmless.
    ///
    /// Returns the staged image directory.
    pub fn stage(&self, input_dir: &Path, output_dir: &Path) -> Result<PathBuf> {
        if !input_dir.is_dir() {
            return Err(PosterError::InputNotFound {
                path: input_dir.to_path_buf(),
            });
        }
        if !self.font_root.is_dir() {
            return Err(PosterError::FontRootNotFound {
                path: self.font_root.clone(),
            });
        }

        fs::create_dir_all(output_dir).map_err(|e| PosterError::io(output_dir, e))?;

        let fonts_dest = output_dir.join(&self.font_dir_name);
        for subdir in self.font_subdirs()? {
            let name = base_name(&subdir);
            copy_tree(&subdir, &fonts_dest.join(name))?;
        }

        let staged = output_dir.join(base_name(input_dir));
        let copied = copy_tree(input_dir, &staged)?;
        info!(
            input = %input_dir.display(),
            staged = %staged.display(),
            files = copied,
            "staged input assets"
        );
        Ok(staged)
    }

    fn font_subdirs(&self) -> Result<Vec<PathBuf>> {
        let mut dirs = vec![];
        for entry in fs::read_dir(&self.font_root).map_err(|e| PosterError::io(&self.font_root, e))? {
            let path = entry.map_err(|e| PosterError::io(&self.font_root, e))?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

/// Recursively copy `src` into `dst`, merging with whatever is already there.
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry?;
        let Ok(rel) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| PosterError::io(&target, e))?;
        } else {
            debug!(from = %entry.path().display(), to = %target.display(), "copy");
            // fs::copy opens the target for writing and would fail on a
            // read-only copy left by an earlier run
            if target.symlink_metadata().is_ok() {
                fs::remove_file(&target).map_err(|e| PosterError::io(&target, e))?;
            }
            fs::copy(entry.path(), &target).map_err(|e| PosterError::io(&target, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_copy_tree_nested() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        write(&src.join("a.svg"), "a");
        write(&src.join("nested/b.svg"), "b");

        let dst = tmp.path().join("dst");
        let copied = copy_tree(&src, &dst).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("a.svg")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dst.join("nested/b.svg")).unwrap(), "b");
    }

    #[test]
    fn test_copy_tree_overwrites_existing() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        write(&src.join("a.svg"), "new");
        let dst = tmp.path().join("dst");
        write(&dst.join("a.svg"), "old");
        write(&dst.join("keep.txt"), "kept");

        copy_tree(&src, &dst).unwrap();

        assert_eq!(fs::read_to_string(dst.join("a.svg")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst.join("keep.txt")).unwrap(), "kept");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_replaces_read_only_copy() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        write(&src.join("font.ttf"), "v1");
        fs::set_permissions(src.join("font.ttf"), fs::Permissions::from_mode(0o444)).unwrap();
        let dst = tmp.path().join("dst");

        copy_tree(&src, &dst).unwrap();
        assert!(fs::metadata(dst.join("font.ttf")).unwrap().permissions().readonly());

        fs::set_permissions(src.join("font.ttf"), fs::Permissions::from_mode(0o644)).unwrap();
        fs::write(src.join("font.ttf"), "v2").unwrap();
        fs::set_permissions(src.join("font.ttf"), fs::Permissions::from_mode(0o444)).unwrap();

        let copied = copy_tree(&src, &dst).unwrap();

        assert_eq!(copied, 1);
        assert_eq!(fs::read_to_string(dst.join("font.ttf")).unwrap(), "v2");
    }

    #[test]
    fn test_only_font_subdirectories_are_copied() {
        let tmp = tempdir().unwrap();
        let fonts = tmp.path().join("fonts");
        write(&fonts.join("roboto/Roboto.ttf"), "font");
        write(&fonts.join("README.md"), "not a font family");
        let input = tmp.path().join("figs");
        write(&input.join("x_1.svg"), "<svg/>");
        let out = tmp.path().join("out");

        let staged = AssetStager::new(&fonts, "fonts").stage(&input, &out).unwrap();

        assert_eq!(staged, out.join("figs"));
        assert!(out.join("figs/x_1.svg").is_file());
        assert!(out.join("fonts/roboto/Roboto.ttf").is_file());
        assert!(!out.join("fonts/README.md").exists());
    }

    #[test]
    fn test_missing_input_rejected() {
        let tmp = tempdir().unwrap();
        let fonts = tmp.path().join("fonts");
        fs::create_dir_all(&fonts).unwrap();
        let err = AssetStager::new(&fonts, "fonts")
            .stage(&tmp.path().join("nope"), &tmp.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, PosterError::InputNotFound { .. }));
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn test_missing_font_root_rejected() {
        let tmp = tempdir().unwrap();
        let input = tmp.path().join("figs");
        fs::create_dir_all(&input).unwrap();
        let err = AssetStager::new(tmp.path().join("nofonts"), "fonts")
            .stage(&input, &tmp.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, PosterError::FontRootNotFound { .. }));
    }
}

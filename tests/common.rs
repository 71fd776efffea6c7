#![allow(dead_code)]

use image::{ImageFormat, Rgb, RgbImage};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

/// Writes `len` bytes of filler to `path`, creating parent directories.
pub fn write_sized_file(path: &Path, len: usize) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path)
        .unwrap()
        .write_all(&vec![0xAB; len])
        .unwrap();
    path.to_path_buf()
}

/// Writes a small gradient image in the format implied by the extension.
pub fn write_real_image(path: &Path, width: u32, height: u32) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    });
    let format = ImageFormat::from_path(path).unwrap();
    img.save_with_format(path, format).unwrap();
    path.to_path_buf()
}

/// a.jpg (1000 B), b.png (2000 B) and c.txt at the top level.
pub fn create_scenario_files(dir: &Path) {
    write_sized_file(&dir.join("a.jpg"), 1000);
    write_sized_file(&dir.join("b.png"), 2000);
    write_sized_file(&dir.join("c.txt"), 10);
}

/// Top-level images plus a nested and a doubly nested one.
pub fn create_nested_directory_structure(dir: &Path) -> Vec<PathBuf> {
    vec![
        write_sized_file(&dir.join("top.jpg"), 100),
        write_sized_file(&dir.join("sub").join("nested.png"), 100),
        write_sized_file(&dir.join("sub").join("notes.txt"), 100),
        write_sized_file(&dir.join("sub").join("deeper").join("deep.webp"), 100),
    ]
}

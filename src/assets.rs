// assets.rs — image decoding, off-thread panorama loading, fallback icon.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

use image::io::Reader as ImageReader;
use image::{GenericImageView, Rgba, RgbaImage};
use log::{debug, error};

use crate::error::AssetError;

/// Decodes an image file to RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, AssetError> {
    let file = File::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let img = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let (w, h) = img.dimensions();
    debug!("decoded {} ({w}x{h})", path.display());
    Ok(img.to_rgba8())
}

/// Decodes a panorama on a worker thread and delivers the result to the
/// frame loop over the channel, tagged with the path it was decoded
/// from. The tag lets the receiver drop results that no longer match
/// the panorama it is waiting for; a matching `Ok` pairs with
/// `texture_ready` and a matching `Err` with `texture_failed`.
pub fn spawn_load_panorama(path: PathBuf, tx: Sender<(PathBuf, Result<RgbaImage, AssetError>)>) {
    thread::spawn(move || {
        debug!("loading panorama {} in background", path.display());
        let result = load_image(&path);
        if let Err(e) = &result {
            error!("{e}");
        }
        if tx.send((path, result)).is_err() {
            error!("frame loop went away before panorama finished loading");
        }
    });
}

/// Loads the shared marker icon, falling back to a generated glyph when
/// the file is missing so markers are never invisible.
pub fn load_marker_icon(path: &Path) -> RgbaImage {
    match load_image(path) {
        Ok(img) => img,
        Err(e) => {
            log::warn!("{e}; using generated marker icon");
            generated_icon()
        }
    }
}

/// A simple "information" glyph: white disc, dark ring, dark dot and
/// stem, transparent corners.
fn generated_icon() -> RgbaImage {
    const SIZE: u32 = 64;
    let center = (SIZE as f32 - 1.0) / 2.0;
    let radius = SIZE as f32 * 0.45;

    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let d = (dx * dx + dy * dy).sqrt();

        if d > radius {
            return Rgba([0, 0, 0, 0]);
        }
        if d > radius - 3.0 {
            return Rgba([40, 70, 120, 255]);
        }

        // Dot above, stem below.
        let in_dot = dy > -18.0 && dy < -10.0 && dx.abs() < 4.0;
        let in_stem = dy > -4.0 && dy < 16.0 && dx.abs() < 4.0;
        if in_dot || in_stem {
            Rgba([40, 70, 120, 255])
        } else {
            Rgba([240, 245, 250, 255])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_is_an_open_error() {
        let err = load_image(Path::new("does/not/exist.jpeg")).unwrap_err();
        assert!(matches!(err, AssetError::Open { .. }));
    }

    #[test]
    fn generated_icon_has_transparent_corners_and_opaque_center() {
        let icon = generated_icon();
        assert_eq!(icon.get_pixel(0, 0).0[3], 0);
        assert_eq!(icon.get_pixel(32, 32).0[3], 255);
    }

    #[test]
    fn background_decode_is_tagged_with_its_path() {
        let (tx, rx) = std::sync::mpsc::channel();
        spawn_load_panorama(PathBuf::from("does/not/exist.jpeg"), tx);
        let (path, result) = rx.recv().unwrap();
        assert_eq!(path, PathBuf::from("does/not/exist.jpeg"));
        assert!(matches!(result, Err(AssetError::Open { .. })));
    }

    #[test]
    fn missing_icon_falls_back_to_generated() {
        let icon = load_marker_icon(Path::new("does/not/exist.png"));
        assert_eq!(icon.dimensions(), (64, 64));
    }
}

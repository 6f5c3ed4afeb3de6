use std::fs;
use std::path::PathBuf;

use image::DynamicImage;
use url::Url;

use super::error::ClassificationError;

/// Resolves an image URI to a local path.
///
/// Accepts `file://` URIs and plain filesystem paths. Other schemes are
/// rejected.
pub fn resolve_uri(uri: &str) -> Result<PathBuf, ClassificationError> {
    if uri.trim().is_empty() {
        return Err(ClassificationError::UnsupportedUri(uri.to_string()));
    }

    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| ClassificationError::UnsupportedUri(uri.to_string())),
        // Single-letter schemes are Windows drive letters
        Ok(url) if url.scheme().len() == 1 => Ok(PathBuf::from(uri)),
        Ok(_) => Err(ClassificationError::UnsupportedUri(uri.to_string())),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(PathBuf::from(uri)),
        Err(_) => Err(ClassificationError::UnsupportedUri(uri.to_string())),
    }
}

/// Reads and decodes the image behind `uri`. The format is detected from
/// the file contents, not its extension.
pub fn load_image(uri: &str) -> Result<DynamicImage, ClassificationError> {
    let path = resolve_uri(uri)?;
    let bytes = fs::read(&path).map_err(|source| ClassificationError::ImageRead {
        uri: uri.to_string(),
        source,
    })?;
    image::load_from_memory(&bytes).map_err(|source| ClassificationError::ImageDecode {
        uri: uri.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    #[test]
    fn test_resolve_plain_path() {
        assert_eq!(resolve_uri("/tmp/photo.jpg").unwrap(), PathBuf::from("/tmp/photo.jpg"));
        assert_eq!(resolve_uri("photo.jpg").unwrap(), PathBuf::from("photo.jpg"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_file_uri() {
        assert_eq!(
            resolve_uri("file:///tmp/my%20photo.png").unwrap(),
            PathBuf::from("/tmp/my photo.png")
        );
    }

    #[test]
    fn test_rejects_remote_and_empty() {
        assert!(matches!(
            resolve_uri("https://example.com/a.png"),
            Err(ClassificationError::UnsupportedUri(_))
        ));
        assert!(matches!(resolve_uri(""), Err(ClassificationError::UnsupportedUri(_))));
    }

    #[test]
    fn test_load_detects_format_from_contents() {
        let dir = TempDir::new().unwrap();
        let png = dir.path().join("scan.png");
        RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])).save(&png).unwrap();
        let renamed = dir.path().join("scan.bin");
        fs::rename(&png, &renamed).unwrap();

        let image = load_image(renamed.to_str().unwrap()).unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
    }

    #[test]
    fn test_load_missing_and_corrupt() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            load_image(missing.to_str().unwrap()),
            Err(ClassificationError::ImageRead { .. })
        ));

        let corrupt = dir.path().join("corrupt.png");
        fs::write(&corrupt, b"not an image").unwrap();
        assert!(matches!(
            load_image(corrupt.to_str().unwrap()),
            Err(ClassificationError::ImageDecode { .. })
        ));
    }
}

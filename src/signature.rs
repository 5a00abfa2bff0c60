//! Turning signature images submitted as base64 into files the renderer can embed.

use crate::letter::Signer;
use crate::LetterError;
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Decode a base64 signature image (optionally prefixed with a `data:image/...;base64,` data
/// URI header), convert it to 8-bit RGB, and save it as a new temporary PNG.
///
/// Returns [None] if anything goes wrong; the reason is logged. The temporary file is left in
/// place for the caller to clean up.
pub fn normalize(signature_data: &str) -> Option<PathBuf> {
    match try_normalize(signature_data) {
        Ok(path) => Some(path),
        Err(e) => {
            warn!(error = %e, "error processing signature image");
            None
        }
    }
}

/// Like [normalize], but reports why the signature couldn't be processed
pub fn try_normalize(signature_data: &str) -> Result<PathBuf, LetterError> {
    // line-wrapped base64 (MIME style) decodes the same as a single line
    let payload: String = strip_data_uri(signature_data)?
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = general_purpose::STANDARD.decode(payload)?;

    let image = image::load_from_memory(&bytes)?;
    let image = match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let file = tempfile::Builder::new()
        .prefix("signature-")
        .suffix(".png")
        .tempfile()?;
    let (_, path) = file.keep().map_err(|e| e.error)?;
    image.save_with_format(&path, ImageFormat::Png)?;

    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "normalized signature image"
    );
    Ok(path)
}

fn strip_data_uri(signature_data: &str) -> Result<&str, LetterError> {
    if signature_data.starts_with("data:image") {
        signature_data
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or(LetterError::DataUri)
    } else {
        Ok(signature_data)
    }
}

/// Give every signer that submitted raw signature data, but no image path, a normalized image
/// file. Signers whose data can't be decoded keep no image and are signed in the signature
/// font instead.
pub fn resolve_signatures(signers: &mut [Signer]) {
    for signer in signers.iter_mut() {
        if signer.signature_image_path.is_some() {
            continue;
        }
        if let Some(data) = signer.signature_data.as_deref() {
            signer.signature_image_path = normalize(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_base64() -> String {
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(6, 3, Rgba([10, 20, 30, 255])))
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        general_purpose::STANDARD.encode(png.into_inner())
    }

    fn assert_rgb_png(path: &PathBuf) {
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (6, 3));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn plain_base64_png() {
        let path = normalize(&png_base64()).expect("normalizes");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert_rgb_png(&path);
    }

    #[test]
    fn line_wrapped_base64_png() {
        let encoded = png_base64();
        let wrapped = encoded
            .as_bytes()
            .chunks(16)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert!(wrapped.contains('\n'));

        let data = format!("data:image/png;base64,\n{wrapped}\n");
        let path = normalize(&data).expect("normalizes");
        assert_rgb_png(&path);
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        let data = format!("data:image/png;base64,{}", png_base64());
        let path = normalize(&data).expect("normalizes");
        assert_rgb_png(&path);
    }

    #[test]
    fn every_call_gets_its_own_file() {
        let data = png_base64();
        let a = normalize(&data).unwrap();
        let b = normalize(&data).unwrap();
        assert_ne!(a, b);
        assert_rgb_png(&a);
        assert_rgb_png(&b);
    }

    #[test]
    fn corrupted_base64_is_none() {
        assert!(normalize("not*base64!!").is_none());
        assert!(matches!(
            try_normalize("not*base64!!"),
            Err(LetterError::Base64(_))
        ));
    }

    #[test]
    fn valid_base64_that_is_not_an_image_is_none() {
        let data = general_purpose::STANDARD.encode(b"hello, world");
        assert!(normalize(&data).is_none());
        assert!(matches!(try_normalize(&data), Err(LetterError::Image(_))));
    }

    #[test]
    fn data_uri_without_payload_is_none() {
        assert!(matches!(
            try_normalize("data:image/png;base64"),
            Err(LetterError::DataUri)
        ));
    }

    #[test]
    fn resolve_fills_paths_from_signature_data() {
        let mut with_data = Signer::new("A", "HOD", "2024-01-01");
        with_data.signature_data = Some(png_base64());
        let mut bad_data = Signer::new("B", "Dean", "2024-01-01");
        bad_data.signature_data = Some("%%%".into());
        let mut preset = Signer::new("C", "Registrar", "2024-01-01");
        preset.signature_image_path = Some("/already/set.png".into());
        preset.signature_data = Some(png_base64());

        let mut signers = vec![with_data, bad_data, preset];
        resolve_signatures(&mut signers);

        let resolved = signers[0].signature_image_path.clone().expect("resolved");
        assert_rgb_png(&resolved);
        assert!(signers[1].signature_image_path.is_none());
        assert_eq!(
            signers[2].signature_image_path,
            Some(PathBuf::from("/already/set.png"))
        );
    }
}

use crate::refs::{ObjectReferences, RefType};
use crate::LetterError;
use id_arena::Id;
use image::{ColorType, DynamicImage, GenericImageView, ImageFormat};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Pdf};
use std::path::Path;

/// Pixel data ready to be embedded in the document
pub enum RasterImage {
    /// RGB JPEG data that PDF readers can decode themselves
    DirectlyEmbeddableJpeg(Vec<u8>),
    Decoded(DynamicImage),
}

/// A raster image (typically a scanned or drawn signature) that can be placed on pages.
/// `width` and `height` are the pixel dimensions; placement on the page decides the
/// printed size.
pub struct Image {
    pub image: RasterImage,
    pub width: u32,
    pub height: u32,
}

struct EncodeOutput<'a> {
    filter: Filter,
    bytes: std::borrow::Cow<'a, [u8]>,
    mask: Option<Vec<u8>>,
}

impl Image {
    /// Load an image from disk, guessing its format from its contents
    pub fn new_from_disk<P: AsRef<Path>>(path: P) -> Result<Image, LetterError> {
        let data = std::fs::read(path.as_ref())?;
        let format = image::guess_format(&data)?;
        let image = image::load_from_memory_with_format(&data, format)?;

        match (format, image.color()) {
            (ImageFormat::Jpeg, ColorType::Rgb8) => {
                let (width, height) = image.dimensions();
                Ok(Image {
                    image: RasterImage::DirectlyEmbeddableJpeg(data),
                    width,
                    height,
                })
            }
            _ => Ok(Self::new_raster(image)),
        }
    }

    pub fn new_raster(image: DynamicImage) -> Image {
        let (width, height) = image.dimensions();
        Image {
            image: RasterImage::Decoded(image),
            width,
            height,
        }
    }

    fn encode(&self) -> EncodeOutput<'_> {
        match &self.image {
            RasterImage::DirectlyEmbeddableJpeg(bytes) => EncodeOutput {
                filter: Filter::DctDecode,
                bytes: bytes.as_slice().into(),
                mask: None,
            },
            RasterImage::Decoded(image) => {
                let level = CompressionLevel::DefaultLevel as u8;

                let mask = image.color().has_alpha().then(|| {
                    let alphas: Vec<u8> = image.pixels().map(|p| (p.2).0[3]).collect();
                    compress_to_vec_zlib(&alphas, level)
                });

                let bytes = compress_to_vec_zlib(image.to_rgb8().as_raw(), level);

                EncodeOutput {
                    filter: Filter::FlateDecode,
                    bytes: bytes.into(),
                    mask,
                }
            }
        }
    }

    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        id: Id<Image>,
        writer: &mut Pdf,
    ) -> Result<(), LetterError> {
        let image_index = id.index();
        let image_id = refs.get_or_gen(RefType::Image(image_index));
        let encoded = self.encode();

        let mask_id = encoded
            .mask
            .as_ref()
            .map(|_| refs.gen(RefType::ImageMask(image_index)));

        let mut image = writer.image_xobject(image_id, &encoded.bytes);
        image.filter(encoded.filter);
        image.width(self.width as i32);
        image.height(self.height as i32);
        image.color_space().device_rgb();
        image.bits_per_component(8);
        if let Some(mask_id) = mask_id {
            image.s_mask(mask_id);
        }
        image.finish();

        // transparent signatures keep their alpha as a soft mask
        if let (Some(mask_id), Some(mask)) = (mask_id, encoded.mask.as_ref()) {
            let mut s_mask = writer.image_xobject(mask_id, mask);
            s_mask.filter(Filter::FlateDecode);
            s_mask.width(self.width as i32);
            s_mask.height(self.height as i32);
            s_mask.color_space().device_gray();
            s_mask.bits_per_component(8);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn png_signatures_are_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sig.png");
        RgbaImage::from_pixel(12, 5, Rgba([0, 0, 0, 128]))
            .save(&path)
            .unwrap();

        let image = Image::new_from_disk(&path).unwrap();
        assert_eq!((image.width, image.height), (12, 5));
        assert!(matches!(image.image, RasterImage::Decoded(_)));
        assert!(image.encode().mask.is_some());
    }

    #[test]
    fn rgb_jpegs_are_embedded_directly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sig.jpg");
        RgbImage::from_pixel(8, 8, Rgb([20, 40, 60])).save(&path).unwrap();

        let image = Image::new_from_disk(&path).unwrap();
        assert!(matches!(
            image.image,
            RasterImage::DirectlyEmbeddableJpeg(_)
        ));
        let encoded = image.encode();
        assert!(encoded.mask.is_none());
        assert_eq!(encoded.filter, Filter::DctDecode);
    }

    #[test]
    fn garbage_is_an_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sig.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        assert!(Image::new_from_disk(&path).is_err());
    }
}

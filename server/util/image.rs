/// Image encoding helpers for responses and the demo pages.
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, GrayImage, ImageFormat, ImageOutputFormat};

/// Encodes the normalized grayscale grid as PNG, then base64.
pub fn grayscale_png_base64(gray: &GrayImage) -> Result<String, image::ImageError> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(gray.clone()).write_to(&mut out, ImageOutputFormat::Png)?;
    Ok(STANDARD.encode(out.into_inner()))
}

/// MIME type of an uploaded image, sniffed from its magic bytes.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png)  => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Gif)  => "image/gif",
        Ok(ImageFormat::Bmp)  => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// `data:` URI for embedding raw upload bytes in an `<img>` tag.
pub fn data_uri(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn processed_image_decodes_back_to_same_grid() {
        let gray = GrayImage::from_fn(5, 3, |x, y| Luma([(x * 40 + y) as u8]));
        let encoded = grayscale_png_base64(&gray).unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(sniff_mime(&bytes), "image/png");
        let back = image::load_from_memory(&bytes).unwrap().to_luma8();
        assert_eq!(back, gray);
    }

    #[test]
    fn unknown_bytes_are_octet_stream() {
        assert_eq!(sniff_mime(b"hello"), "application/octet-stream");
        assert!(data_uri(b"hello").starts_with("data:application/octet-stream;base64,"));
    }
}

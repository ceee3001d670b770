use qrcode::render::svg;
use qrcode::QrCode;

#[derive(thiserror::Error, Debug)]
pub enum QrGenerationError {
    #[error("QR code generation failed: {0}")]
    QrCodeError(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    PngError(#[from] image::ImageError),
}

/// Renders an encoded pass payload as an SVG QR code.
pub fn generate_qr_svg(payload: &str) -> Result<String, QrGenerationError> {
    let code = QrCode::new(payload.as_bytes())?;
    let svg = code.render::<svg::Color>().min_dimensions(200, 200).build();
    Ok(svg)
}

/// Renders an encoded pass payload as a PNG QR code.
pub fn generate_qr_png(payload: &str) -> Result<Vec<u8>, QrGenerationError> {
    use image::{ImageBuffer, Luma};

    let code = QrCode::new(payload.as_bytes())?;

    // Each module is 10x10 pixels
    let module_size = 10u32;
    let width = code.width() as u32;
    let img_size = width * module_size;

    let mut img = ImageBuffer::<Luma<u8>, Vec<u8>>::new(img_size, img_size);

    for (x, y, color) in img.enumerate_pixels_mut() {
        let module_x = x / module_size;
        let module_y = y / module_size;
        let pixel_value = match code[(module_x as usize, module_y as usize)] {
            qrcode::types::Color::Dark => Luma([0u8]),
            qrcode::types::Color::Light => Luma([255u8]),
        };
        *color = pixel_value;
    }

    let mut png_data = Vec::new();
    image::DynamicImage::ImageLuma8(img).write_to(
        &mut std::io::Cursor::new(&mut png_data),
        image::ImageFormat::Png,
    )?;

    Ok(png_data)
}

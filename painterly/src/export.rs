//! PNG export for painterly maps

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::buffer::{MapBuffer, PainterlyMaps};

/// File name of the exported normal map
pub const NORMAL_MAP_FILE: &str = "normal_map_painterly.png";
/// File name of the exported color map
pub const COLOR_MAP_FILE: &str = "color_map_painterly.png";

/// Encode a [`MapBuffer`] as an 8-bit RGBA PNG.
///
/// Channels are clamped to [0, 1] and rounded. Rows are written top-down, so
/// buffer row 0 (v = 0) ends up on the bottom edge of the image.
///
/// # Example
/// ```no_run
/// use painterly::buffer::{MapBuffer, FLAT_NORMAL};
/// use painterly::export::write_png;
/// use std::path::Path;
///
/// let flat = MapBuffer::filled(64, 64, FLAT_NORMAL);
/// write_png(&flat, Path::new("flat_normal.png"))?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn write_png(buffer: &MapBuffer, path: &Path) -> std::io::Result<()> {
    let data = buffer.to_rgba8_top_down();
    let out = BufWriter::new(File::create(path)?);

    let mut encoder = png::Encoder::new(out, buffer.width, buffer.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header().map_err(std::io::Error::other)?;
    writer.write_image_data(&data).map_err(std::io::Error::other)?;
    writer.finish().map_err(std::io::Error::other)
}

/// Write both maps into `dir`, returning the (normal, color) paths
pub fn write_maps(maps: &PainterlyMaps, dir: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;

    let normal_path = dir.join(NORMAL_MAP_FILE);
    let color_path = dir.join(COLOR_MAP_FILE);

    write_png(&maps.normal, &normal_path)?;
    write_png(&maps.color, &color_path)?;

    tracing::info!("Painterly normal map saved to: {}", normal_path.display());
    tracing::info!("Painterly color map saved to: {}", color_path.display());

    Ok((normal_path, color_path))
}

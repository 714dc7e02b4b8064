//! Shared helpers for the example binaries: tracing setup and a minimal
//! PNG snapshot of a synthesized pattern.
use disk_scatter::prelude::*;
use image::{Rgb, RgbImage};
use tracing_subscriber::EnvFilter;

/// Initializes a fmt subscriber honoring `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Fill color for one class of disks.
#[derive(Debug, Clone, Copy)]
pub struct ClassStyle {
    pub color: [u8; 3],
}

/// Renders disk classes into a square PNG. The domain `[0, domain_length]²`
/// maps onto the full image; disks are drawn as filled circles in class
/// order, so later classes paint over earlier ones.
pub fn render_pattern_to_png(
    path: &str,
    classes: &[(Vec<Disk>, ClassStyle)],
    domain_length: f32,
    image_size: u32,
) -> anyhow::Result<()> {
    let mut img = RgbImage::from_pixel(image_size, image_size, Rgb([26, 26, 26]));
    let scale = image_size as f32 / domain_length;

    for (disks, style) in classes {
        for disk in disks {
            let cx = disk.x * scale;
            let cy = disk.y * scale;
            let radius = (disk.r * scale).max(1.0);
            let x_min = (cx - radius).floor().max(0.0) as u32;
            let x_max = ((cx + radius).ceil() as u32).min(image_size.saturating_sub(1));
            let y_min = (cy - radius).floor().max(0.0) as u32;
            let y_max = ((cy + radius).ceil() as u32).min(image_size.saturating_sub(1));
            for py in y_min..=y_max {
                for px in x_min..=x_max {
                    let dx = px as f32 + 0.5 - cx;
                    let dy = py as f32 + 0.5 - cy;
                    if dx * dx + dy * dy <= radius * radius {
                        img.put_pixel(px, py, Rgb(style.color));
                    }
                }
            }
        }
    }

    img.save(path)?;
    Ok(())
}

//! Raster depth-map to PLY preprocessor
//!
//! Converts every depth raster in a directory into a PLY point cloud,
//! using either a pinhole camera model or an orthographic height field.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use curvseg_io::{
    depth_to_point_cloud, height_field_to_point_cloud, DepthMap, PinholeIntrinsics,
    PlyWriter, PointCloudWriter,
};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Projection {
    /// Pinhole camera model: X = (u - cx) * Z / fx
    Pinhole,
    /// Orthographic height field: (u, v, depth)
    Ortho,
}

#[derive(Parser, Debug)]
#[command(about = "Convert raster depth maps into PLY point clouds")]
struct Args {
    /// Directory containing depth rasters (.tif/.tiff/.png)
    input_dir: PathBuf,

    /// Directory to write .ply files into
    output_dir: PathBuf,

    /// Projection model
    #[arg(long, value_enum, default_value_t = Projection::Pinhole)]
    projection: Projection,

    /// Focal length in x (pinhole only)
    #[arg(long, default_value_t = 1000.0)]
    fx: f32,

    /// Focal length in y (pinhole only)
    #[arg(long, default_value_t = 1000.0)]
    fy: f32,

    /// Multiplier applied to raw depth samples
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
}

fn is_depth_raster(path: &std::path::Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("tif") | Some("tiff") | Some("png")
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;

    let mut converted = 0usize;
    for entry in std::fs::read_dir(&args.input_dir)
        .with_context(|| format!("failed to read {}", args.input_dir.display()))?
    {
        let path = entry?.path();
        if !is_depth_raster(&path) {
            continue;
        }

        let depth_map = DepthMap::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;

        let cloud = match args.projection {
            Projection::Pinhole => {
                let intrinsics = PinholeIntrinsics {
                    fx: args.fx,
                    fy: args.fy,
                    depth_scale: args.scale,
                    ..PinholeIntrinsics::default()
                };
                depth_to_point_cloud(&depth_map, &intrinsics)
            }
            Projection::Ortho => height_field_to_point_cloud(&depth_map, args.scale),
        };

        let mut output = args.output_dir.join(path.file_stem().unwrap_or_default());
        output.set_extension("ply");
        PlyWriter::write_point_cloud(&cloud, &output)
            .with_context(|| format!("failed to write {}", output.display()))?;

        log::info!(
            "{} -> {} ({} points)",
            path.display(),
            output.display(),
            cloud.len()
        );
        converted += 1;
    }

    println!("converted {} depth rasters", converted);
    Ok(())
}

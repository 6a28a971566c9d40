//! PLY format support

use crate::{PointCloudReader, PointCloudWriter};
use curvseg_core::{ColoredPoint3f, Point3f, PointCloud, Result};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub struct PlyReader;
pub struct PlyWriter;

impl PointCloudReader for PlyReader {
    /// Read the vertex positions of a PLY file
    ///
    /// Color and normal properties are ignored on load; the classifier
    /// rewrites colors wholesale anyway.
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<PointCloud<Point3f>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let mut points = Vec::new();

        if let Some(vertex_element) = ply.payload.get("vertex") {
            for vertex in vertex_element {
                let x = extract_property_value(vertex, "x")?;
                let y = extract_property_value(vertex, "y")?;
                let z = extract_property_value(vertex, "z")?;

                points.push(Point3f::new(x, y, z));
            }
        }

        log::debug!("read {} points from PLY", points.len());
        Ok(PointCloud::from_points(points))
    }
}

impl PointCloudWriter for PlyWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3f>, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = cloud.len();
        for name in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        }
        ply.header.elements.add(vertex_element);

        let mut vertices = Vec::new();
        for point in cloud.iter() {
            let mut vertex = DefaultElement::new();
            vertex.insert("x".to_string(), Property::Float(point.x));
            vertex.insert("y".to_string(), Property::Float(point.y));
            vertex.insert("z".to_string(), Property::Float(point.z));
            vertices.push(vertex);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;

        Ok(())
    }
}

impl PlyWriter {
    /// Write a colored point cloud, emitting uchar red/green/blue properties
    pub fn write_colored_point_cloud<P: AsRef<Path>>(
        cloud: &PointCloud<ColoredPoint3f>,
        path: P,
    ) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = cloud.len();
        for name in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::Float),
            ));
        }
        for name in ["red", "green", "blue"] {
            vertex_element.properties.add(PropertyDef::new(
                name.to_string(),
                PropertyType::Scalar(ScalarType::UChar),
            ));
        }
        ply.header.elements.add(vertex_element);

        let mut vertices = Vec::new();
        for point in cloud.iter() {
            let mut vertex = DefaultElement::new();
            vertex.insert("x".to_string(), Property::Float(point.position.x));
            vertex.insert("y".to_string(), Property::Float(point.position.y));
            vertex.insert("z".to_string(), Property::Float(point.position.z));
            vertex.insert("red".to_string(), Property::UChar(point.color[0]));
            vertex.insert("green".to_string(), Property::UChar(point.color[1]));
            vertex.insert("blue".to_string(), Property::UChar(point.color[2]));
            vertices.push(vertex);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;

        Ok(())
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        _ => Err(curvseg_core::Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("curvseg-ply-test-{}-{}", std::process::id(), name));
        path
    }

    #[test]
    fn test_write_then_read_positions() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.5, -2.0, 3.25),
        ]);

        let path = temp_path("positions.ply");
        PlyWriter::write_point_cloud(&cloud, &path).unwrap();
        let loaded = PlyReader::read_point_cloud(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), cloud.len());
        assert_eq!(loaded[1], cloud[1]);
    }

    #[test]
    fn test_colored_write_loads_positions_only() {
        let cloud = PointCloud::from_points(vec![Point3f::new(1.0, 2.0, 3.0)])
            .with_uniform_color([0, 255, 0]);

        let path = temp_path("colored.ply");
        PlyWriter::write_colored_point_cloud(&cloud, &path).unwrap();
        let loaded = PlyReader::read_point_cloud(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], Point3f::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = PlyReader::read_point_cloud("/nonexistent/cloud.ply");
        assert!(result.is_err());
    }
}

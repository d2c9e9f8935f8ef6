use std::io::{self, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use picdump_types::Grid3D;

/// Write `grid` as a VTK XML `ImageData` file with one point array.
///
/// The array uses inline `format="binary"`: a base64 block holding the
/// payload size as a little-endian `u32`, followed by a separate base64
/// block of the `f32` values. Values are emitted x fastest, then y, then
/// z, which is the point order VTK expects for image data.
///
/// ```text
/// <VTKFile type="ImageData" byte_order="LittleEndian">
///   <ImageData WholeExtent="0 nx-1 0 ny-1 0 nz-1" ...>
///     <Piece Extent="...">
///       <PointData Scalars="Ex">
///         <DataArray Name="Ex" type="Float32" format="binary">
///           base64(len) base64(values)
/// ```
///
/// # Errors
///
/// I/O errors from `out`, or [`io::ErrorKind::InvalidInput`] when the grid
/// is too large for a `u32` size header.
pub fn write_image_data<W: Write>(out: &mut W, grid: &Grid3D, name: &str) -> io::Result<()> {
    let [nx, ny, nz] = grid.dims();
    let extent = format!(
        "0 {} 0 {} 0 {}",
        nx.saturating_sub(1),
        ny.saturating_sub(1),
        nz.saturating_sub(1)
    );

    let mut data = Vec::with_capacity(grid.len() * 4);
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                data.extend_from_slice(&grid.get(x, y, z).to_le_bytes());
            }
        }
    }
    let size = u32::try_from(data.len()).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "grid too large for a VTK size header")
    })?;

    writeln!(out, "<?xml version=\"1.0\"?>")?;
    writeln!(out, "<VTKFile type=\"ImageData\" byte_order=\"LittleEndian\">")?;
    writeln!(
        out,
        "<ImageData WholeExtent=\"{extent}\" Origin=\"0 0 0\" Spacing=\"1.0 1.0 1.0\">"
    )?;
    writeln!(out, "<Piece Extent=\"{extent}\">")?;
    writeln!(out, "<PointData Scalars=\"{name}\">")?;
    write!(out, "<DataArray Name=\"{name}\" type=\"Float32\" format=\"binary\">")?;
    out.write_all(STANDARD.encode(size.to_le_bytes()).as_bytes())?;
    out.write_all(STANDARD.encode(&data).as_bytes())?;
    writeln!(out, "</DataArray>")?;
    writeln!(out, "</PointData>")?;
    writeln!(out, "</Piece>")?;
    writeln!(out, "</ImageData>")?;
    writeln!(out, "</VTKFile>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn render(grid: &Grid3D, name: &str) -> String {
        let mut buf = Vec::new();
        write_image_data(&mut buf, grid, name).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn single_cell_document() {
        let mut g = Grid3D::zeros(1, 1, 1);
        g.set(0, 0, 0, 1.0);
        assert_snapshot!(render(&g, "Ex"), @r#"
        <?xml version="1.0"?>
        <VTKFile type="ImageData" byte_order="LittleEndian">
        <ImageData WholeExtent="0 0 0 0 0 0" Origin="0 0 0" Spacing="1.0 1.0 1.0">
        <Piece Extent="0 0 0 0 0 0">
        <PointData Scalars="Ex">
        <DataArray Name="Ex" type="Float32" format="binary">BAAAAA==AACAPw==</DataArray>
        </PointData>
        </Piece>
        </ImageData>
        </VTKFile>
        "#);
    }

    #[test]
    fn values_are_x_fastest() {
        // [x][y][z] = [[[1]], [[2]]]: x is the only axis with extent.
        let mut g = Grid3D::zeros(2, 1, 1);
        g.set(0, 0, 0, 1.0);
        g.set(1, 0, 0, 2.0);
        let doc = render(&g, "Bz");
        assert!(doc.contains("WholeExtent=\"0 1 0 0 0 0\""));
        assert!(doc.contains(">CAAAAA==AACAPwAAAEA=</DataArray>"));
    }

    #[test]
    fn payload_decodes_in_vtk_point_order() {
        let mut g = Grid3D::zeros(2, 2, 1);
        g.set(0, 0, 0, 0.0);
        g.set(1, 0, 0, 1.0);
        g.set(0, 1, 0, 2.0);
        g.set(1, 1, 0, 3.0);
        let doc = render(&g, "rho");

        let start = doc.find("binary\">").unwrap() + "binary\">".len();
        let end = doc.find("</DataArray>").unwrap();
        // 4-byte header encodes to 8 base64 characters.
        let values = STANDARD.decode(&doc[start + 8..end]).unwrap();
        let floats: Vec<f32> = values
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(floats, [0.0, 1.0, 2.0, 3.0]);
    }
}

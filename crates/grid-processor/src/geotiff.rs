//! GeoTIFF reading and writing.
//!
//! Only band 1 is read. Georeferencing comes from the standard GeoTIFF tags:
//! `ModelTransformationTag` when present, otherwise `ModelTiepointTag` plus
//! `ModelPixelScaleTag`. The CRS is taken from the GeoKey directory and the
//! no-data sentinel from GDAL's `GDAL_NODATA` ASCII tag.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

use num_traits::ToPrimitive;
use raster_common::{Crs, GeoTransform, GridShape, RasterError, RasterResult};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::types::RasterDataset;

// GeoKey ids
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

/// Read band 1 of a GeoTIFF file.
///
/// A file that does not exist yields [`RasterError::MissingFile`]; any other
/// open failure yields [`RasterError::FileRead`] and a file that opens but
/// cannot be decoded yields [`RasterError::Decode`]. No-data samples come
/// back as NaN.
pub fn read_geotiff(path: &Path) -> RasterResult<RasterDataset> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => RasterError::missing_file(path),
        _ => RasterError::file_read(path, e),
    })?;

    let mut decoder = Decoder::new(BufReader::new(file))
        .map_err(|e| RasterError::decode(path, e))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| RasterError::decode(path, e))?;
    let shape = GridShape::new(width as usize, height as usize);

    let transform = read_transform(&mut decoder).map_err(|e| RasterError::decode(path, e))?;
    let (crs, raster_type) = read_geokeys(&mut decoder).map_err(|e| RasterError::decode(path, e))?;
    let nodata = read_nodata(&mut decoder);

    let transform = match raster_type {
        // Tie points address pixel centres; move the origin to the outer corner
        RASTER_PIXEL_IS_POINT => {
            let (ox, oy) = transform.apply(-0.5, -0.5);
            GeoTransform {
                origin_x: ox,
                origin_y: oy,
                ..transform
            }
        }
        _ => transform,
    };

    let image = decoder
        .read_image()
        .map_err(|e| RasterError::decode(path, e))?;
    let data = match image {
        DecodingResult::U8(buf) => band_one(&buf, shape, nodata),
        DecodingResult::U16(buf) => band_one(&buf, shape, nodata),
        DecodingResult::U32(buf) => band_one(&buf, shape, nodata),
        DecodingResult::U64(buf) => band_one(&buf, shape, nodata),
        DecodingResult::I8(buf) => band_one(&buf, shape, nodata),
        DecodingResult::I16(buf) => band_one(&buf, shape, nodata),
        DecodingResult::I32(buf) => band_one(&buf, shape, nodata),
        DecodingResult::I64(buf) => band_one(&buf, shape, nodata),
        DecodingResult::F32(buf) => band_one(&buf, shape, nodata),
        DecodingResult::F64(buf) => band_one(&buf, shape, nodata),
        #[allow(unreachable_patterns)]
        _ => return Err(RasterError::decode(path, "unsupported sample format")),
    }
    .map_err(|e| RasterError::decode(path, e))?;

    debug!(
        path = %path.display(),
        width,
        height,
        crs = %crs,
        nodata = ?nodata,
        "Read GeoTIFF"
    );

    RasterDataset::new(data, shape, transform, crs).map_err(|e| RasterError::decode(path, e))
}

/// Extract band 1 from a decoded buffer, converting no-data to NaN.
///
/// Chunky multi-sample images interleave bands per pixel, so band 1 is every
/// `samples`-th value.
fn band_one<T: ToPrimitive + Copy>(
    buf: &[T],
    shape: GridShape,
    nodata: Option<f64>,
) -> Result<Vec<f32>, String> {
    let pixels = shape.len();
    if pixels == 0 {
        return Err("image has no pixels".to_string());
    }
    let samples = buf.len() / pixels;
    if samples == 0 {
        return Err(format!(
            "decoded {} samples for {} pixels",
            buf.len(),
            pixels
        ));
    }

    Ok(buf
        .iter()
        .step_by(samples)
        .take(pixels)
        .map(|v| match v.to_f64() {
            Some(x) if x.is_finite() && !is_nodata(x, nodata) => x as f32,
            _ => f32::NAN,
        })
        .collect())
}

fn is_nodata(value: f64, nodata: Option<f64>) -> bool {
    match nodata {
        // f32 rasters store the sentinel at f32 precision
        Some(nd) => value == nd || (value as f32) == (nd as f32),
        None => false,
    }
}

fn read_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<GeoTransform, String> {
    let matrix = find_f64s(decoder, Tag::ModelTransformationTag)?;
    if let Some(m) = matrix {
        if m.len() < 8 {
            return Err(format!("ModelTransformationTag has {} values", m.len()));
        }
        return Ok(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
    }

    let tiepoint = find_f64s(decoder, Tag::ModelTiepointTag)?;
    let scale = find_f64s(decoder, Tag::ModelPixelScaleTag)?;
    match (tiepoint, scale) {
        (Some(tp), Some(sc)) if tp.len() >= 6 && sc.len() >= 2 => {
            let (i, j, x, y) = (tp[0], tp[1], tp[3], tp[4]);
            let (sx, sy) = (sc[0], sc[1]);
            Ok(GeoTransform::north_up(x - i * sx, y + j * sy, sx, -sy))
        }
        _ => Err("missing georeferencing tags".to_string()),
    }
}

fn find_f64s<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
) -> Result<Option<Vec<f64>>, String> {
    decoder
        .find_tag(tag)
        .map_err(|e| e.to_string())?
        .map(|v| v.into_f64_vec())
        .transpose()
        .map_err(|e| e.to_string())
}

/// Returns the CRS and the raster type (pixel-is-area or pixel-is-point).
fn read_geokeys<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<(Crs, u16), String> {
    let keys = decoder
        .find_tag(Tag::GeoKeyDirectoryTag)
        .map_err(|e| e.to_string())?
        .map(|v| v.into_u16_vec())
        .transpose()
        .map_err(|e| e.to_string())?;

    let Some(keys) = keys else {
        return Ok((Crs::Unspecified, RASTER_PIXEL_IS_AREA));
    };

    let mut projected = None;
    let mut geographic = None;
    let mut raster_type = RASTER_PIXEL_IS_AREA;

    // Header is 4 shorts, then (id, location, count, value) per key.
    // Only inline values (location 0) are needed here.
    for entry in keys.get(4..).unwrap_or_default().chunks_exact(4) {
        let (id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match id {
            PROJECTED_CS_TYPE => projected = Some(value),
            GEOGRAPHIC_TYPE => geographic = Some(value),
            GT_RASTER_TYPE => raster_type = value,
            _ => {}
        }
    }

    let code = projected.or(geographic).filter(|c| *c != 0 && *c != USER_DEFINED);
    let crs = code.map(Crs::Epsg).unwrap_or(Crs::Unspecified);
    Ok((crs, raster_type))
}

fn read_nodata<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = match decoder.find_tag(Tag::GdalNodata) {
        Ok(Some(value)) => value.into_string().ok()?,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Unreadable GDAL_NODATA tag, treating raster as fully valid");
            return None;
        }
    };
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match trimmed.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) if trimmed.eq_ignore_ascii_case("nan") => None,
        Err(_) => {
            warn!(nodata = %trimmed, "Cannot parse GDAL_NODATA value");
            None
        }
    }
}

/// Write a dataset as a single-band 32-bit float GeoTIFF.
///
/// NaN samples are written as `nodata` when one is given, and the sentinel
/// is recorded in the `GDAL_NODATA` tag.
pub fn write_geotiff(path: &Path, dataset: &RasterDataset, nodata: Option<f32>) -> RasterResult<()> {
    let file = File::create(path).map_err(|e| RasterError::write(path, e))?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(|e| RasterError::write(path, e))?;

    let samples: Vec<f32> = match nodata {
        Some(nd) => dataset
            .data()
            .iter()
            .map(|v| if v.is_nan() { nd } else { *v })
            .collect(),
        None => dataset.data().to_vec(),
    };

    let mut image = encoder
        .new_image::<colortype::Gray32Float>(dataset.width() as u32, dataset.height() as u32)
        .map_err(|e| RasterError::write(path, e))?;

    let gt = dataset.transform();
    let dir = image.encoder();
    let tags = if gt.row_rotation == 0.0 && gt.col_rotation == 0.0 {
        dir.write_tag(
            Tag::ModelPixelScaleTag,
            &[gt.pixel_width, -gt.pixel_height, 0.0][..],
        )
        .and_then(|_| {
            dir.write_tag(
                Tag::ModelTiepointTag,
                &[0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0][..],
            )
        })
    } else {
        let matrix = [
            gt.pixel_width,
            gt.row_rotation,
            0.0,
            gt.origin_x,
            gt.col_rotation,
            gt.pixel_height,
            0.0,
            gt.origin_y,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ];
        dir.write_tag(Tag::ModelTransformationTag, &matrix[..])
    };
    tags.map_err(|e| RasterError::write(path, e))?;

    dir.write_tag(Tag::GeoKeyDirectoryTag, &geokey_directory(dataset.crs())[..])
        .map_err(|e| RasterError::write(path, e))?;

    if let Some(nd) = nodata {
        let text = nd.to_string();
        dir.write_tag(Tag::GdalNodata, text.as_str())
            .map_err(|e| RasterError::write(path, e))?;
    }

    image
        .write_data(&samples)
        .map_err(|e| RasterError::write(path, e))?;

    debug!(path = %path.display(), crs = %dataset.crs(), "Wrote GeoTIFF");
    Ok(())
}

fn geokey_directory(crs: Crs) -> Vec<u16> {
    let mut keys = vec![1, 1, 0, 0];
    let mut push = |id: u16, value: u16| keys.extend_from_slice(&[id, 0, 1, value]);

    match crs {
        Crs::Epsg(code) if crs.is_geographic() => {
            push(GT_MODEL_TYPE, MODEL_TYPE_GEOGRAPHIC);
            push(GT_RASTER_TYPE, RASTER_PIXEL_IS_AREA);
            push(GEOGRAPHIC_TYPE, code);
        }
        Crs::Epsg(code) => {
            push(GT_MODEL_TYPE, MODEL_TYPE_PROJECTED);
            push(GT_RASTER_TYPE, RASTER_PIXEL_IS_AREA);
            push(PROJECTED_CS_TYPE, code);
        }
        Crs::Unspecified => {
            push(GT_RASTER_TYPE, RASTER_PIXEL_IS_AREA);
        }
    }

    keys[3] = ((keys.len() - 4) / 4) as u16;
    keys
}

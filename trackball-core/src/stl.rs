/// STL model loading for binary and ASCII files
use nalgebra::{Point3, Vector3};
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{multispace0, multispace1},
    multi::{count, many0},
    number::complete::float,
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

#[derive(Debug, Error, PartialEq)]
pub enum StlError {
    #[error("binary STL needs at least 84 bytes, got {0}")]
    TooSmall(usize),
    #[error("binary STL declares {declared} facets but only {available} are present")]
    Truncated { declared: usize, available: usize },
    #[error("malformed ASCII STL near: {0:?}")]
    Ascii(String),
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, StlError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(StlError::TooSmall(data.len()));
    }
    let (count_bytes, body) = data[HEADER_LEN..].split_at(4);
    let declared = u32::from_le_bytes([count_bytes[0], count_bytes[1], count_bytes[2], count_bytes[3]]) as usize;

    let available = body.len() / FACET_LEN;
    if available < declared {
        return Err(StlError::Truncated { declared, available });
    }

    let mut mesh = Mesh::with_capacity(declared);
    for facet in body.chunks_exact(FACET_LEN).take(declared) {
        // normal, three vertices, then a 2-byte attribute count we ignore
        let mut floats = facet[..48]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        let mut next_vec = || {
            let mut xyz = [0.0f32; 3];
            for c in &mut xyz {
                *c = floats.next().unwrap_or_default();
            }
            Vector3::from(xyz)
        };
        let normal = next_vec();
        let vertices = [next_vec(), next_vec(), next_vec()].map(|p| Vertex::new(Point3::from(p), normal));
        mesh.add_triangle(Triangle::new(vertices[0], vertices[1], vertices[2]));
    }

    log::debug!("parsed binary STL with {declared} facets");
    Ok(mesh)
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, StlError> {
    match solid(input) {
        Ok((_, mesh)) => {
            log::debug!("parsed ASCII STL with {} facets", mesh.triangles.len());
            Ok(mesh)
        }
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            Err(StlError::Ascii(e.input.chars().take(32).collect()))
        }
        Err(nom::Err::Incomplete(_)) => Err(StlError::Ascii(String::new())),
    }
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(word))
}

fn solid(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = keyword("solid")(input)?;
    // the solid name runs to the end of the line
    let (input, _) = take_till(|c| c == '\n')(input)?;
    let (input, triangles) = many0(facet)(input)?;
    let (input, _) = terminated(keyword("endsolid"), take_till(|c| c == '\n'))(input)?;
    Ok((input, Mesh { triangles }))
}

fn facet(input: &str) -> IResult<&str, Triangle> {
    let (input, normal) = preceded(tuple((keyword("facet"), multispace1, tag("normal"))), vector3)(input)?;
    let (input, corners) = delimited(
        tuple((keyword("outer"), multispace1, tag("loop"))),
        count(preceded(keyword("vertex"), vector3), 3),
        tuple((keyword("endloop"), keyword("endfacet"))),
    )(input)?;

    let vertex = |p: Vector3<f32>| Vertex::new(Point3::from(p), normal);
    Ok((input, Triangle::new(vertex(corners[0]), vertex(corners[1]), vertex(corners[2]))))
}

fn vector3(input: &str) -> IResult<&str, Vector3<f32>> {
    let (input, (x, y, z)) = tuple((
        preceded(multispace0, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)?;
    Ok((input, Vector3::new(x, y, z)))
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, StlError> {
    // binary files may also start with "solid", so fall back on failure
    if data.starts_with(b"solid") {
        if let Ok(Ok(mesh)) = std::str::from_utf8(data).map(parse_ascii_stl) {
            return Ok(mesh);
        }
    }
    parse_binary_stl(data)
}

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{line_ending, space0, space1, u64 as u64_parser},
    combinator::{eof, map},
    error::ParseError,
    multi::separated_list1,
    number::complete::double,
    sequence::{pair, preceded, terminated},
    IResult,
};

use super::raster::{DemRaster, Origin};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DemParserError {
    #[error("missing NCOLS header")]
    MissingNColsHeader,

    #[error("missing NROWS header")]
    MissingNRowsHeader,

    #[error("missing CELLSIZE header")]
    MissingCellSizeHeader,

    #[error("expected either XLLCENTER & YLLCENTER or XLLCORNER & YLLCORNER headers")]
    MissingOrigin,

    #[error("CELLSIZE must be greater than 0")]
    CellSizeInvalid,

    #[error("unknown header keyword: {0}")]
    UnknownHeaderKeyword(String),

    #[error("data row {0} is too short")]
    RowTooShort(usize),

    #[error("one or more data rows are missing")]
    MissingRow,

    #[error("malformed grid: {0:?}")]
    Malformed(nom::error::ErrorKind),

    #[error("incomplete grid")]
    Incomplete,
}

impl<I> ParseError<I> for DemParserError {
    fn from_error_kind(_: I, kind: nom::error::ErrorKind) -> Self {
        DemParserError::Malformed(kind)
    }

    fn append(_: I, _: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl From<nom::Err<DemParserError>> for DemParserError {
    fn from(e: nom::Err<DemParserError>) -> Self {
        match e {
            nom::Err::Incomplete(_) => Self::Incomplete,
            nom::Err::Error(err) => err,
            nom::Err::Failure(err) => err,
        }
    }
}

#[derive(Debug)]
enum Header {
    NCols(usize),
    NRows(usize),
    XCenter(f64),
    XCorner(f64),
    YCenter(f64),
    YCorner(f64),
    CellSize(f64),
    NoDataValue(f64),
}

type HeaderResult<'a> = IResult<&'a str, Header, DemParserError>;

fn usize_header(name: &'static str) -> impl FnMut(&str) -> IResult<&str, usize, DemParserError> {
    move |input| {
        map(
            terminated(
                preceded(pair(tag_no_case(name), space1), u64_parser),
                line_ending,
            ),
            |val| val as usize,
        )(input)
    }
}

fn f64_header(name: &'static str) -> impl FnMut(&str) -> IResult<&str, f64, DemParserError> {
    move |input| {
        terminated(
            preceded(pair(tag_no_case(name), space1), double),
            line_ending,
        )(input)
    }
}

fn header_line(input: &str) -> HeaderResult {
    alt((
        map(usize_header("NCOLS"), Header::NCols),
        map(usize_header("NROWS"), Header::NRows),
        map(f64_header("XLLCENTER"), Header::XCenter),
        map(f64_header("XLLCORNER"), Header::XCorner),
        map(f64_header("YLLCENTER"), Header::YCenter),
        map(f64_header("YLLCORNER"), Header::YCorner),
        map(f64_header("CELLSIZE"), Header::CellSize),
        map(f64_header("NODATA_VALUE"), Header::NoDataValue),
    ))(input)
}

fn data_line(input: &str) -> IResult<&str, Vec<f64>, DemParserError> {
    terminated(
        preceded(space0, separated_list1(space1, double)),
        preceded(space0, alt((line_ending, eof))),
    )(input)
}

struct ParsedHeader {
    columns: usize,
    rows: usize,
    origin: Origin,
    cell_size: f64,
    no_data_value: f64,
}

fn header(mut input: &str) -> Result<(&str, ParsedHeader), DemParserError> {
    let mut columns: Option<usize> = None;
    let mut rows: Option<usize> = None;
    let mut x_center: Option<f64> = None;
    let mut y_center: Option<f64> = None;
    let mut x_corner: Option<f64> = None;
    let mut y_corner: Option<f64> = None;
    let mut cell_size: Option<f64> = None;
    let mut no_data_value: Option<f64> = None;

    loop {
        match header_line(input) {
            // a line that is no header line terminates the header block
            Err(nom::Err::Error(_)) => break,
            Err(err) => return Err(err.into()),
            Ok((remaining, header)) => {
                input = remaining;

                match header {
                    Header::NCols(val) => columns = Some(val),
                    Header::NRows(val) => rows = Some(val),
                    Header::XCenter(val) => x_center = Some(val),
                    Header::XCorner(val) => x_corner = Some(val),
                    Header::YCenter(val) => y_center = Some(val),
                    Header::YCorner(val) => y_corner = Some(val),
                    Header::CellSize(val) => cell_size = Some(val),
                    Header::NoDataValue(val) => no_data_value = Some(val),
                }
            }
        }
    }

    // anything alphabetic past the header block is a keyword we don't know
    if input.trim_start().starts_with(|c: char| c.is_alphabetic()) {
        let keyword = input
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        return Err(DemParserError::UnknownHeaderKeyword(keyword));
    }

    let columns = columns.ok_or(DemParserError::MissingNColsHeader)?;
    let rows = rows.ok_or(DemParserError::MissingNRowsHeader)?;
    let cell_size = cell_size.ok_or(DemParserError::MissingCellSizeHeader)?;

    if cell_size <= 0.0 {
        return Err(DemParserError::CellSizeInvalid);
    }

    let origin = match (x_center, y_center, x_corner, y_corner) {
        (Some(x), Some(y), _, _) => Origin::Center(x, y),
        (_, _, Some(x), Some(y)) => Origin::Corner(x, y),
        _ => return Err(DemParserError::MissingOrigin),
    };

    Ok((
        input,
        ParsedHeader {
            columns,
            rows,
            origin,
            cell_size,
            no_data_value: no_data_value.unwrap_or(-9999.0),
        },
    ))
}

/// Parse a decompressed ESRI ASCII grid into a raster.
pub fn parse(input: &str) -> Result<DemRaster, DemParserError> {
    let (mut input, header) = header(input)?;

    let mut data: Vec<f64> = Vec::with_capacity(header.columns * header.rows);

    for row_index in 0..header.rows {
        if input.is_empty() {
            return Err(DemParserError::MissingRow);
        }

        let (remaining, mut row) = data_line(input)?;
        input = remaining;

        if row.len() < header.columns {
            return Err(DemParserError::RowTooShort(row_index));
        }

        row.truncate(header.columns);
        data.append(&mut row);
    }

    Ok(DemRaster::new(
        header.columns,
        header.rows,
        header.origin,
        header.cell_size,
        header.no_data_value,
        data,
    ))
}

#[cfg(test)]
mod tests {
    use super::{parse, DemParserError};

    const GRID: &str = "NCOLS 3\nNROWS 2\nXLLCORNER 0.0\nYLLCORNER 0.0\nCELLSIZE 5.0\nNODATA_VALUE -9999\n1 2 3\n4 5 6\n";

    #[test]
    fn parses_a_complete_grid() {
        let raster = parse(GRID).unwrap();

        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.cell_size(), 5.0);
        assert_eq!(raster.no_data_value(), -9999.0);
        assert_eq!(raster.z(0, 0), 1.0);
        assert_eq!(raster.z(2, 1), 6.0);
    }

    #[test]
    fn header_keywords_are_case_insensitive() {
        let input = "ncols 1\nnrows 1\nxllcenter 0.5\nyllcenter 0.5\ncellsize 1.0\n7\n";
        let raster = parse(input).unwrap();

        assert_eq!(raster.dimensions(), (1, 1));
        assert_eq!(raster.z(0, 0), 7.0);
    }

    #[test]
    fn no_data_value_defaults_when_absent() {
        let input = "NCOLS 1\nNROWS 1\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\n0\n";

        assert_eq!(parse(input).unwrap().no_data_value(), -9999.0);
    }

    #[test]
    fn rejects_missing_ncols() {
        let input = "NROWS 1\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\n0\n";

        assert_eq!(parse(input), Err(DemParserError::MissingNColsHeader));
    }

    #[test]
    fn rejects_missing_origin_pair() {
        let input = "NCOLS 1\nNROWS 1\nXLLCORNER 0\nYLLCENTER 0\nCELLSIZE 1\n0\n";

        assert_eq!(parse(input), Err(DemParserError::MissingOrigin));
    }

    #[test]
    fn rejects_non_positive_cell_size() {
        let input = "NCOLS 1\nNROWS 1\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 0\n0\n";

        assert_eq!(parse(input), Err(DemParserError::CellSizeInvalid));
    }

    #[test]
    fn rejects_unknown_header_keyword() {
        let input = "NCOLS 1\nNROWS 1\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\nWHATEVER 1\n0\n";

        assert_eq!(
            parse(input),
            Err(DemParserError::UnknownHeaderKeyword("WHATEVER".to_string()))
        );
    }

    #[test]
    fn rejects_short_data_row() {
        let input = "NCOLS 3\nNROWS 1\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\n1 2\n";

        assert_eq!(parse(input), Err(DemParserError::RowTooShort(0)));
    }

    #[test]
    fn rejects_missing_rows() {
        let input = "NCOLS 1\nNROWS 2\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\n1\n";

        assert_eq!(parse(input), Err(DemParserError::MissingRow));
    }

    #[test]
    fn truncates_overlong_rows() {
        let input = "NCOLS 2\nNROWS 1\nXLLCORNER 0\nYLLCORNER 0\nCELLSIZE 1\n1 2 3 4\n";
        let raster = parse(input).unwrap();

        assert_eq!(raster.dimensions(), (2, 1));
        assert_eq!(raster.z(1, 0), 2.0);
    }

    #[test]
    fn center_origin_is_recognized() {
        let input = "NCOLS 2\nNROWS 2\nXLLCENTER 5\nYLLCENTER 5\nCELLSIZE 5\n1 2\n3 4\n";
        let raster = parse(input).unwrap();

        // Origin::Center(5, 5) normalizes to a (0, 0) corner
        assert_eq!(raster.x(0), 0.0);
        assert_eq!(raster.y(2), 0.0);
    }
}

/// Anchor of the lower-left cell, as given in the grid header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Origin {
    Center(f64, f64),
    Corner(f64, f64),
}

/// A digital elevation model: a uniform grid of elevation samples.
///
/// Rows are stored top-down, i.e. row 0 holds the samples with the largest
/// world Y.
#[derive(Debug, PartialEq)]
pub struct DemRaster {
    columns: usize,
    rows: usize,
    left: f64,
    bottom: f64,
    cell_size: f64,
    /// sentinel for "no sample in this cell"
    no_data_value: f64,
    /// row-major sample matrix, `rows * columns` values
    data: Vec<f64>,
}

impl DemRaster {
    pub fn new(
        columns: usize,
        rows: usize,
        origin: Origin,
        cell_size: f64,
        no_data_value: f64,
        data: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(data.len(), columns * rows);

        let (left, bottom) = match origin {
            Origin::Center(x, y) => (
                x - cell_size * (columns as f64) / 2.0,
                y - cell_size * (rows as f64) / 2.0,
            ),
            Origin::Corner(x, y) => (x, y),
        };

        DemRaster {
            columns,
            rows,
            left,
            bottom,
            cell_size,
            no_data_value,
            data,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.columns, self.rows)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn no_data_value(&self) -> f64 {
        self.no_data_value
    }

    pub fn x(&self, column: usize) -> f64 {
        self.left + column as f64 * self.cell_size
    }

    /// World Y for a row index. Row 0 is stored first but sits at the top of
    /// the world, so the index is flipped against `rows`.
    pub fn y(&self, row: usize) -> f64 {
        let norm_row = self.rows - row;
        self.bottom + norm_row as f64 * self.cell_size
    }

    pub fn z(&self, col: usize, row: usize) -> f64 {
        self.data[col + row * self.columns]
    }

    /// Minimum and maximum elevation, ignoring no-data samples.
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;

        for &sample in &self.data {
            if sample == self.no_data_value {
                continue;
            }

            range = Some(match range {
                None => (sample, sample),
                Some((min, max)) => (min.min(sample), max.max(sample)),
            });
        }

        range
    }
}

//! The source data adapter: a uniform, chunked columnar reader over the
//! bulk numerical data backing the channels.
//!
//! The [`DataSource`] trait is the seam for external backends; the crate
//! ships the in-memory [`MemorySource`]. A cursor pulls a bounded number of
//! rows per chunk and copies exactly the requested bytes, so peak memory is
//! governed by the chunk size rather than the dataset size.

use dlis_core::RepCode;
use snafu::{ensure, Backtrace, Snafu};
use std::collections::BTreeMap;
use std::ops::Range;

/// Module-level error type:
/// for errors which may occur while reading columnar source data.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// A dataset referenced by a frame is not in the source.
    #[snafu(display("The source holds no dataset keyed {}", key))]
    MissingDataset {
        /// The missing dataset key.
        key: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A row range lies outside the dataset.
    #[snafu(display(
        "Rows {}..{} are outside dataset {} of {} rows",
        start,
        end,
        key,
        rows
    ))]
    RangeOutOfBounds {
        /// The dataset key.
        key: String,
        /// The requested range start.
        start: usize,
        /// The requested range end.
        end: usize,
        /// The dataset row count.
        rows: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A column's element count does not form whole rows.
    #[snafu(display("{} elements do not divide into rows of width {}", length, width))]
    BadWidth {
        /// The element count.
        length: usize,
        /// The declared row width.
        width: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },
}

/// Type alias for a result from this module.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A utility macro implementing the per-element-type plumbing of
/// [`ColumnArray`]: length, row slicing and `From` conversions.
macro_rules! impl_column_array {
    ($($typ:ty => $variant:ident / $code:ident),* $(,)?) => {
        impl ColumnArray {
            /// The number of scalar elements held.
            pub fn len(&self) -> usize {
                match self {
                    $(ColumnArray::$variant(v) => v.len(),)*
                }
            }

            /// Whether the array holds no elements.
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Whether the elements are floating point numbers.
            pub fn is_float(&self) -> bool {
                matches!(self, ColumnArray::F32(_) | ColumnArray::F64(_))
            }

            /// The representation code matching the element type exactly.
            pub fn natural_code(&self) -> RepCode {
                match self {
                    $(ColumnArray::$variant(_) => RepCode::$code,)*
                }
            }

            fn slice(&self, elements: Range<usize>) -> ColumnArray {
                match self {
                    $(ColumnArray::$variant(v) => {
                        ColumnArray::$variant(v[elements].to_vec())
                    })*
                }
            }

            /// The elements widened to `f64`, in order.
            pub(crate) fn to_f64_vec(&self) -> Vec<f64> {
                match self {
                    $(ColumnArray::$variant(v) => {
                        v.iter().map(|x| f64::from(*x)).collect()
                    })*
                }
            }
        }

        $(
            impl From<Vec<$typ>> for ColumnArray {
                fn from(values: Vec<$typ>) -> Self {
                    ColumnArray::$variant(values)
                }
            }

            impl From<Vec<$typ>> for Column {
                fn from(values: Vec<$typ>) -> Self {
                    Column {
                        array: ColumnArray::$variant(values),
                        width: 1,
                    }
                }
            }
        )*
    };
}

/// A typed array of column elements, kept in the host's native layout
/// until encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnArray {
    /// Signed one-byte integers.
    I8(Vec<i8>),
    /// Signed two-byte integers.
    I16(Vec<i16>),
    /// Signed four-byte integers.
    I32(Vec<i32>),
    /// Unsigned one-byte integers.
    U8(Vec<u8>),
    /// Unsigned two-byte integers.
    U16(Vec<u16>),
    /// Unsigned four-byte integers.
    U32(Vec<u32>),
    /// Single precision floats.
    F32(Vec<f32>),
    /// Double precision floats.
    F64(Vec<f64>),
}

impl_column_array! {
    i8 => I8 / Sshort,
    i16 => I16 / Snorm,
    i32 => I32 / Slong,
    u8 => U8 / Ushort,
    u16 => U16 / Unorm,
    u32 => U32 / Ulong,
    f32 => F32 / Fsingl,
    f64 => F64 / Fdoubl,
}

/// A column: a typed element array structured into rows of a fixed width.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    array: ColumnArray,
    width: usize,
}

impl Column {
    /// Create a column of the given row width.
    pub fn new<A: Into<ColumnArray>>(array: A, width: usize) -> Result<Self> {
        let array = array.into();
        ensure!(
            width > 0 && array.len() % width == 0,
            BadWidthSnafu {
                length: array.len(),
                width,
            }
        );
        Ok(Column { array, width })
    }

    /// The typed element array.
    pub fn array(&self) -> &ColumnArray {
        &self.array
    }

    /// The number of elements per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of rows.
    pub fn rows(&self) -> usize {
        self.array.len() / self.width
    }

    /// Copy the given rows out into a new column.
    pub fn slice_rows(&self, rows: Range<usize>) -> Column {
        Column {
            array: self
                .array
                .slice(rows.start * self.width..rows.end * self.width),
            width: self.width,
        }
    }
}

/// A chunked columnar reader: shape queries plus exact row-range copies,
/// keyed by dataset name.
pub trait DataSource {
    /// The `(rows, width)` shape of the dataset, or `None` if absent.
    fn shape(&self, key: &str) -> Option<(usize, usize)>;

    /// Copy the given rows of the dataset into a fresh column.
    fn read_rows(&self, key: &str, rows: Range<usize>) -> Result<Column>;
}

/// An in-memory mapping of dataset keys to columns.
///
/// This doubles as the structured-array backend: a record array is a set of
/// equally long named columns, which is exactly what this type holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySource {
    columns: BTreeMap<String, Column>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Insert a column under the given dataset key.
    pub fn insert<K, C>(&mut self, key: K, column: C)
    where
        K: Into<String>,
        C: Into<Column>,
    {
        self.columns.insert(key.into(), column.into());
    }

    /// Insert a two-dimensional column of the given row width.
    pub fn insert_wide<K, A>(&mut self, key: K, array: A, width: usize) -> Result<()>
    where
        K: Into<String>,
        A: Into<ColumnArray>,
    {
        self.columns.insert(key.into(), Column::new(array, width)?);
        Ok(())
    }
}

impl DataSource for MemorySource {
    fn shape(&self, key: &str) -> Option<(usize, usize)> {
        self.columns.get(key).map(|c| (c.rows(), c.width()))
    }

    fn read_rows(&self, key: &str, rows: Range<usize>) -> Result<Column> {
        let column = self
            .columns
            .get(key)
            .ok_or_else(|| MissingDatasetSnafu { key }.build())?;
        ensure!(
            rows.start <= rows.end && rows.end <= column.rows(),
            RangeOutOfBoundsSnafu {
                key,
                start: rows.start,
                end: rows.end,
                rows: column.rows(),
            }
        );
        Ok(column.slice_rows(rows))
    }
}

/// One rectangular chunk of rows across all datasets of a frame.
#[derive(Debug)]
pub(crate) struct RowChunk {
    /// The absolute row index of the chunk's first row.
    pub start: usize,
    /// The number of rows in the chunk.
    pub rows: usize,
    /// One column slice per dataset, parallel to the cursor's key list.
    pub columns: Vec<Column>,
}

/// Pulls fixed-size row chunks across a frame's datasets.
///
/// The next chunk is only fetched when the caller asks for it, giving the
/// downstream pipeline backpressure over the source.
#[derive(Debug)]
pub(crate) struct ChunkCursor<'a, S: DataSource + ?Sized> {
    source: &'a S,
    keys: Vec<String>,
    rows: usize,
    chunk_rows: usize,
    pos: usize,
}

impl<'a, S: DataSource + ?Sized> ChunkCursor<'a, S> {
    pub(crate) fn new(source: &'a S, keys: Vec<String>, rows: usize, chunk_rows: usize) -> Self {
        ChunkCursor {
            source,
            keys,
            rows,
            chunk_rows: chunk_rows.max(1),
            pos: 0,
        }
    }
}

impl<S: DataSource + ?Sized> Iterator for ChunkCursor<'_, S> {
    type Item = Result<RowChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.rows {
            return None;
        }
        let take = self.chunk_rows.min(self.rows - self.pos);
        let range = self.pos..self.pos + take;
        let columns = self
            .keys
            .iter()
            .map(|key| self.source.read_rows(key, range.clone()))
            .collect::<Result<Vec<_>>>();
        let chunk = columns.map(|columns| RowChunk {
            start: self.pos,
            rows: take,
            columns,
        });
        self.pos += take;
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MemorySource {
        let mut source = MemorySource::new();
        source.insert("DEPTH", (0..100).map(f64::from).collect::<Vec<_>>());
        source
            .insert_wide("AMP", vec![0.5_f32; 500], 5)
            .unwrap();
        source
    }

    #[test]
    fn shapes() {
        let source = source();
        assert_eq!(source.shape("DEPTH"), Some((100, 1)));
        assert_eq!(source.shape("AMP"), Some((100, 5)));
        assert_eq!(source.shape("NOPE"), None);
    }

    #[test]
    fn width_must_divide_length() {
        assert!(Column::new(vec![1.0_f64; 10], 3).is_err());
        assert!(Column::new(vec![1.0_f64; 10], 0).is_err());
        assert!(Column::new(vec![1.0_f64; 10], 5).is_ok());
    }

    #[test]
    fn read_rows_copies_exactly() {
        let source = source();
        let column = source.read_rows("DEPTH", 10..13).unwrap();
        assert_eq!(column.rows(), 3);
        assert_eq!(
            column.array(),
            &ColumnArray::F64(vec![10.0, 11.0, 12.0])
        );
        let column = source.read_rows("AMP", 98..100).unwrap();
        assert_eq!(column.rows(), 2);
        assert_eq!(column.array().len(), 10);
    }

    #[test]
    fn missing_and_out_of_bounds() {
        let source = source();
        assert!(matches!(
            source.read_rows("NOPE", 0..1),
            Err(Error::MissingDataset { .. })
        ));
        assert!(matches!(
            source.read_rows("DEPTH", 99..101),
            Err(Error::RangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn cursor_covers_all_rows_once() {
        let source = source();
        let keys = vec![String::from("DEPTH"), String::from("AMP")];
        let cursor = ChunkCursor::new(&source, keys, 100, 32);
        let chunks: Vec<_> = cursor.map(Result::unwrap).collect();
        assert_eq!(chunks.len(), 4);
        assert_eq!(
            chunks.iter().map(|c| c.rows).collect::<Vec<_>>(),
            [32, 32, 32, 4]
        );
        assert_eq!(chunks[3].start, 96);
        assert_eq!(chunks[1].columns[1].rows(), 32);
    }

    #[test]
    fn natural_codes() {
        assert_eq!(
            ColumnArray::from(vec![1_i16]).natural_code(),
            RepCode::Snorm
        );
        assert_eq!(
            ColumnArray::from(vec![1.0_f64]).natural_code(),
            RepCode::Fdoubl
        );
        assert!(ColumnArray::from(vec![1.0_f32]).is_float());
        assert!(!ColumnArray::from(vec![1_u8]).is_float());
    }
}

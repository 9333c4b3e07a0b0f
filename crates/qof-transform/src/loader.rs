use qof_ingest::{MeasureFile, read_csv_table};
use qof_model::{MeasureSchema, Result};
use tracing::{debug, warn};

use crate::frame::MeasureFrame;
use crate::frame_builder::build_measure_frame;
use crate::shape::resolve_shape;

/// Read a measure file, resolve its column roles and build the typed frame.
///
/// A table without rows is returned as an empty frame and logged as a
/// warning; downstream steps handle empty frames.
pub fn load_measure(file: &MeasureFile, schema: Option<&MeasureSchema>) -> Result<MeasureFrame> {
    let table = read_csv_table(&file.path)?;
    let shape = resolve_shape(&file.id, &table.headers, schema)?;
    debug!(
        measure = %file.id,
        numerator = %shape.numerator,
        denominator = %shape.denominator,
        group_by = ?shape.group_by,
        source = ?shape.source,
        "resolved measure shape"
    );
    if table.is_empty() {
        warn!(measure = %file.id, path = %file.path.display(), "measure table has no rows");
    }
    let mut frame = build_measure_frame(&file.id, &table, shape)?;
    frame.set_source_file(file.path.clone());
    Ok(frame)
}

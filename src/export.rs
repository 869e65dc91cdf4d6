use std::io::Write;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::algorithms::models::TraceRecord;
use crate::algorithms::tune::{SweptParameter, TuneReport};
use crate::error::PsoResult;

/// Streams trajectory rows as CSV, header first.
pub struct TraceWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl TraceWriter<std::fs::File> {
    pub fn create(path: impl AsRef<Path>) -> PsoResult<Self> {
        Ok(Self::new(csv::Writer::from_path(path)?))
    }
}

impl<W: Write> TraceWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        Self::new(csv::Writer::from_writer(inner))
    }

    fn new(writer: csv::Writer<W>) -> Self {
        TraceWriter { writer, rows: 0 }
    }

    pub fn write_all(&mut self, records: &[TraceRecord]) -> PsoResult<()> {
        for record in records {
            self.writer.serialize(record)?;
        }
        self.rows += records.len();
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> PsoResult<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| e.into_error().into())
    }
}

const SWEEP_HEADERS: [&str; 6] = [
    "swarm_size",
    "max_iterations",
    "inertia_weight",
    "cognitive_weight",
    "social_weight",
    "fitness",
];

/// All sweep trials on one sheet, one titled sub-table per parameter.
pub fn export_full_experiments_single_sheet(
    report: &TuneReport,
    path: impl AsRef<Path>,
) -> PsoResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    let mut row = 0;
    let heading = format!("Objective: {}", report.objective);
    worksheet.write_with_format(row, 0, &heading, &bold)?;
    row += 2;

    for parameter in SweptParameter::ORDER {
        let Some(trials) = report.experiments.get(&parameter) else {
            continue;
        };

        let title = format!("=== Sweep {} ===", parameter.name().replace('_', " ").to_uppercase());
        worksheet.write_with_format(row, 0, &title, &bold)?;
        row += 1;

        for (col, header) in SWEEP_HEADERS.iter().enumerate() {
            worksheet.write_with_format(row, col as u16, *header, &bold)?;
        }
        row += 1;

        for (params, fitness) in trials {
            worksheet.write(row, 0, params.swarm_size as u32)?;
            worksheet.write(row, 1, params.max_iterations as u32)?;
            worksheet.write(row, 2, params.inertia_weight)?;
            worksheet.write(row, 3, params.cognitive_weight)?;
            worksheet.write(row, 4, params.social_weight)?;
            worksheet.write(row, 5, *fitness)?;
            row += 1;
        }

        // Spacer between sub-tables
        row += 2;
    }

    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fitness::Objective;
    use crate::algorithms::optimizer::Swarm;
    use crate::algorithms::particle::Particle;

    #[test]
    fn trace_rows_are_written_with_header() {
        let swarm = Swarm::from_particles(
            Objective::Sphere,
            vec![
                Particle::at(1.0, 2.0, Objective::Sphere),
                Particle::at(0.5, -0.5, Objective::Sphere),
            ],
        );
        let mut writer = TraceWriter::from_writer(Vec::new());
        writer.write_all(&swarm.trace_records()).unwrap();
        assert_eq!(writer.rows(), 2);

        let bytes = writer.finish().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "iteration,particle,x,y,vx,vy,fitness,best_x,best_y,best_fitness"
        );
        assert_eq!(lines.next().unwrap(), "0,0,1.0,2.0,0.0,0.0,5.0,1.0,2.0,5.0");
        assert_eq!(lines.count(), 1);
    }
}

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;

use failure::format_err;
use serde::de::DeserializeOwned;

use crate::measure::{Currents, Measurement};
use crate::trace::Sweep;
use crate::Result;

const BIAS_COLUMN: &str = "bias";

pub trait ExportableTrace {
    fn save_as_csv(&self, path: &Path) -> Result<()>;
}

pub trait ImportableTrace: Sized {
    fn from_csv<P: AsRef<Path>>(path: P, contact: &str) -> Result<Self>;
}

trait CsvWriter {
    fn write_record(&mut self, record: &[&str]) -> Result<()>;
    fn close(self: Box<Self>) -> Result<()>;
}

impl<W: std::io::Write> CsvWriter for csv::Writer<libflate::gzip::Encoder<W>> {
    fn write_record(&mut self, record: &[&str]) -> Result<()> {
        csv::Writer::write_record(self, record)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.into_inner()
            .map_err(|_| failure::err_msg("Error writing the file"))?
            .finish()
            .into_result()?;
        Ok(())
    }
}

impl CsvWriter for csv::Writer<File> {
    fn write_record(&mut self, record: &[&str]) -> Result<()> {
        csv::Writer::write_record(self, record)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.into_inner()
            .map_err(|_| failure::err_msg("Error writing the file"))?;
        Ok(())
    }
}

fn is_gz(path: &Path) -> bool {
    path.extension().and_then(OsStr::to_str) == Some("gz")
}

fn csv_writer_from_path(path: &Path) -> Result<Box<dyn CsvWriter>> {
    let mut out_builder = csv::WriterBuilder::new();
    out_builder.delimiter(b'\t');
    Ok(if is_gz(path) {
        Box::new(out_builder.from_writer(libflate::gzip::Encoder::new(File::create(path)?)?))
    } else {
        Box::new(out_builder.from_path(path)?)
    })
}

fn csv_reader_from_path<D: DeserializeOwned + 'static>(
    path: &Path,
) -> Result<Box<dyn Iterator<Item = csv::Result<D>>>> {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true);
    builder.delimiter(b'\t');
    Ok(if is_gz(path) {
        Box::new(
            builder
                .from_reader(libflate::gzip::Decoder::new(File::open(path)?)?)
                .into_deserialize(),
        )
    } else {
        Box::new(builder.from_path(path)?.into_deserialize())
    })
}

/// One row per step: the bias, then every contact's current. A contact not
/// measured at a step is left empty.
impl ExportableTrace for Sweep {
    fn save_as_csv(&self, path: &Path) -> Result<()> {
        let mut out = csv_writer_from_path(path)?;

        let contacts = self.contacts();
        let mut header = vec![BIAS_COLUMN];
        header.extend(contacts.iter().map(String::as_str));
        out.write_record(&header)?;

        for m in self.measurements.iter() {
            let mut row = vec![m.bias.to_string()];
            row.extend(
                contacts
                    .iter()
                    .map(|c| m.current(c).map(|i| i.to_string()).unwrap_or_default()),
            );
            let rec = row.iter().map(String::as_str).collect::<Vec<_>>();
            out.write_record(&rec)?;
        }
        out.close()?;
        Ok(())
    }
}

impl ImportableTrace for Sweep {
    fn from_csv<P: AsRef<Path>>(path: P, contact: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut measurements = Vec::new();

        for (ix, result) in csv_reader_from_path(path)?.enumerate() {
            let mut record: BTreeMap<String, Option<f64>> = result?;
            let bias = record.remove(BIAS_COLUMN).and_then(|b| b).ok_or_else(|| {
                format_err!("{}: row {} has no bias", path.display(), ix + 1)
            })?;
            let currents = record
                .into_iter()
                .filter_map(|(c, i)| i.map(|i| (c, i)))
                .collect::<Currents>();
            measurements.push(Measurement::new(bias, currents));
        }

        Ok(Sweep::new(contact, measurements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sweep() -> Sweep {
        let mut sweep = Sweep::new("drain", Vec::new());
        for (ix, bias) in [0.05, 0.1, 0.15, 0.2].iter().enumerate() {
            let mut currents = Currents::new();
            currents.insert("drain".to_owned(), 1e-6 * ix as f64);
            currents.insert("source".to_owned(), -1e-6 * ix as f64);
            if ix != 2 {
                currents.insert("gate".to_owned(), 0.0);
            }
            sweep.measurements.push(Measurement::new(*bias, currents));
        }
        sweep
    }

    #[test]
    fn saved_sweep_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        for name in &["drain_sweep.tsv", "drain_sweep.tsv.gz"] {
            let path = dir.path().join(name);
            sweep().save_as_csv(&path).unwrap();
            let loaded = Sweep::from_csv(&path, "drain").unwrap();
            assert_eq!(loaded, sweep());
        }
    }

    #[test]
    fn header_lists_bias_then_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.tsv");
        sweep().save_as_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "bias\tdrain\tgate\tsource");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[3], "0.15\t0.000002\t\t-0.000002");
    }

    #[test]
    fn row_without_bias_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.tsv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "bias\tdrain").unwrap();
        writeln!(f, "0.1\t1e-6").unwrap();
        writeln!(f, "\t2e-6").unwrap();
        drop(f);

        let err = Sweep::from_csv(&path, "drain").unwrap_err();
        assert!(err.to_string().contains("row 2 has no bias"));
    }
}

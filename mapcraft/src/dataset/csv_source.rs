use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::dataset::{Row, Value};
use crate::error::MapcraftError;

/// Reads rows from a CSV file with a header line.
///
/// Empty cells are omitted from the row. With type inference enabled (the default) cells that
/// parse as numbers become [`Value::Number`], `true`/`false` become [`Value::Bool`] and everything
/// else is kept as text. Disable inference when loading with a declared schema, so that text
/// attributes that look like numbers keep their original form.
pub struct CsvSource<R> {
    reader: csv::Reader<R>,
    infer_types: bool,
}

impl CsvSource<File> {
    /// Opens a CSV file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MapcraftError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file))
    }
}

impl<R: Read> CsvSource<R> {
    /// Creates a source reading from the given reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader),
            infer_types: true,
        }
    }

    /// Enables or disables type inference of cell values.
    pub fn with_type_inference(mut self, infer_types: bool) -> Self {
        self.infer_types = infer_types;
        self
    }

    /// Reads all rows of the file.
    pub fn read_rows(mut self) -> Result<Vec<Row>, MapcraftError> {
        let headers: Vec<String> = self.reader.headers()?.iter().map(String::from).collect();

        let mut rows = vec![];
        for record in self.reader.records() {
            let record = record?;
            let mut row = Row::new();
            for (name, cell) in headers.iter().zip(record.iter()) {
                if cell.is_empty() {
                    continue;
                }

                let value = if self.infer_types {
                    infer_value(cell)
                } else {
                    Value::Text(cell.to_string())
                };
                row.push(name.clone(), value);
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

fn infer_value(cell: &str) -> Value {
    if let Ok(number) = cell.parse::<f64>() {
        return Value::Number(number);
    }

    match cell {
        "true" | "TRUE" | "True" => Value::Bool(true),
        "false" | "FALSE" | "False" => Value::Bool(false),
        _ => Value::Text(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &str = "lat,lon,value,name,active\n\
                        10.5,20,3.5,alpha,true\n\
                        -5, 7 ,,beta,false\n";

    #[test]
    fn reads_typed_rows() {
        let rows = CsvSource::from_reader(DATA.as_bytes()).read_rows().unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].get("lat"), Some(&Value::Number(10.5)));
        assert_eq!(rows[0].get("name"), Some(&Value::from("alpha")));
        assert_eq!(rows[0].get("active"), Some(&Value::Bool(true)));

        assert_eq!(rows[1].get("lon"), Some(&Value::Number(7.0)));
        assert_eq!(rows[1].get("value"), None);
    }

    #[test]
    fn reads_text_rows() {
        let rows = CsvSource::from_reader(DATA.as_bytes())
            .with_type_inference(false)
            .read_rows()
            .unwrap();
        assert_eq!(rows[0].get("value"), Some(&Value::from("3.5")));
    }

    #[test]
    fn ragged_rows_fail() {
        let data = "lat,lon\n1,2,3\n";
        assert!(CsvSource::from_reader(data.as_bytes()).read_rows().is_err());
    }
}

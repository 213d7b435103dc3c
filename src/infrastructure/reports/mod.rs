pub mod csv_exporter;

pub use csv_exporter::CsvReportExporter;

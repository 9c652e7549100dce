pub mod report_writer;
pub mod seed_reader;

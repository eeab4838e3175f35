pub mod job_file;
pub mod raster_reader;
pub mod result_writer;

mod file;
mod iter;

pub use file::run_file_source;
pub use iter::{run_iter_source, SourceFactory, Sources};

pub mod assembly_error;
pub mod catalog_error;
pub mod fetch_error;
pub mod job_error;

pub use assembly_error::AssemblyError;
pub use catalog_error::CatalogError;
pub use fetch_error::FetchError;
pub use job_error::JobError;

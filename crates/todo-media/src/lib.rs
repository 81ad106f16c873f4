mod filename;
mod store;

pub use filename::{allowed_extension, secure_filename, ALLOWED_EXTENSIONS};
pub use store::{MediaError, MediaStore, UPLOAD_PREFIX};

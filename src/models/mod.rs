pub mod clinical;
pub mod enums;
pub mod patient;
pub mod upload;

pub use clinical::*;
pub use enums::*;
pub use patient::*;
pub use upload::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid {field} label: {value}")]
    InvalidLabel { field: String, value: String },
}

//! Profile Store: the user's accumulating attribute record.
//!
//! The wizard mutates the profile one field at a time; the selected sectors
//! decide which wizard steps exist, and the frozen snapshot is what gets
//! submitted for analysis.

pub mod model;
pub mod store;

pub use model::{EmploymentStatus, HousingStatus, Profile, Sector, VacationFrequency};
pub use store::{MAX_CHILDREN, ProfileStore};

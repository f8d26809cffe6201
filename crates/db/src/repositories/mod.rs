//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod attendance_repo;
pub mod group_repo;
pub mod member_repo;
pub mod orientation_repo;

pub use attendance_repo::AttendanceRepo;
pub use group_repo::GroupRepo;
pub use member_repo::MemberRepo;
pub use orientation_repo::OrientationRepo;

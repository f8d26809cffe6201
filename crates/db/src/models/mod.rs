//! Row models (`FromRow`) and insert/update DTOs.

pub mod attendance;
pub mod group;
pub mod member;
pub mod orientation;

pub use attendance::{AttendanceRecord, NewAttendance};
pub use group::{Group, NewGroup};
pub use member::{Member, MemberProfile};
pub use orientation::OrientationDetails;

pub use self::drive::DriveValues;
pub use self::target::Target;

mod drive;
mod target;
